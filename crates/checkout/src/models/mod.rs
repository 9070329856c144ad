//! Domain models for the checkout service.

pub mod order;
pub mod session;
pub mod settings;
pub mod shipping;

pub use order::{Address, FeeLine, Order, OrderNote, ShippingLine};
pub use session::{ActiveSession, SessionRecord, format_remaining};
pub use settings::SessionSettings;
pub use shipping::{
    CheckoutLocation, PickupLocation, PricingRule, PricingTable, ProviderPricing,
    ShippingMethodSettings, ShippingRate,
};
