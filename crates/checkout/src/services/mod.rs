//! Business logic for the checkout.
//!
//! # Services
//!
//! - `catalog` - Pickup locations, pricing tables and admin settings
//! - `gateways` - Payment gateway registry and localized titles
//! - `orders` - Order creation and annotation
//! - `rates` - Shipping rates per destination and session discounts
//! - `reports` - Admin order listings
//! - `sessions` - Free-shipping session cache
//! - `stripe` - Stripe payment intents

pub mod catalog;
pub mod gateways;
pub mod orders;
pub mod rates;
pub mod reports;
pub mod sessions;
pub mod stripe;
