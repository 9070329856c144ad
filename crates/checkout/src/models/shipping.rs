//! Pickup locations, pricing rules and computed shipping rates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use directpay_core::{CountryCode, DeliverySpeed, Money, ShippingProvider};

/// Shipping method id shared by every pickup-point rate.
pub const METHOD_ID: &str = "directpay_shipping";

/// Default rate title when none is configured.
pub const DEFAULT_TITLE: &str = "Pickup Point Delivery";

/// Admin-configured pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupLocation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: CountryCode,
    pub created_at: DateTime<Utc>,
}

impl PickupLocation {
    /// `Name - Address, Postcode City (CC)`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} - {}, {} {} ({})",
            self.name, self.address, self.postal_code, self.city, self.country
        )
    }
}

/// Prices for one country and provider. A zero price means "not offered".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub express: Money,
    pub normal: Money,
    pub updated_at: DateTime<Utc>,
}

impl PricingRule {
    #[must_use]
    pub const fn price(&self, speed: DeliverySpeed) -> Money {
        match speed {
            DeliverySpeed::Express => self.express,
            DeliverySpeed::Normal => self.normal,
        }
    }
}

/// Per-country pricing for one provider.
pub type PricingTable = BTreeMap<CountryCode, PricingRule>;

/// Pricing for every provider, as read for one rate computation.
#[derive(Debug, Clone, Default)]
pub struct ProviderPricing {
    pub tables: BTreeMap<ShippingProvider, PricingTable>,
}

impl ProviderPricing {
    #[must_use]
    pub fn rule(&self, provider: ShippingProvider, country: &CountryCode) -> Option<&PricingRule> {
        self.tables.get(&provider).and_then(|t| t.get(country))
    }
}

/// A pickup location as offered on the checkout page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLocation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: CountryCode,
    pub express_price: Money,
    pub normal_price: Money,
    pub display_name: String,
}

impl CheckoutLocation {
    #[must_use]
    pub fn new(location: &PickupLocation, pricing: Option<&PricingRule>) -> Self {
        Self {
            id: location.id.clone(),
            name: location.name.clone(),
            address: location.address.clone(),
            city: location.city.clone(),
            postal_code: location.postal_code.clone(),
            country: location.country.clone(),
            express_price: pricing.map_or(Money::ZERO, |p| p.express),
            normal_price: pricing.map_or(Money::ZERO, |p| p.normal),
            display_name: location.display_name(),
        }
    }
}

/// Settings for the pickup-point shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethodSettings {
    pub title: String,
}

impl Default for ShippingMethodSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
        }
    }
}

/// A computed shipping option for a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingRate {
    pub id: String,
    pub method_id: String,
    pub label: String,
    pub cost: Money,
    pub meta: BTreeMap<String, String>,
}

impl ShippingRate {
    /// Rate id for a provider and speed, e.g. `directpay_shipping_mondial_relay_express`.
    #[must_use]
    pub fn id_for(provider: ShippingProvider, speed: DeliverySpeed) -> String {
        format!("{METHOD_ID}_{}_{}", provider.slug(), speed.slug())
    }

    /// Whether this rate belongs to the pickup-point method.
    #[must_use]
    pub fn is_pickup_rate(&self) -> bool {
        self.id.contains(METHOD_ID)
    }
}
