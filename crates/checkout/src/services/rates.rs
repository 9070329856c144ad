//! Pickup-point shipping rates.
//!
//! Rates come from the per-country pricing tables only: one rate per provider
//! and speed with a positive price.

use std::collections::BTreeMap;

use directpay_core::{CountryCode, DeliverySpeed, Money, ShippingProvider};

use crate::models::order::line_meta;
use crate::models::shipping::METHOD_ID;
use crate::models::{ProviderPricing, ShippingRate};

/// Suffix appended to the label of a rate zeroed by a shipping session.
pub const FREE_SESSION_SUFFIX: &str = " (Free - Active Session)";

/// Rates offered for `country`, in provider then speed order.
#[must_use]
pub fn rates_for_country(
    pricing: &ProviderPricing,
    country: &CountryCode,
    title: &str,
) -> Vec<ShippingRate> {
    let mut rates = Vec::new();
    for provider in ShippingProvider::ALL {
        let Some(rule) = pricing.rule(provider, country) else {
            continue;
        };
        for speed in DeliverySpeed::ALL {
            let cost = rule.price(speed);
            if cost.is_zero() {
                continue;
            }
            rates.push(rate(provider, speed, cost, title));
        }
    }
    rates
}

fn rate(provider: ShippingProvider, speed: DeliverySpeed, cost: Money, title: &str) -> ShippingRate {
    let meta = BTreeMap::from([
        (line_meta::DELIVERY_TYPE.to_owned(), speed.slug().to_owned()),
        (line_meta::SHIPPING_METHOD.to_owned(), provider.slug().to_owned()),
        (line_meta::PROVIDER.to_owned(), provider.name().to_owned()),
    ]);

    ShippingRate {
        id: ShippingRate::id_for(provider, speed),
        method_id: METHOD_ID.to_owned(),
        label: format!("{title} - {} {}", provider.name(), speed.name()),
        cost,
        meta,
    }
}

/// Zero every pickup-point rate, keeping its price as `original_cost`.
pub fn apply_session_discount(rates: &mut [ShippingRate]) {
    for rate in rates.iter_mut().filter(|r| r.is_pickup_rate()) {
        let original = rate.cost;
        rate.cost = Money::ZERO;
        rate.label.push_str(FREE_SESSION_SUFFIX);
        rate.meta
            .insert(line_meta::ORIGINAL_COST.to_owned(), original.to_string());
        rate.meta
            .insert(line_meta::SESSION_DISCOUNT.to_owned(), original.to_string());
    }
}
