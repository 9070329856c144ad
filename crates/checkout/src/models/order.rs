//! Order records annotated by the checkout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use directpay_core::{CurrencyCode, Money, OrderId, OrderStatus};

/// Order metadata keys written by the checkout.
pub mod meta {
    pub const REFERENCE: &str = "_custom_reference";
    pub const CUSTOM_AMOUNT: &str = "_custom_amount";
    pub const DIRECTPAY_ORDER: &str = "_directpay_order";
    pub const LOCALE: &str = "_order_locale";
    pub const STRIPE_INTENT_ID: &str = "_stripe_intent_id";
    pub const TRANSACTION_ID: &str = "_transaction_id";

    pub const PICKUP_ID: &str = "_pickup_point_id";
    pub const PICKUP_NAME: &str = "_pickup_point_name";
    pub const PICKUP_ADDRESS: &str = "_pickup_point_address";
    pub const PICKUP_CITY: &str = "_pickup_point_city";
    pub const PICKUP_ZIPCODE: &str = "_pickup_point_zipcode";
    pub const PICKUP_COUNTRY: &str = "_pickup_point_country";
    pub const PICKUP_CARRIER: &str = "_pickup_point_carrier";
    pub const DELIVERY_TYPE: &str = "_directpay_delivery_type";
    pub const SHIPPING_METHOD: &str = "_directpay_shipping_method";

    pub const SESSION_ID: &str = "_directpay_session_id";
    pub const SESSION_ORDER_NUMBER: &str = "_directpay_session_order_number";
    pub const SHIPPING_PAID: &str = "_directpay_shipping_paid";
    pub const FIRST_ORDER_ID: &str = "_directpay_first_order_id";
}

/// Shipping line metadata keys.
pub mod line_meta {
    pub const DELIVERY_TYPE: &str = "delivery_type";
    pub const SHIPPING_METHOD: &str = "shipping_method";
    pub const PROVIDER: &str = "provider";
    pub const ORIGINAL_COST: &str = "original_cost";
    pub const SESSION_DISCOUNT: &str = "session_discount";
}

/// A postal address attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
}

impl Address {
    /// `First Last`, trimmed; empty when both names are blank.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }
}

/// A fee line carrying the customer-entered amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub name: String,
    pub total: Money,
}

/// A shipping line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLine {
    pub method_id: String,
    pub title: String,
    pub total: Money,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl ShippingLine {
    /// The pre-discount price recorded when a session zeroed this line.
    #[must_use]
    pub fn original_cost(&self) -> Option<Money> {
        self.meta
            .get(line_meta::ORIGINAL_COST)
            .and_then(|v| v.parse().ok())
    }
}

/// A timestamped audit note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    pub created_at: DateTime<Utc>,
    pub note: String,
}

/// An order created through the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_key: String,
    pub status: OrderStatus,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub billing: Address,
    #[serde(default)]
    pub shipping: Address,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub payment_method_title: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub fee_lines: Vec<FeeLine>,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Vec<OrderNote>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub date_paid: Option<DateTime<Utc>>,
}

impl Order {
    const KEY_PREFIX: &'static str = "order_";
    const KEY_RANDOM_LENGTH: usize = 13;

    /// A new pending order with no lines.
    #[must_use]
    pub fn new(id: OrderId, currency: CurrencyCode, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            order_key: Self::generate_key(),
            status: OrderStatus::Pending,
            currency,
            billing: Address::default(),
            shipping: Address::default(),
            payment_method: String::new(),
            payment_method_title: String::new(),
            transaction_id: None,
            fee_lines: Vec::new(),
            shipping_lines: Vec::new(),
            meta: BTreeMap::new(),
            notes: Vec::new(),
            created_at,
            date_paid: None,
        }
    }

    /// Random order key used in customer-facing links.
    #[must_use]
    pub fn generate_key() -> String {
        let random: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(Self::KEY_RANDOM_LENGTH)
            .map(char::from)
            .collect();
        format!("{}{random}", Self::KEY_PREFIX)
    }

    /// Sum of fee lines.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.fee_lines.iter().map(|l| l.total).sum()
    }

    /// Sum of shipping lines.
    #[must_use]
    pub fn shipping_total(&self) -> Money {
        self.shipping_lines.iter().map(|l| l.total).sum()
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.subtotal() + self.shipping_total()
    }

    /// Total shipping waived by an active session on this order.
    #[must_use]
    pub fn shipping_saved(&self) -> Money {
        self.shipping_lines
            .iter()
            .filter_map(ShippingLine::original_cost)
            .sum()
    }

    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<String>) {
        self.meta.insert(key.to_owned(), value.into());
    }

    pub fn add_note(&mut self, note: impl Into<String>, now: DateTime<Utc>) {
        self.notes.push(OrderNote {
            created_at: now,
            note: note.into(),
        });
    }

    /// Change status, recording the transition and reason as a note.
    pub fn set_status(&mut self, status: OrderStatus, reason: &str, now: DateTime<Utc>) {
        let note = if self.status == status {
            reason.to_owned()
        } else {
            format!(
                "Order status changed from {} to {}. {reason}",
                self.status.label(),
                status.label()
            )
        };
        self.status = status;
        self.add_note(note.trim_end(), now);
    }

    /// Mark the order paid by an external transaction.
    pub fn payment_complete(&mut self, transaction_id: &str, now: DateTime<Utc>) {
        self.transaction_id = Some(transaction_id.to_owned());
        self.date_paid = Some(now);
    }

    /// The customer-entered payment reference.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.meta(meta::REFERENCE)
    }

    /// The shipping session this order belongs to, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.meta(meta::SESSION_ID).filter(|s| !s.is_empty())
    }

    /// Whether the customer paid for shipping on this order.
    #[must_use]
    pub fn paid_shipping(&self) -> bool {
        self.meta(meta::SHIPPING_PAID) != Some("no")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn order() -> Order {
        Order::new(OrderId::new(1), CurrencyCode::EUR, Utc::now())
    }

    #[test]
    fn test_totals_sum_fee_and_shipping_lines() {
        let mut order = order();
        order.fee_lines.push(FeeLine {
            name: "Payment - Ref: A1".to_owned(),
            total: money("42.50"),
        });
        order.shipping_lines.push(ShippingLine {
            method_id: "directpay_shipping_chronopost_normal".to_owned(),
            title: "Chronopost".to_owned(),
            total: money("7.5"),
            meta: BTreeMap::new(),
        });

        assert_eq!(order.subtotal(), money("42.50"));
        assert_eq!(order.shipping_total(), money("7.50"));
        assert_eq!(order.total(), money("50"));
    }

    #[test]
    fn test_shipping_saved_reads_original_cost() {
        let mut order = order();
        let mut meta = BTreeMap::new();
        meta.insert(line_meta::ORIGINAL_COST.to_owned(), "12.9".to_owned());
        order.shipping_lines.push(ShippingLine {
            method_id: "directpay_shipping_mondial_relay_express".to_owned(),
            title: "Mondial Relay (Free - Active Session)".to_owned(),
            total: Money::ZERO,
            meta,
        });

        assert_eq!(order.shipping_saved(), money("12.90"));
        assert!(order.total().is_zero());
    }

    #[test]
    fn test_set_status_records_transition() {
        let mut order = order();
        order.set_status(OrderStatus::Processing, "Payment via COD", Utc::now());

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(
            order.notes.last().unwrap().note,
            "Order status changed from Pending to Processing. Payment via COD"
        );
    }

    #[test]
    fn test_paid_shipping_defaults_to_true() {
        let mut order = order();
        assert!(order.paid_shipping());
        order.set_meta(meta::SHIPPING_PAID, "no");
        assert!(!order.paid_shipping());
    }

    #[test]
    fn test_order_key_shape() {
        let key = Order::generate_key();
        assert!(key.starts_with("order_"));
        assert_eq!(key.len(), "order_".len() + 13);
    }
}
