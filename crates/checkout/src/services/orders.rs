//! Order creation.
//!
//! An order is created pending, then annotated step by step and saved once at
//! the end. Nothing is rolled back: if a later step fails the created row stays.

use chrono::{DateTime, TimeDelta, Utc};

use directpay_core::{CountryCode, Email, Locale, Money, OrderStatus, SessionToken, ShippingProvider};

use crate::db::RepositoryError;
use crate::middleware::session_cookie::ShippingSession;
use crate::models::order::{line_meta, meta};
use crate::models::shipping::METHOD_ID;
use crate::models::{Address, FeeLine, Order, ShippingLine};
use crate::services::catalog;
use crate::services::gateways::GatewayId;
use crate::services::rates;
use crate::state::AppState;

/// Title of a shipping line priced from the client-supplied cost.
const FALLBACK_SHIPPING_TITLE: &str = "Shipping";
const EXPRESS_SHIPPING_TITLE: &str = "Flat rate";
const EXPRESS_PAYMENT_TITLE: &str = "Stripe (Express Checkout)";

/// Customer details from the checkout form.
#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address_1: String,
    pub city: String,
    pub postcode: String,
    pub country: CountryCode,
}

/// Pickup point chosen on the checkout page.
#[derive(Debug, Clone, Default)]
pub struct PickupPoint {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: Option<String>,
    pub carrier: Option<String>,
}

impl PickupPoint {
    /// Carrier display name when the carrier is a known provider slug.
    #[must_use]
    pub fn carrier_name(carrier: &str) -> String {
        carrier
            .parse::<ShippingProvider>()
            .map_or_else(|_| carrier.to_owned(), |p| p.name().to_owned())
    }

    fn summary(&self) -> String {
        let mut summary = format!(
            "Pickup point: {}, {}, {} {}",
            self.name, self.address, self.postal_code, self.city
        );
        if let Some(carrier) = self.carrier.as_deref().filter(|c| !c.is_empty()) {
            summary.push_str(&format!(" ({})", Self::carrier_name(carrier)));
        }
        summary
    }
}

/// A validated order request.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub reference: String,
    pub amount: Money,
    pub customer: CustomerDetails,
    pub gateway: GatewayId,
    pub locale: Locale,
    pub payment_intent_id: Option<String>,
    pub pickup: Option<PickupPoint>,
    pub delivery_type: Option<String>,
    /// Selected shipping rate id.
    pub shipping_method: Option<String>,
    /// Client-side price of the selected rate, used when the id is unknown.
    pub shipping_cost: Option<Money>,
}

/// What happened to the caller's shipping session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// No shipping method was selected or sessions are disabled.
    Skipped,
    /// A new session was opened; the cookie must be set.
    Started {
        token: SessionToken,
        duration: TimeDelta,
    },
    /// The order joined the active session.
    Extended { order_number: u32 },
}

/// A persisted order and its session outcome.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: Order,
    pub session: SessionOutcome,
}

/// Create an order from the direct checkout.
///
/// # Errors
///
/// Returns `RepositoryError` if creating, reading settings for, or saving the
/// order fails.
#[tracing::instrument(skip_all, fields(reference = %input.reference, gateway = %input.gateway))]
pub async fn create_order(
    state: &AppState,
    input: NewOrder,
    session: &ShippingSession,
) -> Result<CreatedOrder, RepositoryError> {
    let now = session.now;
    let mut order = state.orders().create(state.config().currency, now).await?;

    let customer = &input.customer;
    order.billing = Address {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        email: customer.email.to_string(),
        phone: customer.phone.clone(),
        address_1: customer.address_1.clone(),
        city: customer.city.clone(),
        postcode: customer.postcode.clone(),
        country: customer.country.to_string(),
        ..Address::default()
    };
    order.shipping = Address {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        address_1: customer.address_1.clone(),
        city: customer.city.clone(),
        postcode: customer.postcode.clone(),
        country: customer.country.to_string(),
        ..Address::default()
    };

    order.payment_method = input.gateway.as_str().to_owned();
    order.payment_method_title = input.gateway.title(input.locale).to_owned();
    order.fee_lines.push(FeeLine {
        name: format!("Payment - Ref: {}", input.reference),
        total: input.amount,
    });

    if let Some(method) = &input.shipping_method {
        let line = shipping_line(state, session, method, &customer.country, input.shipping_cost).await?;
        if let Some(line) = line {
            order.shipping_lines.push(line);
        }
    }

    order.set_meta(meta::REFERENCE, input.reference.clone());
    order.set_meta(meta::CUSTOM_AMOUNT, input.amount.to_string());
    order.set_meta(meta::DIRECTPAY_ORDER, "yes");
    order.set_meta(meta::LOCALE, input.locale.code());
    if let Some(intent) = &input.payment_intent_id {
        order.set_meta(meta::STRIPE_INTENT_ID, intent.clone());
        order.set_meta(meta::TRANSACTION_ID, intent.clone());
    }
    if let Some(pickup) = &input.pickup {
        annotate_pickup(&mut order, pickup, now);
    }
    if let Some(delivery_type) = input.delivery_type.as_deref().filter(|d| !d.is_empty()) {
        order.set_meta(meta::DELIVERY_TYPE, delivery_type);
    }
    if let Some(method) = &input.shipping_method {
        order.set_meta(meta::SHIPPING_METHOD, method.clone());
    }

    apply_status_policy(&mut order, input.gateway, input.payment_intent_id.as_deref(), now);
    order.add_note(
        format!(
            "Order created via direct checkout. Reference: {}",
            input.reference
        ),
        now,
    );

    let outcome = if input.shipping_method.is_some() && session.settings.enabled {
        apply_session(state, &mut order, session).await
    } else {
        SessionOutcome::Skipped
    };

    state.orders().save(&order).await?;

    tracing::info!(
        order_id = %order.id,
        status = order.status.as_str(),
        total = %order.total(),
        "Created order"
    );
    Ok(CreatedOrder {
        order,
        session: outcome,
    })
}

/// Shipping line for the selected rate id.
///
/// The rate is looked up among the destination's pickup rates (discounted
/// when a session is active). Unknown ids fall back to the client cost.
async fn shipping_line(
    state: &AppState,
    session: &ShippingSession,
    method: &str,
    country: &CountryCode,
    client_cost: Option<Money>,
) -> Result<Option<ShippingLine>, RepositoryError> {
    let pricing = catalog::pricing(state.settings()).await?;
    let title = catalog::shipping_method(state.settings()).await?.title;
    let mut rates = rates::rates_for_country(&pricing, country, &title);
    if session.active.is_some() {
        rates::apply_session_discount(&mut rates);
    }

    if let Some(rate) = rates.into_iter().find(|r| r.id == method) {
        return Ok(Some(ShippingLine {
            method_id: rate.method_id,
            title: rate.label,
            total: rate.cost,
            meta: rate.meta,
        }));
    }

    let Some(cost) = client_cost else {
        tracing::warn!(shipping_method = method, "Unknown shipping rate and no client cost");
        return Ok(None);
    };
    let mut line = ShippingLine {
        method_id: method.to_owned(),
        title: FALLBACK_SHIPPING_TITLE.to_owned(),
        total: cost,
        meta: std::collections::BTreeMap::new(),
    };
    if session.active.is_some() && method.contains(METHOD_ID) && !cost.is_zero() {
        line.total = Money::ZERO;
        line.meta
            .insert(line_meta::ORIGINAL_COST.to_owned(), cost.to_string());
        line.meta
            .insert(line_meta::SESSION_DISCOUNT.to_owned(), cost.to_string());
    }
    Ok(Some(line))
}

fn annotate_pickup(order: &mut Order, pickup: &PickupPoint, now: DateTime<Utc>) {
    if let Some(id) = &pickup.id {
        order.set_meta(meta::PICKUP_ID, id.clone());
    }
    order.set_meta(meta::PICKUP_NAME, pickup.name.clone());
    order.set_meta(meta::PICKUP_ADDRESS, pickup.address.clone());
    order.set_meta(meta::PICKUP_CITY, pickup.city.clone());
    order.set_meta(meta::PICKUP_ZIPCODE, pickup.postal_code.clone());
    if let Some(country) = &pickup.country {
        order.set_meta(meta::PICKUP_COUNTRY, country.clone());
    }
    if let Some(carrier) = &pickup.carrier {
        order.set_meta(meta::PICKUP_CARRIER, carrier.clone());
    }
    order.add_note(pickup.summary(), now);
}

/// Payment intent present: paid. Manual gateway: processing. Otherwise pending.
fn apply_status_policy(
    order: &mut Order,
    gateway: GatewayId,
    payment_intent_id: Option<&str>,
    now: DateTime<Utc>,
) {
    if let Some(intent) = payment_intent_id.filter(|i| !i.is_empty()) {
        order.set_status(OrderStatus::Processing, "Payment confirmed via Stripe", now);
        order.payment_complete(intent, now);
    } else if gateway.is_manual() {
        order.set_status(OrderStatus::Processing, "Payment via COD", now);
    } else {
        order.set_status(OrderStatus::Pending, "Awaiting payment confirmation", now);
    }
}

async fn apply_session(
    state: &AppState,
    order: &mut Order,
    session: &ShippingSession,
) -> SessionOutcome {
    let now = session.now;
    let duration = session.settings.duration();

    if let Some(active) = &session.active {
        let order_number = active.record.order_count + 1;
        order.set_meta(meta::SESSION_ID, active.token.as_str());
        order.set_meta(meta::SESSION_ORDER_NUMBER, order_number.to_string());
        order.set_meta(meta::SHIPPING_PAID, "no");
        order.set_meta(meta::FIRST_ORDER_ID, active.record.first_order_id.to_string());
        order.add_note(
            format!("Free shipping applied (order {order_number} of session)"),
            now,
        );

        state
            .sessions()
            .record_order(&active.token, order.id, order.shipping_saved(), now, duration)
            .await;
        return SessionOutcome::Extended { order_number };
    }

    order.set_meta(meta::SHIPPING_PAID, "yes");
    let customer = order.billing.email.clone();
    if customer.trim().is_empty() {
        return SessionOutcome::Skipped;
    }

    let token = state.sessions().start(order.id, &customer, now, duration).await;
    order.set_meta(meta::SESSION_ID, token.as_str());
    order.set_meta(meta::SESSION_ORDER_NUMBER, "1");
    order.add_note(
        format!(
            "New shipping session created. Free shipping on next orders for {} hours.",
            session.settings.duration_hours
        ),
        now,
    );
    SessionOutcome::Started { token, duration }
}

/// A validated express-checkout (payment request button) order.
#[derive(Debug, Clone)]
pub struct ExpressOrder {
    pub reference: String,
    pub amount: Money,
    pub shipping_cost: Money,
    pub shipping_method: Option<String>,
    pub billing: Address,
    pub shipping: Address,
    pub payment_intent_id: Option<String>,
}

/// Create an order from the express checkout. Express orders never touch
/// shipping sessions.
///
/// # Errors
///
/// Returns `RepositoryError` if creating or saving the order fails.
#[tracing::instrument(skip_all, fields(reference = %input.reference))]
pub async fn create_express_order(
    state: &AppState,
    input: ExpressOrder,
    now: DateTime<Utc>,
) -> Result<Order, RepositoryError> {
    let mut order = state.orders().create(state.config().currency, now).await?;

    order.billing = input.billing;
    order.shipping = input.shipping;
    order.fee_lines.push(FeeLine {
        name: format!("Payment - Ref: {}", input.reference),
        total: input.amount,
    });
    if let Some(method) = input.shipping_method.filter(|_| !input.shipping_cost.is_zero()) {
        order.shipping_lines.push(ShippingLine {
            method_id: method,
            title: EXPRESS_SHIPPING_TITLE.to_owned(),
            total: input.shipping_cost,
            meta: std::collections::BTreeMap::new(),
        });
    }

    order.payment_method = GatewayId::Stripe.as_str().to_owned();
    order.payment_method_title = EXPRESS_PAYMENT_TITLE.to_owned();
    order.set_meta(meta::REFERENCE, input.reference.clone());
    order.set_meta(meta::CUSTOM_AMOUNT, input.amount.to_string());
    order.set_meta(meta::DIRECTPAY_ORDER, "yes");

    match input.payment_intent_id.as_deref().filter(|i| !i.is_empty()) {
        Some(intent) => {
            order.set_meta(meta::STRIPE_INTENT_ID, intent);
            order.set_meta(meta::TRANSACTION_ID, intent);
            order.set_status(OrderStatus::Processing, "Payment confirmed via Stripe", now);
            order.payment_complete(intent, now);
        }
        None => {
            order.set_status(OrderStatus::Pending, "Awaiting payment confirmation", now);
        }
    }
    order.add_note(
        format!(
            "Order created via express checkout. Reference: {}",
            input.reference
        ),
        now,
    );

    state.orders().save(&order).await?;
    tracing::info!(order_id = %order.id, total = %order.total(), "Created express order");
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_status_policy_intent_marks_paid() {
        let mut order = Order::new(1.into(), directpay_core::CurrencyCode::EUR, now());
        apply_status_policy(&mut order, GatewayId::Stripe, Some("pi_1"), now());
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.transaction_id.as_deref(), Some("pi_1"));
        assert!(order.date_paid.is_some());
    }

    #[test]
    fn test_status_policy_cod_processing() {
        let mut order = Order::new(1.into(), directpay_core::CurrencyCode::EUR, now());
        apply_status_policy(&mut order, GatewayId::Cod, None, now());
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.date_paid.is_none());
        assert!(order.notes[0].note.ends_with("Payment via COD"));
    }

    #[test]
    fn test_status_policy_other_pending() {
        let mut order = Order::new(1.into(), directpay_core::CurrencyCode::EUR, now());
        apply_status_policy(&mut order, GatewayId::Bacs, Some(""), now());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.notes[0].note, "Awaiting payment confirmation");
    }

    #[test]
    fn test_pickup_summary_uses_carrier_name() {
        let pickup = PickupPoint {
            name: "Relais".to_owned(),
            address: "2 rue Haute".to_owned(),
            city: "Nantes".to_owned(),
            postal_code: "44000".to_owned(),
            carrier: Some("mondial_relay".to_owned()),
            ..PickupPoint::default()
        };
        assert_eq!(
            pickup.summary(),
            "Pickup point: Relais, 2 rue Haute, 44000 Nantes (Mondial Relay)"
        );
        assert_eq!(PickupPoint::carrier_name("DHL"), "DHL");
    }
}
