//! Order creation route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use directpay_core::{CountryCode, CurrencyCode, Email, Locale, Money, OrderId};

use crate::error::{AppError, AppJson, Result};
use crate::middleware::{CookieUpdate, ShippingSession};
use crate::models::Address;
use crate::services::gateways::Gateways;
use crate::services::orders::{
    self, CreatedOrder, CustomerDetails, ExpressOrder, NewOrder, PickupPoint, SessionOutcome,
};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Customer block of an order request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_1: String,
    pub city: String,
    pub postcode: String,
    pub country: Option<String>,
}

/// Pickup point chosen on the checkout page.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PickupPointInput {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: Option<String>,
    pub carrier: Option<String>,
}

/// Body of `POST /orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateOrderRequest {
    pub reference: String,
    pub amount: Option<Decimal>,
    pub customer: Option<CustomerInput>,
    pub payment_method: String,
    pub locale: Option<String>,
    pub payment_intent_id: Option<String>,
    pub pickup_point: Option<PickupPointInput>,
    pub delivery_type: Option<String>,
    pub shipping_method: Option<String>,
    pub shipping_cost: Option<Decimal>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn order_amount(amount: Option<Decimal>) -> Result<Money> {
    let amount = amount.ok_or(AppError::MissingField("amount"))?;
    Money::positive(amount)
        .map_err(|_| AppError::InvalidAmount("Amount must be greater than zero".to_string()))
}

impl CreateOrderRequest {
    /// Validate into a [`NewOrder`].
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, checked in field order.
    pub fn validate(self, gateways: &Gateways) -> Result<NewOrder> {
        let reference = self.reference.trim().to_owned();
        if reference.is_empty() {
            return Err(AppError::MissingField("reference"));
        }
        let amount = order_amount(self.amount)?;

        let customer = self.customer.ok_or(AppError::MissingField("customer"))?;
        let email = Email::parse(&customer.email)?;
        let country = match non_empty(customer.country) {
            Some(code) => CountryCode::parse(&code)?,
            None => CountryCode::france(),
        };

        let gateway = gateways
            .resolve(self.payment_method.trim())
            .ok_or_else(|| AppError::InvalidGateway(self.payment_method.clone()))?;
        let locale = Locale::parse_or_default(self.locale.as_deref())?;

        let shipping_cost = self
            .shipping_cost
            .map(Money::new)
            .transpose()
            .map_err(|_| AppError::InvalidAmount("Shipping cost cannot be negative".to_string()))?;

        let pickup = self
            .pickup_point
            .filter(|p| !p.name.trim().is_empty())
            .map(|p| PickupPoint {
                id: non_empty(p.id),
                name: p.name.trim().to_owned(),
                address: p.address.trim().to_owned(),
                city: p.city.trim().to_owned(),
                postal_code: p.postal_code.trim().to_owned(),
                country: non_empty(p.country),
                carrier: non_empty(p.carrier),
            });

        Ok(NewOrder {
            reference,
            amount,
            customer: CustomerDetails {
                first_name: customer.first_name.trim().to_owned(),
                last_name: customer.last_name.trim().to_owned(),
                email,
                phone: customer.phone.trim().to_owned(),
                address_1: customer.address_1.trim().to_owned(),
                city: customer.city.trim().to_owned(),
                postcode: customer.postcode.trim().to_owned(),
                country,
            },
            gateway,
            locale,
            payment_intent_id: non_empty(self.payment_intent_id),
            pickup,
            delivery_type: non_empty(self.delivery_type),
            shipping_method: non_empty(self.shipping_method),
            shipping_cost,
        })
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Session part of the order response.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionSummary {
    Started { duration_hours: i64 },
    Extended { order_number: u32 },
}

/// Body returned by `POST /orders`.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub order_number: String,
    pub order_key: String,
    pub total: Money,
    pub subtotal: Money,
    pub shipping_total: Money,
    pub currency: CurrencyCode,
    pub status: &'static str,
    pub payment_method: String,
    pub payment_method_title: String,
    pub shipping_session: Option<SessionSummary>,
}

impl From<&CreatedOrder> for OrderResponse {
    fn from(created: &CreatedOrder) -> Self {
        let order = &created.order;
        let shipping_session = match &created.session {
            SessionOutcome::Skipped => None,
            SessionOutcome::Started { duration, .. } => Some(SessionSummary::Started {
                duration_hours: duration.num_hours(),
            }),
            SessionOutcome::Extended { order_number } => Some(SessionSummary::Extended {
                order_number: *order_number,
            }),
        };

        Self {
            success: true,
            order_id: order.id,
            order_number: order.id.to_string(),
            order_key: order.order_key.clone(),
            total: order.total(),
            subtotal: order.subtotal(),
            shipping_total: order.shipping_total(),
            currency: order.currency,
            status: order.status.as_str(),
            payment_method: order.payment_method.clone(),
            payment_method_title: order.payment_method_title.clone(),
            shipping_session,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an order from the direct checkout.
///
/// Sets the session cookie when the order opens a shipping session and
/// clears a cookie whose session has expired.
#[instrument(skip(state, session, body))]
pub async fn create(
    State(state): State<AppState>,
    session: ShippingSession,
    AppJson(body): AppJson<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    let input = body.validate(state.gateways())?;
    let secure = state.config().secure_cookies();

    let created = orders::create_order(&state, input, &session)
        .await
        .map_err(AppError::OrderCreation)?;

    let cookie = match &created.session {
        SessionOutcome::Started { token, duration } => CookieUpdate::set(token, *duration, secure),
        _ => CookieUpdate::clear_if_stale(&session, secure),
    };

    Ok((
        StatusCode::CREATED,
        cookie,
        Json(OrderResponse::from(&created)),
    ))
}

/// Body of `POST /validate-reference`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidateReferenceRequest {
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateReferenceResponse {
    pub valid: bool,
    pub message: &'static str,
}

/// Check that no order already uses a reference.
#[instrument(skip(state, body))]
pub async fn validate_reference(
    State(state): State<AppState>,
    AppJson(body): AppJson<ValidateReferenceRequest>,
) -> Result<Json<ValidateReferenceResponse>> {
    let reference = body.reference.trim();
    if reference.is_empty() {
        return Err(AppError::InvalidReference(
            "Reference is required".to_string(),
        ));
    }

    let response = if state.orders().reference_exists(reference).await? {
        ValidateReferenceResponse {
            valid: false,
            message: "This reference already exists",
        }
    } else {
        ValidateReferenceResponse {
            valid: true,
            message: "Reference is valid",
        }
    };
    Ok(Json(response))
}

/// Body of `POST /process-express-payment`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpressPaymentRequest {
    pub reference: String,
    pub amount: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub shipping_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub billing_address_1: String,
    pub billing_address_2: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_postcode: String,
    pub billing_country: String,
    pub shipping_first_name: Option<String>,
    pub shipping_last_name: Option<String>,
    pub shipping_address_1: String,
    pub shipping_address_2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postcode: String,
    pub shipping_country: String,
}

impl ExpressPaymentRequest {
    /// Validate into an [`ExpressOrder`].
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank reference, `InvalidAmount` for a
    /// non-positive amount or negative shipping cost, `InvalidEmail` for a
    /// present but malformed email.
    pub fn validate(self) -> Result<ExpressOrder> {
        let reference = self.reference.trim().to_owned();
        if reference.is_empty() {
            return Err(AppError::MissingField("reference"));
        }
        let amount = order_amount(self.amount)?;
        let shipping_cost = match self.shipping_cost {
            Some(cost) => Money::new(cost).map_err(|_| {
                AppError::InvalidAmount("Shipping cost cannot be negative".to_string())
            })?,
            None => Money::ZERO,
        };
        let email = match self.email.trim() {
            "" => String::new(),
            raw => Email::parse(raw)?.to_string(),
        };

        let billing = Address {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email,
            phone: self.phone,
            address_1: self.billing_address_1,
            address_2: self.billing_address_2,
            city: self.billing_city,
            state: self.billing_state,
            postcode: self.billing_postcode,
            country: self.billing_country,
        };
        let shipping = Address {
            first_name: self.shipping_first_name.unwrap_or(self.first_name),
            last_name: self.shipping_last_name.unwrap_or(self.last_name),
            address_1: self.shipping_address_1,
            address_2: self.shipping_address_2,
            city: self.shipping_city,
            state: self.shipping_state,
            postcode: self.shipping_postcode,
            country: self.shipping_country,
            ..Address::default()
        };

        Ok(ExpressOrder {
            reference,
            amount,
            shipping_cost,
            shipping_method: non_empty(self.shipping_method),
            billing,
            shipping,
            payment_intent_id: non_empty(self.payment_intent_id),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExpressPaymentResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub redirect_url: String,
}

/// Create an order from the express checkout (payment request button).
#[instrument(skip(state, body))]
pub async fn process_express_payment(
    State(state): State<AppState>,
    AppJson(body): AppJson<ExpressPaymentRequest>,
) -> Result<Json<ExpressPaymentResponse>> {
    let input = body.validate()?;
    let order = orders::create_express_order(&state, input, state.now())
        .await
        .map_err(AppError::OrderCreation)?;

    Ok(Json(ExpressPaymentResponse {
        success: true,
        order_id: order.id,
        redirect_url: format!(
            "{}/checkout/order-received/{}?key={}",
            state.config().base_url,
            order.id,
            order.order_key
        ),
    }))
}
