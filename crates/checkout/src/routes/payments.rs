//! Payment method and Stripe route handlers.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::instrument;

use directpay_core::{CurrencyCode, Locale, Money};

use crate::config::StripeConfig;
use crate::error::{AppError, AppJson, AppQuery, Result};
use crate::services::gateways::PaymentMethod;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentMethodsQuery {
    pub locale: Option<String>,
    pub amount: Option<Decimal>,
}

/// Enabled gateways with titles in the requested locale.
#[instrument(skip(state))]
pub async fn payment_methods(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PaymentMethodsQuery>,
) -> Result<Json<Vec<PaymentMethod>>> {
    let locale = Locale::parse_or_default(query.locale.as_deref())?;
    let amount = query
        .amount
        .map(Money::new)
        .transpose()
        .map_err(|_| AppError::InvalidAmount("Amount cannot be negative".to_string()))?;

    Ok(Json(state.gateways().available(locale, amount)))
}

/// Stripe settings, failing when Stripe or its publishable key is absent.
fn stripe_settings(state: &AppState) -> Result<(&StripeConfig, &str)> {
    let config = state.config().stripe.as_ref().ok_or(AppError::NoStripe)?;
    let key = config
        .publishable_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(AppError::MissingKey)?;
    Ok((config, key))
}

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentIntentRequest {
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub publishable_key: String,
}

/// Create a Stripe payment intent for the checkout amount.
#[instrument(skip(state))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AppJson(body): AppJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>> {
    let client = state.stripe().ok_or(AppError::NoStripe)?;
    let amount = body
        .amount
        .and_then(|a| Money::positive(a).ok())
        .ok_or_else(|| AppError::InvalidAmount("Amount must be greater than 0".to_string()))?;
    let (_, publishable_key) = stripe_settings(&state)?;

    let intent = client
        .create_payment_intent(amount, state.config().currency)
        .await?;

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
        publishable_key: publishable_key.to_owned(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ExpressCheckoutParams {
    pub publishable_key: String,
    pub currency: CurrencyCode,
    pub test_mode: bool,
}

/// Parameters the browser needs to mount the express checkout button.
#[instrument(skip(state))]
pub async fn express_checkout_params(State(state): State<AppState>) -> Result<Json<JsonValue>> {
    let (config, publishable_key) = stripe_settings(&state)?;
    let params = ExpressCheckoutParams {
        publishable_key: publishable_key.to_owned(),
        currency: state.config().currency,
        test_mode: config.test_mode,
    };
    Ok(Json(json!({ "success": true, "data": params })))
}
