//! Stripe API client for payment intents.
//!
//! Only intent creation is needed: the browser confirms the payment with the
//! returned client secret and the order is created afterwards with the intent
//! id attached.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use directpay_core::{CurrencyCode, Money, MoneyError};

use crate::config::StripeConfig;

/// Outbound request timeout. Requests are not retried.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response, or the amount could not be expressed.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<MoneyError> for StripeError {
    fn from(err: MoneyError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// A created payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: SecretString,
    api_base: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
        })
    }

    /// Create an automatically captured payment intent for `amount`.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` with Stripe's message when the request is
    /// refused, `StripeError::Http` on transport failure.
    #[tracing::instrument(skip(self), fields(currency = %currency))]
    pub async fn create_payment_intent(
        &self,
        amount: Money,
        currency: CurrencyCode,
    ) -> Result<PaymentIntent, StripeError> {
        let minor = amount.to_minor_units(currency)?.to_string();
        let currency = currency.code().to_ascii_lowercase();
        let url = format!("{}/v1/payment_intents", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&[
                ("amount", minor.as_str()),
                ("currency", currency.as_str()),
                ("automatic_payment_methods[enabled]", "true"),
                ("capture_method", "automatic"),
            ])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))?;

        tracing::info!(payment_intent_id = %intent.id, "Created payment intent");
        Ok(intent)
    }
}

/// Extract `error.message` from a Stripe error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| "Payment provider returned an error".to_string())
}
