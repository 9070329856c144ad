//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"code": "...", "message": "...", "data": {"status": N}}`; server errors
//! are captured to Sentry before responding and their details never reach
//! the client.

use axum::extract::{FromRequest, FromRequestParts};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use directpay_core::{CountryCodeError, EmailError, LocaleError};

use crate::db::RepositoryError;
use crate::services::stripe::StripeError;

/// Application-level error type for the checkout.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body or query could not be understood.
    #[error("{0}")]
    InvalidData(String),

    /// A required field was absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidAmount(String),

    #[error("Invalid email address")]
    InvalidEmail(#[from] EmailError),

    #[error("{0}")]
    InvalidLocale(#[from] LocaleError),

    #[error("Invalid or disabled payment method: {0}")]
    InvalidGateway(String),

    #[error("Invalid shipping type: {0}")]
    InvalidType(String),

    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    InvalidCountry(#[from] CountryCodeError),

    #[error("{0}")]
    MissingPrice(String),

    #[error("{0}")]
    InvalidSettings(String),

    #[error("{0}")]
    NotFound(String),

    /// Admin bearer token missing or wrong.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Stripe is not configured")]
    NoStripe,

    #[error("Stripe publishable key is not configured")]
    MissingKey,

    /// The payment provider refused or could not be reached.
    #[error("Payment failed: {0}")]
    PaymentFailed(#[from] StripeError),

    #[error("Too many requests, please try again later")]
    RateLimited,

    /// Persisting a new order failed part-way.
    #[error("Order creation failed: {0}")]
    OrderCreation(#[source] RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidData(_) => "invalid_data",
            Self::MissingField(_) => "missing_field",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidEmail(_) => "invalid_email",
            Self::InvalidLocale(_) => "invalid_locale",
            Self::InvalidGateway(_) => "invalid_gateway",
            Self::InvalidType(_) => "invalid_type",
            Self::InvalidReference(_) => "invalid_reference",
            Self::InvalidCountry(_) => "invalid_country",
            Self::MissingPrice(_) => "missing_price",
            Self::InvalidSettings(_) => "invalid_settings",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::NoStripe => "no_stripe",
            Self::MissingKey => "missing_key",
            Self::PaymentFailed(_) => "payment_failed",
            Self::RateLimited => "rate_limited",
            Self::OrderCreation(_) => "order_creation_failed",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::PaymentFailed(_) => StatusCode::BAD_GATEWAY,
            Self::MissingKey | Self::OrderCreation(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        match self {
            Self::OrderCreation(_) => "Failed to create order".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::PaymentFailed(StripeError::Api { message, .. }) => message.clone(),
            Self::PaymentFailed(_) => "Payment provider unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    const fn should_capture(&self) -> bool {
        matches!(
            self,
            Self::OrderCreation(_)
                | Self::Database(_)
                | Self::Internal(_)
                | Self::MissingKey
                | Self::PaymentFailed(StripeError::Http(_) | StripeError::Parse(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.should_capture() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if let Self::PaymentFailed(err) = &self {
            tracing::warn!(error = %err, "Payment provider rejected request");
        }

        let status = self.status();
        let body = json!({
            "code": self.code(),
            "message": self.public_message(),
            "data": { "status": status.as_u16() },
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidData(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidData(rejection.body_text())
    }
}

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct AmountParams {
        amount: u32,
    }

    fn request_parts(uri: &str) -> axum::http::request::Parts {
        axum::http::Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_app_query_extracts_from_parts() {
        let mut parts = request_parts("/payment-methods?amount=7");
        let AppQuery(params) = AppQuery::<AmountParams>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(params.amount, 7);

        let mut parts = request_parts("/payment-methods?amount=seven");
        let err = AppQuery::<AmountParams>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::InvalidData(_)));
        assert_eq!(err.code(), "invalid_data");
    }

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::MissingField("postalCode");
        assert_eq!(err.to_string(), "Missing required field: postalCode");

        let err = AppError::InvalidLocale(LocaleError("xx_XX".to_string()));
        assert_eq!(err.to_string(), "unsupported locale: xx_XX");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::InvalidAmount("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::NoStripe), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::MissingKey),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(get_status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AppError::PaymentFailed(StripeError::Api {
                status: 402,
                message: "Your card was declined.".to_string(),
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(AppError::InvalidAmount(
            "Amount must be greater than zero".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_amount");
        assert_eq!(body["message"], "Amount must be greater than zero");
        assert_eq!(body["data"]["status"], 400);
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (_, body) = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["code"], "internal_error");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_stripe_api_message_passed_through() {
        let (_, body) = body_json(AppError::PaymentFailed(StripeError::Api {
            status: 402,
            message: "Your card was declined.".to_string(),
        }))
        .await;
        assert_eq!(body["code"], "payment_failed");
        assert_eq!(body["message"], "Your card was declined.");
    }
}
