//! DirectPay checkout service library.
//!
//! Custom-amount orders, pickup-point shipping rates and free-shipping
//! sessions behind a JSON API. The binary in `main.rs` only loads
//! configuration and serves [`app`]; tests drive the same router with
//! in-memory stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::Request, routing::get};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Path prefix of every API route.
pub const API_PREFIX: &str = "/directpay/v1";

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Build the full application router.
///
/// Layer order, outermost first: Sentry hub and transaction, HTTP trace
/// span, request ID.
pub fn app(state: AppState) -> Router {
    let per_minute = state.config().rate_limit_per_minute;

    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, routes::routes(per_minute))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
