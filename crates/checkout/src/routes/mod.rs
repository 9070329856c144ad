//! HTTP route handlers for the checkout API.
//!
//! # Route Structure
//!
//! Everything below is nested under `/directpay/v1`.
//!
//! ```text
//! # Orders
//! POST   /orders                          - Create an order (201, rate limited)
//! POST   /validate-reference              - Reference uniqueness check
//! POST   /process-express-payment         - Create an express checkout order
//!
//! # Shipping
//! GET    /shipping-methods                - Rates for a country, session-discounted
//! POST   /calculate-shipping              - Rates, line items and total
//! GET    /shipping/checkout-locations     - Pickup locations with prices
//!
//! # Payments
//! GET    /payment-methods                 - Enabled gateways
//! POST   /create-payment-intent           - Stripe payment intent (rate limited)
//! GET    /express-checkout-params         - Publishable key, currency, test mode
//!
//! # Shipping session
//! GET    /shipping-session/status         - Caller's session
//! POST   /shipping-session/clear          - End the caller's session
//!
//! # Admin (bearer token)
//! GET    /admin/sessions                  - Active sessions
//! DELETE /admin/sessions/{session_id}     - End a session
//! GET    /admin/session-settings          - Session settings
//! POST   /admin/session-settings          - Update session settings
//! GET    /admin/directpay-orders          - Orders grouped by session and customer
//! GET    /admin/orders/{id}               - Order preview
//! GET    /shipping/locations              - Locations and pricing
//! POST   /shipping/locations              - Add a location (201)
//! DELETE /shipping/locations/{id}         - Remove a location
//! POST   /shipping/pricing                - Upsert country pricing (201)
//! DELETE /shipping/pricing/{country}      - Remove country pricing
//! ```

pub mod admin;
pub mod orders;
pub mod payments;
pub mod session;
pub mod shipping;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::middleware::{checkout_rate_limiter, rate_limit_response};
use crate::state::AppState;

/// Order and payment intent creation, behind the per-IP limiter when one is
/// configured.
fn limited_routes(per_minute: u32) -> Router<AppState> {
    let router = Router::new()
        .route("/orders", post(orders::create))
        .route("/create-payment-intent", post(payments::create_payment_intent));

    match checkout_rate_limiter(per_minute) {
        Some(limiter) => router
            .layer(limiter)
            .layer(middleware::map_response(rate_limit_response)),
        None => router,
    }
}

/// Create the public checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/validate-reference", post(orders::validate_reference))
        .route(
            "/process-express-payment",
            post(orders::process_express_payment),
        )
        .route("/shipping-methods", get(shipping::shipping_methods))
        .route("/calculate-shipping", post(shipping::calculate_shipping))
        .route(
            "/shipping/checkout-locations",
            get(shipping::checkout_locations),
        )
        .route("/payment-methods", get(payments::payment_methods))
        .route(
            "/express-checkout-params",
            get(payments::express_checkout_params),
        )
        .route("/shipping-session/status", get(session::status))
        .route("/shipping-session/clear", post(session::clear))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/sessions", get(admin::list_sessions))
        .route("/admin/sessions/{session_id}", delete(admin::delete_session))
        .route(
            "/admin/session-settings",
            get(admin::get_session_settings).post(admin::update_session_settings),
        )
        .route("/admin/directpay-orders", get(admin::directpay_orders))
        .route("/admin/orders/{id}", get(admin::order_preview))
        .route(
            "/shipping/locations",
            get(shipping::list_locations).post(shipping::add_location),
        )
        .route("/shipping/locations/{id}", delete(shipping::delete_location))
        .route("/shipping/pricing", post(shipping::set_pricing))
        .route("/shipping/pricing/{country}", delete(shipping::delete_pricing))
}

/// Create all routes mounted under `/directpay/v1`.
pub fn routes(rate_limit_per_minute: u32) -> Router<AppState> {
    Router::new()
        .merge(limited_routes(rate_limit_per_minute))
        .merge(checkout_routes())
        .merge(admin_routes())
}
