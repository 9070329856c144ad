//! HTTP middleware for the checkout API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (`x-request-id` in span, Sentry scope and response)
//! 4. Rate limiting on order and payment intent creation (governor)
//!
//! Admin authentication and the shipping session cookie are extractors
//! rather than layers.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session_cookie;

pub use auth::RequireAdmin;
pub use rate_limit::{checkout_rate_limiter, rate_limit_response};
pub use request_id::request_id_middleware;
pub use session_cookie::{CookieUpdate, ShippingSession};
