//! Integration tests for the DirectPay checkout service.
//!
//! The tests drive the real router in-process with in-memory stores and a
//! controllable clock, so no database or running server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p directpay-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `orders` - Order creation, validation and the session flow
//! - `shipping` - Rates, calculate-shipping and admin location/pricing
//! - `sessions` - Session status, expiry, clearing and admin views
//! - `payments` - Payment methods and Stripe intents against a local fake

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;
use tower::ServiceExt;

use directpay_checkout::config::CheckoutConfig;
use directpay_checkout::db::Stores;
use directpay_checkout::middleware::session_cookie::SESSION_COOKIE_NAME;
use directpay_checkout::state::AppState;

/// Admin bearer token used by every test app.
pub const ADMIN_TOKEN: &str = "test-admin-token-4f9c2a7e1b3d";

/// Base URL used by every test app; https, so cookies carry `Secure`.
pub const BASE_URL: &str = "https://shop.example.com";

/// Clock the tests move by hand.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// A response with its body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` header for the session cookie, if the response sent one.
    #[must_use]
    pub fn session_set_cookie(&self) -> Option<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
    }

    /// `name=value` pair to send back as a `Cookie` header.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.session_set_cookie()
            .and_then(|c| c.split(';').next())
            .map(str::to_owned)
    }
}

/// The router plus handles on its state and clock.
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<MutableClock>,
    router: Router,
}

/// Start of every test clock: 2026-01-15 10:00:00 UTC.
#[must_use]
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Default test configuration: no Stripe, `cod` and `bacs` gateways.
#[must_use]
pub fn test_config() -> CheckoutConfig {
    CheckoutConfig::with_defaults(BASE_URL, ADMIN_TOKEN)
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn with_config(config: CheckoutConfig) -> Self {
        let clock = Arc::new(MutableClock::new(start_time()));
        let state = AppState::with_clock(config, Stores::in_memory(), clock.clone())
            .expect("Failed to build application state");
        let router = directpay_checkout::app(state.clone());
        Self {
            state,
            clock,
            router,
        }
    }

    /// Send a request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        cookie: Option<&str>,
        admin: bool,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if admin {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, None, cookie, false).await
    }

    pub async fn post(&self, uri: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        self.send(Method::POST, uri, Some(body), cookie, false).await
    }

    pub async fn admin_get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None, true).await
    }

    pub async fn admin_post(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body), None, true).await
    }

    pub async fn admin_delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, None, true).await
    }

    /// Configure pickup pricing for a country through the admin API.
    ///
    /// # Panics
    ///
    /// Panics if the admin API refuses the rule.
    pub async fn set_pricing(&self, kind: &str, country: &str, express: &str, normal: &str) {
        let response = self
            .admin_post(
                "/directpay/v1/shipping/pricing",
                &serde_json::json!({
                    "country": country,
                    "type": kind,
                    "expressPrice": express,
                    "normalPrice": normal,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A valid order body for `reference` and `amount`, shipping with `method`.
#[must_use]
pub fn order_body(reference: &str, amount: &str, method: Option<&str>) -> Value {
    let mut body = serde_json::json!({
        "reference": reference,
        "amount": amount,
        "payment_method": "cod",
        "locale": "fr_FR",
        "customer": {
            "first_name": "Ana",
            "last_name": "Martin",
            "email": "ana@example.com",
            "phone": "0600000000",
            "address_1": "1 rue de Rivoli",
            "city": "Paris",
            "postcode": "75001",
            "country": "FR"
        }
    });
    if let (Some(method), Some(map)) = (method, body.as_object_mut()) {
        map.insert("shipping_method".to_owned(), Value::from(method));
    }
    body
}
