//! Integration tests for order creation and the free-shipping session flow.

use std::time::Duration;

use axum::http::StatusCode;
use chrono::TimeDelta;
use serde_json::{Value, json};

use directpay_core::SessionToken;
use directpay_integration_tests::{TestApp, order_body};

const CHRONOPOST_NORMAL: &str = "directpay_shipping_chronopost_normal";

fn cookie_token(cookie: &str) -> SessionToken {
    let value = cookie.split_once('=').map(|(_, v)| v).unwrap_or_default();
    SessionToken::parse(value).expect("cookie carries a session token")
}

#[tokio::test]
async fn test_zero_amount_rejected_without_persisting() {
    let app = TestApp::new();

    let response = app
        .post("/directpay/v1/orders", &order_body("INV-0", "0", None), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "invalid_amount");
    assert_eq!(response.body["data"]["status"], 400);

    let orders = app.admin_get("/directpay/v1/admin/directpay-orders").await;
    assert_eq!(orders.status, StatusCode::OK);
    assert_eq!(orders.body["total_orders"], 0);
}

#[tokio::test]
async fn test_validation_reports_first_failure() {
    let app = TestApp::new();

    let mut body = order_body("", "25", None);
    let response = app.post("/directpay/v1/orders", &body, None).await;
    assert_eq!(response.body["code"], "missing_field");

    body = order_body("INV-1", "25", None);
    body["customer"]["email"] = json!("not-an-email");
    let response = app.post("/directpay/v1/orders", &body, None).await;
    assert_eq!(response.body["code"], "invalid_email");

    body = order_body("INV-1", "25", None);
    body["payment_method"] = json!("paypal");
    let response = app.post("/directpay/v1/orders", &body, None).await;
    assert_eq!(response.body["code"], "invalid_gateway");

    body = order_body("INV-1", "25", None);
    body["locale"] = json!("xx_XX");
    let response = app.post("/directpay/v1/orders", &body, None).await;
    assert_eq!(response.body["code"], "invalid_locale");
}

#[tokio::test]
async fn test_first_order_starts_session() {
    let app = TestApp::new();
    app.set_pricing("chronopost", "FR", "0", "15").await;

    let response = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-100", "25", Some(CHRONOPOST_NORMAL)),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["status"], "processing");
    assert_eq!(response.body["payment_method"], "cod");
    assert_eq!(response.body["shipping_total"], json!(15.0));
    assert_eq!(response.body["total"], json!(40.0));
    assert_eq!(response.body["shipping_session"]["status"], "started");
    assert_eq!(response.body["shipping_session"]["duration_hours"], 5);

    let set_cookie = response.session_set_cookie().expect("session cookie set");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=18000"));
}

#[tokio::test]
async fn test_second_order_in_window_ships_free() {
    let app = TestApp::new();
    app.set_pricing("chronopost", "FR", "0", "15").await;

    let first = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-200", "25", Some(CHRONOPOST_NORMAL)),
            None,
        )
        .await;
    let cookie = first.session_cookie().expect("session cookie set");

    app.clock.advance(TimeDelta::hours(2));

    let methods = app
        .get("/directpay/v1/shipping-methods?country=FR", Some(&cookie))
        .await;
    assert_eq!(methods.body[0]["cost"], json!(0.0));
    assert_eq!(methods.body[0]["meta"]["original_cost"], "15.00");

    let second = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-201", "30", Some(CHRONOPOST_NORMAL)),
            Some(&cookie),
        )
        .await;
    assert_eq!(second.status, StatusCode::CREATED, "{:?}", second.body);
    assert_eq!(second.body["shipping_total"], json!(0.0));
    assert_eq!(second.body["total"], json!(30.0));
    assert_eq!(second.body["shipping_session"]["status"], "extended");
    assert_eq!(second.body["shipping_session"]["order_number"], 2);
    assert!(second.session_set_cookie().is_none());

    let status = app
        .get("/directpay/v1/shipping-session/status", Some(&cookie))
        .await;
    assert_eq!(status.body["active"], true);
    assert_eq!(status.body["order_count"], 2);
    assert_eq!(status.body["remaining_seconds"], 3 * 3600);
    assert_eq!(status.body["total_saved"], json!(15.0));

    let token = cookie_token(&cookie);
    let ttl = app.state.sessions().stored_ttl(&token).await;
    assert_eq!(ttl, Some(Duration::from_secs(3 * 3600)));
}

#[tokio::test]
async fn test_order_without_shipping_method_skips_session() {
    let app = TestApp::new();

    let mut body = order_body("INV-300", "12.5", None);
    body["payment_method"] = json!("bacs");
    let response = app.post("/directpay/v1/orders", &body, None).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["total"], json!(12.5));
    assert!(response.body["shipping_session"].is_null());
    assert!(response.session_set_cookie().is_none());
}

#[tokio::test]
async fn test_disabled_sessions_start_nothing() {
    let app = TestApp::new();
    app.set_pricing("chronopost", "FR", "0", "15").await;
    let updated = app
        .admin_post(
            "/directpay/v1/admin/session-settings",
            &json!({"enabled": false, "duration_hours": 5}),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let response = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-400", "25", Some(CHRONOPOST_NORMAL)),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["shipping_total"], json!(15.0));
    assert!(response.body["shipping_session"].is_null());
}

#[tokio::test]
async fn test_reference_validation() {
    let app = TestApp::new();
    app.post("/directpay/v1/orders", &order_body("INV-500", "10", None), None)
        .await;

    let taken = app
        .post(
            "/directpay/v1/validate-reference",
            &json!({"reference": "INV-500"}),
            None,
        )
        .await;
    assert_eq!(taken.body["valid"], false);

    let free = app
        .post(
            "/directpay/v1/validate-reference",
            &json!({"reference": "INV-501"}),
            None,
        )
        .await;
    assert_eq!(free.body["valid"], true);

    let empty = app
        .post("/directpay/v1/validate-reference", &json!({}), None)
        .await;
    assert_eq!(empty.body["code"], "invalid_reference");
}

#[tokio::test]
async fn test_order_preview_shows_pickup_and_session() {
    let app = TestApp::new();
    app.set_pricing("mondial-relay", "FR", "9.90", "0").await;

    let mut body = order_body(
        "INV-600",
        "25",
        Some("directpay_shipping_mondial_relay_express"),
    );
    body["pickup_point"] = json!({
        "id": "MR-42",
        "name": "Relais Centre",
        "address": "3 place du Marché",
        "city": "Lyon",
        "postalCode": "69001",
        "carrier": "mondial_relay"
    });
    let created = app.post("/directpay/v1/orders", &body, None).await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let id = created.body["order_id"].as_i64().expect("numeric order id");

    let preview = app.admin_get(&format!("/directpay/v1/admin/orders/{id}")).await;
    assert_eq!(preview.status, StatusCode::OK);
    assert_eq!(preview.body["reference"], "INV-600");
    assert_eq!(preview.body["pickup"]["carrier"], "Mondial Relay");
    assert_eq!(preview.body["pickup"]["zipcode"], "69001");
    assert_eq!(preview.body["delivery_type"], "Express");
    assert_eq!(preview.body["session"]["active"], true);
    assert_eq!(preview.body["session"]["shipping_paid"], true);

    let missing = app.admin_get("/directpay/v1/admin/orders/99999").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directpay_orders_grouped_by_session() {
    let app = TestApp::new();
    app.set_pricing("chronopost", "FR", "0", "15").await;

    let first = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-700", "25", Some(CHRONOPOST_NORMAL)),
            None,
        )
        .await;
    let cookie = first.session_cookie().expect("session cookie set");
    app.clock.advance(TimeDelta::minutes(30));
    app.post(
        "/directpay/v1/orders",
        &order_body("INV-701", "10", Some(CHRONOPOST_NORMAL)),
        Some(&cookie),
    )
    .await;

    let orders = app.admin_get("/directpay/v1/admin/directpay-orders").await;
    assert_eq!(orders.body["total_orders"], 2);
    let groups = orders.body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(groups.len(), 1);
    let group: &Value = groups.first().expect("one group");
    assert_eq!(group["session_active"], true);
    assert_eq!(group["customer_name"], "Ana Martin");
    assert_eq!(group["orders"][0]["paid_shipping"], true);
    assert_eq!(group["orders"][1]["paid_shipping"], false);
}
