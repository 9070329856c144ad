//! Integration tests for shipping session status, expiry and admin views.

use axum::http::StatusCode;
use chrono::TimeDelta;
use serde_json::json;

use directpay_integration_tests::{TestApp, order_body};

const CHRONOPOST_NORMAL: &str = "directpay_shipping_chronopost_normal";

/// App with Chronopost pricing for France and one order placed; returns the
/// session cookie.
async fn app_with_session() -> (TestApp, String) {
    let app = TestApp::new();
    app.set_pricing("chronopost", "FR", "0", "15").await;
    let response = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-1", "25", Some(CHRONOPOST_NORMAL)),
            None,
        )
        .await;
    let cookie = response.session_cookie().expect("session cookie set");
    (app, cookie)
}

#[tokio::test]
async fn test_status_without_cookie() {
    let app = TestApp::new();
    let response = app.get("/directpay/v1/shipping-session/status", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["active"], false);
    assert_eq!(response.body["message"], "No active shipping session");
    assert!(response.session_set_cookie().is_none());
}

#[tokio::test]
async fn test_status_is_read_only() {
    let (app, cookie) = app_with_session().await;

    let first = app
        .get("/directpay/v1/shipping-session/status", Some(&cookie))
        .await;
    app.clock.advance(TimeDelta::minutes(10));
    let second = app
        .get("/directpay/v1/shipping-session/status", Some(&cookie))
        .await;

    assert_eq!(first.body["order_count"], 1);
    assert_eq!(second.body["order_count"], 1);
    let before = first.body["remaining_seconds"].as_i64().unwrap_or_default();
    let after = second.body["remaining_seconds"].as_i64().unwrap_or_default();
    assert_eq!(before, 5 * 3600);
    assert!(after <= before);
    assert_eq!(after, 5 * 3600 - 600);
    assert_eq!(second.body["remaining_formatted"], "4 hours 50 minutes");
}

#[tokio::test]
async fn test_session_expires_at_duration() {
    let (app, cookie) = app_with_session().await;

    app.clock.advance(TimeDelta::hours(5) - TimeDelta::seconds(1));
    let still_active = app
        .get("/directpay/v1/shipping-session/status", Some(&cookie))
        .await;
    assert_eq!(still_active.body["active"], true);
    assert_eq!(still_active.body["remaining_seconds"], 1);

    app.clock.advance(TimeDelta::seconds(1));
    let expired = app
        .get("/directpay/v1/shipping-session/status", Some(&cookie))
        .await;
    assert_eq!(expired.body["active"], false);
    let removal = expired.session_set_cookie().expect("stale cookie cleared");
    assert!(removal.contains("Max-Age=0"));

    // Next order pays shipping again and opens a new session.
    let order = app
        .post(
            "/directpay/v1/orders",
            &order_body("INV-2", "25", Some(CHRONOPOST_NORMAL)),
            Some(&cookie),
        )
        .await;
    assert_eq!(order.body["shipping_total"], json!(15.0));
    assert_eq!(order.body["shipping_session"]["status"], "started");
    let new_cookie = order.session_cookie().expect("new session cookie");
    assert_ne!(new_cookie, cookie);
}

#[tokio::test]
async fn test_customer_clears_session() {
    let (app, cookie) = app_with_session().await;

    let cleared = app
        .post("/directpay/v1/shipping-session/clear", &json!({}), Some(&cookie))
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.body["success"], true);
    assert_eq!(cleared.body["message"], "Session cleared successfully");
    assert!(cleared.session_set_cookie().is_some());

    let again = app
        .post("/directpay/v1/shipping-session/clear", &json!({}), Some(&cookie))
        .await;
    assert_eq!(again.body["success"], false);

    let none = app
        .post("/directpay/v1/shipping-session/clear", &json!({}), None)
        .await;
    assert_eq!(none.body["success"], false);
    assert_eq!(none.body["message"], "No active session to clear");
    assert!(none.session_set_cookie().is_none());
}

#[tokio::test]
async fn test_admin_requires_token() {
    let app = TestApp::new();
    let response = app.get("/directpay/v1/admin/sessions", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "unauthorized");

    let response = app.get("/directpay/v1/shipping/locations", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lists_and_ends_sessions() {
    let (app, _cookie) = app_with_session().await;

    let listed = app.admin_get("/directpay/v1/admin/sessions").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 1);
    let session = &listed.body["sessions"][0];
    assert_eq!(session["customer_name"], "Ana Martin");
    assert_eq!(session["customer_email"], "ana@example.com");
    assert_eq!(session["order_count"], 1);
    assert_eq!(session["order_ids"].as_array().map(Vec::len), Some(1));
    let id = session["session_id"].as_str().unwrap_or_default().to_owned();

    let deleted = app
        .admin_delete(&format!("/directpay/v1/admin/sessions/{id}"))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Session deleted successfully");

    let again = app
        .admin_delete(&format!("/directpay/v1/admin/sessions/{id}"))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["code"], "not_found");
}

#[tokio::test]
async fn test_session_settings_round_trip() {
    let app = TestApp::new();

    let defaults = app.admin_get("/directpay/v1/admin/session-settings").await;
    assert_eq!(defaults.body["enabled"], true);
    assert_eq!(defaults.body["duration_hours"], 5);

    let rejected = app
        .admin_post(
            "/directpay/v1/admin/session-settings",
            &json!({"enabled": true, "duration_hours": 49}),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.body["code"], "invalid_settings");

    let updated = app
        .admin_post(
            "/directpay/v1/admin/session-settings",
            &json!({"enabled": true, "duration_hours": 2}),
        )
        .await;
    assert_eq!(updated.body["message"], "Settings updated successfully");

    let current = app.admin_get("/directpay/v1/admin/session-settings").await;
    assert_eq!(current.body["duration_hours"], 2);
}

#[tokio::test]
async fn test_shorter_duration_applies_to_running_session() {
    let (app, cookie) = app_with_session().await;

    app.clock.advance(TimeDelta::hours(3));
    app.admin_post(
        "/directpay/v1/admin/session-settings",
        &json!({"enabled": true, "duration_hours": 2}),
    )
    .await;

    let status = app
        .get("/directpay/v1/shipping-session/status", Some(&cookie))
        .await;
    assert_eq!(status.body["active"], false);
}
