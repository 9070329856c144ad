//! Admin route handlers: sessions, session settings and order views.
//!
//! Every handler takes [`RequireAdmin`].

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use directpay_core::{Money, OrderId, SessionToken, ShippingProvider};

use crate::error::{AppError, AppJson, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::{line_meta, meta};
use crate::models::{ActiveSession, Order, SessionSettings};
use crate::services::catalog;
use crate::services::reports::{self, OrderGroup};
use crate::state::AppState;

// =============================================================================
// Sessions
// =============================================================================

/// One session row in the admin listing.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: SessionToken,
    pub customer_name: String,
    pub customer_email: String,
    pub first_order_id: OrderId,
    pub order_count: u32,
    pub order_ids: Vec<OrderId>,
    pub total_saved: Money,
    pub start_time: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub remaining_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionView>,
    pub total: usize,
}

async fn session_view(state: &AppState, session: ActiveSession) -> Result<SessionView> {
    let first_order = state.orders().get(session.record.first_order_id).await?;
    let customer_name = first_order
        .as_ref()
        .map(|o| o.billing.full_name())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown".to_owned());
    let order_ids = state.orders().ids_for_session(session.token.as_str()).await?;

    Ok(SessionView {
        remaining_seconds: session.remaining_seconds(),
        remaining_formatted: session.remaining_formatted(),
        session_id: session.token,
        customer_name,
        customer_email: session.record.customer_identifier,
        first_order_id: session.record.first_order_id,
        order_count: session.record.order_count,
        order_ids,
        total_saved: session.record.total_saved,
        start_time: session.record.start_time,
    })
}

/// List active sessions, newest first.
#[instrument(skip_all)]
pub async fn list_sessions(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<SessionsResponse>> {
    let settings = catalog::session_settings(state.settings()).await?;
    let active = state
        .sessions()
        .list(state.now(), settings.duration())
        .await;

    let mut sessions = Vec::with_capacity(active.len());
    for session in active {
        sessions.push(session_view(&state, session).await?);
    }

    Ok(Json(SessionsResponse {
        success: true,
        total: sessions.len(),
        sessions,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// End a session by id.
#[instrument(skip(state, _admin))]
pub async fn delete_session(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let not_found = || AppError::NotFound("Session not found or already expired".to_string());
    let token = SessionToken::parse(&session_id).map_err(|_| not_found())?;
    let settings = catalog::session_settings(state.settings()).await?;

    if !state
        .sessions()
        .end(&token, state.now(), settings.duration())
        .await
    {
        return Err(not_found());
    }

    tracing::info!(session_id = %token, "Admin ended shipping session");
    Ok(Json(MessageResponse {
        success: true,
        message: "Session deleted successfully",
    }))
}

// =============================================================================
// Session settings
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SessionSettingsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub settings: SessionSettings,
}

#[instrument(skip_all)]
pub async fn get_session_settings(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<SessionSettingsResponse>> {
    let settings = catalog::session_settings(state.settings()).await?;
    Ok(Json(SessionSettingsResponse {
        success: true,
        settings,
    }))
}

/// Body of `POST /admin/session-settings`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSessionSettings {
    pub enabled: Option<bool>,
    pub duration_hours: Option<i64>,
}

impl UpdateSessionSettings {
    fn validate(self) -> Result<SessionSettings> {
        let enabled = self.enabled.ok_or(AppError::MissingField("enabled"))?;
        let hours = self
            .duration_hours
            .ok_or(AppError::MissingField("duration_hours"))?;
        SessionSettings::new(enabled, hours).map_err(AppError::InvalidSettings)
    }
}

#[instrument(skip(state, _admin))]
pub async fn update_session_settings(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<UpdateSessionSettings>,
) -> Result<Json<MessageResponse>> {
    let settings = body.validate()?;
    catalog::set_session_settings(state.settings(), settings).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Settings updated successfully",
    }))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DirectpayOrdersResponse {
    pub success: bool,
    pub data: Vec<OrderGroup>,
    pub total_orders: usize,
}

/// Checkout orders grouped by session, then by customer.
#[instrument(skip_all)]
pub async fn directpay_orders(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<DirectpayOrdersResponse>> {
    let settings = catalog::session_settings(state.settings()).await?;
    let active: HashSet<String> = state
        .sessions()
        .list(state.now(), settings.duration())
        .await
        .into_iter()
        .map(|s| s.token.as_str().to_owned())
        .collect();

    let orders = state.orders().list_recent().await?;
    let data = reports::group_orders(&orders, &active);
    let total_orders = data.iter().map(|g| g.orders.len()).sum();

    Ok(Json(DirectpayOrdersResponse {
        success: true,
        data,
        total_orders,
    }))
}

#[derive(Debug, Default, Serialize)]
pub struct PickupView {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zipcode: String,
    pub carrier: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub order_number: Option<String>,
    pub first_order_id: Option<String>,
    pub shipping_paid: bool,
    pub active: bool,
}

/// Order preview for the admin order list.
#[derive(Debug, Serialize)]
pub struct OrderPreview {
    pub order_id: OrderId,
    pub status: &'static str,
    pub reference: String,
    pub amount: Option<String>,
    pub total: Money,
    pub shipping_total: Money,
    pub payment_method_title: String,
    pub pickup: Option<PickupView>,
    pub delivery_type: String,
    pub session: Option<SessionInfo>,
}

/// Carrier display name; anything but Mondial Relay shows as Chronopost.
fn carrier_label(raw: Option<&str>) -> String {
    match raw.and_then(|c| c.parse::<ShippingProvider>().ok()) {
        Some(ShippingProvider::MondialRelay) => ShippingProvider::MondialRelay.name(),
        _ => ShippingProvider::Chronopost.name(),
    }
    .to_owned()
}

/// Capitalized delivery type of the first shipping line that has one.
fn delivery_type(order: &Order) -> String {
    order
        .shipping_lines
        .iter()
        .find_map(|l| l.meta.get(line_meta::DELIVERY_TYPE))
        .map_or_else(
            || "Normal".to_owned(),
            |t| {
                let mut chars = t.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect()
                })
            },
        )
}

impl OrderPreview {
    fn new(order: &Order, session_active: bool) -> Self {
        let text = |key: &str| order.meta(key).unwrap_or_default().to_owned();
        let pickup = order.meta(meta::PICKUP_NAME).map(|name| PickupView {
            name: name.to_owned(),
            address: text(meta::PICKUP_ADDRESS),
            city: text(meta::PICKUP_CITY),
            zipcode: text(meta::PICKUP_ZIPCODE),
            carrier: carrier_label(order.meta(meta::PICKUP_CARRIER)),
        });
        let session = order.session_id().map(|id| SessionInfo {
            session_id: id.to_owned(),
            order_number: order.meta(meta::SESSION_ORDER_NUMBER).map(str::to_owned),
            first_order_id: order.meta(meta::FIRST_ORDER_ID).map(str::to_owned),
            shipping_paid: order.paid_shipping(),
            active: session_active,
        });

        Self {
            order_id: order.id,
            status: order.status.label(),
            reference: order.reference().unwrap_or_default().to_owned(),
            amount: order.meta(meta::CUSTOM_AMOUNT).map(str::to_owned),
            total: order.total(),
            shipping_total: order.shipping_total(),
            payment_method_title: order.payment_method_title.clone(),
            pickup,
            delivery_type: delivery_type(order),
            session,
        }
    }
}

#[instrument(skip(state, _admin))]
pub async fn order_preview(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<OrderPreview>> {
    let not_found = || AppError::NotFound(format!("Order {id} not found"));
    let order_id: OrderId = id.parse().map_err(|_| not_found())?;
    let order = state.orders().get(order_id).await?.ok_or_else(not_found)?;

    let session_active = match order.session_id().map(SessionToken::parse) {
        Some(Ok(token)) => {
            let settings = catalog::session_settings(state.settings()).await?;
            state
                .sessions()
                .active(&token, state.now(), settings.duration())
                .await
                .is_some()
        }
        _ => false,
    };

    Ok(Json(OrderPreview::new(&order, session_active)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use directpay_core::CurrencyCode;

    use crate::models::ShippingLine;

    #[test]
    fn test_settings_out_of_range_rejected() {
        let body = UpdateSessionSettings {
            enabled: Some(true),
            duration_hours: Some(49),
        };
        assert_eq!(body.validate().unwrap_err().code(), "invalid_settings");

        let body = UpdateSessionSettings {
            enabled: None,
            duration_hours: Some(5),
        };
        assert_eq!(body.validate().unwrap_err().code(), "missing_field");
    }

    #[test]
    fn test_preview_reads_order_meta() {
        let mut order = Order::new(OrderId::new(3), CurrencyCode::EUR, Utc::now());
        order.set_meta(meta::REFERENCE, "INV-1");
        order.set_meta(meta::PICKUP_NAME, "Relais");
        order.set_meta(meta::PICKUP_CARRIER, "mondial_relay");
        order.set_meta(meta::SESSION_ID, "sess_abc");
        order.set_meta(meta::SHIPPING_PAID, "no");
        let mut line_meta_map = BTreeMap::new();
        line_meta_map.insert(line_meta::DELIVERY_TYPE.to_owned(), "express".to_owned());
        order.shipping_lines.push(ShippingLine {
            method_id: "directpay_shipping".to_owned(),
            title: "Relay".to_owned(),
            total: Money::ZERO,
            meta: line_meta_map,
        });

        let preview = OrderPreview::new(&order, true);
        assert_eq!(preview.reference, "INV-1");
        assert_eq!(preview.pickup.unwrap().carrier, "Mondial Relay");
        assert_eq!(preview.delivery_type, "Express");
        let session = preview.session.unwrap();
        assert!(!session.shipping_paid);
        assert!(session.active);
    }

    #[test]
    fn test_preview_defaults() {
        let order = Order::new(OrderId::new(4), CurrencyCode::EUR, Utc::now());
        let preview = OrderPreview::new(&order, false);
        assert!(preview.pickup.is_none());
        assert!(preview.session.is_none());
        assert_eq!(preview.delivery_type, "Normal");
        assert_eq!(carrier_label(None), "Chronopost");
    }
}
