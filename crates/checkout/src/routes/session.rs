//! Customer-facing shipping session handlers.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use directpay_core::{Money, OrderId, SessionToken};

use crate::error::Result;
use crate::middleware::{CookieUpdate, ShippingSession};
use crate::models::ActiveSession;
use crate::state::AppState;

/// Body of `GET /shipping-session/status`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SessionStatus {
    Active {
        active: bool,
        session_id: SessionToken,
        first_order_id: OrderId,
        order_count: u32,
        remaining_seconds: i64,
        remaining_formatted: String,
        total_saved: Money,
    },
    Inactive {
        active: bool,
        message: &'static str,
    },
}

impl From<Option<&ActiveSession>> for SessionStatus {
    fn from(session: Option<&ActiveSession>) -> Self {
        match session {
            Some(session) => Self::Active {
                active: true,
                session_id: session.token.clone(),
                first_order_id: session.record.first_order_id,
                order_count: session.record.order_count,
                remaining_seconds: session.remaining_seconds(),
                remaining_formatted: session.remaining_formatted(),
                total_saved: session.record.total_saved,
            },
            None => Self::Inactive {
                active: false,
                message: "No active shipping session",
            },
        }
    }
}

/// Report the caller's session. Read-only apart from dropping a stale cookie.
#[instrument(skip_all)]
pub async fn status(
    State(state): State<AppState>,
    session: ShippingSession,
) -> Result<impl IntoResponse> {
    let cookie = CookieUpdate::clear_if_stale(&session, state.config().secure_cookies());
    Ok((cookie, Json(SessionStatus::from(session.active.as_ref()))))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: &'static str,
}

/// End the caller's session and drop the cookie.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: ShippingSession,
) -> Result<impl IntoResponse> {
    let secure = state.config().secure_cookies();
    let Some(token) = &session.token else {
        return Ok((
            CookieUpdate::Keep,
            Json(ClearResponse {
                success: false,
                message: "No active session to clear",
            }),
        ));
    };

    let ended = state
        .sessions()
        .end(token, session.now, session.settings.duration())
        .await;
    let message = if ended {
        tracing::info!(session_id = %token, "Customer cleared shipping session");
        "Session cleared successfully"
    } else {
        "No active session to clear"
    };

    Ok((
        CookieUpdate::clear(secure),
        Json(ClearResponse {
            success: ended,
            message,
        }),
    ))
}
