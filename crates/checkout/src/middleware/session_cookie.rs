//! Shipping session cookie extractor and `Set-Cookie` helpers.
//!
//! The browser holds the session token in `directpay_shipping_session`; the
//! server-side record lives in the [`SessionStore`](crate::services::sessions::SessionStore).

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponseParts, ResponseParts},
};
use chrono::{DateTime, TimeDelta, Utc};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration as CookieDuration};

use directpay_core::SessionToken;

use crate::error::AppError;
use crate::models::{ActiveSession, SessionSettings};
use crate::services::catalog;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "directpay_shipping_session";

/// The caller's shipping session as seen at the start of the request.
///
/// `active` is only looked up when sessions are enabled.
#[derive(Debug, Clone)]
pub struct ShippingSession {
    /// Token from the cookie, if one was sent and is well-formed.
    pub token: Option<SessionToken>,
    pub active: Option<ActiveSession>,
    pub settings: SessionSettings,
    /// Request time from the application clock.
    pub now: DateTime<Utc>,
}

impl ShippingSession {
    /// A cookie was sent but the session behind it is gone.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.settings.enabled && self.token.is_some() && self.active.is_none()
    }
}

impl FromRequestParts<AppState> for ShippingSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(parts);
        let settings = catalog::session_settings(state.settings()).await?;
        let now = state.now();

        let active = match &token {
            Some(token) if settings.enabled => {
                state
                    .sessions()
                    .active(token, now, settings.duration())
                    .await
            }
            _ => None,
        };

        Ok(Self {
            token,
            active,
            settings,
            now,
        })
    }
}

fn token_from_headers(parts: &Parts) -> Option<SessionToken> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .and_then(|c| SessionToken::parse(c.value()).ok())
}

/// Cookie carrying `token` for `duration`.
#[must_use]
pub fn session_cookie(token: &SessionToken, duration: TimeDelta, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(duration.num_seconds()))
        .build()
}

/// Expired cookie that makes the browser drop the session cookie.
#[must_use]
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

/// `Set-Cookie` change to attach to a response.
#[derive(Debug, Clone, Default)]
pub enum CookieUpdate {
    #[default]
    Keep,
    Set(Cookie<'static>),
}

impl CookieUpdate {
    /// Start sending `token`.
    #[must_use]
    pub fn set(token: &SessionToken, duration: TimeDelta, secure: bool) -> Self {
        Self::Set(session_cookie(token, duration, secure))
    }

    /// Drop the cookie.
    #[must_use]
    pub fn clear(secure: bool) -> Self {
        Self::Set(removal_cookie(secure))
    }

    /// Drop the cookie when it points at a session that no longer exists.
    #[must_use]
    pub fn clear_if_stale(session: &ShippingSession, secure: bool) -> Self {
        if session.is_stale() {
            Self::clear(secure)
        } else {
            Self::Keep
        }
    }
}

impl IntoResponseParts for CookieUpdate {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Self::Set(cookie) = self
            && let Ok(value) = HeaderValue::from_str(&cookie.to_string())
        {
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}
