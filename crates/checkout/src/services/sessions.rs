//! Free-shipping session store.
//!
//! Sessions live in a `moka` cache keyed by [`SessionToken`]. Each entry
//! carries its own TTL so that extending a session can rewrite the entry with
//! the time left in the window anchored at `start_time`. Validity is always
//! decided against the injected clock; the cache TTL only bounds memory.

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use moka::Expiry;
use moka::future::Cache;

use directpay_core::{Money, OrderId, SessionToken};

use crate::models::{ActiveSession, SessionRecord};

/// Cached session plus the TTL it was written with.
#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    ttl: Duration,
}

/// Per-entry expiry driven by [`StoredSession::ttl`].
struct SessionExpiry;

impl Expiry<SessionToken, StoredSession> for SessionExpiry {
    fn expire_after_create(
        &self,
        _key: &SessionToken,
        value: &StoredSession,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &SessionToken,
        value: &StoredSession,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Shipping session cache.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<SessionToken, StoredSession>,
}

impl SessionStore {
    /// Create a store holding at most `capacity` sessions.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .expire_after(SessionExpiry)
            .build();

        Self { cache }
    }

    /// The session for `token` if it is still inside its window.
    ///
    /// A session whose window has closed is removed on lookup.
    pub async fn active(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
        duration: TimeDelta,
    ) -> Option<ActiveSession> {
        let stored = self.cache.get(token).await?;
        let remaining = stored.record.remaining(duration, now);
        if remaining <= TimeDelta::zero() {
            self.cache.invalidate(token).await;
            tracing::debug!(session_id = %token, "Shipping session expired");
            return None;
        }

        Some(ActiveSession {
            token: token.clone(),
            record: stored.record,
            remaining,
        })
    }

    /// Open a session for the customer who placed `first_order_id`.
    pub async fn start(
        &self,
        first_order_id: OrderId,
        customer_identifier: &str,
        now: DateTime<Utc>,
        duration: TimeDelta,
    ) -> SessionToken {
        let token = SessionToken::generate();
        let record = SessionRecord::new(first_order_id, customer_identifier, now);
        let ttl = duration.to_std().unwrap_or_default();
        self.cache
            .insert(token.clone(), StoredSession { record, ttl })
            .await;

        tracing::info!(
            session_id = %token,
            order_id = %first_order_id,
            "Started shipping session"
        );
        token
    }

    /// Count another order against an active session.
    ///
    /// The entry is rewritten with a TTL of `start_time + duration - now`, so
    /// the window stays anchored at the first order. Returns the updated
    /// record, or `None` when the session is absent or has expired.
    pub async fn record_order(
        &self,
        token: &SessionToken,
        order_id: OrderId,
        saved: Money,
        now: DateTime<Utc>,
        duration: TimeDelta,
    ) -> Option<SessionRecord> {
        let active = self.active(token, now, duration).await?;
        let mut record = active.record;
        record.order_count += 1;
        record.total_saved += saved;
        record.last_order_id = Some(order_id);
        record.last_order_time = Some(now);

        let ttl = active.remaining.to_std().unwrap_or_default();
        self.cache
            .insert(
                token.clone(),
                StoredSession {
                    record: record.clone(),
                    ttl,
                },
            )
            .await;

        tracing::info!(
            session_id = %token,
            order_id = %order_id,
            order_count = record.order_count,
            "Extended shipping session"
        );
        Some(record)
    }

    /// End a session. Returns `false` when it was absent or already expired.
    pub async fn end(&self, token: &SessionToken, now: DateTime<Utc>, duration: TimeDelta) -> bool {
        let was_active = self.active(token, now, duration).await.is_some();
        self.cache.invalidate(token).await;
        if was_active {
            tracing::info!(session_id = %token, "Ended shipping session");
        }
        was_active
    }

    /// TTL the entry was last written with.
    pub async fn stored_ttl(&self, token: &SessionToken) -> Option<Duration> {
        self.cache.get(token).await.map(|stored| stored.ttl)
    }

    /// All sessions still inside their window, newest first.
    pub async fn list(&self, now: DateTime<Utc>, duration: TimeDelta) -> Vec<ActiveSession> {
        let mut active = Vec::new();
        let mut expired = Vec::new();
        for (token, stored) in self.cache.iter() {
            let remaining = stored.record.remaining(duration, now);
            if remaining <= TimeDelta::zero() {
                expired.push(token);
            } else {
                active.push(ActiveSession {
                    token: (*token).clone(),
                    record: stored.record,
                    remaining,
                });
            }
        }
        for token in expired {
            self.cache.invalidate(token.as_ref()).await;
        }

        active.sort_by(|a, b| b.record.start_time.cmp(&a.record.start_time));
        active
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn five_hours() -> TimeDelta {
        TimeDelta::hours(5)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_start_then_active() {
        let store = SessionStore::new(100);
        let token = store.start(OrderId::new(1), "a@example.com", t0(), five_hours()).await;

        let active = store.active(&token, t0(), five_hours()).await.unwrap();
        assert_eq!(active.record.order_count, 1);
        assert_eq!(active.record.total_saved, Money::ZERO);
        assert_eq!(active.remaining_seconds(), 5 * 3600);
        assert_eq!(store.stored_ttl(&token).await, Some(Duration::from_secs(5 * 3600)));
    }

    #[tokio::test]
    async fn test_expires_at_duration() {
        let store = SessionStore::new(100);
        let token = store.start(OrderId::new(1), "a@example.com", t0(), five_hours()).await;

        let just_before = t0() + five_hours() - TimeDelta::seconds(1);
        assert!(store.active(&token, just_before, five_hours()).await.is_some());

        assert!(store.active(&token, t0() + five_hours(), five_hours()).await.is_none());
        // Expired entries are dropped on lookup.
        assert!(store.stored_ttl(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_record_order_keeps_window_anchored() {
        let store = SessionStore::new(100);
        let token = store.start(OrderId::new(1), "a@example.com", t0(), five_hours()).await;

        let saved = Money::new(Decimal::new(750, 2)).unwrap();
        let at = t0() + TimeDelta::hours(2);
        let record = store
            .record_order(&token, OrderId::new(2), saved, at, five_hours())
            .await
            .unwrap();

        assert_eq!(record.order_count, 2);
        assert_eq!(record.total_saved, saved);
        assert_eq!(record.last_order_id, Some(OrderId::new(2)));
        assert_eq!(record.start_time, t0());
        assert_eq!(store.stored_ttl(&token).await, Some(Duration::from_secs(3 * 3600)));
    }

    #[tokio::test]
    async fn test_record_order_on_expired_session() {
        let store = SessionStore::new(100);
        let token = store.start(OrderId::new(1), "a@example.com", t0(), five_hours()).await;
        let late = t0() + TimeDelta::hours(6);
        assert!(
            store
                .record_order(&token, OrderId::new(2), Money::ZERO, late, five_hours())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_end_reports_presence() {
        let store = SessionStore::new(100);
        let token = store.start(OrderId::new(1), "a@example.com", t0(), five_hours()).await;

        assert!(store.end(&token, t0(), five_hours()).await);
        assert!(!store.end(&token, t0(), five_hours()).await);
        assert!(!store.end(&SessionToken::generate(), t0(), five_hours()).await);
    }

    #[tokio::test]
    async fn test_list_skips_expired() {
        let store = SessionStore::new(100);
        let old = store.start(OrderId::new(1), "old@example.com", t0(), five_hours()).await;
        let later = t0() + TimeDelta::hours(4);
        let fresh = store.start(OrderId::new(2), "new@example.com", later, five_hours()).await;

        let now = t0() + TimeDelta::hours(5);
        let sessions = store.list(now, five_hours()).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].token, fresh);
        assert!(store.active(&old, now, five_hours()).await.is_none());
    }
}
