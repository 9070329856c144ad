//! Free-shipping session records.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use directpay_core::{Money, OrderId, SessionToken};

/// Server-side state of a shipping session, keyed by its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_time: DateTime<Utc>,
    pub first_order_id: OrderId,
    pub customer_identifier: String,
    pub order_count: u32,
    pub total_saved: Money,
    pub last_order_id: Option<OrderId>,
    pub last_order_time: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Record for a session opened by `first_order_id`.
    #[must_use]
    pub fn new(first_order_id: OrderId, customer_identifier: &str, now: DateTime<Utc>) -> Self {
        Self {
            start_time: now,
            first_order_id,
            customer_identifier: customer_identifier.to_owned(),
            order_count: 1,
            total_saved: Money::ZERO,
            last_order_id: None,
            last_order_time: None,
        }
    }

    /// Time left in a window of `duration` anchored at `start_time`.
    ///
    /// Zero or negative once the window has closed.
    #[must_use]
    pub fn remaining(&self, duration: TimeDelta, now: DateTime<Utc>) -> TimeDelta {
        self.start_time + duration - now
    }
}

/// A session that is still inside its window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub token: SessionToken,
    pub record: SessionRecord,
    pub remaining: TimeDelta,
}

impl ActiveSession {
    #[must_use]
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining.num_seconds().max(0)
    }

    #[must_use]
    pub fn remaining_formatted(&self) -> String {
        format_remaining(self.remaining_seconds())
    }
}

/// `H hours M minutes`, or `M minutes` under an hour.
#[must_use]
pub fn format_remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours} hours {minutes} minutes")
    } else {
        format!("{minutes} minutes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(3 * 3600 + 25 * 60 + 10), "3 hours 25 minutes");
        assert_eq!(format_remaining(59 * 60), "59 minutes");
        assert_eq!(format_remaining(-5), "0 minutes");
    }

    #[test]
    fn test_remaining_is_anchored_to_start() {
        let start = Utc::now();
        let record = SessionRecord::new(OrderId::new(1), "a@example.com", start);
        let remaining = record.remaining(TimeDelta::hours(5), start + TimeDelta::hours(2));
        assert_eq!(remaining, TimeDelta::hours(3));
    }
}
