//! Order identifiers.
//!
//! Orders are the only entity with a numeric identity; pickup locations and
//! sessions use string identifiers (see [`crate::SessionToken`]).

use core::fmt;
use core::num::ParseIntError;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a stored order, as issued by the order store.
///
/// Serializes as a bare number and parses from a path segment, so admin
/// routes can take it straight from the URL.
///
/// ```
/// use directpay_core::OrderId;
///
/// let id: OrderId = "1042".parse().unwrap();
/// assert_eq!(id.as_i32(), 1042);
/// assert_eq!(id.to_string(), "1042");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
pub struct OrderId(i32);

impl OrderId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrderId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i32> for OrderId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}
