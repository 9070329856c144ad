//! Status and classification enums.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Mirrors the states a storefront order moves through. The checkout only
/// ever assigns `Pending` or `Processing`; the rest are set by back-office
/// tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Slug used in storage and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// Human label, e.g. `On hold`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::OnHold => "On hold",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "on-hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Pickup-point carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingProvider {
    Chronopost,
    MondialRelay,
}

impl ShippingProvider {
    /// All providers, in rate display order.
    pub const ALL: [Self; 2] = [Self::Chronopost, Self::MondialRelay];

    /// Slug used inside rate ids (`chronopost`, `mondial_relay`).
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Chronopost => "chronopost",
            Self::MondialRelay => "mondial_relay",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chronopost => "Chronopost",
            Self::MondialRelay => "Mondial Relay",
        }
    }
}

impl fmt::Display for ShippingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ShippingProvider {
    type Err = String;

    /// Accepts the admin UI's `mondial-relay` spelling as well as the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chronopost" => Ok(Self::Chronopost),
            "mondial-relay" | "mondial_relay" | "mondialrelay" => Ok(Self::MondialRelay),
            other => Err(format!("invalid shipping type: {other}")),
        }
    }
}

/// Delivery speed offered by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverySpeed {
    Express,
    Normal,
}

impl DeliverySpeed {
    /// All speeds, express first.
    pub const ALL: [Self; 2] = [Self::Express, Self::Normal];

    /// Slug used inside rate ids.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Normal => "normal",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Express => "Express",
            Self::Normal => "Normal",
        }
    }
}

impl fmt::Display for DeliverySpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DeliverySpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "express" => Ok(Self::Express),
            "normal" => Ok(Self::Normal),
            other => Err(format!("invalid delivery type: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trip_slugs() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::OnHold,
            OrderStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::OnHold).unwrap(),
            "\"on-hold\""
        );
    }

    #[test]
    fn test_provider_accepts_admin_spelling() {
        assert_eq!(
            "mondial-relay".parse::<ShippingProvider>().unwrap(),
            ShippingProvider::MondialRelay
        );
        assert_eq!(ShippingProvider::MondialRelay.slug(), "mondial_relay");
        assert!("dhl".parse::<ShippingProvider>().is_err());
    }

    #[test]
    fn test_delivery_speed_parse() {
        assert_eq!("Express".parse::<DeliverySpeed>().unwrap(), DeliverySpeed::Express);
        assert!("overnight".parse::<DeliverySpeed>().is_err());
    }
}
