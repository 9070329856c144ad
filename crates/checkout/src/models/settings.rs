//! Admin settings stored as JSON values.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Settings store keys.
pub mod keys {
    use directpay_core::ShippingProvider;

    pub const SESSION_SETTINGS: &str = "shipping_session";
    pub const SHIPPING_METHOD: &str = "shipping_method";

    #[must_use]
    pub const fn locations(provider: ShippingProvider) -> &'static str {
        match provider {
            ShippingProvider::Chronopost => "chronopost_locations",
            ShippingProvider::MondialRelay => "mondial_relay_locations",
        }
    }

    #[must_use]
    pub const fn pricing(provider: ShippingProvider) -> &'static str {
        match provider {
            ShippingProvider::Chronopost => "chronopost_pricing",
            ShippingProvider::MondialRelay => "mondial_relay_pricing",
        }
    }
}

/// Free-shipping session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub enabled: bool,
    pub duration_hours: u32,
}

impl SessionSettings {
    pub const DEFAULT_DURATION_HOURS: u32 = 5;
    pub const MIN_DURATION_HOURS: u32 = 1;
    pub const MAX_DURATION_HOURS: u32 = 48;

    /// Validate admin input.
    ///
    /// # Errors
    ///
    /// Returns a message when `duration_hours` is outside `1..=48`.
    pub fn new(enabled: bool, duration_hours: i64) -> Result<Self, String> {
        let range = i64::from(Self::MIN_DURATION_HOURS)..=i64::from(Self::MAX_DURATION_HOURS);
        if !range.contains(&duration_hours) {
            return Err(format!(
                "duration_hours must be between {} and {}",
                Self::MIN_DURATION_HOURS,
                Self::MAX_DURATION_HOURS
            ));
        }
        let duration_hours = u32::try_from(duration_hours).map_err(|e| e.to_string())?;
        Ok(Self {
            enabled,
            duration_hours,
        })
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.duration_hours))
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_hours: Self::DEFAULT_DURATION_HOURS,
        }
    }
}
