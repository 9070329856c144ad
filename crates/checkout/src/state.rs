//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};

use crate::config::CheckoutConfig;
use crate::db::{OrderStore, SettingsStore, Stores};
use crate::services::gateways::Gateways;
use crate::services::sessions::SessionStore;
use crate::services::stripe::{StripeClient, StripeError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the stores, the session cache, the Stripe client and the clock.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    stores: Stores,
    sessions: SessionStore,
    stripe: Option<StripeClient>,
    gateways: Gateways,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AppState {
    /// Create a new application state using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe HTTP client cannot be built.
    pub fn new(config: CheckoutConfig, stores: Stores) -> Result<Self, StripeError> {
        Self::with_clock(config, stores, Arc::new(DefaultClock))
    }

    /// Create a new application state with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe HTTP client cannot be built.
    pub fn with_clock(
        config: CheckoutConfig,
        stores: Stores,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, StripeError> {
        let stripe = config.stripe.as_ref().map(StripeClient::new).transpose()?;
        let sessions = SessionStore::new(config.session_cache_capacity);
        let gateways = Gateways::new(config.gateways.iter().copied());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                sessions,
                stripe,
                gateways,
                clock,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.stores.orders
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.inner.stores.settings
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Stripe client, present when Stripe keys are configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }

    #[must_use]
    pub fn gateways(&self) -> &Gateways {
        &self.inner.gateways
    }

    /// Current time from the configured clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.utc()
    }
}
