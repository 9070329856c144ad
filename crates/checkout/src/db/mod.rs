//! Persistence for the checkout service.
//!
//! # Tables (schema `directpay`)
//!
//! - `orders` - Orders created by the checkout, with the full record in `data`
//! - `settings` - Admin-managed JSON values (pickup locations, pricing, session settings)
//!
//! Without a database URL the service runs on in-memory stores, which is also
//! what the router tests use.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/checkout/migrations/` and run via:
//! ```bash
//! cargo run -p directpay-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod settings;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use memory::{MemoryOrders, MemorySettings};
pub use orders::{OrderRepository, OrderStore};
pub use settings::{SettingsRepository, SettingsStore};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored JSON value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row does not describe a valid record.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// The pair of stores the service runs on.
#[derive(Clone)]
pub struct Stores {
    pub orders: OrderStore,
    pub settings: SettingsStore,
}

impl Stores {
    /// Stores backed by a `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            orders: OrderStore::Postgres(pool.clone()),
            settings: SettingsStore::Postgres(pool),
        }
    }

    /// Process-local stores; contents are lost on restart.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            orders: OrderStore::Memory(Arc::new(MemoryOrders::default())),
            settings: SettingsStore::Memory(Arc::new(MemorySettings::default())),
        }
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
