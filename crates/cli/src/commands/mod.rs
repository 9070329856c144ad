//! Command implementations.
//!
//! Every command connects to the checkout database and works on the same
//! settings store the service reads.

pub mod migrate;
pub mod settings;
pub mod shipping;

use directpay_checkout::db::{self, RepositoryError, SettingsStore};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Value rejected by validation.
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Database URL from `CHECKOUT_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("CHECKOUT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("CHECKOUT_DATABASE_URL"))
}

async fn connect() -> Result<sqlx::PgPool, CliError> {
    let url = database_url()?;
    tracing::info!("Connecting to checkout database...");
    Ok(db::create_pool(&url).await?)
}

/// Settings store backed by the checkout database.
async fn settings_store() -> Result<SettingsStore, CliError> {
    Ok(SettingsStore::Postgres(connect().await?))
}
