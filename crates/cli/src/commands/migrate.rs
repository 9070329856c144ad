//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! dp-cli migrate
//! ```
//!
//! Migrations live in `crates/checkout/migrations/`.

use super::{CliError, connect};

/// Run checkout database migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running checkout migrations...");
    sqlx::migrate!("../checkout/migrations").run(&pool).await?;

    tracing::info!("Checkout migrations complete!");
    Ok(())
}
