//! Session settings and rate title commands.

use directpay_checkout::models::{SessionSettings, ShippingMethodSettings};
use directpay_checkout::services::catalog;

use super::{CliError, settings_store};

pub async fn show_session_settings() -> Result<(), CliError> {
    let store = settings_store().await?;
    let settings = catalog::session_settings(&store).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("enabled: {}", settings.enabled);
        println!("duration_hours: {}", settings.duration_hours);
    }
    Ok(())
}

/// Validate and store new session settings.
pub async fn set_session_settings(enabled: bool, duration_hours: i64) -> Result<(), CliError> {
    let settings = SessionSettings::new(enabled, duration_hours).map_err(CliError::Invalid)?;
    let store = settings_store().await?;
    catalog::set_session_settings(&store, settings).await?;
    Ok(())
}

pub async fn show_rate_title() -> Result<(), CliError> {
    let store = settings_store().await?;
    let method = catalog::shipping_method(&store).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", method.title);
    }
    Ok(())
}

pub async fn set_rate_title(title: String) -> Result<(), CliError> {
    let title = title.trim().to_owned();
    if title.is_empty() {
        return Err(CliError::Invalid("title must not be empty".to_string()));
    }

    let store = settings_store().await?;
    catalog::set_shipping_method(&store, &ShippingMethodSettings { title }).await?;
    tracing::info!("Rate title updated");
    Ok(())
}
