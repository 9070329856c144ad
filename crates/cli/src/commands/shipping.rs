//! Pickup location and pricing commands.

use directpay_checkout::services::catalog::{self, NewLocation};
use directpay_core::{CountryCode, Money, ShippingProvider};

use super::{CliError, settings_store};

/// Print the locations configured for `provider`.
pub async fn list_locations(provider: ShippingProvider) -> Result<(), CliError> {
    let store = settings_store().await?;
    let locations = catalog::locations(&store, provider).await?;

    #[allow(clippy::print_stdout)]
    {
        if locations.is_empty() {
            println!("No {} locations configured", provider.name());
        }
        for l in &locations {
            println!(
                "{}\t{}\t{}, {} {} ({})",
                l.id, l.name, l.address, l.postal_code, l.city, l.country
            );
        }
    }
    Ok(())
}

pub async fn add_location(provider: ShippingProvider, new: NewLocation) -> Result<(), CliError> {
    for (field, value) in [
        ("name", &new.name),
        ("address", &new.address),
        ("city", &new.city),
        ("postal code", &new.postal_code),
    ] {
        if value.trim().is_empty() {
            return Err(CliError::Invalid(format!("{field} must not be empty")));
        }
    }

    let store = settings_store().await?;
    let location = catalog::add_location(&store, provider, new, chrono::Utc::now()).await?;

    tracing::info!("Added {} location {}", provider.name(), location.id);
    Ok(())
}

pub async fn remove_location(provider: ShippingProvider, id: &str) -> Result<(), CliError> {
    let store = settings_store().await?;
    if catalog::remove_location(&store, provider, id).await? {
        tracing::info!("Removed {} location {id}", provider.name());
    } else {
        tracing::warn!("No {} location with id {id}", provider.name());
    }
    Ok(())
}

/// Print the pricing table for `provider`.
pub async fn list_pricing(provider: ShippingProvider) -> Result<(), CliError> {
    let store = settings_store().await?;
    let table = catalog::pricing_table(&store, provider).await?;

    #[allow(clippy::print_stdout)]
    {
        if table.is_empty() {
            println!("No {} pricing configured", provider.name());
        }
        for (country, rule) in &table {
            println!(
                "{country}\texpress {}\tnormal {}",
                rule.express, rule.normal
            );
        }
    }
    Ok(())
}

/// Insert or replace the rule for `country`. At least one price must be set.
pub async fn set_pricing(
    provider: ShippingProvider,
    country: CountryCode,
    express: Money,
    normal: Money,
) -> Result<(), CliError> {
    if express.is_zero() && normal.is_zero() {
        return Err(CliError::Invalid(
            "at least one delivery price must be set".to_string(),
        ));
    }

    let store = settings_store().await?;
    catalog::set_pricing(&store, provider, country.clone(), express, normal, chrono::Utc::now())
        .await?;

    tracing::info!("Set {} pricing for {country}", provider.name());
    Ok(())
}

pub async fn remove_pricing(provider: ShippingProvider, country: &CountryCode) -> Result<(), CliError> {
    let store = settings_store().await?;
    if catalog::remove_pricing(&store, provider, country).await? {
        tracing::info!("Removed {} pricing for {country}", provider.name());
    } else {
        tracing::warn!("No {} pricing for {country}", provider.name());
    }
    Ok(())
}
