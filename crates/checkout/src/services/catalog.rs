//! Admin-managed shipping configuration.
//!
//! Pickup locations, pricing tables, the rate title and the session settings
//! are plain JSON values in the [`SettingsStore`]. There is no relational
//! integrity between them: removing a location leaves its country's pricing
//! in place.

use chrono::{DateTime, Utc};

use directpay_core::{CountryCode, Money, ShippingProvider};

use crate::db::{RepositoryError, SettingsStore};
use crate::models::settings::keys;
use crate::models::{
    CheckoutLocation, PickupLocation, PricingRule, PricingTable, ProviderPricing, SessionSettings,
    ShippingMethodSettings,
};

/// A validated pickup location to add.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: CountryCode,
}

/// Location id in the `loc_` + 13 hex digits form used by listings.
fn generate_location_id() -> String {
    let bits = rand::random::<u64>() >> 12;
    format!("loc_{bits:013x}")
}

/// Pickup locations configured for `provider`.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read fails or the stored value is malformed.
pub async fn locations(
    settings: &SettingsStore,
    provider: ShippingProvider,
) -> Result<Vec<PickupLocation>, RepositoryError> {
    settings.load(keys::locations(provider)).await
}

/// Append a pickup location.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read or write fails.
pub async fn add_location(
    settings: &SettingsStore,
    provider: ShippingProvider,
    new: NewLocation,
    now: DateTime<Utc>,
) -> Result<PickupLocation, RepositoryError> {
    let mut list = locations(settings, provider).await?;
    let location = PickupLocation {
        id: generate_location_id(),
        name: new.name,
        address: new.address,
        city: new.city,
        postal_code: new.postal_code,
        country: new.country,
        created_at: now,
    };
    list.push(location.clone());
    settings.store(keys::locations(provider), &list).await?;

    tracing::info!(
        provider = provider.slug(),
        location_id = %location.id,
        "Added pickup location"
    );
    Ok(location)
}

/// Remove a pickup location. Returns whether one was removed.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read or write fails.
pub async fn remove_location(
    settings: &SettingsStore,
    provider: ShippingProvider,
    id: &str,
) -> Result<bool, RepositoryError> {
    let mut list = locations(settings, provider).await?;
    let before = list.len();
    list.retain(|l| l.id != id);
    let removed = list.len() != before;
    settings.store(keys::locations(provider), &list).await?;

    if removed {
        tracing::info!(provider = provider.slug(), location_id = id, "Removed pickup location");
    }
    Ok(removed)
}

/// Locations for the checkout page, with prices for their country.
///
/// # Errors
///
/// Returns `RepositoryError` if a settings read fails.
pub async fn checkout_locations(
    settings: &SettingsStore,
    provider: ShippingProvider,
    country: Option<&CountryCode>,
) -> Result<Vec<CheckoutLocation>, RepositoryError> {
    let table = pricing_table(settings, provider).await?;
    let list = locations(settings, provider).await?;

    Ok(list
        .iter()
        .filter(|l| country.is_none_or(|c| &l.country == c))
        .map(|l| CheckoutLocation::new(l, table.get(&l.country)))
        .collect())
}

/// Pricing table for one provider.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read fails or the stored value is malformed.
pub async fn pricing_table(
    settings: &SettingsStore,
    provider: ShippingProvider,
) -> Result<PricingTable, RepositoryError> {
    settings.load(keys::pricing(provider)).await
}

/// Pricing tables for every provider.
///
/// # Errors
///
/// Returns `RepositoryError` if a settings read fails.
pub async fn pricing(settings: &SettingsStore) -> Result<ProviderPricing, RepositoryError> {
    let mut pricing = ProviderPricing::default();
    for provider in ShippingProvider::ALL {
        pricing
            .tables
            .insert(provider, pricing_table(settings, provider).await?);
    }
    Ok(pricing)
}

/// Insert or replace the rule for `country`.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read or write fails.
pub async fn set_pricing(
    settings: &SettingsStore,
    provider: ShippingProvider,
    country: CountryCode,
    express: Money,
    normal: Money,
    now: DateTime<Utc>,
) -> Result<PricingRule, RepositoryError> {
    let mut table = pricing_table(settings, provider).await?;
    let rule = PricingRule {
        express,
        normal,
        updated_at: now,
    };
    table.insert(country.clone(), rule.clone());
    settings.store(keys::pricing(provider), &table).await?;

    tracing::info!(
        provider = provider.slug(),
        country = %country,
        express = %express,
        normal = %normal,
        "Updated pricing rule"
    );
    Ok(rule)
}

/// Remove the rule for `country`. Returns whether one was removed.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read or write fails.
pub async fn remove_pricing(
    settings: &SettingsStore,
    provider: ShippingProvider,
    country: &CountryCode,
) -> Result<bool, RepositoryError> {
    let mut table = pricing_table(settings, provider).await?;
    let removed = table.remove(country).is_some();
    settings.store(keys::pricing(provider), &table).await?;
    Ok(removed)
}

/// Title used in rate labels.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read fails.
pub async fn shipping_method(
    settings: &SettingsStore,
) -> Result<ShippingMethodSettings, RepositoryError> {
    let method: ShippingMethodSettings = settings.load(keys::SHIPPING_METHOD).await?;
    if method.title.trim().is_empty() {
        return Ok(ShippingMethodSettings::default());
    }
    Ok(method)
}

/// # Errors
///
/// Returns `RepositoryError` if the settings write fails.
pub async fn set_shipping_method(
    settings: &SettingsStore,
    method: &ShippingMethodSettings,
) -> Result<(), RepositoryError> {
    settings.store(keys::SHIPPING_METHOD, method).await
}

/// Current session settings, defaulting to enabled for 5 hours.
///
/// # Errors
///
/// Returns `RepositoryError` if the settings read fails.
pub async fn session_settings(settings: &SettingsStore) -> Result<SessionSettings, RepositoryError> {
    settings.load(keys::SESSION_SETTINGS).await
}

/// # Errors
///
/// Returns `RepositoryError` if the settings write fails.
pub async fn set_session_settings(
    settings: &SettingsStore,
    value: SessionSettings,
) -> Result<(), RepositoryError> {
    settings.store(keys::SESSION_SETTINGS, &value).await?;
    tracing::info!(
        enabled = value.enabled,
        duration_hours = value.duration_hours,
        "Updated shipping session settings"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::Stores;

    fn new_location(name: &str, country: &str) -> NewLocation {
        NewLocation {
            name: name.to_owned(),
            address: "1 rue de la Paix".to_owned(),
            city: "Paris".to_owned(),
            postal_code: "75002".to_owned(),
            country: CountryCode::parse(country).unwrap(),
        }
    }

    #[test]
    fn test_location_id_shape() {
        let id = generate_location_id();
        assert_eq!(id.len(), 4 + 13);
        assert!(id.starts_with("loc_"));
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_add_and_remove_location() {
        let settings = Stores::in_memory().settings;
        let provider = ShippingProvider::Chronopost;
        let added = add_location(&settings, provider, new_location("A", "FR"), Utc::now())
            .await
            .unwrap();

        assert_eq!(locations(&settings, provider).await.unwrap(), vec![added.clone()]);
        assert!(locations(&settings, ShippingProvider::MondialRelay)
            .await
            .unwrap()
            .is_empty());

        assert!(remove_location(&settings, provider, &added.id).await.unwrap());
        assert!(!remove_location(&settings, provider, &added.id).await.unwrap());
        assert!(locations(&settings, provider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_locations_carry_country_prices() {
        let settings = Stores::in_memory().settings;
        let provider = ShippingProvider::MondialRelay;
        let now = Utc::now();
        add_location(&settings, provider, new_location("Paris", "FR"), now)
            .await
            .unwrap();
        add_location(&settings, provider, new_location("Bruxelles", "BE"), now)
            .await
            .unwrap();
        set_pricing(
            &settings,
            provider,
            CountryCode::france(),
            "9.90".parse().unwrap(),
            "4.90".parse().unwrap(),
            now,
        )
        .await
        .unwrap();

        let all = checkout_locations(&settings, provider, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let fr = checkout_locations(&settings, provider, Some(&CountryCode::france()))
            .await
            .unwrap();
        assert_eq!(fr.len(), 1);
        assert_eq!(fr[0].normal_price, "4.90".parse().unwrap());

        let be = CountryCode::parse("BE").unwrap();
        let be = checkout_locations(&settings, provider, Some(&be)).await.unwrap();
        assert_eq!(be[0].express_price, Money::ZERO);
    }

    #[tokio::test]
    async fn test_pricing_upsert_and_remove() {
        let settings = Stores::in_memory().settings;
        let provider = ShippingProvider::Chronopost;
        let now = Utc::now();
        for normal in ["10", "12"] {
            set_pricing(
                &settings,
                provider,
                CountryCode::france(),
                Money::ZERO,
                normal.parse().unwrap(),
                now,
            )
            .await
            .unwrap();
        }

        let all = pricing(&settings).await.unwrap();
        let rule = all.rule(provider, &CountryCode::france()).unwrap();
        assert_eq!(rule.normal, "12".parse().unwrap());

        assert!(remove_pricing(&settings, provider, &CountryCode::france()).await.unwrap());
        assert!(pricing_table(&settings, provider).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_title_falls_back_to_default() {
        let settings = Stores::in_memory().settings;
        set_shipping_method(
            &settings,
            &ShippingMethodSettings {
                title: "  ".to_owned(),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            shipping_method(&settings).await.unwrap(),
            ShippingMethodSettings::default()
        );
    }
}
