//! Settings database operations.
//!
//! Each setting is a JSON value under a string key (see
//! [`crate::models::settings::keys`]).

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;
use super::memory::MemorySettings;

/// Repository for settings database operations.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a setting value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        let value: Option<JsonValue> =
            sqlx::query_scalar("SELECT value FROM directpay.settings WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;

        Ok(value)
    }

    /// Set a setting value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO directpay.settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM directpay.settings WHERE key = $1")
            .bind(key)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

/// Settings store selected at startup.
#[derive(Clone)]
pub enum SettingsStore {
    Postgres(PgPool),
    Memory(Arc<MemorySettings>),
}

impl SettingsStore {
    /// Raw JSON value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn get(&self, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
        match self {
            Self::Postgres(pool) => SettingsRepository::new(pool).get(key).await,
            Self::Memory(store) => Ok(store.get(key).await),
        }
    }

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database write fails.
    pub async fn set(&self, key: &str, value: JsonValue) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => SettingsRepository::new(pool).set(key, &value).await,
            Self::Memory(store) => {
                store.set(key, value).await;
                Ok(())
            }
        }
    }

    /// Remove `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database write fails.
    pub async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => SettingsRepository::new(pool).delete(key).await,
            Self::Memory(store) => {
                store.delete(key).await;
                Ok(())
            }
        }
    }

    /// Typed value for `key`, or `T::default()` when unset.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Serialization` if the stored value does not
    /// match `T`.
    pub async fn load<T>(&self, key: &str) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned + Default,
    {
        match self.get(key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(T::default()),
        }
    }

    /// Store a typed value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if serialization or the write fails.
    pub async fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), RepositoryError> {
        self.set(key, serde_json::to_value(value)?).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::SessionSettings;
    use crate::models::settings::keys;

    fn memory() -> SettingsStore {
        SettingsStore::Memory(Arc::new(MemorySettings::default()))
    }

    #[tokio::test]
    async fn test_load_defaults_when_unset() {
        let store = memory();
        let settings: SessionSettings = store.load(keys::SESSION_SETTINGS).await.unwrap();
        assert_eq!(settings, SessionSettings::default());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let store = memory();
        let settings = SessionSettings::new(false, 12).unwrap();
        store.store(keys::SESSION_SETTINGS, &settings).await.unwrap();

        let loaded: SessionSettings = store.load(keys::SESSION_SETTINGS).await.unwrap();
        assert_eq!(loaded, settings);

        store.delete(keys::SESSION_SETTINGS).await.unwrap();
        assert!(store.get(keys::SESSION_SETTINGS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_mismatched_value() {
        let store = memory();
        store
            .set(keys::SESSION_SETTINGS, serde_json::json!("not an object"))
            .await
            .unwrap();
        let result: Result<SessionSettings, _> = store.load(keys::SESSION_SETTINGS).await;
        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }
}
