//! Order persistence.
//!
//! The full order is stored as JSON in `directpay.orders.data`; `status` and
//! `reference` are duplicated into columns for filtering.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use directpay_core::{CurrencyCode, OrderId};

use super::RepositoryError;
use super::memory::MemoryOrders;
use crate::models::Order;
use crate::models::order::meta;

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending order and return it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn create(
        &self,
        currency: CurrencyCode,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO directpay.orders (order_key, status, reference, data, created_at)
            VALUES ('', 'pending', '', '{}'::jsonb, $1)
            RETURNING id
            ",
        )
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        let order = Order::new(OrderId::new(id), currency, now);
        self.save(&order).await?;
        Ok(order)
    }

    /// Write the order's current state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE directpay.orders
            SET order_key = $2, status = $3, reference = $4, data = $5, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(order.id)
        .bind(&order.order_key)
        .bind(order.status.as_str())
        .bind(order.reference().unwrap_or_default())
        .bind(Json(order))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<Json<Order>> =
            sqlx::query_scalar("SELECT data FROM directpay.orders WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|Json(order)| order))
    }

    /// Whether any order already carries this payment reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM directpay.orders WHERE reference = $1)",
        )
        .bind(reference)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<Json<Order>> = sqlx::query_scalar(
            "SELECT data FROM directpay.orders ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }

    /// Ids of orders attached to a shipping session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ids_for_session(&self, session_id: &str) -> Result<Vec<OrderId>, RepositoryError> {
        let ids: Vec<OrderId> = sqlx::query_scalar(
            "SELECT id FROM directpay.orders WHERE data -> 'meta' ->> $2 = $1 ORDER BY id",
        )
        .bind(session_id)
        .bind(meta::SESSION_ID)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}

/// Order store selected at startup.
#[derive(Clone)]
pub enum OrderStore {
    Postgres(PgPool),
    Memory(Arc<MemoryOrders>),
}

impl OrderStore {
    /// Create a pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database write fails.
    pub async fn create(
        &self,
        currency: CurrencyCode,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).create(currency, now).await,
            Self::Memory(store) => Ok(store.create(currency, now).await),
        }
    }

    /// Persist an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database write fails.
    pub async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).save(order).await,
            Self::Memory(store) => {
                store.save(order).await;
                Ok(())
            }
        }
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).get(id).await,
            Self::Memory(store) => Ok(store.get(id).await),
        }
    }

    /// Whether a payment reference has been used.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).reference_exists(reference).await,
            Self::Memory(store) => Ok(store.reference_exists(reference).await),
        }
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn list_recent(&self) -> Result<Vec<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).list_recent().await,
            Self::Memory(store) => Ok(store.list_recent().await),
        }
    }

    /// Ids of orders attached to a shipping session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn ids_for_session(&self, session_id: &str) -> Result<Vec<OrderId>, RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).ids_for_session(session_id).await,
            Self::Memory(store) => Ok(store.ids_for_session(session_id).await),
        }
    }
}
