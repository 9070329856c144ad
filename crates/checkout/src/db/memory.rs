//! In-memory stores used when no database is configured.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use directpay_core::{CurrencyCode, OrderId};

use crate::models::Order;

/// Orders held in process memory.
#[derive(Debug, Default)]
pub struct MemoryOrders {
    inner: RwLock<OrdersInner>,
}

#[derive(Debug, Default)]
struct OrdersInner {
    last_id: i32,
    orders: BTreeMap<OrderId, Order>,
}

impl MemoryOrders {
    pub async fn create(&self, currency: CurrencyCode, now: DateTime<Utc>) -> Order {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let order = Order::new(OrderId::new(inner.last_id), currency, now);
        inner.orders.insert(order.id, order.clone());
        order
    }

    pub async fn save(&self, order: &Order) {
        self.inner
            .write()
            .await
            .orders
            .insert(order.id, order.clone());
    }

    pub async fn get(&self, id: OrderId) -> Option<Order> {
        self.inner.read().await.orders.get(&id).cloned()
    }

    pub async fn reference_exists(&self, reference: &str) -> bool {
        self.inner
            .read()
            .await
            .orders
            .values()
            .any(|o| o.reference() == Some(reference))
    }

    /// Newest first.
    pub async fn list_recent(&self) -> Vec<Order> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }

    pub async fn ids_for_session(&self, session_id: &str) -> Vec<OrderId> {
        self.inner
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.session_id() == Some(session_id))
            .map(|o| o.id)
            .collect()
    }
}

/// Settings held in process memory.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, JsonValue>>,
}

impl MemorySettings {
    pub async fn get(&self, key: &str) -> Option<JsonValue> {
        self.values.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: JsonValue) {
        self.values.write().await.insert(key.to_owned(), value);
    }

    pub async fn delete(&self, key: &str) {
        self.values.write().await.remove(key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::order::meta;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryOrders::default();
        let a = store.create(CurrencyCode::EUR, Utc::now()).await;
        let b = store.create(CurrencyCode::EUR, Utc::now()).await;
        assert_eq!(a.id, OrderId::new(1));
        assert_eq!(b.id, OrderId::new(2));
        assert_ne!(a.order_key, b.order_key);
    }

    #[tokio::test]
    async fn test_reference_and_session_lookups() {
        let store = MemoryOrders::default();
        let mut order = store.create(CurrencyCode::EUR, Utc::now()).await;
        order.set_meta(meta::REFERENCE, "INV-7");
        order.set_meta(meta::SESSION_ID, "sess_abc");
        store.save(&order).await;

        assert!(store.reference_exists("INV-7").await);
        assert!(!store.reference_exists("INV-8").await);
        assert_eq!(store.ids_for_session("sess_abc").await, vec![order.id]);
    }
}
