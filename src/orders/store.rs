use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::orders::types::{meta_keys, Order};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// Order persistence boundary.
///
/// The commerce platform owns order storage; this trait is the slice of it
/// the callback path needs. `save` replaces the whole order record, and the
/// backing store is assumed to serialize concurrent writes to the same order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<Order>, StoreError>;

    /// Exact lookup on the platform order number recorded at initiation.
    async fn find_by_provider_order_no(
        &self,
        provider_order_no: &str,
    ) -> Result<Option<Order>, StoreError>;

    /// Most recent orders whose payment method belongs to the given family,
    /// newest first, capped at `limit`.
    async fn recent_by_method_family(
        &self,
        method_prefix: &str,
        limit: usize,
    ) -> Result<Vec<Order>, StoreError>;

    async fn save(&self, order: Order) -> Result<(), StoreError>;
}

/// In-memory store used by the binary and the test suite.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<u64, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_provider_order_no(
        &self,
        provider_order_no: &str,
    ) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|order| order.meta(meta_keys::PROVIDER_ORDER_NO) == Some(provider_order_no))
            .cloned())
    }

    async fn recent_by_method_family(
        &self,
        method_prefix: &str,
        limit: usize,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| order.payment_method.starts_with(method_prefix))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn save(&self, mut order: Order) -> Result<(), StoreError> {
        order.updated_at = Utc::now();
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }
}
