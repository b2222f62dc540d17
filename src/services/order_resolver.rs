//! Maps platform-side and merchant-side order identifiers to a local order.
//!
//! The callback can race ahead of the outbound request's response, so the
//! provider order number may not be recorded yet; the merchant order number
//! fallback walks a bounded window of recent orders for this provider's
//! payment-method family.

use std::sync::Arc;
use tracing::debug;

use crate::orders::{OrderStore, Order, StoreError};

pub struct OrderResolver {
    store: Arc<dyn OrderStore>,
    /// Payment-method slug prefix identifying this provider's family.
    method_prefix: String,
    /// Upper bound on the fallback search window.
    window: usize,
}

impl OrderResolver {
    pub fn new(store: Arc<dyn OrderStore>, method_prefix: impl Into<String>, window: usize) -> Self {
        Self {
            store,
            method_prefix: method_prefix.into(),
            window,
        }
    }

    pub async fn find_by_provider_order_no(
        &self,
        provider_order_no: &str,
    ) -> Result<Option<Order>, StoreError> {
        self.store.find_by_provider_order_no(provider_order_no).await
    }

    /// Fallback resolution via the merchant order number: direct numeric-ID
    /// lookup, exact order-number match over recent family orders, then a
    /// prefix match tolerating a platform-appended `_{timestamp}` suffix.
    pub async fn find_by_merchant_order_no(
        &self,
        merchant_order_no: &str,
    ) -> Result<Option<Order>, StoreError> {
        let merchant_order_no = merchant_order_no.trim();
        if merchant_order_no.is_empty() {
            return Ok(None);
        }

        if merchant_order_no.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = merchant_order_no.parse::<u64>() {
                if let Some(order) = self.store.find_by_id(id).await? {
                    if order.payment_method.starts_with(&self.method_prefix) {
                        return Ok(Some(order));
                    }
                    debug!(
                        order_id = id,
                        method = %order.payment_method,
                        "numeric match ignored, payment method outside family"
                    );
                }
            }
        }

        let recent = self
            .store
            .recent_by_method_family(&self.method_prefix, self.window)
            .await?;

        if let Some(order) = recent
            .iter()
            .find(|order| order.order_number == merchant_order_no)
        {
            return Ok(Some(order.clone()));
        }

        // Uniqueness suffix tolerance: "{order_number}_{timestamp}".
        let base = merchant_order_no
            .rsplit_once('_')
            .map(|(base, _)| base)
            .unwrap_or(merchant_order_no);
        Ok(recent
            .into_iter()
            .find(|order| {
                order.order_number == base
                    || merchant_order_no
                        .strip_prefix(order.order_number.as_str())
                        .is_some_and(|rest| rest.starts_with('_'))
            }))
    }
}
