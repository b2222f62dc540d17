use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata keys persisted on an order by the callback path.
pub mod meta_keys {
    pub const PROVIDER_ORDER_NO: &str = "onepay_order_no";
    pub const CALLBACK_FINGERPRINT: &str = "onepay_callback_fingerprint";
    pub const CALLBACK_PAYLOAD: &str = "onepay_callback_payload";
    pub const CALLBACK_APPLIED_AT: &str = "onepay_callback_applied_at";
    pub const PAID_AMOUNT: &str = "onepay_paid_amount";
    pub const FEE: &str = "onepay_fee";
    pub const CURRENCY: &str = "onepay_currency";
    pub const PAY_MODEL: &str = "onepay_pay_model";
    pub const ORDER_TIME: &str = "onepay_order_time";
    pub const FINISH_TIME: &str = "onepay_finish_time";
    pub const THREE_DS_REDIRECT_URL: &str = "onepay_3ds_redirect_url";
    pub const THREE_DS_FLOW: &str = "onepay_3ds_flow";
}

/// Order lifecycle status owned by the commerce side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    OnHold,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Statuses no payment-driven transition other than SUCCESS may leave.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Refunded | OrderStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable note appended to an order's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderNote {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Locally owned order, as the callback path sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// The merchant-side order number sent to the platform at initiation.
    pub order_number: String,
    pub status: OrderStatus,
    /// Expected total in minor currency units.
    pub total_minor: i64,
    pub currency: String,
    /// Payment method slug, e.g. "onepay" or "onepay_card".
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub meta: HashMap<String, String>,
    pub notes: Vec<OrderNote>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: u64,
        order_number: impl Into<String>,
        total_minor: i64,
        currency: impl Into<String>,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            id,
            order_number: order_number.into(),
            status: OrderStatus::Pending,
            total_minor,
            currency: currency.into(),
            payment_method: payment_method.into(),
            transaction_id: None,
            meta: HashMap::new(),
            notes: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn add_note(&mut self, text: impl Into<String>) {
        self.notes.push(OrderNote {
            text: text.into(),
            created_at: Utc::now(),
        });
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<String>) {
        self.meta.insert(key.to_string(), value.into());
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}
