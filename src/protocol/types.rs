use serde::{Deserialize, Serialize};

/// Result code the platform uses for a successful business outcome.
pub const RESULT_CODE_OK: &str = "0000";

/// Decoded form of the envelope's nested `result` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<PaymentData>,
}

impl PaymentResult {
    pub fn is_ok(&self) -> bool {
        self.code == RESULT_CODE_OK
    }
}

/// Payment notification payload carried inside `result.data`.
///
/// All amounts are integer minor currency units (divide by 100 for the
/// display denomination). Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentData {
    /// Platform-assigned transaction identifier, authoritative for matching.
    #[serde(rename = "orderNo")]
    pub order_no: String,
    /// Identifier the merchant sent at payment initiation. May carry a
    /// `_{timestamp}` uniqueness suffix appended by the platform.
    #[serde(rename = "merchantOrderNo", default)]
    pub merchant_order_no: Option<String>,
    #[serde(rename = "orderStatus", default)]
    pub order_status: String,
    #[serde(rename = "paidAmount", default)]
    pub paid_amount: Option<i64>,
    #[serde(rename = "orderAmount", default)]
    pub order_amount: Option<i64>,
    #[serde(default)]
    pub fee: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "payModel", default)]
    pub pay_model: Option<String>,
    #[serde(rename = "orderTime", default)]
    pub order_time: Option<i64>,
    #[serde(rename = "finishTime", default)]
    pub finish_time: Option<i64>,
    /// 3-D-Secure redirect target, present when the payment is on a 3DS hold.
    #[serde(rename = "redirectUrl", default)]
    pub redirect_url: Option<String>,
    #[serde(rename = "threeDSFlow", default)]
    pub three_ds_flow: Option<String>,
}

impl PaymentData {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_wire(&self.order_status)
    }
}

/// Platform order status, closed over the values the wire contract defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
    Cancelled,
    Wait3d,
    Unrecognized(String),
}

impl PaymentStatus {
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "SUCCESS" => PaymentStatus::Success,
            "PENDING" => PaymentStatus::Pending,
            "FAIL" | "FAILED" => PaymentStatus::Failed,
            "CANCEL" => PaymentStatus::Cancelled,
            "WAIT3D" => PaymentStatus::Wait3d,
            other => PaymentStatus::Unrecognized(other.to_string()),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Success => write!(f, "SUCCESS"),
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Failed => write!(f, "FAIL"),
            PaymentStatus::Cancelled => write!(f, "CANCEL"),
            PaymentStatus::Wait3d => write!(f, "WAIT3D"),
            PaymentStatus::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// Plaintext acknowledgement token the platform's retry logic keys on.
/// The response body must be exactly one of these two strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Success,
    Error,
}

impl Ack {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ack::Success => "SUCCESS",
            Ack::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render a minor-unit amount in the display denomination.
pub fn minor_to_display(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Convert an epoch-millisecond timestamp to RFC 3339, when representable.
pub fn epoch_millis_to_rfc3339(millis: i64) -> Option<String> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
}
