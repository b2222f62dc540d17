use serde::Deserialize;
use thiserror::Error;

/// Outer callback envelope as it arrives on the wire.
///
/// `result` is a JSON-encoded string, not a nested object. It must stay
/// byte-identical until signature verification has run: the platform signs
/// the raw string, so re-serializing it would break the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEnvelope {
    pub merchant_no: String,
    pub result: String,
    pub sign: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("empty request body")]
    EmptyBody,
    #[error("malformed envelope JSON: {0}")]
    MalformedJson(String),
    #[error("missing or empty envelope field: {0}")]
    MissingField(&'static str),
    #[error("merchant number mismatch: expected {expected}, received {received}")]
    MerchantMismatch { expected: String, received: String },
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "merchantNo", default)]
    merchant_no: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    sign: Option<String>,
}

/// Parse and validate the outer envelope against the configured merchant.
///
/// The nested `result` string is not decoded here; that happens only after
/// the signature over it has been verified.
pub fn parse_envelope(raw: &str, expected_merchant: &str) -> Result<CallbackEnvelope, EnvelopeError> {
    if raw.trim().is_empty() {
        return Err(EnvelopeError::EmptyBody);
    }

    let raw_envelope: RawEnvelope =
        serde_json::from_str(raw).map_err(|e| EnvelopeError::MalformedJson(e.to_string()))?;

    let merchant_no = require(raw_envelope.merchant_no, "merchantNo")?;
    let result = require(raw_envelope.result, "result")?;
    let sign = require(raw_envelope.sign, "sign")?;

    if merchant_no != expected_merchant {
        return Err(EnvelopeError::MerchantMismatch {
            expected: expected_merchant.to_string(),
            received: merchant_no,
        });
    }

    Ok(CallbackEnvelope {
        merchant_no,
        result,
        sign,
    })
}

fn require(value: Option<String>, field: &'static str) -> Result<String, EnvelopeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(EnvelopeError::MissingField(field)),
    }
}

/// Truncate raw payload content to a safe preview length for logging.
pub fn preview(raw: &str, max_len: usize) -> String {
    if raw.len() <= max_len {
        raw.to_string()
    } else {
        let mut cut = max_len;
        while !raw.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…({} bytes total)", &raw[..cut], raw.len())
    }
}
