//! Duplicate-delivery and final-status guards.
//!
//! The platform delivers callbacks at-least-once. A deterministic fingerprint
//! over the normalized payment data detects replays, and the final-status
//! guard keeps a stale FAIL/CANCEL from regressing an order that already
//! finished.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::orders::{meta_keys, Order};
use crate::protocol::{PaymentData, PaymentStatus};

/// Deterministic hash of the normalized payment data, independent of wire
/// field ordering.
pub fn fingerprint(data: &PaymentData) -> String {
    let value = serde_json::to_value(data).unwrap_or(Value::Null);
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for key in keys {
                out.push_str(key);
                out.push('=');
                write_canonical(&map[key], out);
                out.push(';');
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for item in items {
                write_canonical(item, out);
                out.push(';');
            }
            out.push(']');
        }
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(s),
    }
}

/// True when this exact payload has already been applied to the order.
pub fn is_duplicate(order: &Order, fingerprint: &str) -> bool {
    order.meta(meta_keys::CALLBACK_FINGERPRINT) == Some(fingerprint)
}

/// True when the order is in a final status and the incoming status may not
/// move it. SUCCESS is allowed through so a late success can still override
/// a cancelled/refunded order; see DESIGN.md for the policy note.
pub fn is_final_and_conflicting(order: &Order, incoming: &PaymentStatus) -> bool {
    order.status.is_final() && *incoming != PaymentStatus::Success
}
