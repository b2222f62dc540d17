//! Finite transition table from platform order statuses to order mutations.

use tracing::{info, warn};

use crate::events::{PaymentEvent, PaymentEventKind};
use crate::orders::{meta_keys, Order, OrderStatus};
use crate::protocol::types::{epoch_millis_to_rfc3339, minor_to_display};
use crate::protocol::{PaymentData, PaymentStatus};

/// Result of dispatching one callback payload against an order.
#[derive(Debug)]
pub struct StatusOutcome {
    /// Whether the order status or note trail changed.
    pub changed: bool,
    pub event: Option<PaymentEvent>,
}

impl StatusOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            event: None,
        }
    }

    fn changed(event: Option<PaymentEvent>) -> Self {
        Self {
            changed: true,
            event,
        }
    }
}

/// Apply the platform status to the order.
///
/// The idempotency and final-status guards have already run; this function
/// only encodes the per-status transition rules. `message` is the provider's
/// human-readable result message, used as the failure reason.
pub fn apply_status(
    order: &mut Order,
    data: &PaymentData,
    message: &str,
    amount_tolerance_minor: i64,
) -> StatusOutcome {
    match data.status() {
        PaymentStatus::Success => apply_success(order, data, amount_tolerance_minor),
        PaymentStatus::Pending => {
            if order.status == OrderStatus::Pending {
                return StatusOutcome::unchanged();
            }
            order.status = OrderStatus::Pending;
            order.add_note(format!(
                "OnePay reports payment pending (transaction {}).",
                data.order_no
            ));
            StatusOutcome::changed(Some(PaymentEvent {
                order_id: order.id,
                kind: PaymentEventKind::Pending,
            }))
        }
        PaymentStatus::Failed => {
            order.status = OrderStatus::Failed;
            order.add_note(format!(
                "OnePay payment failed (transaction {}): {}",
                data.order_no,
                if message.is_empty() { "no reason given" } else { message }
            ));
            StatusOutcome::changed(Some(PaymentEvent {
                order_id: order.id,
                kind: PaymentEventKind::Failed {
                    reason: message.to_string(),
                },
            }))
        }
        PaymentStatus::Cancelled => {
            order.status = OrderStatus::Cancelled;
            order.add_note(format!(
                "OnePay payment cancelled (transaction {}).",
                data.order_no
            ));
            StatusOutcome::changed(Some(PaymentEvent {
                order_id: order.id,
                kind: PaymentEventKind::Cancelled,
            }))
        }
        PaymentStatus::Wait3d => {
            if matches!(order.status, OrderStatus::Processing | OrderStatus::OnHold) {
                return StatusOutcome::unchanged();
            }
            order.status = OrderStatus::OnHold;
            if let Some(url) = &data.redirect_url {
                order.set_meta(meta_keys::THREE_DS_REDIRECT_URL, url.clone());
            }
            if let Some(flow) = &data.three_ds_flow {
                order.set_meta(meta_keys::THREE_DS_FLOW, flow.clone());
            }
            order.add_note(format!(
                "OnePay payment awaiting 3-D-Secure authentication (transaction {}).",
                data.order_no
            ));
            StatusOutcome::changed(Some(PaymentEvent {
                order_id: order.id,
                kind: PaymentEventKind::AwaitingAuthentication {
                    redirect_url: data.redirect_url.clone(),
                },
            }))
        }
        PaymentStatus::Unrecognized(raw) => {
            warn!(
                order_id = order.id,
                status = %raw,
                "unrecognized OnePay order status, order left untouched"
            );
            order.add_note(format!(
                "OnePay sent unrecognized order status \"{}\" (transaction {}); order status not changed.",
                raw, data.order_no
            ));
            StatusOutcome::changed(Some(PaymentEvent {
                order_id: order.id,
                kind: PaymentEventKind::Unrecognized { raw_status: raw },
            }))
        }
    }
}

fn apply_success(
    order: &mut Order,
    data: &PaymentData,
    amount_tolerance_minor: i64,
) -> StatusOutcome {
    if matches!(order.status, OrderStatus::Processing | OrderStatus::Completed) {
        info!(
            order_id = order.id,
            status = %order.status,
            "success callback for an already-processed order, no-op"
        );
        return StatusOutcome::unchanged();
    }

    if let Some(paid) = data.paid_amount {
        // abs_diff: the wire controls `paid`, so the difference must not
        // overflow i64.
        if paid.abs_diff(order.total_minor) > amount_tolerance_minor.unsigned_abs() {
            warn!(
                order_id = order.id,
                paid_minor = paid,
                expected_minor = order.total_minor,
                "paid amount differs from order total"
            );
            order.add_note(format!(
                "OnePay paid amount {} differs from order total {}; review before fulfilment.",
                minor_to_display(paid),
                minor_to_display(order.total_minor)
            ));
        }
        order.set_meta(meta_keys::PAID_AMOUNT, paid.to_string());
    }

    order.transaction_id = Some(data.order_no.clone());
    order.status = OrderStatus::Processing;
    order.add_note(format!(
        "OnePay payment completed (transaction {}).",
        data.order_no
    ));
    StatusOutcome::changed(Some(PaymentEvent {
        order_id: order.id,
        kind: PaymentEventKind::Completed {
            transaction_id: data.order_no.clone(),
        },
    }))
}

/// Persist the audit trail for an applied callback: raw payload, fingerprint
/// and the provider-specific fields.
pub fn record_callback_meta(order: &mut Order, data: &PaymentData, fingerprint: &str, raw_result: &str) {
    order.set_meta(meta_keys::PROVIDER_ORDER_NO, data.order_no.clone());
    order.set_meta(meta_keys::CALLBACK_FINGERPRINT, fingerprint);
    order.set_meta(meta_keys::CALLBACK_PAYLOAD, raw_result);
    order.set_meta(
        meta_keys::CALLBACK_APPLIED_AT,
        chrono::Utc::now().to_rfc3339(),
    );
    if let Some(fee) = data.fee {
        order.set_meta(meta_keys::FEE, fee.to_string());
    }
    if let Some(currency) = &data.currency {
        order.set_meta(meta_keys::CURRENCY, currency.clone());
    }
    if let Some(pay_model) = &data.pay_model {
        order.set_meta(meta_keys::PAY_MODEL, pay_model.clone());
    }
    if let Some(rendered) = data.order_time.and_then(epoch_millis_to_rfc3339) {
        order.set_meta(meta_keys::ORDER_TIME, rendered);
    }
    if let Some(rendered) = data.finish_time.and_then(epoch_millis_to_rfc3339) {
        order.set_meta(meta_keys::FINISH_TIME, rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(status: &str) -> PaymentData {
        PaymentData {
            order_no: "P900".to_string(),
            merchant_order_no: Some("900".to_string()),
            order_status: status.to_string(),
            paid_amount: Some(5000),
            order_amount: Some(5000),
            fee: Some(75),
            currency: Some("USD".to_string()),
            pay_model: Some("direct".to_string()),
            order_time: Some(1756000000000),
            finish_time: Some(1756000005000),
            redirect_url: None,
            three_ds_flow: None,
        }
    }

    fn order() -> Order {
        Order::new(900, "900", 5000, "USD", "onepay")
    }

    #[test]
    fn success_completes_payment() {
        let mut order = order();
        let outcome = apply_status(&mut order, &data("SUCCESS"), "ok", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.transaction_id.as_deref(), Some("P900"));
        assert!(matches!(
            outcome.event,
            Some(PaymentEvent {
                kind: PaymentEventKind::Completed { .. },
                ..
            })
        ));
    }

    #[test]
    fn success_on_processed_order_is_noop() {
        let mut order = order();
        order.status = OrderStatus::Processing;
        let notes_before = order.notes.len();
        let outcome = apply_status(&mut order, &data("SUCCESS"), "ok", 1);
        assert!(!outcome.changed);
        assert_eq!(order.notes.len(), notes_before);
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn amount_mismatch_warns_but_completes() {
        let mut order = order();
        order.total_minor = 4000;
        let outcome = apply_status(&mut order, &data("SUCCESS"), "ok", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order
            .notes
            .iter()
            .any(|n| n.text.contains("differs from order total")));
    }

    #[test]
    fn extreme_paid_amount_completes_without_overflow() {
        let mut order = order();
        let mut payload = data("SUCCESS");
        payload.paid_amount = Some(i64::MIN);

        let outcome = apply_status(&mut order, &payload, "ok", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order
            .notes
            .iter()
            .any(|n| n.text.contains("differs from order total")));
    }

    #[test]
    fn amount_within_tolerance_does_not_warn() {
        let mut order = order();
        order.total_minor = 5001;
        apply_status(&mut order, &data("SUCCESS"), "ok", 1);
        assert!(!order
            .notes
            .iter()
            .any(|n| n.text.contains("differs from order total")));
    }

    #[test]
    fn pending_transitions_once() {
        let mut order = order();
        order.status = OrderStatus::OnHold;
        let outcome = apply_status(&mut order, &data("PENDING"), "", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Pending);

        let outcome = apply_status(&mut order, &data("PENDING"), "", 1);
        assert!(!outcome.changed);
    }

    #[test]
    fn failure_records_reason() {
        let mut order = order();
        let outcome = apply_status(&mut order, &data("FAIL"), "card declined", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Failed);
        assert!(order.notes.iter().any(|n| n.text.contains("card declined")));
        assert!(matches!(
            outcome.event,
            Some(PaymentEvent {
                kind: PaymentEventKind::Failed { .. },
                ..
            })
        ));
    }

    #[test]
    fn cancel_transitions_to_cancelled() {
        let mut order = order();
        let outcome = apply_status(&mut order, &data("CANCEL"), "", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn wait3d_holds_order_and_persists_redirect() {
        let mut order = order();
        let mut payload = data("WAIT3D");
        payload.redirect_url = Some("https://3ds.onepay.example/auth".to_string());
        payload.three_ds_flow = Some("challenge".to_string());

        let outcome = apply_status(&mut order, &payload, "", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::OnHold);
        assert_eq!(
            order.meta(meta_keys::THREE_DS_REDIRECT_URL),
            Some("https://3ds.onepay.example/auth")
        );
        assert_eq!(order.meta(meta_keys::THREE_DS_FLOW), Some("challenge"));
    }

    #[test]
    fn wait3d_on_processing_order_is_noop() {
        let mut order = order();
        order.status = OrderStatus::Processing;
        let outcome = apply_status(&mut order, &data("WAIT3D"), "", 1);
        assert!(!outcome.changed);
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn unrecognized_status_leaves_order_status_alone() {
        let mut order = order();
        let outcome = apply_status(&mut order, &data("SETTLED"), "", 1);
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.notes.iter().any(|n| n.text.contains("SETTLED")));
        assert!(matches!(
            outcome.event,
            Some(PaymentEvent {
                kind: PaymentEventKind::Unrecognized { .. },
                ..
            })
        ));
    }

    #[test]
    fn callback_meta_is_recorded() {
        let mut order = order();
        let payload = data("SUCCESS");
        record_callback_meta(&mut order, &payload, "fp123", r#"{"code":"0000"}"#);
        assert_eq!(order.meta(meta_keys::PROVIDER_ORDER_NO), Some("P900"));
        assert_eq!(order.meta(meta_keys::CALLBACK_FINGERPRINT), Some("fp123"));
        assert_eq!(order.meta(meta_keys::FEE), Some("75"));
        assert_eq!(order.meta(meta_keys::CURRENCY), Some("USD"));
        assert!(order.meta(meta_keys::ORDER_TIME).is_some());
        assert!(order.meta(meta_keys::FINISH_TIME).is_some());
    }
}
