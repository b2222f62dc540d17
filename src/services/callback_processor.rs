//! End-to-end orchestration of one inbound callback request.
//!
//! Stage order: body check, envelope parse, signature verification, result
//! decode, order resolution, idempotency/final-status guards, status
//! dispatch, acknowledgement. Failure at any stage short-circuits; the
//! processor always produces exactly one `SUCCESS`/`ERROR` token and never
//! lets an error escape to the HTTP layer.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::error::CallbackError;
use crate::events::EventBus;
use crate::orders::{Order, OrderStore};
use crate::protocol::envelope::preview;
use crate::protocol::{parse_envelope, signature, Ack, PaymentData, PaymentResult};
use crate::services::idempotency;
use crate::services::order_resolver::OrderResolver;
use crate::services::status_processor;

const LOG_PREVIEW_LEN: usize = 256;

pub struct CallbackProcessor {
    config: GatewayConfig,
    store: Arc<dyn OrderStore>,
    resolver: OrderResolver,
    events: EventBus,
}

impl CallbackProcessor {
    pub fn new(config: GatewayConfig, store: Arc<dyn OrderStore>, events: EventBus) -> Self {
        let resolver = OrderResolver::new(
            store.clone(),
            config.method_prefix.clone(),
            config.resolver_window,
        );
        Self {
            config,
            store,
            resolver,
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Process one raw callback body into an acknowledgement token.
    ///
    /// This is the catch-all boundary: every internal failure is logged here
    /// and collapsed into `ERROR`.
    pub async fn process(&self, raw: &str) -> Ack {
        match self.handle(raw).await {
            Ok(ack) => ack,
            Err(err) => {
                error!(
                    error = %err,
                    body = %redacted_preview(raw),
                    "callback rejected"
                );
                Ack::Error
            }
        }
    }

    async fn handle(&self, raw: &str) -> Result<Ack, CallbackError> {
        let envelope = parse_envelope(raw, &self.config.merchant_no)?;

        match &self.config.platform_public_key {
            Some(public_key) => {
                // The signature covers the raw nested result string exactly
                // as received; it must not be re-serialized first.
                if !signature::verify(envelope.result.as_bytes(), &envelope.sign, public_key) {
                    return Err(CallbackError::SignatureRejected);
                }
            }
            None => {
                warn!(
                    "no platform public key configured; accepting callback WITHOUT signature verification"
                );
            }
        }

        let result: PaymentResult = serde_json::from_str(&envelope.result)
            .map_err(|e| CallbackError::MalformedResult(e.to_string()))?;
        if !result.is_ok() {
            warn!(
                code = %result.code,
                message = %result.message,
                "platform reported a non-success result code"
            );
        }
        let data = result.data.as_ref().ok_or(CallbackError::MissingData)?;

        let order = match self.resolve(data).await? {
            Some(order) => order,
            None => {
                warn!(
                    provider_order_no = %data.order_no,
                    merchant_order_no = data.merchant_order_no.as_deref().unwrap_or("-"),
                    "no matching order for callback; acknowledging to stop platform retries"
                );
                return Ok(Ack::Success);
            }
        };

        let fingerprint = idempotency::fingerprint(data);
        if idempotency::is_duplicate(&order, &fingerprint) {
            info!(
                order_id = order.id,
                provider_order_no = %data.order_no,
                "duplicate callback delivery, already applied"
            );
            return Ok(Ack::Success);
        }

        let incoming = data.status();
        if idempotency::is_final_and_conflicting(&order, &incoming) {
            warn!(
                order_id = order.id,
                order_status = %order.status,
                incoming_status = %incoming,
                "order already final; refusing status regression"
            );
            return Ok(Ack::Success);
        }

        let mut order = order;
        let outcome = status_processor::apply_status(
            &mut order,
            data,
            &result.message,
            self.config.amount_tolerance_minor,
        );
        status_processor::record_callback_meta(&mut order, data, &fingerprint, &envelope.result);

        let order_id = order.id;
        let order_status = order.status;
        self.store.save(order).await?;

        if let Some(event) = outcome.event {
            self.events.publish(event);
        }

        info!(
            order_id,
            provider_order_no = %data.order_no,
            incoming_status = %incoming,
            order_status = %order_status,
            changed = outcome.changed,
            "callback applied"
        );
        Ok(Ack::Success)
    }

    async fn resolve(&self, data: &PaymentData) -> Result<Option<Order>, CallbackError> {
        if let Some(order) = self.resolver.find_by_provider_order_no(&data.order_no).await? {
            return Ok(Some(order));
        }
        match &data.merchant_order_no {
            Some(merchant_order_no) => Ok(self
                .resolver
                .find_by_merchant_order_no(merchant_order_no)
                .await?),
            None => Ok(None),
        }
    }
}

/// Preview of the raw body for logs with the signature field blanked out.
fn redacted_preview(raw: &str) -> String {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(mut value) => {
            if let Some(obj) = value.as_object_mut() {
                if obj.contains_key("sign") {
                    obj.insert("sign".to_string(), JsonValue::String("<redacted>".to_string()));
                }
            }
            preview(&value.to_string(), LOG_PREVIEW_LEN)
        }
        Err(_) => preview(raw, LOG_PREVIEW_LEN),
    }
}
