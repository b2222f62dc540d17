//! Payment transition events.
//!
//! Every applied status transition publishes one event so collaborators
//! (fulfilment, notifications, reconciliation) can react without sitting in
//! the callback request path. Subscribers that lag simply miss events; the
//! callback response never waits on them.

use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Completed { transaction_id: String },
    Pending,
    Failed { reason: String },
    Cancelled,
    AwaitingAuthentication { redirect_url: Option<String> },
    Unrecognized { raw_status: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub order_id: u64,
    pub kind: PaymentEventKind,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PaymentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaymentEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A send error only means there are no subscribers,
    /// which is fine for the callback path.
    pub fn publish(&self, event: PaymentEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
