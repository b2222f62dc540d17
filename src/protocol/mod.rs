//! Wire protocol for the OnePay asynchronous callback: envelope layout,
//! nested payment payload and the legacy RSA signature scheme.

pub mod envelope;
pub mod signature;
pub mod types;

pub use envelope::{parse_envelope, CallbackEnvelope, EnvelopeError};
pub use types::{Ack, PaymentData, PaymentResult, PaymentStatus};
