//! Error taxonomy for the callback path.
//!
//! Expected failures are explicit `Result` values carried by these types;
//! nothing in the request path panics. Every variant maps to the `ERROR`
//! acknowledgement at the orchestrator boundary. Business outcomes that
//! must still be acknowledged (unknown order, duplicate delivery,
//! final-status conflict) are not errors and never appear here.

use thiserror::Error;

use crate::orders::StoreError;
use crate::protocol::EnvelopeError;

#[derive(Debug, Error)]
pub enum CallbackError {
    /// Malformed or mismatched outer envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The RSA signature over the nested result string did not verify.
    #[error("callback signature verification failed")]
    SignatureRejected,

    /// The nested result string failed to decode after a good signature.
    #[error("malformed payment result: {0}")]
    MalformedResult(String),

    /// Result decoded but carried no payment data to act on.
    #[error("payment data missing from result")]
    MissingData,

    /// The order store failed; the platform should retry.
    #[error(transparent)]
    Store(#[from] StoreError),
}
