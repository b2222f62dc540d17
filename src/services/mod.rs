//! Business logic for the callback path.

pub mod callback_processor;
pub mod idempotency;
pub mod order_resolver;
pub mod status_processor;

pub use callback_processor::CallbackProcessor;
pub use order_resolver::OrderResolver;
