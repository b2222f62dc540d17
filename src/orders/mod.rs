//! Order model and the persistence boundary the callback path consumes.

pub mod store;
pub mod types;

pub use store::{MemoryOrderStore, OrderStore, StoreError};
pub use types::{meta_keys, Order, OrderNote, OrderStatus};
