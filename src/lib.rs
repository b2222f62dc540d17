//! OnePay gateway callback service.
//!
//! Receives asynchronous payment notifications from the OnePay platform,
//! authenticates them against the platform's RSA public key, and applies the
//! reported payment status to the matching local order exactly once.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod health;
pub mod logging;
pub mod orders;
pub mod protocol;
pub mod services;
