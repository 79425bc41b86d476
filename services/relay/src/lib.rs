//! Increment relay
//!
//! Stateless front door: checks the shape and range of `{"n": <integer>}`,
//! forwards it to the ledger service and mirrors the answer byte for byte.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod services;
pub mod upstream;

pub use config::Config;
pub use errors::{RelayError, Result};
pub use services::IncrementRelay;
pub use upstream::{LedgerClient, UpstreamReply};
