//! Increment Ledger Service
//!
//! Accepts natural numbers, records each one exactly once in a SQLite
//! ledger and answers with the incremented value.
//!
//! # Invariants
//!
//! - Uniqueness: a value is recorded at most once
//! - No successor before self: `n` is rejected once `n + 1` is recorded
//! - Append-only: records are never updated or deleted
//! - Fail-fast admission: a contended write lock yields `DbBusy`, never a wait

pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod validation;

pub use config::Config;
pub use database::{Database, WriteTransaction};
pub use errors::{LedgerServiceError, Result};
pub use models::{ProcessResponse, ProcessedNumber};
pub use services::LedgerService;
pub use validation::ValidationFailure;
