use crate::database::{Database, WriteTransaction};
use crate::errors::{LedgerServiceError, Result};
use crate::metrics;
use crate::models::{ProcessResponse, ProcessedNumber};
use crate::validation;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Admits numbers into the ledger.
///
/// Constructed once at startup and shared by every request handler. Writer
/// coordination is delegated entirely to [`Database::begin_immediate`]; this
/// type holds no locks of its own.
pub struct LedgerService {
    pub db: Arc<Database>,
    n_max: i64,
}

impl LedgerService {
    pub fn new(db: Arc<Database>, n_max: i64) -> Self {
        LedgerService { db, n_max }
    }

    pub fn n_max(&self) -> i64 {
        self.n_max
    }

    /// Validate a raw `POST /process` body, then process the number it carries
    pub async fn process_body(&self, body: &[u8]) -> Result<ProcessResponse> {
        match validation::parse_body(body, self.n_max) {
            Ok(n) => self.process(n).await,
            Err(failure) => {
                metrics::record_outcome(failure.code(), None);
                Err(failure.into())
            }
        }
    }

    /// Admit `n` and return `n + 1`.
    ///
    /// Never waits on another writer: a held write lock yields `DbBusy` and
    /// retrying is left to the caller.
    pub async fn process(&self, n: i64) -> Result<ProcessResponse> {
        let started = Instant::now();

        let outcome = match validation::check_range(n, self.n_max) {
            Ok(n) => self.admit(n).await,
            Err(failure) => Err(failure.into()),
        };

        match &outcome {
            Ok(response) => {
                info!(n, result = response.result, "Processed n={} -> result={}", n, response.result);
                metrics::record_outcome("ok", Some(started.elapsed()));
            }
            Err(e) => {
                match e {
                    LedgerServiceError::Database(_) | LedgerServiceError::Internal(_) => {
                        error!(n, error = ?e, "Processing failed: {}", e)
                    }
                    LedgerServiceError::Validation(_) => {}
                    _ => warn!(n, "{}", e),
                }
                metrics::record_outcome(e.error_code(), Some(started.elapsed()));
            }
        }

        outcome
    }

    async fn admit(&self, n: i64) -> Result<ProcessResponse> {
        let mut tx = self.db.begin_immediate().await?;

        match Self::record(&mut tx, n).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(ProcessResponse { result })
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(n, error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Checks and insert, in order, inside the open write transaction
    async fn record(tx: &mut WriteTransaction, n: i64) -> Result<i64> {
        let successor = n
            .checked_add(1)
            .ok_or_else(|| LedgerServiceError::Internal(format!("n={} has no successor", n)))?;

        if tx.contains(n).await? {
            return Err(LedgerServiceError::Duplicate(n));
        }

        if tx.contains(successor).await? {
            return Err(LedgerServiceError::PredecessorProcessed(n));
        }

        tx.insert(&ProcessedNumber::new(n)).await?;
        Ok(successor)
    }

    /// Read a single record without taking the write lock
    pub async fn lookup(&self, value: i64) -> Result<ProcessedNumber> {
        self.db
            .get(value)
            .await?
            .ok_or(LedgerServiceError::NotFound(value))
    }

    pub async fn record_count(&self) -> Result<i64> {
        let count = self.db.count().await?;
        metrics::LEDGER_RECORDS.set(count);
        Ok(count)
    }
}
