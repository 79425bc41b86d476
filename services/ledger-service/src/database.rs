//! SQLite storage adapter
//!
//! The database runs in WAL mode with a zero busy timeout. Readers never wait
//! on the writer, and a second writer is refused at `BEGIN IMMEDIATE` instead
//! of queueing behind the first.

use crate::config::DatabaseConfig;
use crate::errors::{is_unique_violation, LedgerServiceError, Result};
use crate::models::ProcessedNumber;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const CREATE_NUMBERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS numbers (
        value INTEGER PRIMARY KEY,
        processed_at TEXT NOT NULL
    )
"#;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the ledger file and bootstrap the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let path = Path::new(&config.path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LedgerServiceError::Internal(format!(
                    "cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::ZERO);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        let database = Database { pool };
        database.bootstrap().await?;

        info!(path = %config.path, "Ledger database ready");
        Ok(database)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema if missing. Safe to run any number of times.
    pub async fn bootstrap(&self) -> Result<()> {
        sqlx::query(CREATE_NUMBERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Start a write transaction without waiting for the write lock.
    ///
    /// Returns [`LedgerServiceError::DbBusy`] when another writer holds it.
    pub async fn begin_immediate(&self) -> Result<WriteTransaction> {
        let conn = self.pool.acquire().await?;

        // A future dropped mid-statement may still open the transaction on the
        // worker; the guard must own the connection before BEGIN is sent
        let mut tx = WriteTransaction { conn: Some(conn) };
        let begun = sqlx::query("BEGIN IMMEDIATE").execute(&mut **tx.conn()?).await;

        match begun {
            Ok(_) => Ok(tx),
            Err(e) => {
                let err = LedgerServiceError::from(e);
                if matches!(err, LedgerServiceError::DbBusy) {
                    // Refused before anything was opened; the connection is clean
                    tx.release();
                }
                Err(err)
            }
        }
    }

    /// Point lookup outside any write transaction
    pub async fn get(&self, value: i64) -> Result<Option<ProcessedNumber>> {
        let record = sqlx::query_as::<_, ProcessedNumber>(
            "SELECT value, processed_at FROM numbers WHERE value = ?",
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Number of records in the ledger
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM numbers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open `BEGIN IMMEDIATE` transaction holding the ledger's write lock.
///
/// Must be finished with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). If dropped while open, the underlying
/// connection is detached from the pool and closed, which makes SQLite roll
/// the transaction back.
pub struct WriteTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    fn conn(&mut self) -> Result<&mut PoolConnection<Sqlite>> {
        self.conn
            .as_mut()
            .ok_or_else(|| LedgerServiceError::Internal("write transaction already finished".into()))
    }

    pub async fn contains(&mut self, value: i64) -> Result<bool> {
        let conn = self.conn()?;
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM numbers WHERE value = ?")
            .bind(value)
            .fetch_optional(&mut **conn)
            .await?;

        Ok(found.is_some())
    }

    /// Insert a record; a primary key clash surfaces as `DuplicateOnInsert`
    pub async fn insert(&mut self, record: &ProcessedNumber) -> Result<()> {
        let conn = self.conn()?;
        sqlx::query("INSERT INTO numbers (value, processed_at) VALUES (?, ?)")
            .bind(record.value)
            .bind(record.processed_at_text())
            .execute(&mut **conn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    LedgerServiceError::DuplicateOnInsert(record.value)
                } else {
                    LedgerServiceError::from(e)
                }
            })?;

        Ok(())
    }

    pub async fn commit(mut self) -> Result<()> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(mut self) -> Result<()> {
        self.finish("ROLLBACK").await
    }

    /// Runs the statement through the guard; the connection only returns to
    /// the pool once the statement has completed successfully.
    async fn finish(&mut self, statement: &'static str) -> Result<()> {
        let ended = sqlx::query(statement).execute(&mut **self.conn()?).await;

        match ended {
            Ok(_) => {
                self.release();
                Ok(())
            }
            Err(e) => {
                // The transaction state is unknown; never hand this connection back
                warn!(statement, error = %e, "Closing connection after failed transaction end");
                self.discard();
                Err(e.into())
            }
        }
    }

    /// Hand a connection with no open transaction back to the pool
    fn release(&mut self) {
        self.conn.take();
    }

    /// Close the connection outright so SQLite rolls back whatever it holds
    fn discard(&mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn.detach());
        }
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if self.conn.is_some() {
            warn!("Write transaction dropped before it finished; closing its connection");
            self.discard();
        }
    }
}
