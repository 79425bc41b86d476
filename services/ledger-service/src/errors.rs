use crate::validation::ValidationFailure;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, LedgerServiceError>;

/// Primary SQLite result codes that mean another connection holds the lock
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Error, Debug)]
pub enum LedgerServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("Duplicate number received: n={0}")]
    Duplicate(i64),

    /// Uniqueness violation raised by the store on insert
    #[error("Duplicate (integrity): n={0}")]
    DuplicateOnInsert(i64),

    #[error("PredecessorProcessed: n={0} but n+1 already processed")]
    PredecessorProcessed(i64),

    #[error("Database is busy (locked)")]
    DbBusy,

    #[error("Number not found: {0}")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for LedgerServiceError {
    fn from(err: sqlx::Error) -> Self {
        if is_busy(&err) {
            LedgerServiceError::DbBusy
        } else {
            LedgerServiceError::Database(err)
        }
    }
}

/// True when the store refused the operation because another writer holds the lock
pub fn is_busy(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };

    // SQLite reports extended result codes; the low byte is the primary code
    let primary = db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);

    matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
        || db_err.message().to_ascii_lowercase().contains("locked")
}

/// True when the store rejected a write because the key already exists
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

impl LedgerServiceError {
    /// Wire name placed in the `error` field of the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerServiceError::Validation(failure) => failure.code(),
            LedgerServiceError::Duplicate(_) => "Duplicate",
            LedgerServiceError::DuplicateOnInsert(_) => "Duplicate",
            LedgerServiceError::PredecessorProcessed(_) => "PredecessorProcessed",
            LedgerServiceError::DbBusy => "DbBusy",
            LedgerServiceError::NotFound(_) => "NotFound",
            LedgerServiceError::Database(_) => "ServerError",
            LedgerServiceError::Internal(_) => "ServerError",
        }
    }

    /// Whether the caller may succeed by resubmitting the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerServiceError::DbBusy)
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            LedgerServiceError::Database(_) | LedgerServiceError::Internal(_)
        )
    }

    fn public_message(&self) -> String {
        if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for LedgerServiceError {
    fn error_response(&self) -> HttpResponse {
        if self.is_server_error() {
            error!(error = ?self, "Unhandled ledger failure: {}", self);
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.error_code(),
            "message": self.public_message(),
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            LedgerServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerServiceError::Duplicate(_) => StatusCode::CONFLICT,
            LedgerServiceError::DuplicateOnInsert(_) => StatusCode::CONFLICT,
            LedgerServiceError::PredecessorProcessed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerServiceError::DbBusy => StatusCode::SERVICE_UNAVAILABLE,
            LedgerServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
