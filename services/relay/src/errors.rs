use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use ledger_service::ValidationFailure;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Ledger service unreachable, timed out, or answered unreadably
    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::Validation(failure) => failure.code(),
            RelayError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            RelayError::Internal(_) => "ServerError",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::UpstreamUnavailable(err.to_string())
    }
}

impl ResponseError for RelayError {
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            RelayError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.error_code(),
            "message": message,
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
