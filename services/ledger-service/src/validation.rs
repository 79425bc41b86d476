//! Request shape and range checks
//!
//! Runs before any storage work and has no side effects. The relay uses the
//! same gate so both tiers reject malformed input identically.

use serde_json::Value;
use thiserror::Error;

/// Why a submitted value was refused before reaching the ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Body is not a JSON object carrying field `n`
    #[error("Body must be JSON with integer field 'n'")]
    InvalidShape,

    /// `n` is present but is not an integral JSON number
    #[error("n must be integer")]
    NotInteger,

    /// `n` is an integer outside `0..=n_max`
    #[error("n must be between 0 and {n_max}")]
    OutOfRange { n_max: i64 },

    /// A path segment that should carry a number does not parse as one
    #[error("value must be integer")]
    InvalidPathValue,
}

impl ValidationFailure {
    /// Wire name used in the `error` field of the response body
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::InvalidShape => "InvalidJSON",
            ValidationFailure::NotInteger
            | ValidationFailure::OutOfRange { .. }
            | ValidationFailure::InvalidPathValue => "ValidationError",
        }
    }
}

/// Parse a raw request body and return the validated `n`
pub fn parse_body(body: &[u8], n_max: i64) -> Result<i64, ValidationFailure> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|_| ValidationFailure::InvalidShape)?;

    let n = payload
        .as_object()
        .and_then(|fields| fields.get("n"))
        .ok_or(ValidationFailure::InvalidShape)?;

    validate_value(n, n_max)
}

/// Validate an already-extracted JSON value
pub fn validate_value(n: &Value, n_max: i64) -> Result<i64, ValidationFailure> {
    let number = match n {
        Value::Number(number) => number,
        _ => return Err(ValidationFailure::NotInteger),
    };

    if let Some(value) = number.as_i64() {
        check_range(value, n_max)
    } else if number.is_u64() {
        // Integral but above i64::MAX
        Err(ValidationFailure::OutOfRange { n_max })
    } else {
        Err(ValidationFailure::NotInteger)
    }
}

/// Inclusive `0..=n_max` bound check
pub fn check_range(n: i64, n_max: i64) -> Result<i64, ValidationFailure> {
    if n < 0 || n > n_max {
        return Err(ValidationFailure::OutOfRange { n_max });
    }
    Ok(n)
}
