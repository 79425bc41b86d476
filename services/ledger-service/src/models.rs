use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A number admitted to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedNumber {
    pub value: i64,
    /// UTC, truncated to whole seconds
    pub processed_at: DateTime<Utc>,
}

impl ProcessedNumber {
    /// Stamp `value` with the current time
    pub fn new(value: i64) -> Self {
        ProcessedNumber {
            value,
            processed_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Column representation of `processed_at`, e.g. `2024-05-01T12:00:00Z`
    pub fn processed_at_text(&self) -> String {
        self.processed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl<'r> FromRow<'r, SqliteRow> for ProcessedNumber {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let value: i64 = row.try_get("value")?;
        let raw: String = row.try_get("processed_at")?;

        let processed_at = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "processed_at".to_string(),
                source: Box::new(e),
            })?
            .with_timezone(&Utc);

        Ok(ProcessedNumber {
            value,
            processed_at,
        })
    }
}

/// Successful `POST /process` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub result: i64,
}

/// Body forwarded to `POST /process`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub n: i64,
}
