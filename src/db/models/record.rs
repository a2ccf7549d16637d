//! Record data model.
//!
//! A single timestamped observation (one tweet and its toxicity score) as it
//! crosses the input boundary. Both fields are optional so that a malformed
//! document can still travel through the pipeline and be excluded later
//! instead of failing the whole batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub timestamp: Option<DateTime<Utc>>,
    pub value: Option<f64>,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self {
            timestamp: Some(timestamp),
            value,
        }
    }

    /// The value, if present and finite. NaN and infinities never reach an average.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// A record as stored in the `records` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    pub record: Record,
    pub created_at: DateTime<Utc>,
}
