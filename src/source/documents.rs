use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::db::Record;

/// Field holding the toxicity score in exported tweet documents.
pub const DEFAULT_VALUE_FIELD: &str = "TOXCITY_SCORE";

/// Converts one exported document into a `Record`.
///
/// Never fails: an unreadable timestamp or value becomes `None` and the
/// aggregator excludes it. Documents that are not objects yield an empty record.
pub fn parse_document(document: &Value, value_field: &str) -> Record {
    let Some(fields) = document.as_object() else {
        return Record {
            timestamp: None,
            value: None,
        };
    };

    Record {
        timestamp: fields.get("timestamp").and_then(parse_timestamp_value),
        value: fields.get(value_field).and_then(Value::as_f64),
    }
}

/// Accepts an RFC3339 string, epoch milliseconds, or a Firestore timestamp
/// object (`{seconds, nanoseconds}` or `{_seconds, _nanoseconds}`).
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(fields) => {
            let seconds = fields
                .get("seconds")
                .or_else(|| fields.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            DateTime::from_timestamp(seconds, nanos)
        }
        _ => None,
    }
}
