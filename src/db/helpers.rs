use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let parsed = parse_datetime("2024-03-04T10:00:00+02:00", "timestamp").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap());
    }

    #[test]
    fn reports_the_field_on_failure() {
        let err = parse_datetime("yesterday", "created_at").unwrap_err();
        assert!(err.to_string().contains("created_at"));
    }
}
