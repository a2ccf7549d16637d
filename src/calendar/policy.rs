use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    Week,
    Month,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Week => "week",
            WindowKind::Month => "month",
        }
    }
}

impl FromStr for WindowKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(WindowKind::Week),
            "month" => Ok(WindowKind::Month),
            _ => Err(ConfigError::UnknownWindowKind(value.to_string())),
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an empty bucket's average becomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyBucketPolicy {
    /// Report the bucket as having no data.
    #[default]
    NoData,
    /// Report the bucket's average as 0. Only when the caller asks for it.
    Zero,
}

impl FromStr for EmptyBucketPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "no-data" | "nodata" | "none" => Ok(EmptyBucketPolicy::NoData),
            "zero" => Ok(EmptyBucketPolicy::Zero),
            _ => Err(ConfigError::UnknownEmptyBucketPolicy(value.to_string())),
        }
    }
}

/// Defines which records are considered and how they are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub kind: WindowKind,
    /// First day of the week. Affects bucket order and week bounds, never classification.
    pub week_start: Weekday,
    /// Instant the window is computed around. `None` means the caller's "now".
    pub anchor: Option<DateTime<Utc>>,
    /// Offset used for every calendar computation (day-of-week, midnight, month).
    pub utc_offset: FixedOffset,
}

impl WindowPolicy {
    pub fn week() -> Self {
        Self {
            kind: WindowKind::Week,
            ..Self::default()
        }
    }

    pub fn month() -> Self {
        Self {
            kind: WindowKind::Month,
            ..Self::default()
        }
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn resolve_anchor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.anchor.unwrap_or(now)
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            kind: WindowKind::Week,
            week_start: Weekday::Sun,
            anchor: None,
            utc_offset: utc(),
        }
    }
}

/// Parses a weekday name ("Monday", "mon", ...) into a `Weekday`.
pub fn parse_week_start(value: &str) -> Result<Weekday, ConfigError> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| ConfigError::InvalidWeekStart(value.to_string()))
}

/// Builds a fixed offset from minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ConfigError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ConfigError::InvalidUtcOffset(minutes))
}

fn utc() -> FixedOffset {
    Utc.fix()
}
