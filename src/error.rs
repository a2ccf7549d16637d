//! Configuration errors.
//!
//! These are programmer/operator mistakes in widget or dashboard settings.
//! They surface when settings are loaded and are never retried.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown window kind '{0}' (expected \"week\" or \"month\")")]
    UnknownWindowKind(String),

    #[error("invalid week start '{0}' (expected a weekday name such as \"Sunday\")")]
    InvalidWeekStart(String),

    #[error("unknown metric '{0}' (expected \"count\" or \"average\")")]
    UnknownMetric(String),

    #[error("unknown empty bucket policy '{0}' (expected \"no-data\" or \"zero\")")]
    UnknownEmptyBucketPolicy(String),

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),

    #[error("widget '{0}' is defined more than once")]
    DuplicateWidget(String),

    #[error("refresh interval must be greater than zero")]
    ZeroRefreshInterval,
}
