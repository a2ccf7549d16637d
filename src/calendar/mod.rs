//! Calendar-windowed aggregation.
//!
//! Records are filtered to a week or month window, classified into weekday or
//! month buckets in a fixed UTC offset, and reduced to counts or averages.
//! Everything here is pure: the same records, policy and `now` always produce
//! the same result.

pub mod aggregator;
pub mod buckets;
pub mod policy;
pub mod window;

pub use aggregator::{AggregationResult, BucketStat, CalendarAggregator, Metric};
pub use buckets::{bucket_key_of, ordered_bucket_keys, weekday_name, BucketKey, WEEKDAY_NAMES};
pub use policy::{
    offset_from_minutes, parse_week_start, EmptyBucketPolicy, WindowKind, WindowPolicy,
};
pub use window::{compute_window, filter_within_window, Window};
