use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Serialize, Serializer};

use crate::calendar::policy::{WindowKind, WindowPolicy};
use crate::calendar::window::month_start;

/// Weekday names indexed by days from Sunday.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Weekday(Weekday),
    /// Always the first day of the month.
    Month(NaiveDate),
}

impl BucketKey {
    pub fn month_of(day: NaiveDate) -> Self {
        BucketKey::Month(month_start(day))
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Weekday(day) => f.write_str(weekday_name(*day)),
            BucketKey::Month(first) => write!(f, "{}", first.format("%B %Y")),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_sunday() as usize]
}

/// Classifies a timestamp. Week buckets use the local day of week and ignore
/// `week_start`; month buckets use the local calendar month.
pub fn bucket_key_of(timestamp: DateTime<Utc>, policy: &WindowPolicy) -> BucketKey {
    let local = timestamp.with_timezone(&policy.utc_offset);
    match policy.kind {
        WindowKind::Week => BucketKey::Weekday(local.weekday()),
        WindowKind::Month => BucketKey::month_of(local.date_naive()),
    }
}

/// The buckets a result must contain, in display order.
///
/// Week: all seven weekdays rotated to begin at `week_start`.
/// Month: the single month containing the policy's anchor (or `now`).
pub fn ordered_bucket_keys(policy: &WindowPolicy, now: DateTime<Utc>) -> Vec<BucketKey> {
    match policy.kind {
        WindowKind::Week => {
            let mut day = policy.week_start;
            let mut keys = Vec::with_capacity(WEEKDAY_NAMES.len());
            for _ in 0..WEEKDAY_NAMES.len() {
                keys.push(BucketKey::Weekday(day));
                day = day.succ();
            }
            keys
        }
        WindowKind::Month => {
            let anchor = policy.resolve_anchor(now).with_timezone(&policy.utc_offset);
            vec![BucketKey::month_of(anchor.date_naive())]
        }
    }
}
