use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::policy::{WindowKind, WindowPolicy};
use crate::db::models::Record;

/// Inclusive time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Computes the window `policy` selects around its anchor (or `now`).
///
/// Week windows start at local midnight of the most recent `week_start` on or
/// before the anchor and end at the last instant of the sixth day after it.
/// Month windows cover the anchor's calendar month. Both are evaluated in
/// `policy.utc_offset`.
pub fn compute_window(policy: &WindowPolicy, now: DateTime<Utc>) -> Window {
    let offset = policy.utc_offset;
    let anchor_day = policy
        .resolve_anchor(now)
        .with_timezone(&offset)
        .date_naive();

    let (first_day, next_first_day) = match policy.kind {
        WindowKind::Week => {
            let first = week_start_on_or_before(anchor_day, policy);
            let next = first.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX);
            (first, next)
        }
        WindowKind::Month => {
            let first = month_start(anchor_day);
            let next = first
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX);
            (first, next)
        }
    };

    Window {
        start: local_midnight(first_day, offset),
        end: local_midnight(next_first_day, offset) - TimeDelta::nanoseconds(1),
    }
}

/// Keeps the records whose timestamp lies in `[start, end]`, in input order.
/// Records without a timestamp never pass.
pub fn filter_within_window(
    records: &[Record],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Record> {
    let window = Window { start, end };
    records
        .iter()
        .filter(|record| record.timestamp.is_some_and(|ts| window.contains(ts)))
        .cloned()
        .collect()
}

fn week_start_on_or_before(day: NaiveDate, policy: &WindowPolicy) -> NaiveDate {
    let back = (day.weekday().num_days_from_sunday() + 7
        - policy.week_start.num_days_from_sunday())
        % 7;
    day.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(NaiveDate::MIN)
}

pub(crate) fn month_start(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(u64::from(day.day0())))
        .unwrap_or(NaiveDate::MIN)
}

fn local_midnight(day: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = day.and_time(NaiveTime::MIN);
    // A fixed offset has exactly one mapping for every local time.
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}
