use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::buckets::{bucket_key_of, ordered_bucket_keys, BucketKey};
use crate::calendar::policy::{EmptyBucketPolicy, WindowPolicy};
use crate::calendar::window::{compute_window, filter_within_window, Window};
use crate::db::models::Record;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Count,
    Average,
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "count" | "counts" => Ok(Metric::Count),
            "average" | "averages" | "avg" | "mean" => Ok(Metric::Average),
            _ => Err(ConfigError::UnknownMetric(value.to_string())),
        }
    }
}

/// One bucket of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStat {
    pub key: BucketKey,
    /// The count, or the average. `None` marks an average with no data.
    pub value: Option<f64>,
    /// Records in the window classified into this bucket, valued or not.
    pub records_seen: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub metric: Metric,
    pub window: Window,
    pub buckets: Vec<BucketStat>,
}

impl AggregationResult {
    pub fn bucket_keys(&self) -> Vec<BucketKey> {
        self.buckets.iter().map(|bucket| bucket.key).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|bucket| bucket.key.label()).collect()
    }

    /// Values in bucket order; same length as `bucket_keys`.
    pub fn series(&self) -> Vec<Option<f64>> {
        self.buckets.iter().map(|bucket| bucket.value).collect()
    }

    pub fn get(&self, key: &BucketKey) -> Option<&BucketStat> {
        self.buckets.iter().find(|bucket| bucket.key == *key)
    }

    /// Value for the bucket labelled `label`. Outer `None`: no such bucket.
    pub fn value_for(&self, label: &str) -> Option<Option<f64>> {
        self.buckets
            .iter()
            .find(|bucket| bucket.key.label() == label)
            .map(|bucket| bucket.value)
    }

    pub fn total_records(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.records_seen).sum()
    }
}

/// Stateless calendar aggregation over a record set.
///
/// Every call recomputes the window from the policy and the supplied `now`;
/// nothing is retained between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarAggregator {
    pub policy: WindowPolicy,
    pub empty_buckets: EmptyBucketPolicy,
}

impl CalendarAggregator {
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            policy,
            empty_buckets: EmptyBucketPolicy::default(),
        }
    }

    pub fn with_empty_buckets(mut self, empty_buckets: EmptyBucketPolicy) -> Self {
        self.empty_buckets = empty_buckets;
        self
    }

    pub fn aggregate(&self, metric: Metric, records: &[Record], now: DateTime<Utc>) -> AggregationResult {
        match metric {
            Metric::Count => self.aggregate_counts(records, now),
            Metric::Average => self.aggregate_averages(records, now),
        }
    }

    pub fn aggregate_counts(&self, records: &[Record], now: DateTime<Utc>) -> AggregationResult {
        let (window, groups) = self.group(records, now);
        let buckets = ordered_bucket_keys(&self.policy, now)
            .into_iter()
            .map(|key| {
                let seen = groups.get(&key).map_or(0, |group| group.seen);
                BucketStat {
                    key,
                    value: Some(seen as f64),
                    records_seen: seen,
                }
            })
            .collect();

        AggregationResult {
            metric: Metric::Count,
            window,
            buckets,
        }
    }

    pub fn aggregate_averages(&self, records: &[Record], now: DateTime<Utc>) -> AggregationResult {
        let (window, groups) = self.group(records, now);
        let buckets = ordered_bucket_keys(&self.policy, now)
            .into_iter()
            .map(|key| {
                let group = groups.get(&key).copied().unwrap_or_default();
                let value = match (group.mean(), self.empty_buckets) {
                    (Some(mean), _) => Some(mean),
                    (None, EmptyBucketPolicy::NoData) => None,
                    (None, EmptyBucketPolicy::Zero) => Some(0.0),
                };
                BucketStat {
                    key,
                    value,
                    records_seen: group.seen,
                }
            })
            .collect();

        AggregationResult {
            metric: Metric::Average,
            window,
            buckets,
        }
    }

    fn group(&self, records: &[Record], now: DateTime<Utc>) -> (Window, HashMap<BucketKey, Accumulator>) {
        let window = compute_window(&self.policy, now);
        let mut groups: HashMap<BucketKey, Accumulator> = HashMap::new();

        for record in filter_within_window(records, window.start, window.end) {
            let Some(timestamp) = record.timestamp else {
                continue;
            };
            let entry = groups.entry(bucket_key_of(timestamp, &self.policy)).or_default();
            entry.seen += 1;
            if let Some(value) = record.numeric_value() {
                entry.push(value);
            }
        }

        (window, groups)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    seen: usize,
    samples: usize,
    mean: f64,
}

impl Accumulator {
    /// Running mean. A raw sum of large finite values overflows to inf.
    fn push(&mut self, value: f64) {
        self.samples += 1;
        self.mean += (value - self.mean) / self.samples as f64;
    }

    fn mean(&self) -> Option<f64> {
        (self.samples > 0).then_some(self.mean)
    }
}
