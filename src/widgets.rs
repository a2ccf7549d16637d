use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{
    parse_week_start, AggregationResult, CalendarAggregator, EmptyBucketPolicy, Metric,
    WindowKind, WindowPolicy,
};
use crate::db::Record;
use crate::error::ConfigError;

/// Widget definition as written in the settings file. Enumerated fields are
/// free text here and validated by [`Widget::from_settings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub name: String,
    pub title: String,
    pub window: String,
    #[serde(default = "default_week_start")]
    pub week_start: String,
    pub metric: String,
    #[serde(default = "default_empty_buckets")]
    pub empty_buckets: String,
    #[serde(default)]
    pub highlight_above: Option<f64>,
}

fn default_week_start() -> String {
    "Sunday".into()
}

fn default_empty_buckets() -> String {
    "no-data".into()
}

impl WidgetSettings {
    /// Record count for the current month.
    pub fn daily_month_trends() -> Self {
        Self {
            name: "daily-month-trends".into(),
            title: "Daily Month Trends".into(),
            window: "month".into(),
            week_start: default_week_start(),
            metric: "count".into(),
            empty_buckets: default_empty_buckets(),
            highlight_above: None,
        }
    }

    /// Average toxicity per weekday of the current week.
    pub fn daily_weekend_trends() -> Self {
        Self {
            name: "daily-weekend-trends".into(),
            title: "Daily Weekend Trends".into(),
            window: "week".into(),
            week_start: default_week_start(),
            metric: "average".into(),
            empty_buckets: default_empty_buckets(),
            highlight_above: Some(0.5),
        }
    }
}

/// A validated widget: what to aggregate and how to present it.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub name: String,
    pub title: String,
    pub metric: Metric,
    pub aggregator: CalendarAggregator,
    pub highlight_above: Option<f64>,
}

impl Widget {
    pub fn from_settings(
        settings: &WidgetSettings,
        utc_offset: FixedOffset,
    ) -> Result<Self, ConfigError> {
        let kind: WindowKind = settings.window.parse()?;
        let week_start = parse_week_start(&settings.week_start)?;
        let metric: Metric = settings.metric.parse()?;
        let empty_buckets: EmptyBucketPolicy = settings.empty_buckets.parse()?;

        let policy = WindowPolicy {
            kind,
            week_start,
            anchor: None,
            utc_offset,
        };

        Ok(Self {
            name: settings.name.clone(),
            title: settings.title.clone(),
            metric,
            aggregator: CalendarAggregator::new(policy).with_empty_buckets(empty_buckets),
            highlight_above: settings.highlight_above,
        })
    }

    pub fn aggregate(&self, records: &[Record], now: DateTime<Utc>) -> AggregationResult {
        self.aggregator.aggregate(self.metric, records, now)
    }
}
