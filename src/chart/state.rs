use serde::Serialize;

use crate::calendar::{AggregationResult, Metric};
use crate::widgets::Widget;

/// Everything a renderer needs to draw one bar chart.
///
/// Produced fresh each refresh cycle from the previous state and the new
/// aggregation; nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartState {
    pub widget: String,
    pub title: String,
    pub metric: Metric,
    pub labels: Vec<String>,
    /// `None` is a bucket without data, distinct from a zero bar.
    pub values: Vec<Option<f64>>,
    pub highlighted: Vec<bool>,
    pub suggested_max: f64,
    /// 1 for the first render, incremented on every update.
    pub revision: u64,
}

impl ChartState {
    pub fn is_first_render(&self) -> bool {
        self.revision == 1
    }
}

/// Builds the chart for `result`, continuing from `previous` when there is one.
pub fn render_chart(
    previous: Option<&ChartState>,
    widget: &Widget,
    result: &AggregationResult,
) -> ChartState {
    let values = result.series();
    let highlighted = values
        .iter()
        .map(|value| match (value, widget.highlight_above) {
            (Some(value), Some(threshold)) => *value > threshold,
            _ => false,
        })
        .collect();

    let suggested_max = match result.metric {
        Metric::Count => values.iter().flatten().copied().fold(0.0, f64::max) + 1.0,
        Metric::Average => 1.0,
    };

    ChartState {
        widget: widget.name.clone(),
        title: widget.title.clone(),
        metric: result.metric,
        labels: result.labels(),
        values,
        highlighted,
        suggested_max,
        revision: previous.map_or(1, |state| state.revision + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Record;
    use crate::widgets::WidgetSettings;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn widget(settings: WidgetSettings) -> Widget {
        Widget::from_settings(&settings, FixedOffset::east_opt(0).unwrap()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new(Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(), Some(0.2)),
            Record::new(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(), Some(0.7)),
        ]
    }

    #[test]
    fn average_chart_highlights_values_over_threshold() {
        let widget = widget(WidgetSettings::daily_weekend_trends());
        let chart = render_chart(None, &widget, &widget.aggregate(&records(), now()));

        assert_eq!(chart.labels.len(), 7);
        assert_eq!(chart.labels.len(), chart.values.len());
        assert_eq!(chart.values[0], None);
        assert_eq!(chart.highlighted, vec![false, false, true, false, false, false, false]);
        assert_eq!(chart.suggested_max, 1.0);
        assert!(chart.is_first_render());
    }

    #[test]
    fn count_chart_pads_the_axis() {
        let widget = widget(WidgetSettings::daily_month_trends());
        let chart = render_chart(None, &widget, &widget.aggregate(&records(), now()));

        assert_eq!(chart.labels, vec!["March 2024"]);
        assert_eq!(chart.values, vec![Some(2.0)]);
        assert_eq!(chart.suggested_max, 3.0);
        assert!(chart.highlighted.iter().all(|h| !h));
    }

    #[test]
    fn rerender_advances_revision_without_touching_previous() {
        let widget = widget(WidgetSettings::daily_month_trends());
        let first = render_chart(None, &widget, &widget.aggregate(&[], now()));
        let second = render_chart(Some(&first), &widget, &widget.aggregate(&records(), now()));

        assert_eq!(first.revision, 1);
        assert_eq!(first.values, vec![Some(0.0)]);
        assert_eq!(second.revision, 2);
        assert_eq!(second.values, vec![Some(2.0)]);
    }
}
