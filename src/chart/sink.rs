use log::info;

use super::state::ChartState;

const BAR_WIDTH: usize = 30;

/// Receives every rendered chart.
pub trait ChartSink: Send + Sync {
    fn present(&self, chart: &ChartState);
}

/// Writes charts to the log as text bars.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ChartSink for LogSink {
    fn present(&self, chart: &ChartState) {
        info!("{}", format_chart(chart));
    }
}

pub fn format_chart(chart: &ChartState) -> String {
    let label_width = chart.labels.iter().map(String::len).max().unwrap_or(0);
    let mut out = format!("{} (rev {})", chart.title, chart.revision);

    for ((label, value), highlighted) in chart
        .labels
        .iter()
        .zip(&chart.values)
        .zip(&chart.highlighted)
    {
        let line = match value {
            Some(value) => {
                let filled = if chart.suggested_max > 0.0 {
                    ((value / chart.suggested_max) * BAR_WIDTH as f64).round() as usize
                } else {
                    0
                };
                let mark = if *highlighted { '!' } else { '#' };
                format!(
                    "{label:>label_width$} | {} {value:.2}",
                    mark.to_string().repeat(filled.min(BAR_WIDTH))
                )
            }
            None => format!("{label:>label_width$} | no data"),
        };
        out.push('\n');
        out.push_str(&line);
    }

    out
}
