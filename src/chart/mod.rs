mod sink;
mod state;

pub use sink::{format_chart, ChartSink, LogSink};
pub use state::{render_chart, ChartState};
