use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::chart::{render_chart, ChartSink, ChartState};
use crate::source::RecordSource;
use crate::widgets::Widget;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const FETCH_TIMEOUT_SECS: u64 = 30;

pub async fn refresh_loop(
    source: Arc<dyn RecordSource>,
    widgets: Arc<Vec<Widget>>,
    sink: Arc<dyn ChartSink>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Last chart per widget. Lives only as long as this loop.
    let mut charts: HashMap<String, ChartState> = HashMap::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_refresh_cycle(source.as_ref(), &widgets, sink.as_ref(), &mut charts).await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("refresh loop shutting down");
                break;
            }
        }
    }
}

/// Fetches once and re-renders every widget. Returns how many charts were presented.
pub async fn run_refresh_cycle(
    source: &dyn RecordSource,
    widgets: &[Widget],
    sink: &dyn ChartSink,
    charts: &mut HashMap<String, ChartState>,
) -> usize {
    let fetch = source.fetch_records();
    let records = match tokio::time::timeout(Duration::from_secs(FETCH_TIMEOUT_SECS), fetch).await {
        Ok(Ok(records)) => records,
        Ok(Err(err)) => {
            log_error!("fetch from {} failed: {err:#}", source.describe());
            return 0;
        }
        Err(_) => {
            log_warn!(
                "fetch from {} timed out (> {}s)",
                source.describe(),
                FETCH_TIMEOUT_SECS
            );
            return 0;
        }
    };

    let now = Utc::now();
    log_info!(
        "fetched {} records from {}",
        records.len(),
        source.describe()
    );

    for widget in widgets {
        let result = widget.aggregate(&records, now);
        let chart = render_chart(charts.get(&widget.name), widget, &result);
        sink.present(&chart);
        charts.insert(widget.name.clone(), chart);
    }

    widgets.len()
}
