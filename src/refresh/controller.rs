use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::chart::ChartSink;
use crate::source::RecordSource;
use crate::widgets::Widget;

use super::loop_worker::refresh_loop;

/// Owns the periodic refresh task. The task runs from `start` until `stop`
/// (or until the controller is dropped).
pub struct RefreshController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl RefreshController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn start(
        &mut self,
        source: Arc<dyn RecordSource>,
        widgets: Vec<Widget>,
        sink: Arc<dyn ChartSink>,
        interval: Duration,
    ) -> Result<()> {
        if self.is_running() {
            bail!("refresh already active");
        }
        // A handle that is no longer running belongs to a loop that exited on its own.
        if self.handle.take().is_some() {
            warn!("Previous refresh loop had already exited; starting a new one");
        }
        if interval.is_zero() {
            bail!("refresh interval must be greater than zero");
        }

        info!(
            "Starting refresh of {} widgets from {} every {:?}",
            widgets.len(),
            source.describe(),
            interval
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(
            source,
            Arc::new(widgets),
            sink,
            interval,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("refresh loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartState;
    use crate::db::Record;
    use crate::widgets::WidgetSettings;
    use async_trait::async_trait;
    use chrono::{FixedOffset, Utc};
    use tokio::sync::mpsc;

    struct StaticSource(Vec<Record>);

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn fetch_records(&self) -> Result<Vec<Record>> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".into()
        }
    }

    struct ChannelSink(mpsc::UnboundedSender<ChartState>);

    impl ChartSink for ChannelSink {
        fn present(&self, chart: &ChartState) {
            let _ = self.0.send(chart.clone());
        }
    }

    fn widget() -> Vec<Widget> {
        vec![Widget::from_settings(
            &WidgetSettings::daily_month_trends(),
            FixedOffset::east_opt(0).unwrap(),
        )
        .unwrap()]
    }

    fn source() -> Arc<dyn RecordSource> {
        Arc::new(StaticSource(vec![Record::new(Utc::now(), None)]))
    }

    #[tokio::test]
    async fn refreshes_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = RefreshController::new();

        controller
            .start(source(), widget(), Arc::new(ChannelSink(tx)), Duration::from_millis(20))
            .unwrap();
        assert!(controller.is_running());

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.revision, 1);
        assert_eq!(second.revision, 2);

        controller.stop().await.unwrap();
        assert!(!controller.is_running());

        // Drain anything presented before the stop landed, then expect silence.
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn ChartSink> = Arc::new(ChannelSink(tx));
        let mut controller = RefreshController::new();

        controller
            .start(source(), widget(), sink.clone(), Duration::from_secs(60))
            .unwrap();
        assert!(controller
            .start(source(), widget(), sink, Duration::from_secs(60))
            .is_err());

        controller.stop().await.unwrap();
    }

    struct PanickingSink;

    impl ChartSink for PanickingSink {
        fn present(&self, _chart: &ChartState) {
            panic!("sink failure");
        }
    }

    #[tokio::test]
    async fn restarts_after_loop_exits_on_its_own() {
        let mut controller = RefreshController::new();
        controller
            .start(source(), widget(), Arc::new(PanickingSink), Duration::from_millis(10))
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while controller.is_running() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        controller
            .start(source(), widget(), Arc::new(ChannelSink(tx)), Duration::from_millis(10))
            .unwrap();
        let chart = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chart.revision, 1);

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = RefreshController::new();
        assert!(controller
            .start(source(), widget(), Arc::new(ChannelSink(tx)), Duration::ZERO)
            .is_err());
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_fine() {
        let mut controller = RefreshController::default();
        controller.stop().await.unwrap();
    }
}
