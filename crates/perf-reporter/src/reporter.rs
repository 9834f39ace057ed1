//! Scenario reporters.

use crate::backend::{Event, Metric, MetricsBackend};
use crate::summary::{MeasurementSummary, ScenarioOutcome, ScenarioResult};
use std::sync::Arc;

/// Consumer of completed scenarios.
#[async_trait::async_trait]
pub trait ScenarioReporter: Send + Sync {
    async fn report(&self, outcome: &ScenarioOutcome);
}

/// Sends failure events and latency gauges to Datadog.
///
/// Every delivery problem is logged and swallowed so that one bad or
/// undeliverable record never suppresses the others.
pub struct DatadogReporter {
    metric_prefix: String,
    backend: Arc<dyn MetricsBackend>,
}

impl DatadogReporter {
    pub fn new(metric_prefix: impl Into<String>, backend: Arc<dyn MetricsBackend>) -> Self {
        Self {
            metric_prefix: metric_prefix.into(),
            backend,
        }
    }

    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }

    async fn report_failure(&self, outcome: &ScenarioOutcome) {
        let event = Event {
            title: format!("{}-test-failure", self.metric_prefix),
            text: outcome.description(),
            tags: vec![self.metric_prefix.clone()],
        };

        if let Err(e) = self.backend.post_event(&event).await {
            tracing::error!(
                metric = "failevent",
                prefix = %self.metric_prefix,
                error = %e,
                "failed-sending-events-to-datadog"
            );
        }
    }

    async fn report_measurement(&self, summary: &MeasurementSummary, timestamp: f64) {
        if summary.metric_name.is_empty() {
            tracing::error!(prefix = %self.metric_prefix, "failed-blank-metric-name");
            return;
        }

        let Some(metrics) = self.series_for(summary, timestamp) else {
            tracing::error!(
                metric = %summary.metric_name,
                prefix = %self.metric_prefix,
                "failed-empty-measurement"
            );
            return;
        };

        tracing::info!(
            metric = %summary.metric_name,
            prefix = %self.metric_prefix,
            "sending-metrics-to-datadog"
        );
        if let Err(e) = self.backend.post_metrics(&metrics).await {
            tracing::error!(
                metric = %summary.metric_name,
                prefix = %self.metric_prefix,
                error = %e,
                "failed-sending-metrics-to-datadog"
            );
            return;
        }
        tracing::info!(
            metric = %summary.metric_name,
            prefix = %self.metric_prefix,
            "sending-metrics-to-datadog-complete"
        );
    }

    /// Slowest, fastest and average series for `summary`, or `None` without samples.
    fn series_for(&self, summary: &MeasurementSummary, timestamp: f64) -> Option<Vec<Metric>> {
        let slowest = summary.largest()?;
        let fastest = summary.smallest()?;
        let average = summary.average()?;

        let series = |suffix: &str, value: f64| Metric {
            metric: format!("{}.{}-{}", self.metric_prefix, summary.metric_name, suffix),
            points: vec![(timestamp, value)],
        };

        Some(vec![
            series("slowest", slowest),
            series("fastest", fastest),
            series("average", average),
        ])
    }
}

#[async_trait::async_trait]
impl ScenarioReporter for DatadogReporter {
    async fn report(&self, outcome: &ScenarioOutcome) {
        match &outcome.result {
            ScenarioResult::Failed { .. } => self.report_failure(outcome).await,
            ScenarioResult::Passed { measurements } => {
                for summary in measurements {
                    let timestamp = chrono::Utc::now().timestamp() as f64;
                    self.report_measurement(summary, timestamp).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    /// Log output written by a subscriber installed for the current thread.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn count(&self, message: &str) -> usize {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.split_whitespace().any(|word| word == message))
                .count()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    #[derive(Default)]
    struct RecordingBackend {
        events: Mutex<Vec<Event>>,
        metric_calls: Mutex<Vec<Vec<Metric>>>,
        fail_metrics_for: Option<String>,
        fail_events: bool,
    }

    #[async_trait::async_trait]
    impl MetricsBackend for RecordingBackend {
        async fn post_event(&self, event: &Event) -> Result<(), BackendError> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail_events {
                return Err(BackendError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(())
        }

        async fn post_metrics(&self, metrics: &[Metric]) -> Result<(), BackendError> {
            self.metric_calls.lock().unwrap().push(metrics.to_vec());
            if let Some(name) = &self.fail_metrics_for {
                if metrics.iter().any(|m| m.metric.contains(name.as_str())) {
                    return Err(BackendError::Status {
                        status: 500,
                        body: "boom".to_string(),
                    });
                }
            }
            Ok(())
        }
    }

    fn texts() -> Vec<String> {
        vec!["creating containers".to_string(), "create latency".to_string()]
    }

    #[tokio::test]
    async fn test_passed_measurement_emits_three_series() {
        let backend = Arc::new(RecordingBackend::default());
        let reporter = DatadogReporter::new("prefix", backend.clone());

        let outcome = ScenarioOutcome::passed(
            texts(),
            vec![MeasurementSummary::new("latency", vec![10.0, 20.0, 30.0])],
        );
        reporter.report(&outcome).await;

        let calls = backend.metric_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let names: Vec<&str> = calls[0].iter().map(|m| m.metric.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "prefix.latency-slowest",
                "prefix.latency-fastest",
                "prefix.latency-average"
            ]
        );
        assert_eq!(calls[0][0].points[0].1, 30.0);
        assert_eq!(calls[0][1].points[0].1, 10.0);
        assert_eq!(calls[0][2].points[0].1, 20.0);
        assert!(backend.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_series_share_one_timestamp() {
        let backend = Arc::new(RecordingBackend::default());
        let reporter = DatadogReporter::new("prefix", backend.clone());

        let outcome = ScenarioOutcome::passed(
            texts(),
            vec![MeasurementSummary::new("latency", vec![1.0])],
        );
        reporter.report(&outcome).await;

        let calls = backend.metric_calls.lock().unwrap();
        let ts = calls[0][0].points[0].0;
        assert!(ts > 0.0);
        assert!(calls[0].iter().all(|m| m.points[0].0 == ts));
    }

    #[tokio::test]
    async fn test_blank_metric_name_is_skipped() {
        let (logs, _guard) = capture_logs();
        let backend = Arc::new(RecordingBackend::default());
        let reporter = DatadogReporter::new("prefix", backend.clone());

        let outcome =
            ScenarioOutcome::passed(texts(), vec![MeasurementSummary::new("", vec![1.0])]);
        reporter.report(&outcome).await;

        assert!(backend.metric_calls.lock().unwrap().is_empty());
        assert!(backend.events.lock().unwrap().is_empty());
        assert_eq!(logs.count("failed-blank-metric-name"), 1);
        assert_eq!(logs.count("sending-metrics-to-datadog"), 0);
    }

    #[tokio::test]
    async fn test_summary_without_samples_is_skipped() {
        let (logs, _guard) = capture_logs();
        let backend = Arc::new(RecordingBackend::default());
        let reporter = DatadogReporter::new("prefix", backend.clone());

        let outcome = ScenarioOutcome::passed(
            texts(),
            vec![
                MeasurementSummary::new("empty", vec![]),
                MeasurementSummary::new("full", vec![2.0]),
            ],
        );
        reporter.report(&outcome).await;

        let calls = backend.metric_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].metric, "prefix.full-slowest");
        assert_eq!(logs.count("failed-empty-measurement"), 1);
        assert_eq!(logs.count("sending-metrics-to-datadog-complete"), 1);
    }

    #[tokio::test]
    async fn test_failed_scenario_emits_single_event() {
        let backend = Arc::new(RecordingBackend::default());
        let reporter = DatadogReporter::new("prefix", backend.clone());

        reporter
            .report(&ScenarioOutcome::failed(texts(), "too slow"))
            .await;

        let events = backend.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "prefix-test-failure");
        assert_eq!(events[0].text, "creating containers - create latency");
        assert_eq!(events[0].tags, vec!["prefix".to_string()]);
        assert!(backend.metric_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_delivery_failure_is_not_fatal() {
        let (logs, _guard) = capture_logs();
        let backend = Arc::new(RecordingBackend {
            fail_events: true,
            ..Default::default()
        });
        let reporter = DatadogReporter::new("prefix", backend.clone());

        reporter
            .report(&ScenarioOutcome::failed(texts(), "too slow"))
            .await;

        assert_eq!(backend.events.lock().unwrap().len(), 1);
        assert_eq!(logs.count("failed-sending-events-to-datadog"), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_block_next_summary() {
        let (logs, _guard) = capture_logs();
        let backend = Arc::new(RecordingBackend {
            fail_metrics_for: Some("first".to_string()),
            ..Default::default()
        });
        let reporter = DatadogReporter::new("prefix", backend.clone());

        let outcome = ScenarioOutcome::passed(
            texts(),
            vec![
                MeasurementSummary::new("first", vec![1.0]),
                MeasurementSummary::new("second", vec![2.0]),
            ],
        );
        reporter.report(&outcome).await;

        let calls = backend.metric_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1][0].metric, "prefix.second-slowest");
        assert_eq!(logs.count("failed-sending-metrics-to-datadog"), 1);
        assert_eq!(logs.count("sending-metrics-to-datadog"), 2);
        assert_eq!(logs.count("sending-metrics-to-datadog-complete"), 1);
    }
}
