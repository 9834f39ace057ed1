//! Metrics backend interface.

use serde::Serialize;
use thiserror::Error;

/// Errors returned while delivering events or metrics.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metrics backend returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// A discrete event, used for scenario failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
}

/// `(unix timestamp, value)` pair.
pub type DataPoint = (f64, f64);

/// A named series of data points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub metric: String,
    pub points: Vec<DataPoint>,
}

/// Transport for events and metric series.
#[async_trait::async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn post_event(&self, event: &Event) -> Result<(), BackendError>;

    async fn post_metrics(&self, metrics: &[Metric]) -> Result<(), BackendError>;
}
