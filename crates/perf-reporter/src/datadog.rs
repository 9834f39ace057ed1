//! Datadog HTTP API adapter.

use crate::backend::{BackendError, Event, Metric, MetricsBackend};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_DATADOG_URL: &str = "https://api.datadoghq.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API key pair for the Datadog API.
#[derive(Clone)]
pub struct DatadogCredentials {
    pub api_key: String,
    pub app_key: String,
}

impl std::fmt::Debug for DatadogCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatadogCredentials")
            .field("api_key", &"***")
            .field("app_key", &"***")
            .finish()
    }
}

/// Posts events and gauge series to the Datadog v1 API.
pub struct DatadogClient {
    base_url: String,
    credentials: DatadogCredentials,
    client: Client,
}

impl DatadogClient {
    pub fn new(base_url: &str, credentials: DatadogCredentials) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    async fn post<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("DD-API-KEY", &self.credentials.api_key)
            .header("DD-APPLICATION-KEY", &self.credentials.app_key)
            .json(body)
            .send()
            .await?;
        check(response).await
    }
}

async fn check(response: Response) -> Result<(), BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

fn series_body(metrics: &[Metric]) -> Value {
    let series: Vec<Value> = metrics
        .iter()
        .map(|m| {
            json!({
                "metric": m.metric,
                "points": m.points.iter().map(|(ts, v)| json!([ts, v])).collect::<Vec<_>>(),
                "type": "gauge",
            })
        })
        .collect();
    json!({ "series": series })
}

#[async_trait::async_trait]
impl MetricsBackend for DatadogClient {
    async fn post_event(&self, event: &Event) -> Result<(), BackendError> {
        self.post("/api/v1/events", event).await
    }

    async fn post_metrics(&self, metrics: &[Metric]) -> Result<(), BackendError> {
        self.post("/api/v1/series", &series_body(metrics)).await
    }
}
