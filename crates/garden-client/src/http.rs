//! HTTP adapter for the Garden REST API.

use crate::error::ClientError;
use crate::types::{Container, ContainerSpec, Handle, Properties};
use crate::LifecycleClient;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize)]
struct CreateResponse {
    handle: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    handles: Vec<String>,
}

/// Garden client speaking HTTP to `address` (`host:port`).
#[derive(Clone)]
pub struct HttpGardenClient {
    base_url: String,
    client: Client,
}

impl HttpGardenClient {
    pub fn new(address: &str) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url(address),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn base_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", address.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl LifecycleClient for HttpGardenClient {
    async fn create(&self, spec: &ContainerSpec) -> Result<Handle, ClientError> {
        let url = format!("{}/containers", self.base_url);
        let response = self.client.post(&url).json(spec).send().await?;
        let response = Self::check(response).await?;
        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        tracing::debug!("Created container {}", created.handle);
        Ok(Handle::new(created.handle))
    }

    async fn destroy(&self, handle: &Handle) -> Result<(), ClientError> {
        let url = format!("{}/containers/{}", self.base_url, handle);
        let response = self.client.delete(&url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn containers(&self, filter: &Properties) -> Result<Vec<Container>, ClientError> {
        let url = format!("{}/containers", self.base_url);
        let response = self.client.get(&url).query(filter).send().await?;
        let response = Self::check(response).await?;
        let listed: ListResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(listed
            .handles
            .into_iter()
            .map(|h| Container::new(Handle::new(h)))
            .collect())
    }
}
