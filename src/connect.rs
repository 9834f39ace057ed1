use crate::config::SuiteConfig;
use crate::resolver::{Resolver, TargetEndpoint};
use anyhow::Context;
use garden_client::HttpGardenClient;
use perf_reporter::{DatadogClient, DatadogReporter, ScenarioReporter};
use std::sync::Arc;

// Resolve the Garden host once and connect to the resolved address
pub async fn connect_to_garden(
    config: &SuiteConfig,
) -> anyhow::Result<(TargetEndpoint, HttpGardenClient)> {
    let resolver = Resolver::system(config.resolver);
    let endpoint = TargetEndpoint::resolve(&resolver, &config.garden_host, config.garden_port)
        .await
        .context("Garden endpoint is unresolved")?;

    let client = HttpGardenClient::new(&endpoint.address())
        .with_context(|| format!("Failed to create Garden client for {}", endpoint.address()))?;

    tracing::info!(
        "Using Garden at {} (host {})",
        endpoint.address(),
        endpoint.host
    );
    Ok((endpoint, client))
}

// Datadog reporter, or None when reporting is disabled
pub fn datadog_reporter(
    config: &SuiteConfig,
) -> anyhow::Result<Option<Arc<dyn ScenarioReporter>>> {
    let Some(settings) = &config.datadog else {
        tracing::info!("Datadog keys not set, metrics will not be reported");
        return Ok(None);
    };

    let backend = DatadogClient::new(&settings.url, settings.credentials.clone())
        .context("Failed to create Datadog client")?;
    let reporter = DatadogReporter::new(settings.metric_prefix.clone(), Arc::new(backend));
    Ok(Some(Arc::new(reporter)))
}
