//! Command-line entry point for garden-perf
//!
//! Every flag can also be set through the environment variable shown in
//! `--help` (`GARDEN_ADDRESS`, `GARDEN_PORT`, `PREHEAT_SERVER`,
//! `IGNORE_PERF_EXPECTATIONS`, `DATADOG_API_KEY`, `DATADOG_APP_KEY`, ...).

use clap::Parser;
use garden_perf::connect::{connect_to_garden, datadog_reporter};
use garden_perf::{Suite, SuiteConfig, SuiteOpts};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SuiteConfig::from(SuiteOpts::parse());

    let (_endpoint, client) = connect_to_garden(&config).await?;
    let reporter = datadog_reporter(&config)?;

    let report = Suite::new(&config, Arc::new(client), reporter)
        .run()
        .await?;

    if let Some(preheat) = &report.preheat {
        tracing::info!(
            "Preheated with {} containers in {} batches",
            preheat.containers_created,
            preheat.batches
        );
    }
    println!("{}", report.results_table());

    report.final_cleanup()?;
    if !report.passed() {
        anyhow::bail!(
            "{} of {} scenarios failed",
            report.failed_count(),
            report.outcomes.len()
        );
    }

    Ok(())
}
