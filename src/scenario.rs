//! Measured performance scenarios.
//!
//! Each scenario times one lifecycle operation a number of times, turns the
//! samples into a [`MeasurementSummary`] and checks an average-latency
//! expectation through the [`ExpectationGate`]. Containers a scenario
//! creates are destroyed by the scenario itself.

use crate::gate::ExpectationGate;
use anyhow::Context;
use garden_client::{ContainerSpec, Handle, LifecycleClient, Properties};
use perf_reporter::{MeasurementSummary, ScenarioOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Time `create` calls.
    Create,
    /// Time `destroy` calls on freshly created containers.
    Destroy,
    /// Time listing while `population` containers exist.
    List { population: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expectation {
    pub max_average: Duration,
}

impl Expectation {
    pub fn verify(&self, summary: &MeasurementSummary) -> Result<(), String> {
        let average = summary.average().unwrap_or_default();
        if average > self.max_average.as_secs_f64() {
            return Err(format!(
                "{}: average {:.3}s exceeded {:?}",
                summary.metric_name, average, self.max_average
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub context: String,
    pub name: String,
    pub metric_name: String,
    pub kind: ScenarioKind,
    pub expectation: Expectation,
}

impl Scenario {
    pub fn new(
        context: impl Into<String>,
        name: impl Into<String>,
        metric_name: impl Into<String>,
        kind: ScenarioKind,
        max_average: Duration,
    ) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
            metric_name: metric_name.into(),
            kind,
            expectation: Expectation { max_average },
        }
    }

    pub fn texts(&self) -> Vec<String> {
        vec![self.context.clone(), self.name.clone()]
    }
}

/// Scenarios run by a default suite, in order.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "creating containers",
            "measures create latency",
            "create-container",
            ScenarioKind::Create,
            Duration::from_secs(2),
        ),
        Scenario::new(
            "destroying containers",
            "measures destroy latency",
            "destroy-container",
            ScenarioKind::Destroy,
            Duration::from_secs(2),
        ),
        Scenario::new(
            "listing containers",
            "measures list latency with 50 live containers",
            "list-containers",
            ScenarioKind::List { population: 50 },
            Duration::from_secs(1),
        ),
    ]
}

pub struct ScenarioRunner {
    client: Arc<dyn LifecycleClient>,
    gate: ExpectationGate,
    samples: usize,
}

impl ScenarioRunner {
    pub fn new(client: Arc<dyn LifecycleClient>, gate: ExpectationGate, samples: usize) -> Self {
        Self {
            client,
            gate,
            samples,
        }
    }

    pub async fn run(&self, scenario: &Scenario) -> ScenarioOutcome {
        tracing::info!("Running scenario: {} - {}", scenario.context, scenario.name);

        let samples = match self.measure(scenario.kind).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::error!("Scenario '{}' failed: {:#}", scenario.name, e);
                return ScenarioOutcome::failed(scenario.texts(), format!("{e:#}"));
            }
        };

        let summary = MeasurementSummary::new(&scenario.metric_name, samples);
        if let Err(message) = self.gate.check(|| scenario.expectation.verify(&summary)) {
            tracing::error!("Scenario '{}' missed its expectation: {}", scenario.name, message);
            return ScenarioOutcome::failed(scenario.texts(), message);
        }

        ScenarioOutcome::passed(scenario.texts(), vec![summary])
    }

    async fn measure(&self, kind: ScenarioKind) -> anyhow::Result<Vec<f64>> {
        match kind {
            ScenarioKind::Create => self.measure_create().await,
            ScenarioKind::Destroy => self.measure_destroy().await,
            ScenarioKind::List { population } => self.measure_list(population).await,
        }
    }

    async fn measure_create(&self) -> anyhow::Result<Vec<f64>> {
        let spec = ContainerSpec::default();
        let mut handles = Vec::with_capacity(self.samples);
        let mut samples = Vec::with_capacity(self.samples);

        let result: anyhow::Result<()> = async {
            for _ in 0..self.samples {
                let start = Instant::now();
                let handle = self
                    .client
                    .create(&spec)
                    .await
                    .context("Failed to create container")?;
                samples.push(start.elapsed().as_secs_f64());
                handles.push(handle);
            }
            Ok(())
        }
        .await;

        self.destroy_quietly(&handles).await;
        result.map(|_| samples)
    }

    async fn measure_destroy(&self) -> anyhow::Result<Vec<f64>> {
        let handles = self.create_many(self.samples).await?;
        let mut samples = Vec::with_capacity(handles.len());

        for (i, handle) in handles.iter().enumerate() {
            let start = Instant::now();
            if let Err(e) = self.client.destroy(handle).await {
                self.destroy_quietly(&handles[i + 1..]).await;
                return Err(e).with_context(|| format!("Failed to destroy container {handle}"));
            }
            samples.push(start.elapsed().as_secs_f64());
        }

        Ok(samples)
    }

    async fn measure_list(&self, population: usize) -> anyhow::Result<Vec<f64>> {
        let handles = self.create_many(population).await?;
        let mut samples = Vec::with_capacity(self.samples);

        let result: anyhow::Result<()> = async {
            for _ in 0..self.samples {
                let start = Instant::now();
                self.client
                    .containers(&Properties::new())
                    .await
                    .context("Failed to list containers")?;
                samples.push(start.elapsed().as_secs_f64());
            }
            Ok(())
        }
        .await;

        self.destroy_quietly(&handles).await;
        result.map(|_| samples)
    }

    /// Create `count` containers; on failure the ones already created are destroyed.
    async fn create_many(&self, count: usize) -> anyhow::Result<Vec<Handle>> {
        let spec = ContainerSpec::default();
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            match self.client.create(&spec).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    self.destroy_quietly(&handles).await;
                    return Err(e).context("Failed to create container");
                }
            }
        }
        Ok(handles)
    }

    async fn destroy_quietly(&self, handles: &[Handle]) {
        for handle in handles {
            if let Err(e) = self.client.destroy(handle).await {
                tracing::warn!("Failed to destroy container {}: {}", handle, e);
            }
        }
    }
}
