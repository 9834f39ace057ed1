//! Suite sequencing.
//!
//! Cleanup → optional preheat → scenarios (each reported as it completes) →
//! final cleanup. Setup failures abort the run. Scenario failures and a
//! failed final cleanup are collected in the [`SuiteReport`] so the results
//! are never lost.

use crate::cleanup::{CleanupEngine, CleanupError};
use crate::config::SuiteConfig;
use crate::gate::ExpectationGate;
use crate::preheat::{PreheatPlan, PreheatReport, Preheater};
use crate::scenario::{default_scenarios, Scenario, ScenarioRunner};
use anyhow::Context;
use garden_client::LifecycleClient;
use perf_reporter::{render_results_table, ScenarioOutcome, ScenarioReporter};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub preheat: Option<PreheatReport>,
    pub outcomes: Vec<ScenarioOutcome>,
    /// Set when containers could not be removed after the scenarios.
    pub final_cleanup_error: Option<Arc<CleanupError>>,
}

impl SuiteReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn passed(&self) -> bool {
        self.failed_count() == 0 && self.final_cleanup_error.is_none()
    }

    /// The final cleanup failure as an error, if there was one.
    pub fn final_cleanup(&self) -> anyhow::Result<()> {
        match &self.final_cleanup_error {
            Some(e) => Err(anyhow::Error::new(Arc::clone(e)))
                .context("Failed to clean up containers after the run"),
            None => Ok(()),
        }
    }

    pub fn results_table(&self) -> String {
        render_results_table(&self.outcomes)
    }
}

pub struct Suite {
    client: Arc<dyn LifecycleClient>,
    reporter: Option<Arc<dyn ScenarioReporter>>,
    preheat_total: u64,
    plan: PreheatPlan,
    runner: ScenarioRunner,
    scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(
        config: &SuiteConfig,
        client: Arc<dyn LifecycleClient>,
        reporter: Option<Arc<dyn ScenarioReporter>>,
    ) -> Self {
        let gate = ExpectationGate::new(config.ignore_perf_expectations);
        if !gate.enforcing() {
            tracing::warn!("Performance expectations are ignored for this run");
        }

        Self {
            runner: ScenarioRunner::new(Arc::clone(&client), gate, config.samples),
            client,
            reporter,
            preheat_total: config.preheat_total,
            plan: PreheatPlan::default(),
            scenarios: default_scenarios(),
        }
    }

    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn with_preheat_plan(mut self, plan: PreheatPlan) -> Self {
        self.plan = plan;
        self
    }

    pub async fn run(&self) -> anyhow::Result<SuiteReport> {
        let cleanup = CleanupEngine::new(Arc::clone(&self.client));

        let destroyed = cleanup
            .cleanup()
            .await
            .context("Failed to clean up containers before the run")?;
        tracing::info!("Removed {} leftover containers", destroyed);

        let preheat = if self.preheat_total > 0 {
            let report = Preheater::new(Arc::clone(&self.client), self.plan)
                .preheat(self.preheat_total)
                .await
                .context("Failed to preheat the server")?;
            Some(report)
        } else {
            None
        };

        let mut outcomes = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            let outcome = self.runner.run(scenario).await;
            if let Some(reporter) = &self.reporter {
                reporter.report(&outcome).await;
            }
            outcomes.push(outcome);
        }

        let final_cleanup_error = match cleanup.cleanup().await {
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Failed to clean up containers after the run: {:#}", e);
                Some(Arc::new(e))
            }
        };

        Ok(SuiteReport {
            preheat,
            outcomes,
            final_cleanup_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioKind;
    use crate::testing::FakeGarden;
    use garden_client::Handle;
    use std::time::Duration;

    fn config(preheat_total: u64) -> SuiteConfig {
        SuiteConfig {
            preheat_total,
            samples: 2,
            ..SuiteConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_without_preheat() {
        let garden = Arc::new(FakeGarden::new());
        garden.seed(3);

        let report = Suite::new(&config(0), garden.clone(), None)
            .run()
            .await
            .unwrap();

        assert!(report.preheat.is_none());
        assert_eq!(report.outcomes.len(), 3);
        assert!(report.passed());
        assert_eq!(garden.live_count(), 0);
    }

    #[tokio::test]
    async fn test_run_with_preheat() {
        let garden = Arc::new(FakeGarden::new());

        let report = Suite::new(&config(20), garden.clone(), None)
            .with_scenarios(vec![])
            .run()
            .await
            .unwrap();

        let preheat = report.preheat.unwrap();
        assert_eq!(preheat.batches, 2);
        assert_eq!(garden.create_calls(), 20);
        assert_eq!(garden.live_count(), 0);
    }

    #[tokio::test]
    async fn test_setup_cleanup_failure_aborts() {
        let garden = Arc::new(FakeGarden::new());
        garden.fail_list(true);

        let err = Suite::new(&config(0), garden.clone(), None)
            .run()
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("before the run"));
        assert_eq!(garden.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_final_cleanup_failure_keeps_outcomes() {
        let garden = Arc::new(FakeGarden::new());
        // first container the destroy scenario creates
        let stuck = Handle::new("container-00000");
        garden.fail_destroy_of(stuck.clone());

        let scenario = Scenario::new(
            "destroying containers",
            "measures destroy latency",
            "destroy-container",
            ScenarioKind::Destroy,
            Duration::from_secs(5),
        );
        let report = Suite::new(&config(0), garden.clone(), None)
            .with_scenarios(vec![scenario])
            .run()
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(report.final_cleanup_error.is_some());
        assert!(!report.passed());
        assert!(report.results_table().contains("destroy latency"));
        assert!(garden.is_live(&stuck));

        let err = report.final_cleanup().unwrap_err();
        assert!(format!("{err:#}").starts_with(
            "Failed to clean up containers after the run: Failed to destroy container container-00000"
        ));
    }
}
