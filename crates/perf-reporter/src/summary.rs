//! Measurement summaries and scenario outcomes.

use serde::Serialize;

/// Latency samples recorded for one named metric during a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSummary {
    pub metric_name: String,
    /// Samples in recording order, in seconds.
    pub samples: Vec<f64>,
}

impl MeasurementSummary {
    pub fn new(metric_name: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            metric_name: metric_name.into(),
            samples,
        }
    }

    pub fn smallest(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn largest(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Result of a single scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioResult {
    Passed { measurements: Vec<MeasurementSummary> },
    Failed { message: String },
}

/// A completed scenario together with its hierarchical description.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// Description components, outermost first (e.g. context, then case).
    pub texts: Vec<String>,
    pub result: ScenarioResult,
}

impl ScenarioOutcome {
    pub fn passed(texts: Vec<String>, measurements: Vec<MeasurementSummary>) -> Self {
        Self {
            texts,
            result: ScenarioResult::Passed { measurements },
        }
    }

    pub fn failed(texts: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            texts,
            result: ScenarioResult::Failed {
                message: message.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.result, ScenarioResult::Failed { .. })
    }

    pub fn description(&self) -> String {
        self.texts.join(" - ")
    }
}
