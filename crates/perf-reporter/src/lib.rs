//! Reporting of performance scenario results.
//!
//! Scenarios produce a [`ScenarioOutcome`]; a [`ScenarioReporter`] consumes it.
//! The [`DatadogReporter`] turns failures into events and every
//! [`MeasurementSummary`] of a passed scenario into three gauge series
//! (slowest, fastest, average) sent through a [`MetricsBackend`].

pub mod backend;
pub mod datadog;
pub mod reporter;
pub mod summary;
pub mod table;

pub use backend::{BackendError, DataPoint, Event, Metric, MetricsBackend};
pub use datadog::{DatadogClient, DatadogCredentials};
pub use reporter::{DatadogReporter, ScenarioReporter};
pub use summary::{MeasurementSummary, ScenarioOutcome, ScenarioResult};
pub use table::render_results_table;
