//! Garden performance acceptance tests
//!
//! Drives a Garden container server through concurrent create/destroy
//! load and reports latency measurements to Datadog.
//!
//! # Run sequence
//!
//! 1. Resolve the Garden host once, retrying flaky DNS until a deadline
//! 2. Destroy every leftover container (two parallel workers)
//! 3. Optionally preheat: batches of concurrent creates, each followed by a cleanup
//! 4. Run the measured scenarios and report each outcome
//!
//! # CLI Usage
//!
//! ```bash
//! # Measure against a local Garden without preheating
//! garden-perf --garden-address 127.0.0.1 --garden-port 7777
//!
//! # Preheat with 30000 create/destroy cycles and report to Datadog
//! PREHEAT_SERVER=30000 DATADOG_API_KEY=... DATADOG_APP_KEY=... garden-perf
//! ```

pub mod cleanup;
pub mod config;
pub mod connect;
pub mod fanout;
pub mod gate;
pub mod preheat;
pub mod resolver;
pub mod scenario;
pub mod suite;
pub mod testing;

pub use cleanup::{split_in_half, CleanupEngine, CleanupError};
pub use config::{SuiteConfig, SuiteOpts};
pub use gate::{run_if, ExpectationGate};
pub use preheat::{PreheatError, PreheatPlan, PreheatReport, Preheater};
pub use resolver::{HostLookup, ResolveError, Resolver, TargetEndpoint};
pub use scenario::{default_scenarios, Scenario, ScenarioKind, ScenarioRunner};
pub use suite::{Suite, SuiteReport};
