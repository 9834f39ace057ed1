//! Conditional expectations.
//!
//! Lets a scenario keep recording and reporting its timings while its
//! latency assertion is switched off (`IGNORE_PERF_EXPECTATIONS`).

/// Run `assertion` only when `enabled`.
pub fn run_if<T>(assertion: impl FnOnce() -> T, enabled: bool) -> Option<T> {
    if enabled {
        Some(assertion())
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectationGate {
    enforce: bool,
}

impl ExpectationGate {
    pub fn new(ignore_perf_expectations: bool) -> Self {
        Self {
            enforce: !ignore_perf_expectations,
        }
    }

    pub fn enforcing(&self) -> bool {
        self.enforce
    }

    /// Evaluate `expectation` when enforcing; otherwise it passes.
    pub fn check<E>(&self, expectation: impl FnOnce() -> Result<(), E>) -> Result<(), E> {
        run_if(expectation, self.enforce).unwrap_or(Ok(()))
    }
}
