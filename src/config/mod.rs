//! Suite configuration.
//!
//! Everything is read once at startup, from flags or the environment, and
//! turned into an immutable [`SuiteConfig`] that is passed by reference to
//! every component.

pub mod duration;

use clap::Parser;
use perf_reporter::datadog::DEFAULT_DATADOG_URL;
use perf_reporter::DatadogCredentials;
use std::time::Duration;

pub use duration::parse_duration;

/// Preheat total used when `PREHEAT_SERVER` is set but not a number.
pub const DEFAULT_PREHEAT_TOTAL: u64 = 30_000;

#[derive(Parser, Clone, Debug)]
#[command(name = "garden-perf")]
#[command(about = "Performance acceptance tests for a Garden container server")]
#[command(version)]
pub struct SuiteOpts {
    /// Garden server host name or IP address
    #[arg(long, env = "GARDEN_ADDRESS", default_value = "127.0.0.1")]
    pub garden_address: String,

    /// Garden server port
    #[arg(long, env = "GARDEN_PORT", default_value_t = 7777)]
    pub garden_port: u16,

    /// Number of containers to create and destroy before measuring (unset or 0 skips)
    #[arg(long, env = "PREHEAT_SERVER")]
    pub preheat_server: Option<String>,

    /// Record metrics even when a latency expectation is not met
    #[arg(
        long,
        env = "IGNORE_PERF_EXPECTATIONS",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub ignore_perf_expectations: Option<String>,

    /// Datadog API key (reporting is disabled without both keys)
    #[arg(long, env = "DATADOG_API_KEY", hide_env_values = true)]
    pub datadog_api_key: Option<String>,

    /// Datadog application key
    #[arg(long, env = "DATADOG_APP_KEY", hide_env_values = true)]
    pub datadog_app_key: Option<String>,

    /// Prefix for every metric and event sent to Datadog
    #[arg(long, env = "DATADOG_METRIC_PREFIX", default_value = "gpats")]
    pub datadog_metric_prefix: String,

    /// Datadog API base URL
    #[arg(long, env = "DATADOG_URL", default_value = DEFAULT_DATADOG_URL)]
    pub datadog_url: String,

    /// Samples recorded per scenario (at least one)
    #[arg(
        long,
        env = "PERF_SAMPLES",
        default_value_t = 10,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub samples: usize,

    /// Delay between DNS lookup attempts (e.g. "5s", "500ms")
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub resolve_interval: Duration,

    /// Give up resolving the Garden host after this long
    #[arg(long, default_value = "1m", value_parser = parse_duration)]
    pub resolve_timeout: Duration,
}

/// Datadog reporting settings.
#[derive(Debug, Clone)]
pub struct DatadogSettings {
    pub credentials: DatadogCredentials,
    pub metric_prefix: String,
    pub url: String,
}

/// How long and how often to retry host resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    pub retry_interval: Duration,
    pub deadline: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(5),
            deadline: Duration::from_secs(60),
        }
    }
}

/// Immutable configuration of one suite run.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub garden_host: String,
    pub garden_port: u16,
    /// Zero disables preheating.
    pub preheat_total: u64,
    pub ignore_perf_expectations: bool,
    /// `None` disables reporting entirely.
    pub datadog: Option<DatadogSettings>,
    pub samples: usize,
    pub resolver: ResolverSettings,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            garden_host: "127.0.0.1".to_string(),
            garden_port: 7777,
            preheat_total: 0,
            ignore_perf_expectations: false,
            datadog: None,
            samples: 10,
            resolver: ResolverSettings::default(),
        }
    }
}

impl From<SuiteOpts> for SuiteConfig {
    fn from(opts: SuiteOpts) -> Self {
        let datadog = match (opts.datadog_api_key, opts.datadog_app_key) {
            (Some(api_key), Some(app_key)) if !api_key.is_empty() && !app_key.is_empty() => {
                Some(DatadogSettings {
                    credentials: DatadogCredentials { api_key, app_key },
                    metric_prefix: opts.datadog_metric_prefix,
                    url: opts.datadog_url,
                })
            }
            _ => None,
        };

        Self {
            garden_host: opts.garden_address,
            garden_port: opts.garden_port,
            preheat_total: parse_preheat_total(opts.preheat_server.as_deref()),
            ignore_perf_expectations: is_set(opts.ignore_perf_expectations.as_deref()),
            datadog,
            samples: opts.samples,
            resolver: ResolverSettings {
                retry_interval: opts.resolve_interval,
                deadline: opts.resolve_timeout,
            },
        }
    }
}

/// Unset, empty or non-positive disables preheating; anything that is not
/// an integer falls back to [`DEFAULT_PREHEAT_TOTAL`].
pub fn parse_preheat_total(value: Option<&str>) -> u64 {
    match value.map(str::trim) {
        None | Some("") => 0,
        Some(v) => match v.parse::<i64>() {
            Ok(total) => u64::try_from(total).unwrap_or(0),
            Err(_) => DEFAULT_PREHEAT_TOTAL,
        },
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}
