use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// What the worker pool does with a unit when every worker and queue slot is taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationPolicy {
    /// Run the unit on the caller lane; the submitter waits for it
    #[default]
    CallerRuns,
    /// Fail the unit with a pool rejection
    Reject,
    /// Wait for a queue slot
    Wait,
}

/// Worker pool used for fan-out dispatch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Units running at the same time
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Units admitted but waiting for a worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub saturation: SaturationPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            saturation: SaturationPolicy::default(),
        }
    }
}

fn default_workers() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    50
}

/// Dispatch defaults applied when a call does not set its own options
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Per-unit deadline for fan-out dispatch (e.g. "250ms", "2s")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout: Option<HumanDuration>,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.default_timeout.map(|timeout| timeout.as_duration())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
