//! Observability: tracing setup and dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;
use crate::task::{ExecutionResult, TaskError, UnitState};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is a no-op.
pub fn init_tracing(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}

/// Counters for dispatch activity
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    dispatches_one: AtomicU64,
    dispatches_all: AtomicU64,
    lookups_failed: AtomicU64,
    units_succeeded: AtomicU64,
    units_failed: AtomicU64,
    units_timed_out: AtomicU64,
    units_rejected: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_one(&self) {
        self.dispatches_one.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "dispatches_one", "Metric incremented");
    }

    pub fn dispatch_all(&self) {
        self.dispatches_all.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "dispatches_all", "Metric incremented");
    }

    pub fn lookup_failed(&self) {
        self.lookups_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "lookups_failed", "Metric incremented");
    }

    /// Count a unit outcome under its terminal state
    pub fn record<T>(&self, outcome: &ExecutionResult<T>) {
        let counter = match outcome.state() {
            UnitState::Succeeded => &self.units_succeeded,
            UnitState::TimedOut => &self.units_timed_out,
            _ if matches!(outcome.error(), Some(TaskError::PoolRejected { .. })) => {
                &self.units_rejected
            }
            _ => &self.units_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatches_one: self.dispatches_one.load(Ordering::Relaxed),
            dispatches_all: self.dispatches_all.load(Ordering::Relaxed),
            lookups_failed: self.lookups_failed.load(Ordering::Relaxed),
            units_succeeded: self.units_succeeded.load(Ordering::Relaxed),
            units_failed: self.units_failed.load(Ordering::Relaxed),
            units_timed_out: self.units_timed_out.load(Ordering::Relaxed),
            units_rejected: self.units_rejected.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub dispatches_one: u64,
    pub dispatches_all: u64,
    pub lookups_failed: u64,
    pub units_succeeded: u64,
    pub units_failed: u64,
    pub units_timed_out: u64,
    pub units_rejected: u64,
}
