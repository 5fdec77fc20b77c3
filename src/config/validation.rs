use super::models::Config;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Upper bound on pool workers; matches tokio's default blocking thread cap
pub const MAX_WORKERS: usize = 512;

/// Upper bound on units waiting for a worker
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Worker pool needs at least one worker")]
    NoWorkers,

    #[error("workers ({actual}) exceeds limit of {limit}")]
    TooManyWorkers { actual: usize, limit: usize },

    #[error("queue_capacity ({actual}) exceeds limit of {limit}")]
    QueueTooLarge { actual: usize, limit: usize },

    #[error("dispatch.default_timeout must be positive")]
    ZeroTimeout,

    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_pool(config)?;
    validate_dispatch(config)?;
    validate_telemetry(config)?;
    Ok(())
}

fn validate_pool(config: &Config) -> Result<(), ValidationError> {
    let pool = &config.pool;

    if pool.workers == 0 {
        return Err(ValidationError::NoWorkers);
    }

    if pool.workers > MAX_WORKERS {
        return Err(ValidationError::TooManyWorkers {
            actual: pool.workers,
            limit: MAX_WORKERS,
        });
    }

    if pool.queue_capacity > MAX_QUEUE_CAPACITY {
        return Err(ValidationError::QueueTooLarge {
            actual: pool.queue_capacity,
            limit: MAX_QUEUE_CAPACITY,
        });
    }

    Ok(())
}

fn validate_dispatch(config: &Config) -> Result<(), ValidationError> {
    if config
        .dispatch
        .default_timeout
        .is_some_and(|timeout| timeout.is_zero())
    {
        return Err(ValidationError::ZeroTimeout);
    }

    Ok(())
}

fn validate_telemetry(config: &Config) -> Result<(), ValidationError> {
    let filter = &config.telemetry.log_filter;

    if filter.trim().is_empty() {
        return Err(ValidationError::InvalidLogFilter {
            filter: filter.clone(),
            reason: "filter is empty".to_string(),
        });
    }

    EnvFilter::try_new(filter).map_err(|e| ValidationError::InvalidLogFilter {
        filter: filter.clone(),
        reason: e.to_string(),
    })?;

    Ok(())
}
