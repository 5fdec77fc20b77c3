use bon::Builder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::pool::{BoundedPool, Job, WorkerPool};
use crate::binding::{BindingKey, Registry};
use crate::config::Config;
use crate::observability::DispatchMetrics;
use crate::task::{
    AnyError, Args, DispatchResult, ExecutionResult, Handle, InvocationUnit, TaskError, UnitState,
};

/// Per-call dispatch options
#[derive(Debug, Clone, Default, Builder)]
pub struct ExecuteOptions {
    /// Deadline for each fan-out unit, measured from its submission
    pub timeout: Option<Duration>,
}

/// Resolves binding keys to handles and runs them
///
/// Exactly-one dispatch runs on the calling thread; fan-out dispatch submits
/// one unit per handle to the injected [`WorkerPool`] and waits for all of
/// them.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    pool: Arc<dyn WorkerPool>,
    metrics: Arc<DispatchMetrics>,
    default_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, pool: Arc<dyn WorkerPool>) -> Self {
        Self {
            registry,
            pool,
            metrics: Arc::new(DispatchMetrics::new()),
            default_timeout: None,
        }
    }

    /// Fresh registry plus a [`BoundedPool`] sized from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(Registry::new()),
            Arc::new(BoundedPool::from_config(&config.pool)),
        )
        .with_default_timeout(config.dispatch.timeout())
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Timeout applied by [`Dispatcher::execute_all`] when no options are given
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn register(&self, key: BindingKey, handle: Handle) -> Handle {
        self.registry.register(key, handle)
    }

    /// Run the single handle bound to `key` on the calling thread.
    ///
    /// Fails with `LookupNotFound` / `AmbiguousLookup` before anything runs;
    /// a failure raised by the handle is returned as this call's error.
    pub fn execute_one(&self, key: &BindingKey, args: Args) -> Result<Value, TaskError> {
        self.metrics.dispatch_one();

        let handle = self.registry.lookup_exactly_one(key).inspect_err(|e| {
            self.metrics.lookup_failed();
            debug!(key = %key, code = e.code(), error = %e, "Exactly-one lookup failed");
        })?;

        debug!(key = %key, handle = %handle.id(), "Dispatching to single handle");
        let outcome = handle.with_args(args).run();
        self.metrics.record(&outcome);
        if let Some(e) = outcome.error() {
            log_unit_failure(key, handle.id().function(), e);
        }
        outcome.into_result()
    }

    pub fn execute_one_as<T: DeserializeOwned>(
        &self,
        key: &BindingKey,
        args: Args,
    ) -> Result<T, TaskError> {
        let value = self.execute_one(key, args)?;
        serde_json::from_value(value).map_err(TaskError::ResultDecode)
    }

    /// Fan out to every handle bound to `key` using the default timeout
    pub async fn execute_all(
        &self,
        key: &BindingKey,
        args: Args,
    ) -> Result<Vec<DispatchResult<Value>>, TaskError> {
        let options = ExecuteOptions::builder()
            .maybe_timeout(self.default_timeout)
            .build();
        self.execute_all_with(key, args, options).await
    }

    /// Fan out to every handle bound to `key`.
    ///
    /// Returns one result per handle in lookup-snapshot order, which is not
    /// registration order. Every unit yields a result: failures, timeouts and
    /// pool rejections are recorded per unit and never abort siblings.
    pub async fn execute_all_with(
        &self,
        key: &BindingKey,
        args: Args,
        options: ExecuteOptions,
    ) -> Result<Vec<DispatchResult<Value>>, TaskError> {
        self.metrics.dispatch_all();

        let handles = self.registry.lookup(key);
        if handles.is_empty() {
            self.metrics.lookup_failed();
            debug!(key = %key, "Fan-out lookup found no handles");
            return Err(TaskError::LookupNotFound(key.clone()));
        }

        let dispatch_id = Uuid::now_v7();
        info!(
            %dispatch_id,
            key = %key,
            handles = handles.len(),
            timeout = ?options.timeout,
            "Fan-out dispatch"
        );

        let units = handles
            .iter()
            .map(|handle| handle.with_args(args.clone()))
            .collect();
        let outcomes = fan_out(units, self.pool.as_ref(), options.timeout).await;

        let results: Vec<_> = handles
            .into_iter()
            .zip(outcomes)
            .map(|(handle, (outcome, elapsed))| {
                self.metrics.record(&outcome);
                if let Some(e) = outcome.error() {
                    log_unit_failure(key, handle.id().function(), e);
                }
                DispatchResult::new(key.clone(), handle.id().clone(), outcome, elapsed)
            })
            .collect();

        let failed = results.iter().filter(|result| !result.is_success()).count();
        info!(
            %dispatch_id,
            key = %key,
            succeeded = results.len() - failed,
            failed,
            "Fan-out dispatch complete"
        );

        Ok(results)
    }

    pub async fn execute_all_as<T: DeserializeOwned>(
        &self,
        key: &BindingKey,
        args: Args,
    ) -> Result<Vec<DispatchResult<T>>, TaskError> {
        let results = self.execute_all(key, args).await?;
        Ok(results.into_iter().map(DispatchResult::decode).collect())
    }
}

/// Caller mistakes (bad key or arguments) stay at debug; body failures warn
fn log_unit_failure(key: &BindingKey, function: &str, error: &TaskError) {
    if error.is_fail_fast() {
        debug!(key = %key, function, code = error.code(), error = %error, "Unit rejected before running");
    } else {
        warn!(key = %key, function, code = error.code(), error = %error, "Unit failed");
    }
}

/// Run ad-hoc invocation units on `pool`, one outcome per unit in input order
pub async fn execute_units(
    units: Vec<InvocationUnit>,
    pool: &dyn WorkerPool,
    timeout: Option<Duration>,
) -> Vec<ExecutionResult<Value>> {
    fan_out(units, pool, timeout)
        .await
        .into_iter()
        .map(|(outcome, _)| outcome)
        .collect()
}

async fn fan_out(
    units: Vec<InvocationUnit>,
    pool: &dyn WorkerPool,
    timeout: Option<Duration>,
) -> Vec<(ExecutionResult<Value>, Duration)> {
    let pending = units
        .into_iter()
        .map(|unit| run_on_pool(unit, pool, timeout));
    futures::future::join_all(pending).await
}

async fn run_on_pool(
    unit: InvocationUnit,
    pool: &dyn WorkerPool,
    timeout: Option<Duration>,
) -> (ExecutionResult<Value>, Duration) {
    let function = unit.handle().function_name().to_string();
    let started = Instant::now();
    debug!(function = %function, state = ?UnitState::Pending, "Submitting unit");

    let outcome = match timeout {
        // a pool may run the job inside `submit`, so an outcome can arrive late
        Some(limit) => match tokio::time::timeout(limit, submit_and_wait(unit, pool)).await {
            Ok(outcome) if started.elapsed() <= limit => outcome,
            _ => {
                warn!(
                    function = %function,
                    timeout = ?limit,
                    "Unit exceeded its deadline; the work is not cancelled"
                );
                ExecutionResult::Failure(TaskError::TimeoutExceeded {
                    function,
                    timeout: limit,
                })
            }
        },
        None => submit_and_wait(unit, pool).await,
    };

    debug!(
        state = ?outcome.state(),
        code = outcome.error().map(TaskError::code),
        "Unit finished"
    );
    (outcome, started.elapsed())
}

async fn submit_and_wait(unit: InvocationUnit, pool: &dyn WorkerPool) -> ExecutionResult<Value> {
    let function = unit.handle().function_name().to_string();
    let job: Job = Box::new(move || {
        debug!(function = %unit.handle().function_name(), state = ?UnitState::Running, "Unit running");
        unit.run()
    });

    let receiver = match pool.submit(job).await {
        Ok(receiver) => receiver,
        Err(source) => {
            return ExecutionResult::Failure(TaskError::PoolRejected { function, source });
        }
    };

    match receiver.await {
        Ok(outcome) => outcome,
        Err(_) => {
            let source: AnyError = "worker dropped the unit before producing a result".into();
            ExecutionResult::Failure(TaskError::InvocationFailure { function, source })
        }
    }
}
