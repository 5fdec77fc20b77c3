use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError, oneshot};
use tracing::{debug, warn};

use crate::config::{MAX_QUEUE_CAPACITY, MAX_WORKERS, PoolConfig, SaturationPolicy};
use crate::task::ExecutionResult;

/// Unit of work handed to a pool
pub type Job = Box<dyn FnOnce() -> ExecutionResult<Value> + Send + 'static>;

/// Receiver for the eventual outcome of a submitted job
pub type JobReceiver = oneshot::Receiver<ExecutionResult<Value>>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool saturated: {workers} workers busy and {queue_capacity} units queued")]
    Saturated {
        workers: usize,
        queue_capacity: usize,
    },

    #[error("worker pool is shut down")]
    Closed,
}

/// Submit-and-await work execution, injected into the dispatcher
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Accept `job` for execution and return a receiver for its outcome.
    ///
    /// Dropping the receiver does not stop the job; its outcome is discarded.
    async fn submit(&self, job: Job) -> Result<JobReceiver, PoolError>;
}

/// Worker pool with a fixed number of workers and a bounded queue
///
/// Jobs run on tokio's blocking thread pool. At most `workers` jobs run at a
/// time and at most `queue_capacity` more wait for a worker; what happens to
/// the next job is decided by the [`SaturationPolicy`].
///
/// Under `CallerRuns` an overflow job runs on the caller lane: one job at a
/// time, outside the worker set, and `submit` does not return until it is
/// done. Abandoning `submit` leaves the job running but stops waiting for it.
pub struct BoundedPool {
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    caller_lane: Arc<Semaphore>,
    worker_count: usize,
    queue_capacity: usize,
    saturation: SaturationPolicy,
}

impl BoundedPool {
    /// Sizes are clamped to `1..=MAX_WORKERS` and `0..=MAX_QUEUE_CAPACITY`
    pub fn new(workers: usize, queue_capacity: usize, saturation: SaturationPolicy) -> Self {
        let workers = workers.clamp(1, MAX_WORKERS);
        let queue_capacity = queue_capacity.min(MAX_QUEUE_CAPACITY);
        debug!(
            workers,
            queue_capacity,
            ?saturation,
            "Creating bounded worker pool"
        );

        Self {
            workers: Arc::new(Semaphore::new(workers)),
            admission: Arc::new(Semaphore::new(workers + queue_capacity)),
            caller_lane: Arc::new(Semaphore::new(1)),
            worker_count: workers,
            queue_capacity,
            saturation,
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.workers, config.queue_capacity, config.saturation)
    }

    /// Units currently admitted (running or queued)
    pub fn in_flight(&self) -> usize {
        self.worker_count + self.queue_capacity - self.admission.available_permits()
    }

    /// Stop admitting work; running and queued jobs still complete
    pub fn close(&self) {
        self.admission.close();
        self.caller_lane.close();
    }

    fn spawn(&self, admitted: OwnedSemaphorePermit, job: Job) -> JobReceiver {
        let (tx, rx) = oneshot::channel();
        let workers = Arc::clone(&self.workers);

        tokio::spawn(async move {
            let _admitted = admitted;
            let Ok(_running) = workers.acquire_owned().await else {
                warn!("Worker semaphore closed, dropping job");
                return;
            };

            match tokio::task::spawn_blocking(job).await {
                Ok(outcome) => {
                    if tx.send(outcome).is_err() {
                        debug!("Caller gave up on unit, late outcome discarded");
                    }
                }
                Err(e) => warn!(error = %e, "Blocking worker failed to complete job"),
            }
        });

        rx
    }
}

#[async_trait]
impl WorkerPool for BoundedPool {
    async fn submit(&self, job: Job) -> Result<JobReceiver, PoolError> {
        match Arc::clone(&self.admission).try_acquire_owned() {
            Ok(permit) => return Ok(self.spawn(permit, job)),
            Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
            Err(TryAcquireError::NoPermits) => {}
        }

        match self.saturation {
            SaturationPolicy::Reject => {
                warn!(
                    workers = self.worker_count,
                    queue_capacity = self.queue_capacity,
                    "Worker pool saturated, rejecting unit"
                );
                Err(PoolError::Saturated {
                    workers: self.worker_count,
                    queue_capacity: self.queue_capacity,
                })
            }
            SaturationPolicy::Wait => {
                debug!("Worker pool saturated, waiting for a queue slot");
                let permit = Arc::clone(&self.admission)
                    .acquire_owned()
                    .await
                    .map_err(|_| PoolError::Closed)?;
                Ok(self.spawn(permit, job))
            }
            SaturationPolicy::CallerRuns => {
                debug!("Worker pool saturated, running unit on the caller lane");
                let lane = Arc::clone(&self.caller_lane)
                    .acquire_owned()
                    .await
                    .map_err(|_| PoolError::Closed)?;

                let (tx, rx) = oneshot::channel();
                // the lane stays held until the job returns, even if the caller gives up
                let running = tokio::task::spawn_blocking(move || {
                    let _lane = lane;
                    job()
                });
                match running.await {
                    Ok(outcome) => {
                        let _ = tx.send(outcome);
                    }
                    Err(e) => warn!(error = %e, "Caller lane failed to complete job"),
                }
                Ok(rx)
            }
        }
    }
}

/// Pool without bounds: every job goes straight to tokio's blocking threads
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePool;

#[async_trait]
impl WorkerPool for InlinePool {
    async fn submit(&self, job: Job) -> Result<JobReceiver, PoolError> {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            if tx.send(job()).is_err() {
                debug!("Caller gave up on unit, late outcome discarded");
            }
        });
        Ok(rx)
    }
}
