//! Dispatch engine and worker pools
//!
//! [`Dispatcher`] resolves keys through the [`Registry`](crate::binding::Registry)
//! and runs the resulting invocation units, directly for exactly-one dispatch
//! and through a [`WorkerPool`] for fan-out.

mod dispatcher;
mod pool;

pub use dispatcher::{Dispatcher, ExecuteOptions, execute_units};
pub use pool::{BoundedPool, InlinePool, Job, JobReceiver, PoolError, WorkerPool};
