pub mod binding;
pub mod config;
pub mod demo;
pub mod executor;
pub mod humanize;
pub mod observability;
pub mod task;

pub use binding::{BindingDecl, BindingKey, Registry};
pub use executor::{BoundedPool, Dispatcher, ExecuteOptions, InlinePool, WorkerPool};
pub use task::{Args, DispatchResult, ExecutionResult, Handle, InvocationUnit, TaskError};

// Used by `args!`
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
