//! Invocation wrapper and result model
//!
//! A [`Handle`] is an immutable binding of a callable unit; pairing it with an
//! argument list yields an [`InvocationUnit`], and running a unit yields an
//! [`ExecutionResult`].
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use taskbind::task::Handle;
//!
//! let handle = Handle::function("double", |x: i64| x * 2);
//! let value = handle.with_args(vec![json!(21)]).execute().unwrap();
//! assert_eq!(value, json!(42));
//! ```

mod adapters;
mod error;
mod handle;
mod result;
mod unit;

pub use adapters::{IntoFallibleMethodFn, IntoFallibleTaskFn, IntoMethodFn, IntoTaskFn};
pub use error::{AnyError, Result, TaskError};
pub use handle::{Args, CallError, Handle, HandleId, OwnerId, TaskFn};
pub use result::{DispatchResult, ExecutionResult, UnitState};
pub use unit::InvocationUnit;

/// Build an argument list from serializable expressions
///
/// ```rust
/// let args = taskbind::args![1, "two", [3]];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::__private::serde_json::json!($arg)),*]
    };
}
