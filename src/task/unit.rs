use serde_json::Value;

use super::error::TaskError;
use super::handle::{Args, Handle};
use super::result::ExecutionResult;

/// A handle bound to a concrete argument list, ready to run
#[derive(Debug, Clone)]
pub struct InvocationUnit {
    handle: Handle,
    args: Args,
}

impl InvocationUnit {
    pub fn new(handle: Handle, args: Args) -> Self {
        Self { handle, args }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// New unit for the same handle with different arguments
    pub fn with_args(&self, args: Args) -> Self {
        Self::new(self.handle.clone(), args)
    }

    /// Run on the current thread, consuming the unit
    pub fn execute(self) -> Result<Value, TaskError> {
        self.handle.invoke(self.args)
    }

    pub fn run(self) -> ExecutionResult<Value> {
        self.execute().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_args_leaves_original_untouched() {
        let handle = Handle::function("add", |a: i64, b: i64| a + b);
        let unit = handle.with_args(vec![json!(1), json!(2)]);
        let rebound = unit.with_args(vec![json!(10), json!(20)]);

        assert_eq!(unit.args(), &[json!(1), json!(2)]);
        assert_eq!(rebound.handle(), unit.handle());
        assert_eq!(rebound.execute().unwrap(), json!(30));
        assert_eq!(unit.execute().unwrap(), json!(3));
    }

    #[test]
    fn test_run_wraps_failure() {
        let handle = Handle::function("add", |a: i64, b: i64| a + b);
        let outcome = handle.with_args(vec![json!(1)]).run();

        assert!(outcome.is_failure());
        assert!(matches!(
            outcome.error(),
            Some(TaskError::ArgumentArityMismatch { .. })
        ));
    }
}
