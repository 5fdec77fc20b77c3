use std::time::Duration;

use thiserror::Error;

use crate::binding::BindingKey;
use crate::executor::PoolError;

/// Error type handler bodies report failures with
pub type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure taxonomy shared by lookup, invocation and dispatch
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task does not exist: {0}")]
    LookupNotFound(BindingKey),

    #[error("task count {count} is greater than 1: {key}")]
    AmbiguousLookup { key: BindingKey, count: usize },

    #[error("argument count mismatch: `{function}` declares {expected} arguments, passed in {actual}")]
    ArgumentArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {index} of `{function}` could not be decoded: {source}")]
    ArgumentDecode {
        function: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{function}` raised an error: {source}")]
    InvocationFailure {
        function: String,
        #[source]
        source: AnyError,
    },

    #[error("`{function}` did not complete within {timeout:?}")]
    TimeoutExceeded { function: String, timeout: Duration },

    #[error("worker pool rejected `{function}`: {source}")]
    PoolRejected {
        function: String,
        #[source]
        source: PoolError,
    },

    #[error("result could not be decoded: {0}")]
    ResultDecode(#[source] serde_json::Error),
}

impl TaskError {
    /// Errors raised before any handler body ran
    pub fn is_fail_fast(&self) -> bool {
        matches!(
            self,
            TaskError::LookupNotFound(_)
                | TaskError::AmbiguousLookup { .. }
                | TaskError::ArgumentArityMismatch { .. }
                | TaskError::ArgumentDecode { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::TimeoutExceeded { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            TaskError::LookupNotFound(_) => "LOOKUP_NOT_FOUND",
            TaskError::AmbiguousLookup { .. } => "AMBIGUOUS_LOOKUP",
            TaskError::ArgumentArityMismatch { .. } => "ARGUMENT_ARITY_MISMATCH",
            TaskError::ArgumentDecode { .. } => "ARGUMENT_DECODE",
            TaskError::InvocationFailure { .. } => "INVOCATION_FAILURE",
            TaskError::TimeoutExceeded { .. } => "TIMEOUT_EXCEEDED",
            TaskError::PoolRejected { .. } => "POOL_REJECTED",
            TaskError::ResultDecode(_) => "RESULT_DECODE",
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_errors_are_fail_fast() {
        let key = BindingKey::new("orders", "", "create");
        assert!(TaskError::LookupNotFound(key.clone()).is_fail_fast());
        assert!(TaskError::AmbiguousLookup { key, count: 2 }.is_fail_fast());

        let failure = TaskError::InvocationFailure {
            function: "create".to_string(),
            source: "boom".into(),
        };
        assert!(!failure.is_fail_fast());
        assert_eq!(failure.code(), "INVOCATION_FAILURE");
    }

    #[test]
    fn test_error_messages_name_the_key() {
        let key = BindingKey::new("orders", "", "create");
        let err = TaskError::LookupNotFound(key);
        assert_eq!(
            err.to_string(),
            "task does not exist: {service=orders,module=,function=create}"
        );

        let err = TaskError::ArgumentArityMismatch {
            function: "create".to_string(),
            expected: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("declares 2 arguments, passed in 1"));
    }
}
