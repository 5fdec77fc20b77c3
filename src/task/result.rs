use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::error::TaskError;
use super::handle::HandleId;
use crate::binding::BindingKey;

/// Lifecycle of a single invocation unit.
///
/// `TimedOut` is terminal for the caller only; the work behind it may still
/// be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnitState::Succeeded | UnitState::Failed | UnitState::TimedOut
        )
    }
}

/// Outcome of one invocation, produced exactly once
#[derive(Debug)]
pub enum ExecutionResult<T> {
    Success(T),
    Failure(TaskError),
}

impl<T> ExecutionResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ExecutionResult::Success(value) => Some(value),
            ExecutionResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TaskError> {
        match self {
            ExecutionResult::Success(_) => None,
            ExecutionResult::Failure(error) => Some(error),
        }
    }

    pub fn state(&self) -> UnitState {
        match self {
            ExecutionResult::Success(_) => UnitState::Succeeded,
            ExecutionResult::Failure(error) if error.is_timeout() => UnitState::TimedOut,
            ExecutionResult::Failure(_) => UnitState::Failed,
        }
    }

    pub fn into_result(self) -> Result<T, TaskError> {
        match self {
            ExecutionResult::Success(value) => Ok(value),
            ExecutionResult::Failure(error) => Err(error),
        }
    }
}

impl ExecutionResult<Value> {
    /// Decode a successful JSON value into `T`
    pub fn decode<T: DeserializeOwned>(self) -> ExecutionResult<T> {
        match self {
            ExecutionResult::Success(value) => match serde_json::from_value(value) {
                Ok(decoded) => ExecutionResult::Success(decoded),
                Err(error) => ExecutionResult::Failure(TaskError::ResultDecode(error)),
            },
            ExecutionResult::Failure(error) => ExecutionResult::Failure(error),
        }
    }
}

impl<T> From<Result<T, TaskError>> for ExecutionResult<T> {
    fn from(result: Result<T, TaskError>) -> Self {
        match result {
            Ok(value) => ExecutionResult::Success(value),
            Err(error) => ExecutionResult::Failure(error),
        }
    }
}

/// Fan-out outcome attributed to the handle that produced it
#[derive(Debug)]
pub struct DispatchResult<T> {
    key: BindingKey,
    handle: HandleId,
    outcome: ExecutionResult<T>,
    elapsed: Duration,
}

impl<T> DispatchResult<T> {
    pub fn new(
        key: BindingKey,
        handle: HandleId,
        outcome: ExecutionResult<T>,
        elapsed: Duration,
    ) -> Self {
        Self {
            key,
            handle,
            outcome,
            elapsed,
        }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn service(&self) -> &str {
        self.key.service_name()
    }

    pub fn module(&self) -> Option<&str> {
        self.key.module()
    }

    pub fn function(&self) -> Option<&str> {
        self.key.function()
    }

    pub fn handle(&self) -> &HandleId {
        &self.handle
    }

    pub fn outcome(&self) -> &ExecutionResult<T> {
        &self.outcome
    }

    pub fn into_outcome(self) -> ExecutionResult<T> {
        self.outcome
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.value()
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.error()
    }

    /// Wall time between submission and the recorded outcome
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl DispatchResult<Value> {
    pub fn decode<T: DeserializeOwned>(self) -> DispatchResult<T> {
        DispatchResult {
            key: self.key,
            handle: self.handle,
            outcome: self.outcome.decode(),
            elapsed: self.elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_mapping() {
        let ok: ExecutionResult<Value> = ExecutionResult::Success(json!(1));
        assert_eq!(ok.state(), UnitState::Succeeded);

        let timed_out: ExecutionResult<Value> =
            ExecutionResult::Failure(TaskError::TimeoutExceeded {
                function: "slow".to_string(),
                timeout: Duration::from_millis(50),
            });
        assert_eq!(timed_out.state(), UnitState::TimedOut);
        assert!(timed_out.state().is_terminal());
        assert!(!UnitState::Running.is_terminal());
    }

    #[test]
    fn test_decode_mismatch_becomes_failure() {
        let ok: ExecutionResult<Value> = ExecutionResult::Success(json!("forty-two"));
        let decoded = ok.decode::<i64>();
        assert!(matches!(
            decoded.error(),
            Some(TaskError::ResultDecode(_))
        ));

        let null: ExecutionResult<Value> = ExecutionResult::Success(Value::Null);
        assert_eq!(null.decode::<Option<i64>>().into_result().unwrap(), None);
    }
}
