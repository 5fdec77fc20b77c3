use serde_json::Value;
use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::adapters::{
    IntoFallibleMethodFn, IntoFallibleTaskFn, IntoMethodFn, IntoTaskFn, VariadicFn,
};
use super::error::{AnyError, TaskError};
use super::unit::InvocationUnit;

/// Argument list passed to a handle
pub type Args = Vec<Value>;

/// Failure raised by a [`TaskFn`] while decoding arguments or running its body
#[derive(Debug)]
pub enum CallError {
    /// Argument at `index` does not fit the declared parameter type
    Argument {
        index: usize,
        source: serde_json::Error,
    },
    /// The body itself failed
    Failed(AnyError),
}

impl CallError {
    pub fn failed(error: impl Into<AnyError>) -> Self {
        CallError::Failed(error.into())
    }
}

/// Callable unit behind a [`Handle`]
///
/// Discovery code normally builds these through the typed constructors on
/// [`Handle`]; implement it directly for callables that manage their own
/// argument decoding.
pub trait TaskFn: Send + Sync + 'static {
    /// Declared parameter count, `None` for variadic callables
    fn arity(&self) -> Option<usize>;

    fn call(&self, args: Args) -> Result<Value, CallError>;
}

/// Identity of the instance a method handle is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId {
    type_name: &'static str,
    addr: usize,
}

impl OwnerId {
    /// Identity of the instance behind `owner`.
    ///
    /// The handle keeps its own clone of the `Arc`, so the address cannot be
    /// reused by another instance while the handle is alive.
    pub fn of<O: Send + Sync + 'static>(owner: &Arc<O>) -> Self {
        Self {
            type_name: type_name::<O>(),
            addr: Arc::as_ptr(owner) as *const () as usize,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Identity used for registry deduplication: owner instance + function descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleId {
    owner: Option<OwnerId>,
    function: String,
    arity: Option<usize>,
}

impl HandleId {
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}@{:#x}::{}", owner.type_name, owner.addr, self.function),
            None => write!(f, "{}", self.function),
        }
    }
}

/// Immutable, reusable binding of a callable unit
///
/// Equality and hashing use [`HandleId`] only, so two handles built for the
/// same owner instance and function collapse into one registry entry.
#[derive(Clone)]
pub struct Handle {
    id: HandleId,
    callable: Arc<dyn TaskFn>,
}

impl Handle {
    /// Wrap an already-built callable
    pub fn from_task_fn(
        owner: Option<OwnerId>,
        function: impl Into<String>,
        callable: Arc<dyn TaskFn>,
    ) -> Self {
        let id = HandleId {
            owner,
            function: function.into(),
            arity: callable.arity(),
        };
        Self { id, callable }
    }

    /// Free function of 0 to 5 deserializable parameters
    pub fn function<M, F>(name: impl Into<String>, f: F) -> Self
    where
        F: IntoTaskFn<M>,
    {
        Self::from_task_fn(None, name, f.into_task_fn())
    }

    /// Free function returning `Result`; the `Err` side becomes an invocation failure
    pub fn try_function<M, F>(name: impl Into<String>, f: F) -> Self
    where
        F: IntoFallibleTaskFn<M>,
    {
        Self::from_task_fn(None, name, f.into_task_fn())
    }

    /// Method bound to `owner`; the handle keeps the owner alive
    pub fn method<O, M, F>(owner: &Arc<O>, name: impl Into<String>, f: F) -> Self
    where
        O: Send + Sync + 'static,
        F: IntoMethodFn<O, M>,
    {
        Self::from_task_fn(
            Some(OwnerId::of(owner)),
            name,
            f.into_method_fn(Arc::clone(owner)),
        )
    }

    pub fn try_method<O, M, F>(owner: &Arc<O>, name: impl Into<String>, f: F) -> Self
    where
        O: Send + Sync + 'static,
        F: IntoFallibleMethodFn<O, M>,
    {
        Self::from_task_fn(
            Some(OwnerId::of(owner)),
            name,
            f.into_method_fn(Arc::clone(owner)),
        )
    }

    /// Callable taking the raw argument list; arity is not checked
    pub fn variadic<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Args) -> Result<Value, AnyError> + Send + Sync + 'static,
    {
        Self::from_task_fn(None, name, Arc::new(VariadicFn::new(f)))
    }

    pub fn id(&self) -> &HandleId {
        &self.id
    }

    pub fn function_name(&self) -> &str {
        &self.id.function
    }

    pub fn arity(&self) -> Option<usize> {
        self.id.arity
    }

    /// Whether both handles wrap the same callable instance
    pub fn same_callable(&self, other: &Handle) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.callable), Arc::as_ptr(&other.callable))
    }

    pub fn with_args(&self, args: Args) -> InvocationUnit {
        InvocationUnit::new(self.clone(), args)
    }

    /// Invoke with `args` on the current thread.
    ///
    /// The arity check runs before the callable is touched. Errors and panics
    /// raised by the body are captured as [`TaskError::InvocationFailure`].
    pub fn invoke(&self, args: Args) -> Result<Value, TaskError> {
        if let Some(expected) = self.id.arity {
            if expected != args.len() {
                return Err(TaskError::ArgumentArityMismatch {
                    function: self.id.function.clone(),
                    expected,
                    actual: args.len(),
                });
            }
        }

        let callable = &self.callable;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callable.call(args)));

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(CallError::Argument { index, source })) => Err(TaskError::ArgumentDecode {
                function: self.id.function.clone(),
                index,
                source,
            }),
            Ok(Err(CallError::Failed(source))) => Err(TaskError::InvocationFailure {
                function: self.id.function.clone(),
                source,
            }),
            Err(payload) => Err(TaskError::InvocationFailure {
                function: self.id.function.clone(),
                source: panic_message(payload).into(),
            }),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("id", &self.id).finish_non_exhaustive()
    }
}
