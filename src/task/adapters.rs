//! Typed closure adapters
//!
//! Turns closures of up to five parameters into [`TaskFn`] trait objects.
//! Parameters are decoded from JSON values with serde; return values are
//! encoded back. The marker type parameter `M` carries the parameter tuple
//! so each arity gets its own impl.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::error::AnyError;
use super::handle::{Args, CallError, TaskFn};

pub trait IntoTaskFn<M> {
    fn into_task_fn(self) -> Arc<dyn TaskFn>;
}

pub trait IntoFallibleTaskFn<M> {
    fn into_task_fn(self) -> Arc<dyn TaskFn>;
}

pub trait IntoMethodFn<O, M> {
    fn into_method_fn(self, owner: Arc<O>) -> Arc<dyn TaskFn>;
}

pub trait IntoFallibleMethodFn<O, M> {
    fn into_method_fn(self, owner: Arc<O>) -> Arc<dyn TaskFn>;
}

struct FixedArity<C> {
    arity: usize,
    call: C,
}

impl<C> TaskFn for FixedArity<C>
where
    C: Fn(Args) -> Result<Value, CallError> + Send + Sync + 'static,
{
    fn arity(&self) -> Option<usize> {
        Some(self.arity)
    }

    fn call(&self, args: Args) -> Result<Value, CallError> {
        (self.call)(args)
    }
}

pub(crate) struct VariadicFn<F> {
    f: F,
}

impl<F> VariadicFn<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> TaskFn for VariadicFn<F>
where
    F: Fn(Args) -> Result<Value, AnyError> + Send + Sync + 'static,
{
    fn arity(&self) -> Option<usize> {
        None
    }

    fn call(&self, args: Args) -> Result<Value, CallError> {
        (self.f)(args).map_err(CallError::Failed)
    }
}

fn decode<T: DeserializeOwned>(
    args: &mut std::vec::IntoIter<Value>,
    index: usize,
) -> Result<T, CallError> {
    let value = args.next().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|source| CallError::Argument { index, source })
}

fn encode<R: Serialize>(value: R) -> Result<Value, CallError> {
    serde_json::to_value(value).map_err(CallError::failed)
}

macro_rules! impl_adapters {
    ($arity:expr; $($ty:ident $var:ident $idx:expr),*) => {
        impl<F, R, $($ty,)*> IntoTaskFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: Serialize,
            $($ty: DeserializeOwned,)*
        {
            fn into_task_fn(self) -> Arc<dyn TaskFn> {
                Arc::new(FixedArity {
                    arity: $arity,
                    call: move |args: Args| -> Result<Value, CallError> {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = args.into_iter();
                        $(let $var: $ty = decode(&mut args, $idx)?;)*
                        encode((self)($($var),*))
                    },
                })
            }
        }

        impl<F, R, E, $($ty,)*> IntoFallibleTaskFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Result<R, E> + Send + Sync + 'static,
            R: Serialize,
            E: Into<AnyError>,
            $($ty: DeserializeOwned,)*
        {
            fn into_task_fn(self) -> Arc<dyn TaskFn> {
                Arc::new(FixedArity {
                    arity: $arity,
                    call: move |args: Args| -> Result<Value, CallError> {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = args.into_iter();
                        $(let $var: $ty = decode(&mut args, $idx)?;)*
                        match (self)($($var),*) {
                            Ok(value) => encode(value),
                            Err(error) => Err(CallError::Failed(error.into())),
                        }
                    },
                })
            }
        }

        impl<O, F, R, $($ty,)*> IntoMethodFn<O, ($($ty,)*)> for F
        where
            O: Send + Sync + 'static,
            F: Fn(&O, $($ty),*) -> R + Send + Sync + 'static,
            R: Serialize,
            $($ty: DeserializeOwned,)*
        {
            fn into_method_fn(self, owner: Arc<O>) -> Arc<dyn TaskFn> {
                Arc::new(FixedArity {
                    arity: $arity,
                    call: move |args: Args| -> Result<Value, CallError> {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = args.into_iter();
                        $(let $var: $ty = decode(&mut args, $idx)?;)*
                        encode((self)(&owner, $($var),*))
                    },
                })
            }
        }

        impl<O, F, R, E, $($ty,)*> IntoFallibleMethodFn<O, ($($ty,)*)> for F
        where
            O: Send + Sync + 'static,
            F: Fn(&O, $($ty),*) -> Result<R, E> + Send + Sync + 'static,
            R: Serialize,
            E: Into<AnyError>,
            $($ty: DeserializeOwned,)*
        {
            fn into_method_fn(self, owner: Arc<O>) -> Arc<dyn TaskFn> {
                Arc::new(FixedArity {
                    arity: $arity,
                    call: move |args: Args| -> Result<Value, CallError> {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = args.into_iter();
                        $(let $var: $ty = decode(&mut args, $idx)?;)*
                        match (self)(&owner, $($var),*) {
                            Ok(value) => encode(value),
                            Err(error) => Err(CallError::Failed(error.into())),
                        }
                    },
                })
            }
        }
    };
}

impl_adapters!(0;);
impl_adapters!(1; A1 a1 0);
impl_adapters!(2; A1 a1 0, A2 a2 1);
impl_adapters!(3; A1 a1 0, A2 a2 1, A3 a3 2);
impl_adapters!(4; A1 a1 0, A2 a2 1, A3 a3 2, A4 a4 3);
impl_adapters!(5; A1 a1 0, A2 a2 1, A3 a3 2, A4 a4 3, A5 a5 4);
