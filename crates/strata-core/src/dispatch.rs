//! Type-erased task bodies
//!
//! Task functions have different return types, but the runtime keeps them in
//! one table. [`RuntimeHelper`] is the uniform calling contract: each
//! registration wraps its closure in a helper that runs it and boxes the
//! typed return value into a [`TaskResult`].

use crate::error::Result;
use crate::future::TaskResult;
use crate::runtime::Runtime;
use crate::storage::PhysicalRegion;
use crate::task::{Context, Task};
use std::any::{type_name, Any};
use std::marker::PhantomData;

/// Uniform entry point for one registered task variant.
pub trait RuntimeHelper: Send + Sync {
    /// Runs the body and wraps what it returns.
    fn run(
        &self,
        task: &Task,
        regions: &[PhysicalRegion],
        ctx: Context,
        rt: &mut Runtime,
    ) -> Result<TaskResult>;

    /// Returns the name of the type `run` produces.
    fn result_type(&self) -> &'static str;
}

/// Helper for bodies returning a value of type `T`.
pub struct ValueHelper<T, F> {
    body: F,
    _result: PhantomData<fn() -> T>,
}

impl<T, F> ValueHelper<T, F>
where
    F: Fn(&Task, &[PhysicalRegion], Context, &mut Runtime) -> Result<T>,
{
    /// Wraps a value-returning body.
    pub fn new(body: F) -> Self {
        Self {
            body,
            _result: PhantomData,
        }
    }
}

impl<T, F> RuntimeHelper for ValueHelper<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&Task, &[PhysicalRegion], Context, &mut Runtime) -> Result<T> + Send + Sync,
{
    fn run(
        &self,
        task: &Task,
        regions: &[PhysicalRegion],
        ctx: Context,
        rt: &mut Runtime,
    ) -> Result<TaskResult> {
        let value = (self.body)(task, regions, ctx, rt)?;
        Ok(TaskResult::value(value))
    }

    fn result_type(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Helper for bodies with no return value.
pub struct VoidHelper<F> {
    body: F,
}

impl<F> VoidHelper<F>
where
    F: Fn(&Task, &[PhysicalRegion], Context, &mut Runtime) -> Result<()>,
{
    /// Wraps a body with no return value.
    pub fn new(body: F) -> Self {
        Self { body }
    }
}

impl<F> RuntimeHelper for VoidHelper<F>
where
    F: Fn(&Task, &[PhysicalRegion], Context, &mut Runtime) -> Result<()> + Send + Sync,
{
    fn run(
        &self,
        task: &Task,
        regions: &[PhysicalRegion],
        ctx: Context,
        rt: &mut Runtime,
    ) -> Result<TaskResult> {
        (self.body)(task, regions, ctx, rt)?;
        Ok(TaskResult::Void)
    }

    fn result_type(&self) -> &'static str {
        type_name::<()>()
    }
}
