//! Task results
//!
//! Every launch runs to completion before `execute_task` returns, so a
//! [`Future`] is always ready. Its payload is type-tagged: reading it back as
//! the wrong type is an error, not a reinterpretation.

use crate::error::{Error, Result};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// What a task body produced.
#[derive(Clone)]
pub enum TaskResult {
    /// Task declared no return value
    Void,
    /// Heap copy of the returned value, tagged with its type name
    Value {
        payload: Arc<dyn Any + Send + Sync>,
        type_name: &'static str,
    },
}

impl TaskResult {
    /// Wraps a task's return value.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        TaskResult::Value {
            payload: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns true for a task without a return value.
    pub fn is_void(&self) -> bool {
        matches!(self, TaskResult::Void)
    }

    /// Returns the producer's type name, `"()"` for void results.
    pub fn type_name(&self) -> &'static str {
        match self {
            TaskResult::Void => type_name::<()>(),
            TaskResult::Value { type_name, .. } => *type_name,
        }
    }
}

impl fmt::Debug for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskResult::Void => f.write_str("Void"),
            TaskResult::Value { type_name, .. } => {
                f.debug_struct("Value").field("type_name", type_name).finish()
            }
        }
    }
}

/// Handle to one task's result.
#[derive(Debug, Clone)]
pub struct Future {
    id: usize,
    result: TaskResult,
}

impl Future {
    pub(crate) fn new(id: usize, result: TaskResult) -> Self {
        Self { id, result }
    }

    /// Returns this launch's position in the runtime's launch order.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Copies the result out as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyResult`] for a void task and
    /// [`Error::ResultTypeMismatch`] if the task returned another type.
    pub fn get_result<T: Any + Clone>(&self) -> Result<T> {
        match &self.result {
            TaskResult::Void => Err(Error::EmptyResult),
            TaskResult::Value { payload, type_name: actual } => payload
                .downcast_ref::<T>()
                .cloned()
                .ok_or(Error::ResultTypeMismatch {
                    expected: type_name::<T>(),
                    actual: *actual,
                }),
        }
    }

    /// Returns true. Tasks complete before their future is returned.
    pub fn is_ready(&self) -> bool {
        true
    }

    /// Returns true when the task returned nothing.
    pub fn is_void(&self) -> bool {
        self.result.is_void()
    }

    /// Returns the type name of the task's return value.
    pub fn result_type(&self) -> &'static str {
        self.result.type_name()
    }

    /// Returns the untyped result.
    pub fn result(&self) -> &TaskResult {
        &self.result
    }
}
