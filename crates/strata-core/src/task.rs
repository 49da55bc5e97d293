//! Task launch descriptions
//!
//! Everything a caller assembles before handing work to the runtime:
//! argument bytes, region requirements, launchers, and variant registrars.
//! Privilege and coherence modes are recorded for callers to inspect but
//! the runtime never enforces them.

use crate::error::{Error, Result};
use crate::space::{FieldId, LogicalRegion};
use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::mem::size_of;

/// Task identifier.
pub type TaskId = u32;

/// Variant identifier. Each task id has one variant, so the two coincide.
pub type VariantId = u32;

/// Access a task declares for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrivilegeMode {
    NoAccess,
    ReadOnly,
    Reduce,
    #[default]
    ReadWrite,
    WriteDiscard,
}

/// How concurrent tasks may share a region. Launches never overlap, so
/// exclusive coherence is the only mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoherenceProperty {
    #[default]
    Exclusive,
}

/// A region a task wants, with the fields it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRequirement {
    pub region: LogicalRegion,
    pub privilege: PrivilegeMode,
    pub coherence: CoherenceProperty,
    pub parent: LogicalRegion,
    pub field_ids: Vec<FieldId>,
}

impl RegionRequirement {
    /// Creates a requirement on `region` with no fields.
    pub fn new(
        region: LogicalRegion,
        privilege: PrivilegeMode,
        coherence: CoherenceProperty,
        parent: LogicalRegion,
    ) -> Self {
        Self {
            region,
            privilege,
            coherence,
            parent,
            field_ids: Vec::new(),
        }
    }

    /// Appends a field id. Duplicates are kept.
    pub fn add_field(&mut self, field: FieldId) -> &mut Self {
        self.field_ids.push(field);
        self
    }
}

/// Borrowed argument bytes for a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskArgument<'a> {
    bytes: &'a [u8],
}

impl<'a> TaskArgument<'a> {
    /// Wraps raw bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Returns an argument with no bytes.
    pub fn empty() -> Self {
        Self { bytes: &[] }
    }

    /// Views a plain-old-data value as argument bytes.
    pub fn from_value<T: Pod>(value: &'a T) -> Self {
        Self {
            bytes: bytemuck::bytes_of(value),
        }
    }

    /// Returns the borrowed bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the number of argument bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when there are no argument bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One invocation with its own copy of the argument bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    task_id: TaskId,
    args: Box<[u8]>,
}

impl Task {
    /// Creates a task, copying the argument bytes.
    pub fn new(task_id: TaskId, arg: TaskArgument<'_>) -> Self {
        Self {
            task_id,
            args: arg.as_bytes().into(),
        }
    }

    /// Returns the id of the task being run.
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the task's copy of the argument bytes.
    pub fn args(&self) -> &[u8] {
        &self.args
    }

    /// Decodes the argument bytes as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentSizeMismatch`] unless the argument is exactly
    /// `size_of::<T>()` bytes.
    pub fn arg<T: Pod>(&self) -> Result<T> {
        if self.args.len() != size_of::<T>() {
            return Err(Error::ArgumentSizeMismatch {
                expected: size_of::<T>(),
                actual: self.args.len(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(&self.args))
    }
}

/// Launch description for [`Runtime::execute_task`](crate::Runtime::execute_task).
#[derive(Debug, Clone)]
pub struct TaskLauncher<'a> {
    pub task_id: TaskId,
    pub argument: TaskArgument<'a>,
    pub requirements: Vec<RegionRequirement>,
}

impl<'a> TaskLauncher<'a> {
    /// Creates a launcher with no region requirements.
    pub fn new(task_id: TaskId, argument: TaskArgument<'a>) -> Self {
        Self {
            task_id,
            argument,
            requirements: Vec::new(),
        }
    }

    /// Appends a requirement and returns it for adding fields.
    pub fn add_region_requirement(&mut self, req: RegionRequirement) -> &mut RegionRequirement {
        self.requirements.push(req);
        let last = self.requirements.len() - 1;
        &mut self.requirements[last]
    }

    /// Appends `field` to the requirement at position `idx`, failing with
    /// [`Error::OutOfBounds`] past the last requirement.
    pub fn add_field(&mut self, idx: usize, field: FieldId) -> Result<()> {
        let len = self.requirements.len();
        self.requirements
            .get_mut(idx)
            .ok_or(Error::OutOfBounds { index: idx, len })?
            .add_field(field);
        Ok(())
    }
}

/// Single-requirement launcher for [`Runtime::map_region`](crate::Runtime::map_region).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineLauncher {
    pub requirement: RegionRequirement,
}

impl InlineLauncher {
    /// Wraps the requirement to map.
    pub fn new(requirement: RegionRequirement) -> Self {
        Self { requirement }
    }
}

/// Processor kinds a variant may be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProcessorKind {
    #[default]
    NoKind,
    /// Latency-optimized (CPU) processor
    LocProc,
}

/// Restricts a variant to one processor kind. Recorded, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProcessorConstraint {
    pub kind: ProcessorKind,
}

impl ProcessorConstraint {
    /// Creates a constraint to `kind`.
    pub fn new(kind: ProcessorKind) -> Self {
        Self { kind }
    }
}

/// Registration details for one task variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskVariantRegistrar {
    pub task_id: TaskId,
    pub variant_name: String,
    pub constraints: Vec<ProcessorConstraint>,
}

impl TaskVariantRegistrar {
    /// Creates a registrar with no constraints.
    pub fn new(task_id: TaskId, variant_name: impl Into<String>) -> Self {
        Self {
            task_id,
            variant_name: variant_name.into(),
            constraints: Vec::new(),
        }
    }

    /// Records a constraint. Constraints are informational only.
    pub fn add_constraint(&mut self, constraint: ProcessorConstraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }
}

/// Execution context handed to task bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    depth: u32,
}

impl Context {
    /// Returns the nesting depth: 0 for the top-level task.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) fn child(&self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }
}

/// Process arguments passed to [`Runtime::start`](crate::Runtime::start).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputArgs {
    argv: Vec<String>,
}

impl InputArgs {
    /// Collects the arguments, program name first.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of arguments.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Returns the arguments in order.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}
