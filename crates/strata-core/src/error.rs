//! Error types for strata-core operations

use crate::geometry::{Domain, DomainPoint};
use crate::space::FieldId;
use crate::task::TaskId;
use std::fmt;

/// Result type for strata-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which registry a failed lookup went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    IndexSpace,
    FieldSpace,
    Field,
    LogicalRegion,
    PhysicalRegion,
    Task,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleKind::IndexSpace => "index space",
            HandleKind::FieldSpace => "field space",
            HandleKind::Field => "field",
            HandleKind::LogicalRegion => "logical region",
            HandleKind::PhysicalRegion => "physical region",
            HandleKind::Task => "task",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in strata-core operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Lookup of an id absent from its registry (never created or destroyed)
    #[error("{kind} {id} not found")]
    NotFound { kind: HandleKind, id: u64 },

    /// Positional index past the end of a coordinate or requirement list
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },

    /// Accessed point outside the region's domain
    #[error("point {point} outside domain {domain}")]
    PointOutOfBounds { point: DomainPoint, domain: Domain },

    /// Point and domain (or lo and hi) disagree on dimensionality
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Domain whose point count or addressing overflows the coordinate or
    /// index types.
    #[error("domain {domain} is too large to address")]
    DomainTooLarge { domain: Domain },

    /// Field buffer whose byte length overflows `usize` or cannot be allocated.
    #[error("cannot allocate {elements} elements of {element_size} bytes")]
    StorageOverflow { element_size: usize, elements: usize },

    /// Scalar conversion of a point whose coordinate count is not 1
    #[error("cannot cast {dims}-dimensional point to a scalar")]
    InvalidCast { dims: usize },

    /// Accessor element type does not match the field's byte size
    #[error("field {field} holds {field_size}-byte elements, accessor reads {element_size} bytes")]
    ElementSizeMismatch {
        field: FieldId,
        field_size: usize,
        element_size: usize,
    },

    /// Task argument bytes do not decode as the requested type
    #[error("task argument holds {actual} bytes, expected {expected}")]
    ArgumentSizeMismatch { expected: usize, actual: usize },

    /// Resizing a field whose storage is already materialized
    #[error("field {field} is materialized in logical region {region} with {existing}-byte elements, cannot resize to {requested}")]
    FieldInUse {
        field: FieldId,
        region: usize,
        existing: usize,
        requested: usize,
    },

    /// Future read back as a different type than the task produced
    #[error("future holds {actual}, requested {expected}")]
    ResultTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Future produced by a task without a return value
    #[error("future holds no result")]
    EmptyResult,

    /// `start` called before `set_top_level_task_id`
    #[error("top-level task id was never set")]
    TopLevelTaskUnset,

    /// Task body returned an error
    #[error("task {task_id} failed: {source}")]
    TaskFailed { task_id: TaskId, source: Box<Error> },
}

impl Error {
    pub(crate) fn not_found(kind: HandleKind, id: impl TryInto<u64>) -> Self {
        Self::NotFound {
            kind,
            id: id.try_into().unwrap_or(u64::MAX),
        }
    }

    /// Returns true for registry lookup failures of the given kind.
    pub fn is_not_found(&self, kind: HandleKind) -> bool {
        matches!(self, Error::NotFound { kind: k, .. } if *k == kind)
    }

    /// Returns the innermost error, looking through task failures.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::TaskFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
