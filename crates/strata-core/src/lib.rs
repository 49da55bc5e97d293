//! # strata-core
//!
//! A single-process runtime for region-based task programs.
//!
//! Programs describe multi-dimensional index domains, typed fields over
//! those domains, and tasks that read and write *logical regions* of that
//! data. The [`Runtime`] materializes storage for each region when it is
//! created, runs task bodies synchronously, and hands results back through
//! [`Future`] handles.
//!
//! ## Architecture
//!
//! ```text
//! geometry      Point / Rect (const-generic)  →  DomainPoint / Domain (erased)
//!     ↓
//! space         IndexSpace, FieldSpace, LogicalRegion handles
//!     ↓
//! storage       one byte buffer per (region, field)
//!     ↓
//! accessor      typed, bounds-checked element access
//!     ↓
//! task/dispatch launchers, type-erased task bodies, Futures
//!     ↓
//! runtime       owns every table; create / destroy / launch
//! ```
//!
//! ## Example
//!
//! ```text
//! use strata_core::prelude::*;
//!
//! let mut rt = Runtime::new();
//! let ctx = Context::default();
//!
//! let space = rt.create_index_space(ctx, &Rect::<1>::new([0], [9]).into());
//! let fields = rt.create_field_space(ctx);
//! rt.create_field_allocator(ctx, fields)?.allocate_field(&mut rt, 4, 0)?;
//! let region = rt.create_logical_region(ctx, &space, fields)?;
//!
//! rt.preregister_task_variant(&TaskVariantRegistrar::new(1, "read"), |_, regions, _, rt| {
//!     let acc = FieldAccessor::<i32, 1>::new(rt, &regions[0], 0)?;
//!     acc.read(rt, [5])
//! });
//!
//! let mut launcher = TaskLauncher::new(1, TaskArgument::empty());
//! launcher
//!     .add_region_requirement(RegionRequirement::new(
//!         region, PrivilegeMode::ReadOnly, CoherenceProperty::Exclusive, region,
//!     ))
//!     .add_field(0);
//! let value: i32 = rt.execute_task(ctx, &launcher)?.get_result()?;
//! ```

pub mod accessor;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod future;
pub mod geometry;
pub mod instrumentation;
pub mod registry;
pub mod runtime;
pub mod space;
pub mod storage;
pub mod task;

pub use accessor::FieldAccessor;
pub use config::{FieldReallocation, RuntimeConfig};
pub use error::{Error, HandleKind, Result};
pub use future::{Future, TaskResult};
pub use geometry::{Coord, Domain, DomainPoint, IterationOrder, Point, PointInRectIterator, Rect};
pub use instrumentation::RuntimeMetrics;
pub use runtime::Runtime;
pub use space::{
    FieldAllocator, FieldId, FieldSpace, IndexPartition, IndexSpace, IndexSpaceT, LogicalPartition,
    LogicalRegion, LogicalRegionT,
};
pub use storage::PhysicalRegion;
pub use task::{
    CoherenceProperty, Context, InlineLauncher, InputArgs, PrivilegeMode, ProcessorConstraint,
    ProcessorKind, RegionRequirement, Task, TaskArgument, TaskId, TaskLauncher,
    TaskVariantRegistrar, VariantId,
};

/// Everything a task program usually needs
pub mod prelude {
    pub use crate::accessor::FieldAccessor;
    pub use crate::error::{Error, Result};
    pub use crate::future::Future;
    pub use crate::geometry::{Domain, DomainPoint, Point, Rect};
    pub use crate::runtime::Runtime;
    pub use crate::space::{FieldId, FieldSpace, IndexSpace, LogicalRegion};
    pub use crate::storage::PhysicalRegion;
    pub use crate::task::{
        CoherenceProperty, Context, InlineLauncher, PrivilegeMode, RegionRequirement, Task,
        TaskArgument, TaskLauncher, TaskVariantRegistrar,
    };
}
