//! The runtime: owner of every registry
//!
//! A [`Runtime`] is an explicitly constructed context object. It holds the
//! index-space, field-space and logical-region tables, the materialized
//! storage of each region, the registered task variants, and the futures of
//! every launch. All handles elsewhere in the crate are ids into these
//! tables.
//!
//! # Lifecycle
//!
//! ```text
//! let mut rt = Runtime::new();
//! rt.set_top_level_task_id(TOP);
//! rt.preregister_void_task_variant(&TaskVariantRegistrar::new(TOP, "top"), top_task);
//! rt.start(std::env::args())?;   // runs `top_task`, then tears everything down
//! ```
//!
//! Launches are synchronous: `execute_task` runs the body to completion and
//! returns a ready [`Future`].

use crate::config::{FieldReallocation, RuntimeConfig};
use crate::dispatch::{RuntimeHelper, ValueHelper, VoidHelper};
use crate::error::{Error, HandleKind, Result};
use crate::future::Future;
use crate::geometry::{Domain, DomainPoint};
use crate::instrumentation::RuntimeMetrics;
use crate::registry::Registry;
use crate::space::{
    FieldAllocator, FieldId, FieldLayout, FieldSpace, IndexPartition, IndexSpace, LogicalPartition,
    LogicalRegion, LogicalRegionEntry,
};
use crate::storage::{PhysicalRegion, RegionStorage};
use crate::task::{
    Context, InlineLauncher, InputArgs, Task, TaskArgument, TaskId, TaskLauncher,
    TaskVariantRegistrar, VariantId,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use strata_tracing::timed;
use strata_tracing::timing::DispatchTimer;

/// Owner of every registry, buffer, task body and future.
pub struct Runtime {
    config: RuntimeConfig,
    input_args: InputArgs,
    top_level_task_id: Option<TaskId>,

    /// Registered task bodies by id
    tasks: HashMap<TaskId, Arc<dyn RuntimeHelper>>,
    variants: HashMap<TaskId, TaskVariantRegistrar>,

    index_spaces: Registry<Domain>,
    field_spaces: Registry<FieldLayout>,
    logical_regions: Registry<LogicalRegionEntry>,

    /// Storage keyed by logical region id
    physical_regions: HashMap<usize, RegionStorage>,

    /// Futures of every launch since start, released at teardown
    futures: Vec<Future>,
    next_future_id: usize,

    metrics: RuntimeMetrics,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    ///
    /// Environment variables are not consulted; use [`Runtime::from_env`]
    /// for that.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runtime configured from `STRATA_FILL_BYTE` and
    /// `STRATA_FIELD_REALLOCATION`.
    pub fn from_env() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    /// Creates a runtime with an explicit configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        tracing::debug!(config = ?config, "runtime_created");
        Self {
            config,
            input_args: InputArgs::default(),
            top_level_task_id: None,
            tasks: HashMap::new(),
            variants: HashMap::new(),
            index_spaces: Registry::new(HandleKind::IndexSpace),
            field_spaces: Registry::new(HandleKind::FieldSpace),
            logical_regions: Registry::new(HandleKind::LogicalRegion),
            physical_regions: HashMap::new(),
            futures: Vec::new(),
            next_future_id: 0,
            metrics: RuntimeMetrics::default(),
        }
    }

    /// Returns the configuration this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Returns the arguments passed to [`Runtime::start`].
    pub fn get_input_args(&self) -> &InputArgs {
        &self.input_args
    }

    /// Sets the task that [`Runtime::start`] runs.
    pub fn set_top_level_task_id(&mut self, task_id: TaskId) {
        self.top_level_task_id = Some(task_id);
    }

    /// Returns the task id set by [`Runtime::set_top_level_task_id`], if any.
    pub fn top_level_task_id(&self) -> Option<TaskId> {
        self.top_level_task_id
    }

    /// Registers a task body returning `T`, replacing any earlier body for
    /// the same task id. Returns the id the variant was registered under.
    pub fn preregister_task_variant<T, F>(
        &mut self,
        registrar: &TaskVariantRegistrar,
        body: F,
    ) -> VariantId
    where
        T: Any + Send + Sync,
        F: Fn(&Task, &[PhysicalRegion], Context, &mut Runtime) -> Result<T> + Send + Sync + 'static,
    {
        self.register_helper(registrar, Arc::new(ValueHelper::new(body)))
    }

    /// Registers a task body with no return value.
    pub fn preregister_void_task_variant<F>(
        &mut self,
        registrar: &TaskVariantRegistrar,
        body: F,
    ) -> VariantId
    where
        F: Fn(&Task, &[PhysicalRegion], Context, &mut Runtime) -> Result<()> + Send + Sync + 'static,
    {
        self.register_helper(registrar, Arc::new(VoidHelper::new(body)))
    }

    fn register_helper(
        &mut self,
        registrar: &TaskVariantRegistrar,
        helper: Arc<dyn RuntimeHelper>,
    ) -> VariantId {
        let task_id = registrar.task_id;
        let result_type = helper.result_type();
        let replaced = self.tasks.insert(task_id, helper).is_some();
        self.variants.insert(task_id, registrar.clone());
        tracing::debug!(
            task_id = task_id,
            variant = %registrar.variant_name,
            result_type = result_type,
            constraints = registrar.constraints.len(),
            replaced = replaced,
            "task_variant_registered"
        );
        task_id
    }

    /// Returns the registrar recorded for `task_id`.
    pub fn variant(&self, task_id: TaskId) -> Option<&TaskVariantRegistrar> {
        self.variants.get(&task_id)
    }

    /// Runs the top-level task, then releases every future, task body and
    /// region buffer. Returns the process exit code.
    ///
    /// # Errors
    ///
    /// - [`Error::TopLevelTaskUnset`] or [`Error::NotFound`] if there is no
    ///   top-level task to run. Nothing is torn down in that case.
    /// - [`Error::TaskFailed`] if the top-level task returns an error. The
    ///   runtime is still torn down.
    #[tracing::instrument(skip_all)]
    pub fn start<I, S>(&mut self, args: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args = InputArgs::new(args);
        let task_id = self.top_level_task_id.ok_or(Error::TopLevelTaskUnset)?;
        let helper = self.helper(task_id)?;
        tracing::info!(task_id = task_id, argc = self.input_args.argc(), "runtime_start");

        let task = Task::new(task_id, TaskArgument::empty());
        let outcome = {
            let timer = DispatchTimer::new("top_level_task", None);
            let _entered = timer.enter();
            helper.run(&task, &[], Context::default(), self)
        };
        drop(helper);

        let outcome = match outcome {
            Ok(result) => {
                self.metrics.record_result(result.is_void());
                Ok(0)
            }
            Err(source) => {
                self.metrics.tasks_failed += 1;
                Err(Error::TaskFailed {
                    task_id,
                    source: Box::new(source),
                })
            }
        };
        self.teardown();
        outcome
    }

    fn teardown(&mut self) {
        let released = self.futures.len();
        self.futures.clear();
        self.tasks.clear();
        self.variants.clear();
        self.physical_regions.clear();
        self.logical_regions.clear();
        self.metrics.futures_released += released as u64;

        self.metrics.log();
        tracing::info!(futures_released = released, "runtime_shutdown");
    }

    fn helper(&self, task_id: TaskId) -> Result<Arc<dyn RuntimeHelper>> {
        self.tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| Error::not_found(HandleKind::Task, task_id))
    }

    // ------------------------------------------------------------------
    // Index spaces
    // ------------------------------------------------------------------

    /// Registers `domain` and returns a handle to it.
    pub fn create_index_space(&mut self, _ctx: Context, domain: &Domain) -> IndexSpace {
        let id = self.index_spaces.insert(domain.clone());
        tracing::debug!(id = id, domain = %domain, size = ?domain.size().ok(), "index_space_created");
        IndexSpace::new(id, domain.clone())
    }

    /// Returns the domain of a live index space.
    ///
    /// Fails with [`Error::NotFound`] once the space has been destroyed.
    pub fn index_space_domain(&self, space: &IndexSpace) -> Result<&Domain> {
        self.index_spaces.get(space.id())
    }

    /// Retires an index space. Regions already created over it keep working
    /// with their own copy of the domain.
    pub fn destroy_index_space(&mut self, _ctx: Context, space: &IndexSpace) -> Result<()> {
        self.index_spaces.remove(space.id())?;
        tracing::debug!(id = space.id(), "index_space_destroyed");
        Ok(())
    }

    /// Partitions `parent` into as many equal pieces as `color_space` has
    /// points. Only the parent and color space are recorded.
    pub fn create_equal_partition(
        &mut self,
        _ctx: Context,
        parent: &IndexSpace,
        color_space: &IndexSpace,
    ) -> Result<IndexPartition> {
        self.index_spaces.get(parent.id())?;
        self.index_spaces.get(color_space.id())?;
        Ok(IndexPartition::new(parent.id(), color_space.domain().clone()))
    }

    // ------------------------------------------------------------------
    // Field spaces
    // ------------------------------------------------------------------

    /// Creates an empty field space.
    pub fn create_field_space(&mut self, _ctx: Context) -> FieldSpace {
        let id = self.field_spaces.insert(FieldLayout::new());
        tracing::debug!(id = id, "field_space_created");
        FieldSpace::new(id)
    }

    /// Retires a field space. Regions already materialized keep their storage.
    pub fn destroy_field_space(&mut self, _ctx: Context, space: FieldSpace) -> Result<()> {
        self.field_spaces.remove(space.id())?;
        tracing::debug!(id = space.id(), "field_space_destroyed");
        Ok(())
    }

    /// Returns an allocator that adds fields to `space`.
    pub fn create_field_allocator(&mut self, _ctx: Context, space: FieldSpace) -> Result<FieldAllocator> {
        self.field_spaces.get(space.id())?;
        Ok(FieldAllocator::new(space))
    }

    /// Returns the field layout of a live field space.
    pub fn field_layout(&self, space: FieldSpace) -> Result<&FieldLayout> {
        self.field_spaces.get(space.id())
    }

    pub(crate) fn allocate_field(
        &mut self,
        space: FieldSpace,
        size: usize,
        field: FieldId,
    ) -> Result<FieldId> {
        let previous = self.field_spaces.get(space.id())?.size_of(field).ok();

        if let Some(existing) = previous {
            if existing == size {
                tracing::debug!(field = field, size = size, "field_reallocated_same_size");
                return Ok(field);
            }
            if self.config.field_reallocation == FieldReallocation::Reject {
                if let Some(region) = self.region_materializing(space, field) {
                    return Err(Error::FieldInUse {
                        field,
                        region,
                        existing,
                        requested: size,
                    });
                }
            }
            tracing::warn!(
                field = field,
                existing = existing,
                requested = size,
                "field_size_replaced"
            );
        }

        self.field_spaces.get_mut(space.id())?.insert(field, size);
        tracing::debug!(field_space = space.id(), field = field, size = size, "field_allocated");
        Ok(field)
    }

    /// Lowest live region over `space` with `field` materialized.
    fn region_materializing(&self, space: FieldSpace, field: FieldId) -> Option<usize> {
        self.logical_regions
            .iter()
            .filter(|(_, entry)| entry.field_space == space)
            .map(|(id, _)| id)
            .filter(|id| {
                self.physical_regions
                    .get(id)
                    .map_or(false, |storage| storage.has_field(field))
            })
            .min()
    }

    // ------------------------------------------------------------------
    // Logical regions
    // ------------------------------------------------------------------

    /// Creates a region and materializes one buffer per field currently in
    /// `fields`, each filled with the configured fill byte. Fields added to
    /// the space later are not allocated here.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if either space has been destroyed.
    /// - [`Error::DomainTooLarge`] if the domain's point count does not fit
    ///   `usize`.
    /// - [`Error::StorageOverflow`] if a field buffer cannot be allocated.
    #[tracing::instrument(skip(self, _ctx, index, fields), fields(
        index_space = index.id(),
        field_space = fields.id()
    ))]
    pub fn create_logical_region(
        &mut self,
        _ctx: Context,
        index: &IndexSpace,
        fields: FieldSpace,
    ) -> Result<LogicalRegion> {
        let domain = self.index_spaces.get(index.id())?.clone();
        let layout = self.field_spaces.get(fields.id())?;
        let elements = domain.size()?;
        let fill = self.config.fill_byte;

        let (storage, duration_us) = timed!("materialize_region", {
            RegionStorage::materialize(layout, elements, fill)
        });
        let storage = storage?;
        let bytes = storage.total_bytes();

        let id = self.logical_regions.insert(LogicalRegionEntry {
            index_space: index.id(),
            field_space: fields,
            domain,
        });
        self.physical_regions.insert(id, storage);
        self.metrics.record_materialized(bytes);

        tracing::debug!(
            region = id,
            elements = elements,
            bytes = bytes,
            duration_us = duration_us,
            "logical_region_created"
        );
        Ok(LogicalRegion::new(id))
    }

    /// Removes the region and frees its buffers. Later lookups fail with
    /// [`Error::NotFound`].
    pub fn destroy_logical_region(&mut self, _ctx: Context, region: LogicalRegion) -> Result<()> {
        self.logical_regions.remove(region.id())?;
        let freed = self
            .physical_regions
            .remove(&region.id())
            .map_or(0, |storage| storage.total_bytes());
        self.metrics.regions_destroyed += 1;
        tracing::debug!(region = region.id(), bytes_freed = freed, "logical_region_destroyed");
        Ok(())
    }

    /// Returns the domain of a live region.
    pub fn region_domain(&self, region: LogicalRegion) -> Result<&Domain> {
        Ok(&self.logical_regions.get(region.id())?.domain)
    }

    /// Returns the field space a live region was created over.
    pub fn region_field_space(&self, region: LogicalRegion) -> Result<FieldSpace> {
        Ok(self.logical_regions.get(region.id())?.field_space)
    }

    /// Returns the id of the index space a live region was created over.
    pub fn region_index_space(&self, region: LogicalRegion) -> Result<usize> {
        Ok(self.logical_regions.get(region.id())?.index_space)
    }

    /// Returns the materialized storage of a live region.
    pub fn region_storage(&self, region: LogicalRegion) -> Result<&RegionStorage> {
        self.physical_regions
            .get(&region.id())
            .ok_or_else(|| Error::not_found(HandleKind::PhysicalRegion, region.id()))
    }

    /// Returns the materialized storage of a live region for writing.
    pub fn region_storage_mut(&mut self, region: LogicalRegion) -> Result<&mut RegionStorage> {
        self.physical_regions
            .get_mut(&region.id())
            .ok_or_else(|| Error::not_found(HandleKind::PhysicalRegion, region.id()))
    }

    /// Returns the byte length of `field`'s buffer in `region`.
    pub fn field_buffer_len(&self, region: LogicalRegion, field: FieldId) -> Result<usize> {
        Ok(self.region_storage(region)?.field(field)?.len())
    }

    /// Returns the number of logical regions not yet destroyed.
    pub fn live_region_count(&self) -> usize {
        self.logical_regions.len()
    }

    /// Returns the partition of `parent` for `_handle`. Every color maps back
    /// to `parent`.
    pub fn get_logical_partition(
        &self,
        parent: LogicalRegion,
        _handle: &IndexPartition,
    ) -> Result<LogicalPartition> {
        self.logical_regions.get(parent.id())?;
        Ok(LogicalPartition::new(parent))
    }

    /// Returns the subregion of `partition` at `_color`, which is always the
    /// partition's parent.
    pub fn get_logical_subregion_by_color(
        &self,
        partition: &LogicalPartition,
        _color: &DomainPoint,
    ) -> Result<LogicalRegion> {
        let parent = partition.parent();
        self.logical_regions.get(parent.id())?;
        Ok(parent)
    }

    // ------------------------------------------------------------------
    // Mapping and launches
    // ------------------------------------------------------------------

    fn resolve(&self, region: LogicalRegion) -> Result<PhysicalRegion> {
        self.logical_regions.get(region.id())?;
        self.region_storage(region)?;
        Ok(PhysicalRegion::new(region))
    }

    /// Resolves the launcher's region to its physical region. Storage is
    /// materialized at region creation, so nothing is allocated here.
    pub fn map_region(&mut self, _ctx: Context, launcher: &InlineLauncher) -> Result<PhysicalRegion> {
        let physical = self.resolve(launcher.requirement.region)?;
        tracing::trace!(region = launcher.requirement.region.id(), "region_mapped");
        Ok(physical)
    }

    /// Releases an inline mapping. Storage stays with the logical region.
    pub fn unmap_region(&mut self, _ctx: Context, region: PhysicalRegion) {
        tracing::trace!(region = region.logical_region().id(), "region_unmapped");
    }

    /// Copies the argument, resolves every requirement, runs the registered
    /// body and returns its result as a ready future.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if a requirement names a destroyed region or the
    ///   task id has no registered body.
    /// - [`Error::TaskFailed`] if the body returns an error. No future is
    ///   recorded for the launch.
    #[tracing::instrument(skip(self, ctx, launcher), fields(
        task_id = launcher.task_id,
        requirements = launcher.requirements.len(),
        arg_bytes = launcher.argument.len()
    ))]
    pub fn execute_task(&mut self, ctx: Context, launcher: &TaskLauncher<'_>) -> Result<Future> {
        let timer = DispatchTimer::new("execute_task", None);
        let task_id = launcher.task_id;

        let task = Task::new(task_id, launcher.argument);
        let regions = launcher
            .requirements
            .iter()
            .map(|req| self.resolve(req.region))
            .collect::<Result<Vec<_>>>()?;
        let helper = self.helper(task_id)?;

        let result = {
            let _entered = timer.enter();
            helper.run(&task, &regions, ctx.child(), self)
        };
        let result = match result {
            Ok(result) => result,
            Err(source) => {
                self.metrics.tasks_failed += 1;
                tracing::warn!(task_id = task_id, error = %source, "task_failed");
                return Err(Error::TaskFailed {
                    task_id,
                    source: Box::new(source),
                });
            }
        };

        self.metrics.record_result(result.is_void());
        let future = Future::new(self.next_future_id, result);
        self.next_future_id += 1;
        self.futures.push(future.clone());

        tracing::debug!(
            task_id = task_id,
            future = future.id(),
            result_type = future.result_type(),
            duration_us = timer.elapsed_us(),
            "task_executed"
        );
        Ok(future)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Returns the number of task ids with a registered body.
    pub fn registered_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns the number of futures held until teardown.
    pub fn future_count(&self) -> usize {
        self.futures.len()
    }

    /// Returns the counters collected so far.
    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        tracing::debug!(
            live_regions = self.logical_regions.len(),
            futures = self.futures.len(),
            "Runtime dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::task::{CoherenceProperty, PrivilegeMode, RegionRequirement};

    fn ctx() -> Context {
        Context::default()
    }

    fn region_over(rt: &mut Runtime, hi: i64, fields: &[(FieldId, usize)]) -> LogicalRegion {
        let space = rt.create_index_space(ctx(), &Rect::<1>::new([0], [hi]).into());
        let fs = rt.create_field_space(ctx());
        let alloc = rt.create_field_allocator(ctx(), fs).unwrap();
        for (fid, size) in fields {
            alloc.allocate_field(rt, *size, *fid).unwrap();
        }
        rt.create_logical_region(ctx(), &space, fs).unwrap()
    }

    #[test]
    fn test_region_materializes_current_fields_only() {
        let mut rt = Runtime::new();
        let space = rt.create_index_space(ctx(), &Rect::<1>::new([0], [9]).into());
        let fs = rt.create_field_space(ctx());
        let alloc = rt.create_field_allocator(ctx(), fs).unwrap();
        alloc.allocate_field(&mut rt, 8, 5).unwrap();

        let region = rt.create_logical_region(ctx(), &space, fs).unwrap();
        alloc.allocate_field(&mut rt, 4, 6).unwrap();

        assert_eq!(rt.field_buffer_len(region, 5).unwrap(), 80);
        assert!(rt
            .field_buffer_len(region, 6)
            .unwrap_err()
            .is_not_found(HandleKind::Field));
        assert_eq!(rt.metrics().bytes_materialized, 80);
    }

    #[test]
    fn test_same_size_reallocation_is_noop() {
        let mut rt = Runtime::new();
        let region = region_over(&mut rt, 3, &[(1, 4)]);
        let fs = rt.region_field_space(region).unwrap();
        let alloc = rt.create_field_allocator(ctx(), fs).unwrap();
        assert_eq!(alloc.allocate_field(&mut rt, 4, 1).unwrap(), 1);
        assert_eq!(rt.field_layout(fs).unwrap().size_of(1).unwrap(), 4);
    }

    #[test]
    fn test_reallocation_after_materialization_rejected() {
        let mut rt = Runtime::new();
        let region = region_over(&mut rt, 3, &[(1, 4)]);
        let fs = rt.region_field_space(region).unwrap();
        let alloc = rt.create_field_allocator(ctx(), fs).unwrap();

        let err = alloc.allocate_field(&mut rt, 8, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldInUse { field: 1, existing: 4, requested: 8, .. }
        ));
        assert_eq!(rt.field_layout(fs).unwrap().size_of(1).unwrap(), 4);

        rt.destroy_logical_region(ctx(), region).unwrap();
        alloc.allocate_field(&mut rt, 8, 1).unwrap();
        assert_eq!(rt.field_layout(fs).unwrap().size_of(1).unwrap(), 8);
    }

    #[test]
    fn test_replace_policy_keeps_existing_buffers() {
        let config = RuntimeConfig::default().with_field_reallocation(FieldReallocation::Replace);
        let mut rt = Runtime::with_config(config);
        let region = region_over(&mut rt, 3, &[(1, 4)]);
        let fs = rt.region_field_space(region).unwrap();
        let alloc = rt.create_field_allocator(ctx(), fs).unwrap();

        alloc.allocate_field(&mut rt, 8, 1).unwrap();
        assert_eq!(rt.field_layout(fs).unwrap().size_of(1).unwrap(), 8);
        assert_eq!(rt.field_buffer_len(region, 1).unwrap(), 16);
    }

    #[test]
    fn test_destroyed_handles_fail_lookup() {
        let mut rt = Runtime::new();
        let fs = rt.create_field_space(ctx());
        rt.destroy_field_space(ctx(), fs).unwrap();
        assert!(rt
            .create_field_allocator(ctx(), fs)
            .unwrap_err()
            .is_not_found(HandleKind::FieldSpace));

        let space = rt.create_index_space(ctx(), &Rect::<1>::new([0], [1]).into());
        rt.destroy_index_space(ctx(), &space).unwrap();
        let fs = rt.create_field_space(ctx());
        assert!(rt
            .create_logical_region(ctx(), &space, fs)
            .unwrap_err()
            .is_not_found(HandleKind::IndexSpace));
    }

    #[test]
    fn test_index_space_queries_fail_after_destroy() {
        let mut rt = Runtime::new();
        let space = rt.create_index_space(ctx(), &Rect::<2>::new([0, 0], [1, 2]).into());
        assert_eq!(space.size(&rt).unwrap(), 6);
        assert_eq!(rt.index_space_domain(&space).unwrap().dim(), 2);

        rt.destroy_index_space(ctx(), &space).unwrap();
        assert!(space.size(&rt).unwrap_err().is_not_found(HandleKind::IndexSpace));
        assert!(rt
            .index_space_domain(&space)
            .unwrap_err()
            .is_not_found(HandleKind::IndexSpace));
    }

    #[test]
    fn test_fill_byte_flows_into_region_buffers() {
        let mut rt = Runtime::with_config(RuntimeConfig::default().with_fill_byte(0xAB));
        let region = region_over(&mut rt, 3, &[(0, 8), (1, 2)]);

        let storage = rt.region_storage(region).unwrap();
        assert_eq!(storage.field(0).unwrap().read::<u64>(3).unwrap(), 0xABAB_ABAB_ABAB_ABAB);
        assert_eq!(storage.field(1).unwrap().read::<u16>(0).unwrap(), 0xABAB);
        assert!(storage.field(0).unwrap().as_bytes().iter().all(|b| *b == 0xAB));
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_fill_byte() {
        std::env::set_var(crate::config::FILL_BYTE_ENV, "0x7f");
        let mut rt = Runtime::from_env();
        std::env::remove_var(crate::config::FILL_BYTE_ENV);

        assert_eq!(rt.config().fill_byte, 0x7f);
        let region = region_over(&mut rt, 1, &[(0, 1)]);
        let storage = rt.region_storage(region).unwrap();
        assert_eq!(storage.field(0).unwrap().read::<u8>(1).unwrap(), 0x7f);
    }

    #[test]
    fn test_oversized_domain_rejected_at_region_creation() {
        let mut rt = Runtime::new();
        let side = 1i64 << 32;
        let space = rt.create_index_space(ctx(), &Rect::<2>::new([0, 0], [side, side]).into());
        let fs = rt.create_field_space(ctx());
        let err = rt.create_logical_region(ctx(), &space, fs).unwrap_err();
        assert!(matches!(err, Error::DomainTooLarge { .. }));
        assert_eq!(rt.live_region_count(), 0);
    }

    #[test]
    fn test_oversized_buffer_rejected_at_region_creation() {
        let mut rt = Runtime::new();
        let space = rt.create_index_space(ctx(), &Rect::<1>::new([0], [1i64 << 62]).into());
        let fs = rt.create_field_space(ctx());
        let alloc = rt.create_field_allocator(ctx(), fs).unwrap();
        alloc.allocate_field(&mut rt, 8, 0).unwrap();

        let err = rt.create_logical_region(ctx(), &space, fs).unwrap_err();
        assert!(matches!(err, Error::StorageOverflow { element_size: 8, .. }));
        assert_eq!(rt.live_region_count(), 0);
        assert_eq!(rt.metrics().bytes_materialized, 0);
    }

    #[test]
    fn test_wide_fieldless_region_addresses_its_far_corner() {
        let mut rt = Runtime::new();
        let bound = 1i64 << 62;
        let space = rt.create_index_space(ctx(), &Rect::<1>::new([-bound], [bound]).into());
        let fs = rt.create_field_space(ctx());
        let region = rt.create_logical_region(ctx(), &space, fs).unwrap();

        let req = RegionRequirement::new(region, PrivilegeMode::ReadOnly, CoherenceProperty::Exclusive, region);
        let physical = rt.map_region(ctx(), &InlineLauncher::new(req)).unwrap();
        let index = physical.get_index(&rt, &DomainPoint::from(bound)).unwrap();
        assert_eq!(index as u128, 1u128 << 63);
    }

    #[test]
    fn test_region_survives_index_space_destruction() {
        let mut rt = Runtime::new();
        let region = region_over(&mut rt, 4, &[(0, 4)]);
        let space_id = rt.region_index_space(region).unwrap();
        let domain = rt.region_domain(region).unwrap().clone();
        let space = IndexSpace::new(space_id, domain);
        rt.destroy_index_space(ctx(), &space).unwrap();

        assert_eq!(rt.region_domain(region).unwrap().size().unwrap(), 5);
        assert_eq!(rt.field_buffer_len(region, 0).unwrap(), 20);
    }

    #[test]
    fn test_partition_resolves_to_parent() {
        let mut rt = Runtime::new();
        let region = region_over(&mut rt, 7, &[]);
        let parent = rt.create_index_space(ctx(), &Rect::<1>::new([0], [7]).into());
        let colors = rt.create_index_space(ctx(), &Rect::<1>::new([0], [1]).into());
        let partition = rt.create_equal_partition(ctx(), &parent, &colors).unwrap();
        assert_eq!(partition.color_space().size().unwrap(), 2);

        let lp = rt.get_logical_partition(region, &partition).unwrap();
        let sub = rt
            .get_logical_subregion_by_color(&lp, &DomainPoint::from(1i64))
            .unwrap();
        assert_eq!(sub, region);
    }

    #[test]
    fn test_map_region_returns_materialized_storage() {
        let mut rt = Runtime::new();
        let region = region_over(&mut rt, 2, &[(0, 8)]);
        let req = RegionRequirement::new(region, PrivilegeMode::ReadOnly, CoherenceProperty::Exclusive, region);
        let physical = rt.map_region(ctx(), &InlineLauncher::new(req)).unwrap();
        assert_eq!(physical.logical_region(), region);
        assert_eq!(physical.get_index(&rt, &DomainPoint::from(2i64)).unwrap(), 2);
        rt.unmap_region(ctx(), physical);
    }

    #[test]
    fn test_execute_unregistered_task() {
        let mut rt = Runtime::new();
        let launcher = TaskLauncher::new(99, TaskArgument::empty());
        let err = rt.execute_task(ctx(), &launcher).unwrap_err();
        assert!(err.is_not_found(HandleKind::Task));
        assert_eq!(rt.future_count(), 0);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut rt = Runtime::new();
        let registrar = TaskVariantRegistrar::new(1, "first");
        rt.preregister_task_variant(&registrar, |_, _, _, _| Ok(1u8));
        rt.preregister_task_variant(&TaskVariantRegistrar::new(1, "second"), |_, _, _, _| Ok(2u8));
        assert_eq!(rt.registered_task_count(), 1);
        assert_eq!(rt.variant(1).unwrap().variant_name, "second");

        let future = rt
            .execute_task(ctx(), &TaskLauncher::new(1, TaskArgument::empty()))
            .unwrap();
        assert_eq!(future.get_result::<u8>().unwrap(), 2);
    }

    #[test]
    fn test_failed_task_records_no_future() {
        let mut rt = Runtime::new();
        rt.preregister_task_variant(&TaskVariantRegistrar::new(4, "needs_arg"), |task, _, _, _| {
            task.arg::<u32>()
        });
        let err = rt
            .execute_task(ctx(), &TaskLauncher::new(4, TaskArgument::empty()))
            .unwrap_err();
        assert!(matches!(err, Error::TaskFailed { task_id: 4, .. }));
        assert!(matches!(err.root_cause(), Error::ArgumentSizeMismatch { .. }));
        assert_eq!(rt.future_count(), 0);
        assert_eq!(rt.metrics().tasks_failed, 1);
    }

    #[test]
    fn test_nested_launch_context_depth() {
        let mut rt = Runtime::new();
        rt.preregister_task_variant(&TaskVariantRegistrar::new(2, "leaf"), |_, _, ctx, _| {
            Ok(ctx.depth())
        });
        rt.preregister_task_variant(&TaskVariantRegistrar::new(1, "outer"), |_, _, ctx, rt| {
            let inner = rt.execute_task(ctx, &TaskLauncher::new(2, TaskArgument::empty()))?;
            inner.get_result::<u32>()
        });

        let future = rt
            .execute_task(ctx(), &TaskLauncher::new(1, TaskArgument::empty()))
            .unwrap();
        assert_eq!(future.get_result::<u32>().unwrap(), 2);
        assert_eq!(rt.future_count(), 2);
    }

    #[test]
    fn test_start_requires_top_level_task() {
        let mut rt = Runtime::new();
        assert_eq!(rt.top_level_task_id(), None);
        assert!(matches!(rt.start(["prog"]), Err(Error::TopLevelTaskUnset)));

        rt.set_top_level_task_id(7);
        assert_eq!(rt.top_level_task_id(), Some(7));
        assert!(rt.start(["prog"]).unwrap_err().is_not_found(HandleKind::Task));
    }
}
