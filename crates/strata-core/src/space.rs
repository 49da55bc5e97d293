//! Index spaces, field spaces, and logical regions
//!
//! All handles here are lightweight `Copy`/`Clone` references into tables
//! owned by [`Runtime`]; none of them owns storage. Queries that must stop
//! answering once a handle is destroyed go through the runtime.

use crate::error::{Error, HandleKind, Result};
use crate::geometry::{Domain, Rect};
use crate::runtime::Runtime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field identifier within a field space
pub type FieldId = u64;

/// Handle to a registered domain.
///
/// Two index spaces compare equal when they were created over the same
/// domain. The handle remembers that domain for comparisons only; reading it
/// back goes through [`Runtime::index_space_domain`], which fails once the
/// space is destroyed.
#[derive(Debug, Clone, Eq)]
pub struct IndexSpace {
    id: usize,
    domain: Domain,
}

impl IndexSpace {
    pub(crate) fn new(id: usize, domain: Domain) -> Self {
        Self { id, domain }
    }

    /// Returns the registry id of this space.
    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the number of points in this space's domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the space has been destroyed and
    /// [`Error::DomainTooLarge`] if the count does not fit `usize`.
    pub fn size(&self, rt: &Runtime) -> Result<usize> {
        rt.index_space_domain(self)?.size()
    }
}

impl PartialEq for IndexSpace {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
    }
}

/// Index space whose dimensionality is checked against `DIM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpaceT<const DIM: usize> {
    space: IndexSpace,
    bounds: Rect<DIM>,
}

impl<const DIM: usize> IndexSpaceT<DIM> {
    /// Returns the space's domain as a typed box.
    pub fn bounds(&self) -> Rect<DIM> {
        self.bounds
    }

    /// Returns the dimension-erased handle.
    pub fn as_untyped(&self) -> &IndexSpace {
        &self.space
    }
}

impl<const DIM: usize> TryFrom<IndexSpace> for IndexSpaceT<DIM> {
    type Error = Error;

    fn try_from(space: IndexSpace) -> Result<Self> {
        let bounds = Rect::<DIM>::try_from(space.domain())?;
        Ok(Self { space, bounds })
    }
}

impl<const DIM: usize> From<IndexSpaceT<DIM>> for IndexSpace {
    fn from(typed: IndexSpaceT<DIM>) -> Self {
        typed.space
    }
}

/// Result of partitioning an index space.
///
/// Carries the parent and the color space only; no subspaces are computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPartition {
    parent: usize,
    colors: Domain,
}

impl IndexPartition {
    pub(crate) fn new(parent: usize, colors: Domain) -> Self {
        Self { parent, colors }
    }

    /// Returns the id of the partitioned index space.
    pub fn parent(&self) -> usize {
        self.parent
    }

    /// Returns the domain of colors, one per piece.
    pub fn color_space(&self) -> &Domain {
        &self.colors
    }
}

/// Handle to a set of field definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpace {
    id: usize,
}

impl FieldSpace {
    pub(crate) fn new(id: usize) -> Self {
        Self { id }
    }

    /// Returns the registry id of this field space.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl fmt::Display for FieldSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldSpace({})", self.id)
    }
}

/// Maps each field id of a field space to its element byte size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    fields: BTreeMap<FieldId, usize>,
}

impl FieldLayout {
    /// Creates a layout with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the byte size of `field`, or [`Error::NotFound`] if it was
    /// never allocated.
    pub fn size_of(&self, field: FieldId) -> Result<usize> {
        self.fields
            .get(&field)
            .copied()
            .ok_or_else(|| Error::not_found(HandleKind::Field, field))
    }

    pub(crate) fn insert(&mut self, field: FieldId, size: usize) -> Option<usize> {
        self.fields.insert(field, size)
    }

    /// Returns true if `field` has been allocated.
    pub fn contains(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field has been allocated.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(field, byte size)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, usize)> + '_ {
        self.fields.iter().map(|(fid, size)| (*fid, *size))
    }
}

/// Adds fields to one field space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAllocator {
    space: FieldSpace,
}

impl FieldAllocator {
    pub(crate) fn new(space: FieldSpace) -> Self {
        Self { space }
    }

    /// Returns the field space this allocator adds to.
    pub fn field_space(&self) -> FieldSpace {
        self.space
    }

    /// Defines `field` with `size`-byte elements and returns the id unchanged.
    ///
    /// Define fields before creating regions over the space: regions only
    /// materialize the fields present at creation time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldInUse`] when resizing a field that a live region
    /// has materialized, unless the runtime allows replacement.
    pub fn allocate_field(&self, rt: &mut Runtime, size: usize, field: FieldId) -> Result<FieldId> {
        rt.allocate_field(self.space, size, field)
    }
}

/// Handle to an (index space, field space) pair. Two regions are equal
/// only when they share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalRegion {
    id: usize,
}

impl LogicalRegion {
    pub(crate) fn new(id: usize) -> Self {
        Self { id }
    }

    /// Returns the registry id of this region.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl fmt::Display for LogicalRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicalRegion({})", self.id)
    }
}

/// Logical region whose domain dimensionality is checked against `DIM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalRegionT<const DIM: usize> {
    region: LogicalRegion,
    bounds: Rect<DIM>,
}

impl<const DIM: usize> LogicalRegionT<DIM> {
    /// Looks the region up and checks its dimensionality.
    pub fn checked(region: LogicalRegion, rt: &Runtime) -> Result<Self> {
        let bounds = Rect::<DIM>::try_from(rt.region_domain(region)?)?;
        Ok(Self { region, bounds })
    }

    /// Returns the dimension-erased handle.
    pub fn region(&self) -> LogicalRegion {
        self.region
    }

    /// Returns the region's domain as a typed box.
    pub fn bounds(&self) -> Rect<DIM> {
        self.bounds
    }
}

impl<const DIM: usize> From<LogicalRegionT<DIM>> for LogicalRegion {
    fn from(typed: LogicalRegionT<DIM>) -> Self {
        typed.region
    }
}

/// Partition of a logical region. Every color resolves to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalPartition {
    parent: LogicalRegion,
}

impl LogicalPartition {
    pub(crate) fn new(parent: LogicalRegion) -> Self {
        Self { parent }
    }

    /// Returns the partitioned region.
    pub fn parent(&self) -> LogicalRegion {
        self.parent
    }
}

/// Registry entry behind a [`LogicalRegion`]
///
/// Keeps its own copy of the domain so the region outlives its index space.
#[derive(Debug, Clone)]
pub(crate) struct LogicalRegionEntry {
    pub index_space: usize,
    pub field_space: FieldSpace,
    pub domain: Domain,
}
