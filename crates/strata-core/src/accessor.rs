//! Typed element access into physical regions
//!
//! Addressing is column-major relative to the domain's `lo` corner: axis 0
//! has stride 1 and each following axis's stride is the product of the
//! extents before it. Every access is checked, so an out-of-domain point is
//! an error rather than a stray address.

use crate::error::{Error, Result};
use crate::geometry::{Domain, DomainPoint, Point};
use crate::runtime::Runtime;
use crate::space::FieldId;
use crate::storage::PhysicalRegion;
use bytemuck::Pod;
use std::marker::PhantomData;
use std::mem::size_of;

/// Returns the column-major element index of `point` within `domain`.
///
/// # Errors
///
/// - [`Error::DimensionMismatch`] if the point and domain have different
///   dimensionality.
/// - [`Error::PointOutOfBounds`] if the point lies outside the domain.
/// - [`Error::DomainTooLarge`] if the index does not fit `usize`.
pub fn linearize(domain: &Domain, point: &DomainPoint) -> Result<usize> {
    if point.dim() != domain.dim() {
        return Err(Error::DimensionMismatch {
            expected: domain.dim(),
            actual: point.dim(),
        });
    }
    if !domain.contains(point) {
        return Err(Error::PointOutOfBounds {
            point: point.clone(),
            domain: domain.clone(),
        });
    }

    // i128 keeps `point - lo` and every extent exact for any i64 corners
    let dims = domain.dim();
    let mut offset: i128 = 0;
    let mut stride: i128 = 1;
    for d in 0..dims {
        let lo = i128::from(domain.lo()[d]);
        offset = (i128::from(point[d]) - lo)
            .checked_mul(stride)
            .and_then(|term| offset.checked_add(term))
            .ok_or_else(|| domain.too_large())?;
        if d + 1 < dims {
            let extent = i128::from(domain.hi()[d]) - lo + 1;
            stride = stride.checked_mul(extent).ok_or_else(|| domain.too_large())?;
        }
    }
    usize::try_from(offset).map_err(|_| domain.too_large())
}

/// View of one field of a physical region as elements of type `T`.
///
/// The accessor holds only handles; every read and write goes through the
/// runtime that owns the storage.
#[derive(Debug)]
pub struct FieldAccessor<T, const DIM: usize> {
    region: PhysicalRegion,
    field: FieldId,
    _element: PhantomData<fn() -> T>,
}

impl<T, const DIM: usize> Clone for FieldAccessor<T, DIM> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const DIM: usize> Copy for FieldAccessor<T, DIM> {}

impl<T: Pod, const DIM: usize> FieldAccessor<T, DIM> {
    /// Binds to `field` of `region`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the region or field does not exist.
    /// - [`Error::ElementSizeMismatch`] if the field's elements are not
    ///   `size_of::<T>()` bytes.
    /// - [`Error::DimensionMismatch`] if the region's domain does not have
    ///   `DIM` axes.
    pub fn new(rt: &Runtime, region: &PhysicalRegion, field: FieldId) -> Result<Self> {
        let storage = rt.region_storage(region.logical_region())?;
        let field_size = storage.field(field)?.element_size();
        if field_size != size_of::<T>() {
            return Err(Error::ElementSizeMismatch {
                field,
                field_size,
                element_size: size_of::<T>(),
            });
        }

        let dims = rt.region_domain(region.logical_region())?.dim();
        if dims != DIM {
            return Err(Error::DimensionMismatch {
                expected: DIM,
                actual: dims,
            });
        }

        Ok(Self {
            region: *region,
            field,
            _element: PhantomData,
        })
    }

    /// Returns the field this accessor reads.
    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Returns the physical region this accessor reads.
    pub fn region(&self) -> PhysicalRegion {
        self.region
    }

    /// Returns the byte offset of `point` from the start of the field buffer:
    /// its element index times `size_of::<T>()`.
    pub fn byte_offset(&self, rt: &Runtime, point: impl Into<Point<DIM>>) -> Result<usize> {
        Ok(self.index_of(rt, point.into())? * size_of::<T>())
    }

    /// Reads the element at `point`.
    pub fn read(&self, rt: &Runtime, point: impl Into<Point<DIM>>) -> Result<T> {
        let index = self.index_of(rt, point.into())?;
        rt.region_storage(self.region.logical_region())?
            .field(self.field)?
            .read(index)
    }

    /// Overwrites the element at `point` with `value`.
    pub fn write(&self, rt: &mut Runtime, point: impl Into<Point<DIM>>, value: T) -> Result<()> {
        let index = self.index_of(rt, point.into())?;
        rt.region_storage_mut(self.region.logical_region())?
            .field_mut(self.field)?
            .write(index, value)
    }

    /// Replaces the element at `point` with `f(old)` and returns the new value.
    pub fn update(
        &self,
        rt: &mut Runtime,
        point: impl Into<Point<DIM>>,
        f: impl FnOnce(T) -> T,
    ) -> Result<T> {
        let point = point.into();
        let value = f(self.read(rt, point)?);
        self.write(rt, point, value)?;
        Ok(value)
    }

    fn index_of(&self, rt: &Runtime, point: Point<DIM>) -> Result<usize> {
        let domain = rt.region_domain(self.region.logical_region())?;
        linearize(domain, &DomainPoint::from(point))
    }
}
