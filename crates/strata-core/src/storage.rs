//! Materialized field storage
//!
//! A logical region's storage is created once, when the region is created:
//! one zero-or-`fill_byte`-initialized byte buffer per field defined in its
//! field space at that moment. Buffers are released when the region is
//! destroyed or the runtime tears down.

use crate::accessor::linearize;
use crate::error::{Error, HandleKind, Result};
use crate::geometry::DomainPoint;
use crate::runtime::Runtime;
use crate::space::{FieldId, FieldLayout, LogicalRegion};
use bytemuck::Pod;
use std::collections::HashMap;
use std::mem::size_of;

/// Raw bytes for one field across every point of a domain.
#[derive(Debug, Clone)]
pub struct FieldBuffer {
    element_size: usize,
    bytes: Box<[u8]>,
}

impl FieldBuffer {
    /// Allocates `element_size * elements` bytes, each set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageOverflow`] if the byte length overflows
    /// `usize` or the allocation is refused.
    pub fn new(element_size: usize, elements: usize, fill: u8) -> Result<Self> {
        let overflow = || Error::StorageOverflow {
            element_size,
            elements,
        };
        let len = element_size.checked_mul(elements).ok_or_else(overflow)?;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).map_err(|_| overflow())?;
        bytes.resize(len, fill);
        Ok(Self {
            element_size,
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Returns the byte size of one element.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn element_range(&self, index: usize, width: usize) -> Result<std::ops::Range<usize>> {
        let out_of_bounds = || Error::OutOfBounds {
            index,
            len: self.bytes.len() / self.element_size.max(1),
        };
        let start = index
            .checked_mul(self.element_size)
            .ok_or_else(out_of_bounds)?;
        let end = start
            .checked_add(width)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(out_of_bounds)?;
        Ok(start..end)
    }

    /// Copies element `index` out as `T`.
    pub fn read<T: Pod>(&self, index: usize) -> Result<T> {
        let range = self.element_range(index, size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(&self.bytes[range]))
    }

    /// Overwrites element `index` with `value`.
    pub fn write<T: Pod>(&mut self, index: usize, value: T) -> Result<()> {
        let range = self.element_range(index, size_of::<T>())?;
        self.bytes[range].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }
}

/// All field buffers of one logical region.
#[derive(Debug, Clone, Default)]
pub struct RegionStorage {
    fields: HashMap<FieldId, FieldBuffer>,
    elements: usize,
}

impl RegionStorage {
    /// Allocates one buffer per field in `layout`, each `size * elements`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageOverflow`] for the first field whose buffer
    /// cannot be allocated; nothing is kept in that case.
    pub fn materialize(layout: &FieldLayout, elements: usize, fill: u8) -> Result<Self> {
        let fields = layout
            .iter()
            .map(|(fid, size)| Ok((fid, FieldBuffer::new(size, elements, fill)?)))
            .collect::<Result<_>>()?;
        Ok(Self { fields, elements })
    }

    /// Returns the buffer of `field`, or [`Error::NotFound`] if the region
    /// did not materialize it.
    pub fn field(&self, field: FieldId) -> Result<&FieldBuffer> {
        self.fields
            .get(&field)
            .ok_or_else(|| Error::not_found(HandleKind::Field, field))
    }

    /// Returns the buffer of `field` for writing.
    pub fn field_mut(&mut self, field: FieldId) -> Result<&mut FieldBuffer> {
        self.fields
            .get_mut(&field)
            .ok_or_else(|| Error::not_found(HandleKind::Field, field))
    }

    /// Returns true if `field` was materialized.
    pub fn has_field(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field)
    }

    /// Returns the number of materialized fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the number of elements in each buffer.
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Returns the byte length of all buffers together.
    pub fn total_bytes(&self) -> usize {
        self.fields.values().map(FieldBuffer::len).sum()
    }
}

/// Handle to the materialized storage of one logical region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalRegion {
    region: LogicalRegion,
}

impl PhysicalRegion {
    pub(crate) fn new(region: LogicalRegion) -> Self {
        Self { region }
    }

    /// Returns the logical region this storage belongs to.
    pub fn logical_region(&self) -> LogicalRegion {
        self.region
    }

    /// Returns the column-major element index of `point` within this
    /// region's domain.
    pub fn get_index(&self, rt: &Runtime, point: &DomainPoint) -> Result<usize> {
        linearize(rt.region_domain(self.region)?, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_sizes_each_field() {
        let mut layout = FieldLayout::new();
        layout.insert(5, 8);
        layout.insert(6, 2);

        let storage = RegionStorage::materialize(&layout, 10, 0).unwrap();
        assert_eq!(storage.field(5).unwrap().len(), 80);
        assert_eq!(storage.field(6).unwrap().len(), 20);
        assert_eq!(storage.total_bytes(), 100);
        assert!(storage.field(7).unwrap_err().is_not_found(HandleKind::Field));
    }

    #[test]
    fn test_fill_byte_initializes_buffers() {
        let buffer = FieldBuffer::new(4, 3, 0xAB).unwrap();
        assert!(buffer.as_bytes().iter().all(|b| *b == 0xAB));
        assert_eq!(buffer.read::<u32>(2).unwrap(), 0xABAB_ABAB);
    }

    #[test]
    fn test_buffer_read_write_elements() {
        let mut buffer = FieldBuffer::new(8, 4, 0).unwrap();
        buffer.write(1, 2.5f64).unwrap();
        buffer.write(3, -1.0f64).unwrap();
        assert_eq!(buffer.read::<f64>(1).unwrap(), 2.5);
        assert_eq!(buffer.read::<f64>(3).unwrap(), -1.0);
        assert_eq!(buffer.read::<f64>(0).unwrap(), 0.0);
        assert!(matches!(
            buffer.read::<f64>(4),
            Err(Error::OutOfBounds { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_empty_layout_materializes_nothing() {
        let storage = RegionStorage::materialize(&FieldLayout::new(), 10, 0).unwrap();
        assert_eq!(storage.field_count(), 0);
        assert_eq!(storage.elements(), 10);
    }

    #[test]
    fn test_buffer_length_overflow_is_an_error() {
        let err = FieldBuffer::new(8, (1usize << 62) + 1, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::StorageOverflow { element_size: 8, elements } if elements == (1usize << 62) + 1
        ));

        let mut layout = FieldLayout::new();
        layout.insert(0, 16);
        layout.insert(1, 1);
        assert!(matches!(
            RegionStorage::materialize(&layout, usize::MAX / 8, 0),
            Err(Error::StorageOverflow { element_size: 16, .. })
        ));
    }

    #[test]
    fn test_huge_element_index_is_out_of_bounds() {
        let buffer = FieldBuffer::new(8, 2, 0).unwrap();
        assert!(matches!(
            buffer.read::<u64>(usize::MAX),
            Err(Error::OutOfBounds { len: 2, .. })
        ));
        assert!(buffer.read::<u64>(usize::MAX / 8).is_err());
    }
}
