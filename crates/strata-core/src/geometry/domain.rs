//! Inclusive boxes: typed [`Rect`] and dimension-erased [`Domain`]

use super::iter::{IterationOrder, PointInRectIterator};
use super::point::{Coord, Coordinate, DomainPoint, Point};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned box from `lo` to `hi`, both inclusive
///
/// `lo <= hi` is not enforced; a box with `hi < lo` along any axis is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect<const DIM: usize, T = Coord> {
    pub lo: Point<DIM, T>,
    pub hi: Point<DIM, T>,
}

impl<const DIM: usize, T: Coordinate> Rect<DIM, T> {
    /// Creates a box from its two inclusive corners.
    pub fn new(lo: impl Into<Point<DIM, T>>, hi: impl Into<Point<DIM, T>>) -> Self {
        Self {
            lo: lo.into(),
            hi: hi.into(),
        }
    }

    /// Returns the number of points in the box, saturating at `usize::MAX`.
    ///
    /// Use [`Domain::size`] for an exact, checked count.
    pub fn volume(&self) -> usize {
        checked_volume(
            self.lo.coords().iter().map(|c| c.to_coord()),
            self.hi.coords().iter().map(|c| c.to_coord()),
        )
        .unwrap_or(usize::MAX)
    }

    /// Returns true when `hi < lo` along some axis.
    pub fn is_empty(&self) -> bool {
        (0..DIM).any(|d| self.hi[d] < self.lo[d])
    }

    /// Returns true when `point` lies inside the box on every axis.
    pub fn contains(&self, point: &Point<DIM, T>) -> bool {
        (0..DIM).all(|d| self.lo[d] <= point[d] && point[d] <= self.hi[d])
    }

    /// Enumerates every point in column-major order.
    pub fn points(&self) -> PointInRectIterator<DIM, T> {
        PointInRectIterator::new(self, IterationOrder::ColumnMajor)
    }

    /// Enumerates every point in the given order.
    pub fn points_in(&self, order: IterationOrder) -> PointInRectIterator<DIM, T> {
        PointInRectIterator::new(self, order)
    }
}

/// Product of per-axis extents, or `None` if it does not fit `usize`.
///
/// Any empty axis makes the whole box empty, however large the other axes are.
fn checked_volume(lo: impl Iterator<Item = Coord>, hi: impl Iterator<Item = Coord>) -> Option<usize> {
    let extents: Vec<i128> = lo
        .zip(hi)
        .map(|(l, h)| i128::from(h) - i128::from(l) + 1)
        .collect();
    if extents.iter().any(|extent| *extent <= 0) {
        return Some(0);
    }
    extents
        .into_iter()
        .try_fold(1usize, |acc, extent| acc.checked_mul(usize::try_from(extent).ok()?))
}

/// Dimension-erased box, the form index spaces store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    lo: DomainPoint,
    hi: DomainPoint,
}

impl Domain {
    /// Creates a domain from two inclusive corners.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `lo` and `hi` have different
    /// dimensionality.
    pub fn new(lo: DomainPoint, hi: DomainPoint) -> Result<Self> {
        if lo.dim() != hi.dim() {
            return Err(Error::DimensionMismatch {
                expected: lo.dim(),
                actual: hi.dim(),
            });
        }
        Ok(Self { lo, hi })
    }

    /// Returns the lower inclusive corner.
    pub fn lo(&self) -> &DomainPoint {
        &self.lo
    }

    /// Returns the upper inclusive corner.
    pub fn hi(&self) -> &DomainPoint {
        &self.hi
    }

    /// Returns the number of axes.
    pub fn dim(&self) -> usize {
        self.lo.dim()
    }

    /// Returns the number of points: the product of `hi[d] - lo[d] + 1` over
    /// every axis, seeded at 1. An axis with `hi < lo` makes the count zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DomainTooLarge`] if the count does not fit `usize`.
    ///
    /// ```
    /// use strata_core::{Domain, Rect};
    ///
    /// let domain = Domain::from(Rect::<2>::new([0, 0], [2, 3]));
    /// assert_eq!(domain.size()?, 12);
    /// # Ok::<(), strata_core::Error>(())
    /// ```
    pub fn size(&self) -> Result<usize> {
        checked_volume(
            self.lo.coords().iter().copied(),
            self.hi.coords().iter().copied(),
        )
        .ok_or_else(|| self.too_large())
    }

    /// Returns true when `hi < lo` along some axis.
    pub fn is_empty(&self) -> bool {
        self.lo
            .coords()
            .iter()
            .zip(self.hi.coords())
            .any(|(lo, hi)| hi < lo)
    }

    /// Returns the number of coordinates along `dim`, or zero if that axis is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] past the last axis and
    /// [`Error::DomainTooLarge`] if the extent does not fit a [`Coord`].
    pub fn extent(&self, dim: usize) -> Result<Coord> {
        let lo = self.lo.get(dim)?;
        let hi = self.hi.get(dim)?;
        if hi < lo {
            return Ok(0);
        }
        hi.checked_sub(lo)
            .and_then(|span| span.checked_add(1))
            .ok_or_else(|| self.too_large())
    }

    /// Returns true when `point` has this domain's dimensionality and lies
    /// inside it on every axis.
    pub fn contains(&self, point: &DomainPoint) -> bool {
        point.dim() == self.dim()
            && point
                .coords()
                .iter()
                .zip(self.lo.coords().iter().zip(self.hi.coords()))
                .all(|(p, (lo, hi))| lo <= p && p <= hi)
    }

    pub(crate) fn too_large(&self) -> Error {
        Error::DomainTooLarge {
            domain: self.clone(),
        }
    }
}

impl<const DIM: usize, T: Coordinate> From<Rect<DIM, T>> for Domain {
    fn from(rect: Rect<DIM, T>) -> Self {
        Self {
            lo: rect.lo.into(),
            hi: rect.hi.into(),
        }
    }
}

impl<const DIM: usize, T: Coordinate> From<&Rect<DIM, T>> for Domain {
    fn from(rect: &Rect<DIM, T>) -> Self {
        Self::from(*rect)
    }
}

impl<const DIM: usize> TryFrom<&Domain> for Rect<DIM, Coord> {
    type Error = Error;

    fn try_from(domain: &Domain) -> Result<Self> {
        let mismatch = || Error::DimensionMismatch {
            expected: DIM,
            actual: domain.dim(),
        };
        let lo = <[Coord; DIM]>::try_from(domain.lo.coords()).map_err(|_| mismatch())?;
        let hi = <[Coord; DIM]>::try_from(domain.hi.coords()).map_err(|_| mismatch())?;
        Ok(Rect::new(lo, hi))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.lo, self.hi)
    }
}
