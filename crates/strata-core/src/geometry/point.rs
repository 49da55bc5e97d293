//! Points: fixed-dimension and dimension-erased

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Runtime coordinate type.
pub type Coord = i64;

/// Integer types usable as point coordinates.
///
/// Only types that widen to [`Coord`] without loss implement this, so a
/// typed point always has an exact dimension-erased form.
pub trait Coordinate: Copy + PartialEq + PartialOrd + Default + fmt::Debug + 'static {
    /// Widens to the runtime coordinate type.
    fn to_coord(self) -> Coord;

    /// Returns the next value along an axis.
    fn successor(self) -> Self;
}

macro_rules! impl_coordinate {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Coordinate for $ty {
                #[inline]
                fn to_coord(self) -> Coord {
                    Coord::from(self)
                }

                #[inline]
                fn successor(self) -> Self {
                    self + 1
                }
            }
        )*
    };
}

impl_coordinate!(i8, i16, i32, i64, u8, u16, u32);

/// A point with `DIM` coordinates of type `T`.
///
/// Any dimensionality can be built from an array; 1-D and 2-D points also
/// have scalar and pair shorthands.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point<const DIM: usize, T = Coord> {
    coords: [T; DIM],
}

impl<const DIM: usize, T: Coordinate> Point<DIM, T> {
    /// Creates a point from its coordinates.
    pub const fn new(coords: [T; DIM]) -> Self {
        Self { coords }
    }

    /// Returns the number of coordinates.
    pub const fn dim(&self) -> usize {
        DIM
    }

    /// Returns the coordinates in axis order.
    pub fn coords(&self) -> &[T; DIM] {
        &self.coords
    }

    /// Returns the coordinate at `ix`, failing with [`Error::OutOfBounds`]
    /// past the last axis.
    pub fn get(&self, ix: usize) -> Result<T> {
        self.coords
            .get(ix)
            .copied()
            .ok_or(Error::OutOfBounds { index: ix, len: DIM })
    }

    /// Overwrites the coordinate at `ix`, failing past the last axis.
    pub fn set(&mut self, ix: usize, value: T) -> Result<()> {
        let slot = self
            .coords
            .get_mut(ix)
            .ok_or(Error::OutOfBounds { index: ix, len: DIM })?;
        *slot = value;
        Ok(())
    }

    /// Returns the single coordinate of a 1-D point, or
    /// [`Error::InvalidCast`] for any other dimensionality.
    pub fn to_scalar(&self) -> Result<T> {
        if DIM == 1 {
            Ok(self.coords[0])
        } else {
            Err(Error::InvalidCast { dims: DIM })
        }
    }

    /// Returns the dimension-erased form of this point.
    pub fn to_domain_point(&self) -> DomainPoint {
        DomainPoint::from(*self)
    }
}

impl<T: Coordinate> Point<1, T> {
    /// Creates a 1-D point.
    pub const fn from_scalar(value: T) -> Self {
        Self { coords: [value] }
    }
}

impl<T: Coordinate> Point<2, T> {
    /// Creates a 2-D point.
    pub const fn from_pair(x: T, y: T) -> Self {
        Self { coords: [x, y] }
    }
}

impl<const DIM: usize, T: Coordinate> Default for Point<DIM, T> {
    fn default() -> Self {
        Self {
            coords: [T::default(); DIM],
        }
    }
}

impl<const DIM: usize, T: Coordinate> From<[T; DIM]> for Point<DIM, T> {
    fn from(coords: [T; DIM]) -> Self {
        Self { coords }
    }
}

impl<T: Coordinate> From<(T, T)> for Point<2, T> {
    fn from((x, y): (T, T)) -> Self {
        Self::from_pair(x, y)
    }
}

impl<const DIM: usize, T> Index<usize> for Point<DIM, T> {
    type Output = T;

    fn index(&self, ix: usize) -> &T {
        &self.coords[ix]
    }
}

impl<const DIM: usize, T> IndexMut<usize> for Point<DIM, T> {
    fn index_mut(&mut self, ix: usize) -> &mut T {
        &mut self.coords[ix]
    }
}

impl<const DIM: usize, T: fmt::Debug> fmt::Debug for Point<DIM, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Point").field(&self.coords).finish()
    }
}

/// Dimension-erased point: the runtime representation of any [`Point`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DomainPoint {
    coords: Vec<Coord>,
}

impl DomainPoint {
    /// Creates a point from its coordinates.
    pub fn new(coords: Vec<Coord>) -> Self {
        Self { coords }
    }

    /// Returns the number of coordinates.
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// Returns the coordinates in axis order.
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Returns the coordinate at `ix`, failing with [`Error::OutOfBounds`]
    /// past the last axis.
    pub fn get(&self, ix: usize) -> Result<Coord> {
        self.coords.get(ix).copied().ok_or(Error::OutOfBounds {
            index: ix,
            len: self.coords.len(),
        })
    }

    /// Overwrites the coordinate at `ix`, failing past the last axis.
    pub fn set(&mut self, ix: usize, value: Coord) -> Result<()> {
        let len = self.coords.len();
        let slot = self
            .coords
            .get_mut(ix)
            .ok_or(Error::OutOfBounds { index: ix, len })?;
        *slot = value;
        Ok(())
    }
}

impl From<Coord> for DomainPoint {
    fn from(coord: Coord) -> Self {
        Self { coords: vec![coord] }
    }
}

impl From<Vec<Coord>> for DomainPoint {
    fn from(coords: Vec<Coord>) -> Self {
        Self { coords }
    }
}

impl<const DIM: usize, T: Coordinate> From<Point<DIM, T>> for DomainPoint {
    fn from(point: Point<DIM, T>) -> Self {
        Self {
            coords: point.coords.iter().map(|c| c.to_coord()).collect(),
        }
    }
}

impl<const DIM: usize, T: Coordinate> From<&Point<DIM, T>> for DomainPoint {
    fn from(point: &Point<DIM, T>) -> Self {
        Self::from(*point)
    }
}

impl Index<usize> for DomainPoint {
    type Output = Coord;

    fn index(&self, ix: usize) -> &Coord {
        &self.coords[ix]
    }
}

impl fmt::Display for DomainPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_constructors() {
        let p = Point::<1>::from_scalar(7);
        assert_eq!(p.coords(), &[7]);

        let q: Point<2, i32> = (3, 4).into();
        assert_eq!(q[0], 3);
        assert_eq!(q[1], 4);

        let r = Point::new([1u32, 2, 3]);
        assert_eq!(r.dim(), 3);
    }

    #[test]
    fn test_point_component_access_bounds() {
        let mut p = Point::<2>::from_pair(5, 6);
        assert_eq!(p.get(1).unwrap(), 6);
        assert!(matches!(p.get(2), Err(Error::OutOfBounds { index: 2, len: 2 })));

        p.set(0, 9).unwrap();
        assert_eq!(p[0], 9);
        assert!(p.set(5, 0).is_err());
    }

    #[test]
    fn test_higher_dimensions_by_assignment() {
        let mut p = Point::<4, i32>::default();
        for ix in 0..4 {
            p.set(ix, ix as i32 * 10).unwrap();
        }
        assert_eq!(p.coords(), &[0, 10, 20, 30]);
    }

    #[test]
    fn test_scalar_cast() {
        assert_eq!(Point::<1, i32>::from_scalar(12).to_scalar().unwrap(), 12);
        let err = Point::<2>::from_pair(1, 2).to_scalar().unwrap_err();
        assert!(matches!(err, Error::InvalidCast { dims: 2 }));
    }

    #[test]
    fn test_domain_point_from_point() {
        let dp = DomainPoint::from(Point::<2, i32>::from_pair(-1, 8));
        assert_eq!(dp.coords(), &[-1, 8]);
        assert_eq!(dp, DomainPoint::new(vec![-1, 8]));
        assert_ne!(dp, DomainPoint::new(vec![-1, 8, 0]));
        assert_eq!(DomainPoint::from(4i64), DomainPoint::new(vec![4]));
    }

    #[test]
    fn test_domain_point_access_and_display() {
        let mut dp = DomainPoint::new(vec![1, 2, 3]);
        assert_eq!(dp.get(2).unwrap(), 3);
        assert!(dp.get(3).is_err());
        dp.set(2, 30).unwrap();
        assert_eq!(dp.to_string(), "(1, 2, 30)");
    }
}
