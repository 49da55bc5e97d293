//! Coordinate geometry
//!
//! Fixed-dimension types ([`Point`], [`Rect`]) carry their dimensionality as a
//! const generic; the dimension-erased types ([`DomainPoint`], [`Domain`]) are
//! what the runtime stores and compares. Conversion is always fixed → erased.

mod domain;
mod iter;
mod point;

pub use domain::{Domain, Rect};
pub use iter::{IterationOrder, PointInRectIterator};
pub use point::{Coord, Coordinate, DomainPoint, Point};
