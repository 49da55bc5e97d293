//! Point enumeration over a [`Rect`]

use super::domain::Rect;
use super::point::{Coordinate, Point};
use std::iter::FusedIterator;

/// Which axis varies fastest during enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IterationOrder {
    /// Axis 0 fastest
    #[default]
    ColumnMajor,
    /// Last axis fastest
    RowMajor,
}

/// Mixed-radix counter over every point of an inclusive box
///
/// Starts at `lo`, yields `hi` last, and finishes when the next advance
/// carries out of every axis back to `lo`. An empty box yields nothing.
#[derive(Debug, Clone)]
pub struct PointInRectIterator<const DIM: usize, T> {
    start: Point<DIM, T>,
    end: Point<DIM, T>,
    cur: Option<Point<DIM, T>>,
    order: IterationOrder,
    remaining: usize,
}

impl<const DIM: usize, T: Coordinate> PointInRectIterator<DIM, T> {
    /// Starts an enumeration of `rect` in `order`.
    pub fn new(rect: &Rect<DIM, T>, order: IterationOrder) -> Self {
        let remaining = rect.volume();
        Self {
            start: rect.lo,
            end: rect.hi,
            cur: (remaining > 0).then_some(rect.lo),
            order,
            remaining,
        }
    }

    /// Enumerates `rect` with axis 0 varying fastest.
    pub fn column_major(rect: &Rect<DIM, T>) -> Self {
        Self::new(rect, IterationOrder::ColumnMajor)
    }

    /// Enumerates `rect` with the last axis varying fastest.
    pub fn row_major(rect: &Rect<DIM, T>) -> Self {
        Self::new(rect, IterationOrder::RowMajor)
    }

    /// Returns the enumeration order.
    pub fn order(&self) -> IterationOrder {
        self.order
    }

    /// Step one point forward; `None` once the counter wraps to `start`.
    fn advance(&self, mut point: Point<DIM, T>) -> Option<Point<DIM, T>> {
        let mut step = |d: usize| {
            if point[d] >= self.end[d] {
                point[d] = self.start[d];
                false
            } else {
                point[d] = point[d].successor();
                true
            }
        };
        match self.order {
            IterationOrder::ColumnMajor => {
                for d in 0..DIM {
                    if step(d) {
                        break;
                    }
                }
            }
            IterationOrder::RowMajor => {
                for d in (0..DIM).rev() {
                    if step(d) {
                        break;
                    }
                }
            }
        }
        (point != self.start).then_some(point)
    }
}

impl<const DIM: usize, T: Coordinate> Iterator for PointInRectIterator<DIM, T> {
    type Item = Point<DIM, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cur?;
        self.cur = self.advance(current);
        self.remaining = self.remaining.saturating_sub(1);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const DIM: usize, T: Coordinate> ExactSizeIterator for PointInRectIterator<DIM, T> {}

impl<const DIM: usize, T: Coordinate> FusedIterator for PointInRectIterator<DIM, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords<const DIM: usize>(iter: PointInRectIterator<DIM, i64>) -> Vec<[i64; DIM]> {
        iter.map(|p| *p.coords()).collect()
    }

    #[test]
    fn test_column_major_order() {
        let rect = Rect::<2>::new([0, 0], [1, 2]);
        assert_eq!(
            coords(rect.points()),
            vec![[0, 0], [1, 0], [0, 1], [1, 1], [0, 2], [1, 2]]
        );
    }

    #[test]
    fn test_row_major_order() {
        let rect = Rect::<2>::new([0, 0], [1, 2]);
        let iter = PointInRectIterator::row_major(&rect);
        assert_eq!(iter.order(), IterationOrder::RowMajor);
        assert_eq!(rect.points().order(), IterationOrder::ColumnMajor);
        assert_eq!(
            coords(iter),
            vec![[0, 0], [0, 1], [0, 2], [1, 0], [1, 1], [1, 2]]
        );
    }

    #[test]
    fn test_single_point_rect() {
        let rect = Rect::<3>::new([2, 2, 2], [2, 2, 2]);
        let mut iter = rect.points();
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next(), Some(rect.lo));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_empty_rect_yields_nothing() {
        let rect = Rect::<2>::new([0, 3], [4, 2]);
        assert_eq!(rect.points().count(), 0);
    }

    #[test]
    fn test_negative_origin_ends_on_hi() {
        let rect = Rect::<2>::new([-2, -1], [0, 1]);
        let points = coords(rect.points());
        assert_eq!(points.len(), 9);
        assert_eq!(points.first(), Some(&[-2, -1]));
        assert_eq!(points.last(), Some(&[0, 1]));
    }

    #[test]
    fn test_exact_size_counts_down() {
        let rect = Rect::<2, u32>::new([0, 0], [2, 3]);
        let mut iter = rect.points();
        assert_eq!(iter.len(), 12);
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 10);
    }
}
