//! Axis-aligned bounding box.

use super::Point;
use crate::{unscale, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned bounding box over scaled points.
///
/// An empty box (`defined == false`) absorbs the first point merged into it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub defined: bool,
}

impl BoundingBox {
    /// Create an empty bounding box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the bounding box of a set of points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    /// Extend the box to include a point.
    pub fn merge_point(&mut self, p: Point) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    /// Extend the box to include another box.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    /// Size of the box (max - min).
    #[inline]
    pub fn size(&self) -> Point {
        self.max - self.min
    }

    /// Check whether a point lies inside or on the border of the box.
    #[inline]
    pub fn contains_point(&self, p: &Point) -> bool {
        self.defined
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }

    /// Width in mm.
    pub fn width_mm(&self) -> CoordF {
        unscale(self.size().x)
    }

    /// Height in mm.
    pub fn height_mm(&self) -> CoordF {
        unscale(self.size().y)
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.defined {
            write!(f, "BoundingBox({:?} - {:?})", self.min, self.max)
        } else {
            write!(f, "BoundingBox(empty)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_points() {
        let bb = BoundingBox::from_points(&[
            Point::new(10, 5),
            Point::new(-3, 8),
            Point::new(4, -2),
        ]);
        assert!(bb.defined);
        assert_eq!(bb.min, Point::new(-3, -2));
        assert_eq!(bb.max, Point::new(10, 8));
        assert!(bb.contains_point(&Point::new(0, 0)));
        assert!(!bb.contains_point(&Point::new(11, 0)));
    }

    #[test]
    fn test_bounding_box_merge_empty() {
        let mut bb = BoundingBox::new();
        assert!(!bb.contains_point(&Point::zero()));
        bb.merge(&BoundingBox::new());
        assert!(!bb.defined);
        bb.merge(&BoundingBox::from_points(&[Point::new(0, 0), Point::new(2, 2)]));
        assert!(bb.defined);
        assert_eq!(bb.size(), Point::new(2, 2));
    }
}
