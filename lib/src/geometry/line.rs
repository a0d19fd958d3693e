//! Line segment type.
//!
//! This module provides the Line type representing a line segment between two points.
//! It doubles as a containment probe for layer slice queries.

use super::Point;
use crate::{unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line segment defined by two endpoints.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    /// Create a new line segment from two points.
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Create a line from coordinates.
    #[inline]
    pub const fn from_coords(ax: Coord, ay: Coord, bx: Coord, by: Coord) -> Self {
        Self {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        }
    }

    /// Get the midpoint of the line segment.
    #[inline]
    pub fn midpoint(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2, (self.a.y + self.b.y) / 2)
    }

    /// Get the squared length of the line segment.
    #[inline]
    pub fn length_squared(&self) -> i128 {
        self.a.distance_squared(&self.b)
    }

    /// Get the length of the line segment.
    #[inline]
    pub fn length(&self) -> CoordF {
        self.a.distance(&self.b)
    }

    /// Calculate the distance from a point to this line segment.
    pub fn distance_to_point(&self, p: &Point) -> CoordF {
        let proj = p.project_onto_segment(self.a, self.b);
        p.distance(&proj)
    }

    /// Project a point onto this line segment, clamping to the segment bounds.
    #[inline]
    pub fn project_point(&self, p: &Point) -> Point {
        p.project_onto_segment(self.a, self.b)
    }

    /// Check if a point lies on this line segment (within tolerance).
    pub fn contains_point(&self, p: &Point, tolerance: Coord) -> bool {
        if tolerance == 0 {
            // Exact: collinear and inside the segment's bounding box
            return self.ccw(p) == 0
                && p.x >= self.a.x.min(self.b.x)
                && p.x <= self.a.x.max(self.b.x)
                && p.y >= self.a.y.min(self.b.y)
                && p.y <= self.a.y.max(self.b.y);
        }

        let dist = self.distance_to_point(p);
        if dist > tolerance as CoordF {
            return false;
        }

        let proj = self.project_point(p);
        p.coincides_with(&proj, tolerance)
    }

    /// Check if two segments cross at a single point interior to both.
    ///
    /// Touching at an endpoint or running along each other is not a crossing.
    pub fn crosses(&self, other: &Line) -> bool {
        let d1 = self.ccw(&other.a).signum();
        let d2 = self.ccw(&other.b).signum();
        let d3 = other.ccw(&self.a).signum();
        let d4 = other.ccw(&self.b).signum();
        d1 * d2 < 0 && d3 * d4 < 0
    }

    /// Get the CCW (counter-clockwise) value of a point relative to this line.
    /// Positive if the point is to the left of the line (a -> b direction).
    #[inline]
    pub fn ccw(&self, p: &Point) -> i128 {
        let v1 = self.b - self.a;
        let v2 = *p - self.a;
        v1.cross(&v2)
    }

}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?} -> {:?})", self.a, self.b)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({:.6}, {:.6}) -> ({:.6}, {:.6})]",
            unscale(self.a.x),
            unscale(self.a.y),
            unscale(self.b.x),
            unscale(self.b.y)
        )
    }
}

impl From<(Point, Point)> for Line {
    #[inline]
    fn from((a, b): (Point, Point)) -> Self {
        Self { a, b }
    }
}

/// Type alias for a collection of lines.
pub type Lines = Vec<Line>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        let line = Line::from_coords(0, 0, 3_000_000, 4_000_000);
        let len = line.length();
        assert!((len - 5_000_000.0).abs() < 1.0);
    }

    #[test]
    fn test_line_midpoint() {
        let line = Line::from_coords(0, 0, 100, 100);
        let mid = line.midpoint();
        assert_eq!(mid.x, 50);
        assert_eq!(mid.y, 50);
    }

    #[test]
    fn test_line_intersection() {
        let line1 = Line::from_coords(0, 0, 100, 100);
        let line2 = Line::from_coords(0, 100, 100, 0);
        assert!(line1.crosses(&line2));
    }

    #[test]
    fn test_line_no_intersection() {
        let line1 = Line::from_coords(0, 0, 50, 50);
        let line2 = Line::from_coords(60, 60, 100, 100);
        assert!(!line1.crosses(&line2));
    }

    #[test]
    fn test_line_touching_is_not_crossing() {
        let line1 = Line::from_coords(0, 0, 100, 0);
        let line2 = Line::from_coords(50, 0, 50, 100);
        assert!(line1.contains_point(&line2.a, 0));
        assert!(!line1.crosses(&line2));
    }

    #[test]
    fn test_line_collinear_overlap() {
        let line1 = Line::from_coords(0, 0, 100, 0);
        let line2 = Line::from_coords(50, 0, 150, 0);
        assert!(line1.contains_point(&line2.a, 0));
        assert!(!line1.crosses(&line2));
    }

    #[test]
    fn test_line_distance_to_point() {
        let line = Line::from_coords(0, 0, 100, 0);
        let p = Point::new(50, 50);
        let dist = line.distance_to_point(&p);
        assert!((dist - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_line_contains_point_exact() {
        let line = Line::from_coords(0, 0, 100, 100);
        assert!(line.contains_point(&Point::new(40, 40), 0));
        assert!(!line.contains_point(&Point::new(40, 41), 0));
        assert!(!line.contains_point(&Point::new(140, 140), 0));
    }

    #[test]
    fn test_line_ccw() {
        let line = Line::from_coords(0, 0, 100, 0);
        assert!(line.ccw(&Point::new(50, 50)) > 0);
        assert!(line.ccw(&Point::new(50, -50)) < 0);
    }
}
