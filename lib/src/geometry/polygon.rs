//! Closed polygon type.

use super::{BoundingBox, Line, Point};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, Index};

/// A closed polygon defined by a sequence of points.
///
/// The closing edge from the last point back to the first is implicit; the
/// first point is never repeated at the end.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a new empty polygon.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polygon from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Create an axis-aligned rectangle (counter-clockwise) from two corners.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
    }

    /// Get the points of this polygon.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the polygon has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the first point, if any.
    #[inline]
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Iterate over the edges, including the closing edge.
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        let n = self.points.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }

    /// Signed area in scaled units squared (positive when counter-clockwise).
    pub fn signed_area(&self) -> CoordF {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area: i128 = 0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice_area += p.cross(&q);
        }
        twice_area as CoordF / 2.0
    }

    /// Absolute area in scaled units squared.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    /// Make the polygon counter-clockwise. Returns true if it was reversed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if self.signed_area() < 0.0 {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    /// Make the polygon clockwise. Returns true if it was reversed.
    pub fn make_clockwise(&mut self) -> bool {
        if self.signed_area() > 0.0 {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    /// Total length of the boundary (scaled units).
    pub fn perimeter(&self) -> CoordF {
        self.lines().map(|l| l.length()).sum()
    }

    /// Get the bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Check whether a point lies exactly on the boundary.
    pub fn on_boundary(&self, p: &Point) -> bool {
        self.lines().any(|l| l.contains_point(p, 0))
    }

    /// Check if a point is inside the polygon or on its boundary.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.on_boundary(p) || self.winds_around(p)
    }

    /// Check if a point is strictly inside the polygon.
    pub fn contains_point_strict(&self, p: &Point) -> bool {
        !self.on_boundary(p) && self.winds_around(p)
    }

    /// Crossing-number test, boundary undefined.
    fn winds_around(&self, p: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                // x coordinate of the edge at p.y, compared without division
                let lhs = (p.x - a.x) as i128 * (b.y - a.y) as i128;
                let rhs = (b.x - a.x) as i128 * (p.y - a.y) as i128;
                let crosses = if b.y > a.y { lhs < rhs } else { lhs > rhs };
                if crosses {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Check whether two edges of the polygon cross each other.
    ///
    /// Only proper crossings count; edges that merely touch at a vertex (a
    /// pinched ring as produced by unions) do not. Edges are swept by
    /// increasing x so only pairs with overlapping extents are compared.
    pub fn has_self_intersections(&self) -> bool {
        let edges: Vec<Line> = self.lines().collect();
        let mut order: Vec<usize> = (0..edges.len()).collect();
        order.sort_unstable_by_key(|&i| edges[i].a.x.min(edges[i].b.x));

        for (pos, &i) in order.iter().enumerate() {
            let edge = &edges[i];
            let max_x = edge.a.x.max(edge.b.x);
            let (min_y, max_y) = (edge.a.y.min(edge.b.y), edge.a.y.max(edge.b.y));
            for &j in &order[pos + 1..] {
                let other = &edges[j];
                if other.a.x.min(other.b.x) > max_x {
                    break;
                }
                if other.a.y.max(other.b.y) < min_y || other.a.y.min(other.b.y) > max_y {
                    continue;
                }
                if edge.crosses(other) {
                    return true;
                }
            }
        }
        false
    }
}

impl Deref for Polygon {
    type Target = [Point];

    fn deref(&self) -> &[Point] {
        &self.points
    }
}

impl Index<usize> for Polygon {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon({} points)", self.points.len())
    }
}

/// Type alias for a collection of polygons.
pub type Polygons = Vec<Polygon>;

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: i64) -> Polygon {
        Polygon::rectangle(Point::new(0, 0), Point::new(size, size))
    }

    #[test]
    fn test_polygon_area() {
        let poly = square(100);
        assert!((poly.signed_area() - 10_000.0).abs() < 1e-9);
        assert!(poly.signed_area() > 0.0);

        let mut cw = poly.clone();
        assert!(cw.make_clockwise());
        assert!((cw.signed_area() + 10_000.0).abs() < 1e-9);
        assert!((cw.area() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_contains_point() {
        let poly = square(100);
        assert!(poly.contains_point(&Point::new(50, 50)));
        assert!(poly.contains_point(&Point::new(0, 50)));
        assert!(!poly.contains_point_strict(&Point::new(0, 50)));
        assert!(!poly.contains_point(&Point::new(150, 50)));
        assert!(!poly.contains_point(&Point::new(-1, -1)));
    }

    #[test]
    fn test_polygon_perimeter() {
        let poly = square(100);
        assert!((poly.perimeter() - 400.0).abs() < 1e-9);
        assert_eq!(poly.lines().count(), 4);
    }

    #[test]
    fn test_polygon_self_intersections() {
        assert!(!square(100).has_self_intersections());

        // Bow tie
        let bow_tie = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 100),
            Point::new(100, 0),
            Point::new(0, 100),
        ]);
        assert!(bow_tie.has_self_intersections());
    }

    #[test]
    fn test_polygon_pinch_is_not_self_intersection() {
        // Two squares joined at the corner (100, 100)
        let pinched = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(200, 100),
            Point::new(200, 200),
            Point::new(100, 200),
            Point::new(100, 100),
            Point::new(0, 100),
        ]);
        assert!(!pinched.has_self_intersections());
    }

    #[test]
    fn test_polygon_self_intersections_many_vertices() {
        let n = 4000;
        let circle: Vec<Point> = (0..n)
            .map(|i| {
                let angle = i as f64 / n as f64 * std::f64::consts::TAU;
                Point::new_scale(50.0 * angle.cos(), 50.0 * angle.sin())
            })
            .collect();
        assert!(!Polygon::from_points(circle.clone()).has_self_intersections());

        // Swapping two far-apart vertices makes edges cross
        let mut twisted = circle;
        twisted.swap(10, n / 2);
        assert!(Polygon::from_points(twisted).has_self_intersections());
    }

    #[test]
    fn test_polygon_first_point() {
        assert_eq!(Polygon::new().first_point(), None);
        assert_eq!(square(10).first_point(), Some(Point::new(0, 0)));
    }
}
