//! Point type with scaled integer coordinates.

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point with integer (scaled) coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    /// Create a new point from scaled coordinates.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Create a new point from coordinates in mm.
    #[inline]
    pub fn new_scale(x: CoordF, y: CoordF) -> Self {
        Self::new(scale(x), scale(y))
    }

    /// The origin.
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Cross product of two vectors.
    #[inline]
    pub fn cross(&self, other: &Point) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(&self, other: &Point) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    /// Squared length of this point taken as a vector.
    #[inline]
    pub fn length_squared(&self) -> i128 {
        self.dot(self)
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &Point) -> i128 {
        (*other - *self).length_squared()
    }

    /// Euclidean distance to another point (scaled units).
    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        (self.distance_squared(other) as CoordF).sqrt()
    }

    /// Check if two points coincide within a tolerance (per axis).
    #[inline]
    pub fn coincides_with(&self, other: &Point, tolerance: Coord) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    /// Project this point onto the segment `a`-`b`, clamping to its endpoints.
    pub fn project_onto_segment(&self, a: Point, b: Point) -> Point {
        let ab = b - a;
        let len_sq = ab.length_squared();
        if len_sq == 0 {
            return a;
        }
        let t = ((*self - a).dot(&ab) as CoordF / len_sq as CoordF).clamp(0.0, 1.0);
        Point::new(
            (a.x as CoordF + t * ab.x as CoordF).round() as Coord,
            (a.y as CoordF + t * ab.y as CoordF).round() as Coord,
        )
    }

    /// Coordinates in mm.
    #[inline]
    pub fn to_mm(&self) -> (CoordF, CoordF) {
        (unscale(self.x), unscale(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<CoordF> for Point {
    type Output = Point;

    #[inline]
    fn mul(self, factor: CoordF) -> Point {
        Point::new(
            (self.x as CoordF * factor).round() as Coord,
            (self.y as CoordF * factor).round() as Coord,
        )
    }
}

impl From<(Coord, Coord)> for Point {
    #[inline]
    fn from((x, y): (Coord, Coord)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.to_mm();
        write!(f, "({:.3}, {:.3})", x, y)
    }
}

/// Type alias for a collection of points.
pub type Points = Vec<Point>;
