//! Polyline type for open paths.
//!
//! This module provides the Polyline type representing an open path (sequence of connected
//! line segments). Polylines are the usual probe shape for layer slice containment queries.

use super::{Line, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, Index};

/// An open polyline defined by a sequence of points.
///
/// Unlike a Polygon, a Polyline is not implicitly closed - it's a path from
/// the first point to the last point.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Create a new empty polyline.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polyline from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Get the points of this polyline.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get the number of points in the polyline.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the polyline is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get all edges of the polyline.
    pub fn edges(&self) -> Vec<Line> {
        self.points
            .windows(2)
            .map(|w| Line::new(w[0], w[1]))
            .collect()
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline({} points)", self.points.len())
    }
}

impl Deref for Polyline {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl Index<usize> for Polyline {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl FromIterator<Point> for Polyline {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

impl From<Line> for Polyline {
    fn from(line: Line) -> Self {
        Self::from_points(vec![line.a, line.b])
    }
}
