//! Polygon with holes.
//!
//! An [`ExPolygon`] is one connected area: an outer contour plus any number of
//! hole contours. The [`SliceProbe`] trait answers "is this shape fully inside
//! the area" for points, segments and polylines.

use super::{BoundingBox, Line, Point, Polygon, Polyline};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A polygon with holes.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    /// Outer boundary.
    pub contour: Polygon,
    /// Holes inside the contour.
    pub holes: Vec<Polygon>,
}

impl ExPolygon {
    /// Create an ExPolygon without holes.
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    /// Create an ExPolygon with holes.
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    /// Check if the contour has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.is_empty()
    }

    /// Area of the contour minus the holes (scaled units squared).
    pub fn area(&self) -> CoordF {
        let holes: CoordF = self.holes.iter().map(|h| h.area()).sum();
        self.contour.area() - holes
    }

    /// Bounding box of the outer contour.
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Iterate over the contour followed by the holes.
    pub fn rings(&self) -> impl Iterator<Item = &Polygon> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }

    /// Check whether a point lies inside the area or on its boundary.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point_strict(p))
    }

    /// Check whether a shape lies entirely inside this area.
    #[inline]
    pub fn contains<T: SliceProbe + ?Sized>(&self, item: &T) -> bool {
        item.is_inside(self)
    }

    /// Check whether a segment crosses any ring of this area.
    fn is_crossed_by(&self, line: &Line) -> bool {
        self.rings().any(|ring| ring.lines().any(|edge| edge.crosses(line)))
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

impl fmt::Debug for ExPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExPolygon(contour={} points, {} holes)",
            self.contour.len(),
            self.holes.len()
        )
    }
}

/// Type alias for a collection of ExPolygons.
pub type ExPolygons = Vec<ExPolygon>;

/// A shape that can be tested for containment in a slice area.
pub trait SliceProbe {
    /// True iff the shape lies entirely inside `area` (boundary counts as inside).
    fn is_inside(&self, area: &ExPolygon) -> bool;
}

impl SliceProbe for Point {
    fn is_inside(&self, area: &ExPolygon) -> bool {
        area.contains_point(self)
    }
}

impl SliceProbe for Line {
    fn is_inside(&self, area: &ExPolygon) -> bool {
        area.contains_point(&self.a)
            && area.contains_point(&self.b)
            && area.contains_point(&self.midpoint())
            && !area.is_crossed_by(self)
    }
}

impl SliceProbe for Polyline {
    fn is_inside(&self, area: &ExPolygon) -> bool {
        match self.len() {
            0 => false,
            1 => self[0].is_inside(area),
            _ => self.edges().iter().all(|edge| edge.is_inside(area)),
        }
    }
}
