//! Geometry primitives for layer composition.
//!
//! This module provides the fundamental geometric types used by layers and regions:
//! - [`Point`] - 2D point with integer coordinates (scaled)
//! - [`Line`] - Line segment between two points
//! - [`Polygon`] - Closed polygon (boundary)
//! - [`Polyline`] - Open polyline (path)
//! - [`ExPolygon`] - Polygon with holes (exterior + interior contours)
//! - [`BoundingBox`] - Axis-aligned bounding box
//! - [`chained_path`] - Nearest-neighbour ordering of a point set
//!
//! ## Coordinate System
//!
//! Coordinates are scaled by `SCALING_FACTOR` (1,000,000), so 1 unit = 1 nanometer.
//! Use `scale()` / `unscale()` to convert between mm and internal units.

mod bounding_box;
mod chain;
mod expolygon;
mod line;
mod point;
mod polygon;
mod polyline;

pub use bounding_box::BoundingBox;
pub use chain::chained_path;
pub use expolygon::{ExPolygon, ExPolygons, SliceProbe};
pub use line::{Line, Lines};
pub use point::{Point, Points};
pub use polygon::{Polygon, Polygons};
pub use polyline::Polyline;

/// Build an axis-aligned square ExPolygon from its lower-left corner and size, in mm.
pub fn square_mm(x: crate::CoordF, y: crate::CoordF, size: crate::CoordF) -> ExPolygon {
    Polygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size)).into()
}
