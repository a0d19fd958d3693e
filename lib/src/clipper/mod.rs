//! Clipper polygon boolean operations module.
//!
//! This module provides the polygon algebra used by layers and regions (union,
//! intersection, difference) and offset operations using the geo-clipper library.
//!
//! These operations are essential for:
//! - Merging per-region slices into layer islands
//! - Pooling the slices of regions that share perimeter settings
//! - Computing perimeter insets
//! - Splitting pooled fill/perimeter areas back to the regions
//!
//! Boolean operations run at micron resolution ([`CLIPPER_FACTOR`]). Inputs are
//! expected to be well formed; [`validate_expolygons`] rejects rings that the
//! algebra cannot handle before any of them reach clipper.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::{unscale, CoordF, Error, Result};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Integer resolution handed to clipper: coordinates in mm are multiplied by this.
pub const CLIPPER_FACTOR: CoordF = 1000.0;

/// Offset (mm) applied before and removed after a safety-offset union so that
/// coincident edges of touching polygons merge instead of leaving slivers.
pub const SAFETY_OFFSET: CoordF = 0.001;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    Round,
    /// Mitered corners
    #[default]
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.25), // Default arc tolerance
            OffsetJoinType::Miter => JoinType::Miter(2.0),  // Default miter limit
        }
    }
}

/// Convert a ring of scaled points to a closed geo LineString in mm.
fn ring_to_geo(poly: &Polygon) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = poly
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();

    // Close the ring if needed
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }

    LineString::new(ring)
}

/// Convert our ExPolygon to geo's Polygon type (with holes).
fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let holes = expoly.holes.iter().map(ring_to_geo).collect();
    GeoPolygon::new(ring_to_geo(&expoly.contour), holes)
}

/// Convert a geo ring back to our Polygon type.
fn geo_to_ring(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(crate::scale(c.x), crate::scale(c.y)))
        .collect();

    // Remove the closing point if present (our Polygon doesn't store it)
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    Polygon::from_points(points)
}

/// Convert geo's Polygon to our ExPolygon type (with holes).
fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let contour = geo_to_ring(geo_poly.exterior());
    let holes = geo_poly.interiors().iter().map(geo_to_ring).collect();
    ExPolygon::with_holes(contour, holes)
}

/// Convert geo's MultiPolygon to our ExPolygons type, dropping empty pieces.
fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|expoly| expoly.contour.len() >= 3 && expoly.area() > 0.0)
        .collect()
}

/// Convert our ExPolygons to geo's MultiPolygon.
fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Validation
// ============================================================================

/// Check that a set of ExPolygons is safe input for the boolean operations.
///
/// Every ring needs at least three points, a non-zero area and no
/// self-intersections.
pub fn validate_expolygons(expolygons: &[ExPolygon]) -> Result<()> {
    for (idx, expoly) in expolygons.iter().enumerate() {
        for (ring_idx, ring) in expoly.rings().enumerate() {
            let what = if ring_idx == 0 {
                "contour".to_string()
            } else {
                format!("hole {}", ring_idx - 1)
            };
            if ring.len() < 3 {
                return Err(Error::DegenerateGeometry(format!(
                    "polygon {idx} {what} has {} points",
                    ring.len()
                )));
            }
            if ring.signed_area() == 0.0 {
                return Err(Error::DegenerateGeometry(format!(
                    "polygon {idx} {what} has zero area"
                )));
            }
            if ring.has_self_intersections() {
                return Err(Error::DegenerateGeometry(format!(
                    "polygon {idx} {what} is self-intersecting"
                )));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Compute the union of two sets of polygons.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return clip.to_vec();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);

    let result = subject_geo.union(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the union of a single set of potentially overlapping polygons.
pub fn union_ex(polygons: &[ExPolygon]) -> ExPolygons {
    if polygons.is_empty() {
        return vec![];
    }
    if polygons.len() == 1 {
        return polygons.to_vec();
    }

    // Union all polygons together
    let mut result = vec![polygons[0].clone()];
    for poly in polygons.iter().skip(1) {
        result = union(&result, std::slice::from_ref(poly));
    }
    result
}

/// Union with a safety offset: every polygon is grown by [`SAFETY_OFFSET`],
/// the grown set is unioned, and the result is shrunk back.
///
/// Polygons that only share an edge come out as one piece without a
/// zero-width seam between them. Input is not validated here; callers check
/// their raw slices once before pooling.
pub fn union_safety_offset_ex(polygons: &[ExPolygon]) -> ExPolygons {
    if polygons.is_empty() {
        return vec![];
    }

    let grown: ExPolygons = polygons
        .iter()
        .flat_map(|p| offset_expolygon(p, SAFETY_OFFSET, OffsetJoinType::Miter))
        .collect();
    let merged = union_ex(&grown);
    shrink(&merged, SAFETY_OFFSET, OffsetJoinType::Miter)
}

/// Compute the intersection of two sets of polygons.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }

    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);

    let result = subject_geo.intersection(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the difference of two sets of polygons (subject - clip).
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let subject_geo = expolygons_to_geo_multi(subject);
    let clip_geo = expolygons_to_geo_multi(clip);

    let result = subject_geo.difference(&clip_geo, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset an ExPolygon by a given distance.
///
/// Positive delta inflates (grows) the polygon, negative delta deflates (shrinks) it.
pub fn offset_expolygon(
    expolygon: &ExPolygon,
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    let geo_poly = expolygon_to_geo(expolygon);
    let result = geo_poly.offset(delta, join_type.into(), EndType::ClosedPolygon, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Offset multiple ExPolygons by a given distance.
///
/// Positive delta inflates (grows) the polygons, negative delta deflates (shrinks) them.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }

    let geo_multi = expolygons_to_geo_multi(expolygons);
    let result = geo_multi.offset(delta, join_type.into(), EndType::ClosedPolygon, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Shrink (inset) ExPolygons by a given distance in mm.
pub fn shrink(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, -distance.abs(), join_type)
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Compute the total area of a set of polygons (scaled units squared).
pub fn total_area(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|p| p.area()).sum()
}
