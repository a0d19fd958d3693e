//! Surface types for layer regions.
//!
//! A [`Surface`] is a classified polygon-with-holes inside one region of a
//! layer. Regions keep their raw slices, perimeter areas and fill areas as
//! [`SurfaceCollection`]s.
//!
//! The classification and the extra perimeter count travel with the geometry:
//! when a surface is split or merged by a boolean operation, the pieces copy
//! the attributes of the surface they came from ([`Surface::with_expolygon`]).

use crate::geometry::{ExPolygon, ExPolygons, SliceProbe};
use crate::{unscale_area, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a surface within a layer.
///
/// Surfaces are classified to determine how they should be filled:
/// - Top/bottom surfaces get solid infill
/// - Internal surfaces get sparse infill
/// - Bridge surfaces need special handling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    /// Top surface (visible from above).
    Top,
    /// Bottom surface (visible from below, or first layer).
    Bottom,
    /// Bottom surface that bridges over air/support.
    BottomBridge,
    /// Internal solid surface (between top/bottom and infill).
    InternalSolid,
    /// Internal surface that will receive sparse infill.
    #[default]
    Internal,
    /// Internal bridge surface.
    InternalBridge,
    /// Internal void (empty space, no infill).
    InternalVoid,
}

impl SurfaceType {
    /// All classifications, in declaration order.
    pub const ALL: [SurfaceType; 7] = [
        SurfaceType::Top,
        SurfaceType::Bottom,
        SurfaceType::BottomBridge,
        SurfaceType::InternalSolid,
        SurfaceType::Internal,
        SurfaceType::InternalBridge,
        SurfaceType::InternalVoid,
    ];

    /// Check if this surface type is a top surface.
    #[inline]
    pub fn is_top(&self) -> bool {
        matches!(self, SurfaceType::Top)
    }

    /// Check if this surface type is a bottom surface.
    #[inline]
    pub fn is_bottom(&self) -> bool {
        matches!(self, SurfaceType::Bottom | SurfaceType::BottomBridge)
    }

    /// Check if this surface type is a bridge.
    #[inline]
    pub fn is_bridge(&self) -> bool {
        matches!(
            self,
            SurfaceType::BottomBridge | SurfaceType::InternalBridge
        )
    }

    /// Check if this surface type requires solid infill.
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(
            self,
            SurfaceType::Top
                | SurfaceType::Bottom
                | SurfaceType::BottomBridge
                | SurfaceType::InternalSolid
                | SurfaceType::InternalBridge
        )
    }

    /// Check if this surface type is internal (not top or bottom).
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SurfaceType::Internal
                | SurfaceType::InternalSolid
                | SurfaceType::InternalBridge
                | SurfaceType::InternalVoid
        )
    }

    /// Get a human-readable name for this surface type.
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceType::Top => "top",
            SurfaceType::Bottom => "bottom",
            SurfaceType::BottomBridge => "bottom bridge",
            SurfaceType::InternalSolid => "internal solid",
            SurfaceType::Internal => "internal",
            SurfaceType::InternalBridge => "internal bridge",
            SurfaceType::InternalVoid => "internal void",
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A classified region within a layer.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// The geometry of this surface.
    pub expolygon: ExPolygon,

    /// The type/classification of this surface.
    pub surface_type: SurfaceType,

    /// Thickness of this surface, in mm. Negative when not yet known.
    pub thickness: CoordF,

    /// Number of layers this surface spans.
    pub thickness_layers: usize,

    /// Bridge angle in radians (for bridge surfaces).
    /// None if not a bridge or angle not yet determined.
    pub bridge_angle: Option<CoordF>,

    /// Extra perimeters needed for this surface.
    pub extra_perimeters: usize,
}

impl Surface {
    /// Create a new surface with the given geometry and type.
    pub fn new(expolygon: ExPolygon, surface_type: SurfaceType) -> Self {
        Self {
            expolygon,
            surface_type,
            thickness: -1.0,
            thickness_layers: 1,
            bridge_angle: None,
            extra_perimeters: 0,
        }
    }

    /// Create a new internal surface.
    pub fn internal(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::Internal)
    }

    /// Create a new bottom surface.
    pub fn bottom(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::Bottom)
    }

    /// Create a new top surface.
    pub fn top(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::Top)
    }

    /// Builder method: set the extra perimeter count.
    pub fn with_extra_perimeters(mut self, extra: usize) -> Self {
        self.extra_perimeters = extra;
        self
    }

    /// A new surface with different geometry and this surface's attributes.
    pub fn with_expolygon(&self, expolygon: ExPolygon) -> Self {
        Self {
            expolygon,
            surface_type: self.surface_type,
            thickness: self.thickness,
            thickness_layers: self.thickness_layers,
            bridge_angle: self.bridge_angle,
            extra_perimeters: self.extra_perimeters,
        }
    }

    /// Check if this surface is empty (no geometry).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expolygon.is_empty()
    }

    /// Get the area of this surface (scaled units squared).
    #[inline]
    pub fn area(&self) -> CoordF {
        self.expolygon.area()
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.surface_type.is_top()
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        self.surface_type.is_bottom()
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.surface_type.is_bridge()
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.surface_type.is_solid()
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        self.surface_type.is_internal()
    }

    /// Check whether the probe lies entirely inside this surface.
    #[inline]
    pub fn contains<T: SliceProbe + ?Sized>(&self, item: &T) -> bool {
        self.expolygon.contains(item)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surface({:?}, extra={}, area={:.2}mm²)",
            self.surface_type,
            self.extra_perimeters,
            unscale_area(self.area())
        )
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} surface (area={:.2}mm²)",
            self.surface_type,
            unscale_area(self.area())
        )
    }
}

impl From<ExPolygon> for Surface {
    fn from(expolygon: ExPolygon) -> Self {
        Self::new(expolygon, SurfaceType::default())
    }
}

/// Type alias for a list of surfaces.
pub type Surfaces = Vec<Surface>;

/// Collection of surfaces with utility methods.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCollection {
    /// The surfaces in this collection.
    pub surfaces: Vec<Surface>,
}

impl SurfaceCollection {
    /// Create a new empty surface collection.
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
        }
    }

    /// Create a surface collection from a vector of surfaces.
    pub fn from_surfaces(surfaces: Vec<Surface>) -> Self {
        Self { surfaces }
    }

    /// Wrap each polygon in a surface carrying the attributes of `template`.
    pub fn from_expolygons(expolygons: ExPolygons, template: &Surface) -> Self {
        Self {
            surfaces: expolygons
                .into_iter()
                .map(|e| template.with_expolygon(e))
                .collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Surface> {
        self.surfaces.iter()
    }

    /// Add a surface to the collection.
    pub fn push(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    /// Append every surface of `other`.
    pub fn append(&mut self, other: SurfaceCollection) {
        self.surfaces.extend(other.surfaces);
    }

    /// Clear all surfaces.
    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    /// The bare geometry of every surface, in order.
    pub fn expolygons(&self) -> ExPolygons {
        self.surfaces.iter().map(|s| s.expolygon.clone()).collect()
    }

    /// Get the total area of all surfaces (scaled units squared).
    pub fn total_area(&self) -> CoordF {
        self.surfaces.iter().map(|s| s.area()).sum()
    }

    /// True iff some internal surface fully contains the probe.
    pub fn any_internal_contains<T: SliceProbe + ?Sized>(&self, item: &T) -> bool {
        self.surfaces
            .iter()
            .any(|s| s.is_internal() && s.contains(item))
    }

    /// True iff some bottom surface fully contains the probe.
    pub fn any_bottom_contains<T: SliceProbe + ?Sized>(&self, item: &T) -> bool {
        self.surfaces
            .iter()
            .any(|s| s.is_bottom() && s.contains(item))
    }
}

impl fmt::Display for SurfaceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceCollection({} surfaces)", self.surfaces.len())
    }
}

impl FromIterator<Surface> for SurfaceCollection {
    fn from_iter<I: IntoIterator<Item = Surface>>(iter: I) -> Self {
        Self::from_surfaces(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SurfaceCollection {
    type Item = &'a Surface;
    type IntoIter = std::slice::Iter<'a, Surface>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.iter()
    }
}
