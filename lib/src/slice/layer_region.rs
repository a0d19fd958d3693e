//! Per-layer, per-region geometry.

use crate::clipper::{union_ex, validate_expolygons};
use crate::config::PrintRegionConfig;
use crate::geometry::ExPolygon;
use crate::perimeter::{PerimeterConfig, PerimeterGenerator, PerimeterLoop, PerimeterOutput};
use crate::print::PrintRegion;
use crate::slice::{Surface, SurfaceCollection, SurfaceType};
use crate::{unscale_area, CoordF, Result};
use std::fmt;
use std::sync::Arc;

/// The part of one layer printed with one region's settings.
///
/// `slices` is the raw cross-section handed down by the slicer. The other
/// collections are outputs of perimeter generation and are replaced
/// wholesale on every pass.
#[derive(Clone)]
pub struct LayerRegion {
    /// Id of the owning layer.
    layer_id: usize,

    /// Shared region settings.
    region: Arc<PrintRegion>,

    /// Raw slice surfaces of this region.
    pub slices: SurfaceCollection,

    /// Area covered by perimeters.
    pub perimeter_surfaces: SurfaceCollection,

    /// Area left for infill.
    pub fill_surfaces: SurfaceCollection,

    /// Perimeter loops. In a pooled perimeter group only the first region
    /// of the group holds them.
    pub perimeters: Vec<PerimeterLoop>,
}

impl LayerRegion {
    pub(crate) fn new(layer_id: usize, region: Arc<PrintRegion>) -> Self {
        Self {
            layer_id,
            region,
            slices: SurfaceCollection::new(),
            perimeter_surfaces: SurfaceCollection::new(),
            fill_surfaces: SurfaceCollection::new(),
            perimeters: Vec::new(),
        }
    }

    /// Id of the layer owning this region.
    #[inline]
    pub fn layer_id(&self) -> usize {
        self.layer_id
    }

    pub(crate) fn set_layer_id(&mut self, id: usize) {
        self.layer_id = id;
    }

    /// The shared region this geometry belongs to.
    #[inline]
    pub fn region(&self) -> &Arc<PrintRegion> {
        &self.region
    }

    /// The region's settings.
    #[inline]
    pub fn config(&self) -> &PrintRegionConfig {
        self.region.config()
    }

    /// Add a raw slice surface.
    pub fn add_slice(&mut self, expolygon: ExPolygon, surface_type: SurfaceType) {
        self.slices.push(Surface::new(expolygon, surface_type));
    }

    /// Total raw slice area (scaled units squared).
    pub fn slices_area(&self) -> CoordF {
        self.slices.total_area()
    }

    /// Union the raw slices and store the result as internal surfaces.
    ///
    /// Overlapping or touching raw slices become single surfaces. Nothing is
    /// modified when the slices are degenerate.
    pub fn merge_slices(&mut self) -> Result<()> {
        self.slices = self.merged_slices()?;
        Ok(())
    }

    pub(crate) fn merged_slices(&self) -> Result<SurfaceCollection> {
        let expolygons = self.slices.expolygons();
        validate_expolygons(&expolygons)?;
        Ok(union_ex(&expolygons)
            .into_iter()
            .map(Surface::internal)
            .collect())
    }

    /// Run the perimeter routine on `slices` with this region's settings.
    ///
    /// Results are returned rather than stored; the layer decides which
    /// regions they belong to.
    pub fn make_perimeters(
        &self,
        slices: &SurfaceCollection,
        layer_height: CoordF,
        generator: &dyn PerimeterGenerator,
    ) -> Result<PerimeterOutput> {
        let config = PerimeterConfig::from_region(self.config(), layer_height)?;
        generator.generate(slices, &config)
    }

    /// Replace the perimeter outputs.
    pub(crate) fn set_perimeter_output(
        &mut self,
        perimeter_surfaces: SurfaceCollection,
        fill_surfaces: SurfaceCollection,
        perimeters: Vec<PerimeterLoop>,
    ) {
        self.perimeter_surfaces = perimeter_surfaces;
        self.fill_surfaces = fill_surfaces;
        self.perimeters = perimeters;
    }
}

impl fmt::Debug for LayerRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LayerRegion(layer={}, region={}, {} slices, {:.2}mm²)",
            self.layer_id,
            self.region.id(),
            self.slices.len(),
            unscale_area(self.slices_area())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::square_mm;
    use crate::perimeter::ClassicPerimeterGenerator;

    fn region() -> LayerRegion {
        LayerRegion::new(3, Arc::new(PrintRegion::new(0, PrintRegionConfig::default())))
    }

    #[test]
    fn test_layer_region_new() {
        let r = region();
        assert_eq!(r.layer_id(), 3);
        assert_eq!(r.region().id(), 0);
        assert!(r.slices.is_empty());
        assert!(r.fill_surfaces.is_empty());
        assert_eq!(r.config().perimeters, 3);
    }

    #[test]
    fn test_merge_slices() {
        let mut r = region();
        r.add_slice(square_mm(0.0, 0.0, 10.0), SurfaceType::Top);
        r.add_slice(square_mm(5.0, 0.0, 10.0), SurfaceType::Top);
        r.add_slice(square_mm(40.0, 0.0, 10.0), SurfaceType::Top);

        r.merge_slices().unwrap();
        assert_eq!(r.slices.len(), 2);
        assert!(r.slices.iter().all(|s| s.surface_type == SurfaceType::Internal));
        assert!((unscale_area(r.slices_area()) - 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_merge_slices_degenerate_keeps_state() {
        let mut r = region();
        r.add_slice(square_mm(0.0, 0.0, 10.0), SurfaceType::Internal);
        r.add_slice(ExPolygon::default(), SurfaceType::Internal);
        let before = r.slices.clone();

        assert!(r.merge_slices().is_err());
        assert_eq!(r.slices, before);
    }

    #[test]
    fn test_make_perimeters_returns_output() {
        let mut r = region();
        r.add_slice(square_mm(0.0, 0.0, 20.0), SurfaceType::Internal);

        let output = r
            .make_perimeters(&r.slices, 0.2, &ClassicPerimeterGenerator)
            .unwrap();
        assert_eq!(output.loops.len(), 3);
        // Nothing stored on the region itself
        assert!(r.fill_surfaces.is_empty());

        let covered = output.fill_surfaces.total_area() + output.perimeter_surfaces.total_area();
        assert!((unscale_area(covered) - 400.0).abs() < 1e-2);
    }
}
