//! Perimeter generation module.
//!
//! This module turns a region's slice surfaces into perimeter areas, fill
//! areas and perimeter loops.
//!
//! # Overview
//!
//! Layers treat the perimeter routine as a black box behind the
//! [`PerimeterGenerator`] trait. The one contract they rely on is that, for
//! every input surface, the perimeter area and the fill area together cover
//! the input exactly:
//!
//! ```text
//! area(perimeter_surfaces ∪ fill_surfaces) == area(input)
//! ```
//!
//! # Algorithm ([`ClassicPerimeterGenerator`])
//!
//! 1. Validate the input surfaces
//! 2. For each surface, inset by `(perimeters + extra_perimeters) × spacing`
//!    to get the fill area
//! 3. The perimeter area is the surface minus the fill area
//! 4. Loop centerlines are the contours of the surface inset by half a width,
//!    then by one spacing per further loop, until the area vanishes

use crate::clipper::{difference, shrink, OffsetJoinType};
use crate::config::PrintRegionConfig;
use crate::geometry::{chained_path, ExPolygon, ExPolygons, Polygon};
use crate::slice::{Surface, SurfaceCollection};
use crate::{CoordF, Error, Result};
use log::trace;

/// Ratio of the automatic extrusion width to the nozzle diameter.
const AUTO_WIDTH_RATIO: CoordF = 1.125;

/// Configuration for perimeter generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PerimeterConfig {
    /// Number of perimeter loops to generate (before per-surface extras).
    pub perimeter_count: usize,

    /// Extrusion width for perimeters (mm).
    pub perimeter_extrusion_width: CoordF,

    /// Spacing between perimeter centerlines (mm).
    /// Calculated as: width - height × (1 - π/4)
    pub perimeter_spacing: CoordF,

    /// Layer height (mm) - needed for spacing calculations.
    pub layer_height: CoordF,

    /// Whether to print external perimeters first (outside-in).
    pub external_perimeters_first: bool,

    /// Join type for perimeter offset corners.
    pub join_type: OffsetJoinType,
}

impl Default for PerimeterConfig {
    fn default() -> Self {
        Self::new(0.45, 0.2, 3)
    }
}

impl PerimeterConfig {
    /// Create a new perimeter configuration with proper spacing calculations.
    ///
    /// # Arguments
    /// * `perimeter_width` - Width of perimeters (mm)
    /// * `layer_height` - Layer height (mm)
    /// * `perimeter_count` - Number of perimeters to generate
    pub fn new(perimeter_width: CoordF, layer_height: CoordF, perimeter_count: usize) -> Self {
        let perimeter_spacing = Self::rounded_rectangle_spacing(perimeter_width, layer_height)
            .unwrap_or(perimeter_width * 0.9);

        Self {
            perimeter_count,
            perimeter_extrusion_width: perimeter_width,
            perimeter_spacing,
            layer_height,
            external_perimeters_first: false,
            join_type: OffsetJoinType::Miter,
        }
    }

    /// Resolve the perimeter settings of a region for a layer of the given height.
    ///
    /// A width of `0` means automatic (1.125 × nozzle); percentages are
    /// relative to the nozzle diameter.
    pub fn from_region(region: &PrintRegionConfig, layer_height: CoordF) -> Result<Self> {
        if layer_height <= 0.0 {
            return Err(Error::Config(format!(
                "Layer height must be positive, got {layer_height}"
            )));
        }

        let width = match region.perimeter_extrusion_width.value() {
            v if v == 0.0 => AUTO_WIDTH_RATIO * region.nozzle_diameter,
            _ => region
                .perimeter_extrusion_width
                .resolve(region.nozzle_diameter),
        };
        if width <= 0.0 {
            return Err(Error::Config(format!(
                "Perimeter extrusion width must be positive, got {width}"
            )));
        }

        let spacing = Self::rounded_rectangle_spacing(width, layer_height).ok_or_else(|| {
            Error::Config(format!(
                "Perimeter width {width} is too small for layer height {layer_height}"
            ))
        })?;

        Ok(Self {
            perimeter_count: region.perimeters as usize,
            perimeter_extrusion_width: width,
            perimeter_spacing: spacing,
            layer_height,
            external_perimeters_first: region.external_perimeters_first,
            join_type: OffsetJoinType::Miter,
        })
    }

    /// Centerline spacing of adjacent extrusions with rounded sides.
    ///
    /// `None` when the result would not be positive.
    pub fn rounded_rectangle_spacing(width: CoordF, height: CoordF) -> Option<CoordF> {
        let spacing = width - height * (1.0 - 0.25 * std::f64::consts::PI);
        (spacing > 0.0).then_some(spacing)
    }

    /// Depth of the perimeter band for a surface with `extra` added loops (mm).
    pub fn inset_depth(&self, extra: usize) -> CoordF {
        (self.perimeter_count + extra) as CoordF * self.perimeter_spacing
    }
}

/// A single perimeter loop with associated metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PerimeterLoop {
    /// The polygon representing the perimeter centerline.
    pub polygon: Polygon,

    /// Whether this is an external (outer) perimeter.
    pub is_external: bool,

    /// Whether this is a contour (outer boundary) or hole (inner boundary).
    pub is_contour: bool,

    /// The perimeter index (0 = outermost, increasing inward).
    pub perimeter_index: usize,

    /// Extrusion width for this perimeter (mm).
    pub extrusion_width: CoordF,
}

impl PerimeterLoop {
    /// Create a new perimeter loop.
    pub fn new(
        polygon: Polygon,
        is_contour: bool,
        perimeter_index: usize,
        extrusion_width: CoordF,
    ) -> Self {
        Self {
            polygon,
            is_external: perimeter_index == 0,
            is_contour,
            perimeter_index,
            extrusion_width,
        }
    }

    /// Get the perimeter length in mm.
    pub fn length_mm(&self) -> CoordF {
        self.polygon.perimeter() / crate::SCALING_FACTOR
    }
}

/// Result of perimeter generation for one set of surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerimeterOutput {
    /// Area covered by perimeters, tagged like the source surfaces.
    pub perimeter_surfaces: SurfaceCollection,

    /// Area left for infill, tagged like the source surfaces.
    pub fill_surfaces: SurfaceCollection,

    /// Generated perimeter loops, ordered for printing.
    pub loops: Vec<PerimeterLoop>,
}

impl PerimeterOutput {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry of the perimeter surfaces.
    pub fn perimeter_expolygons(&self) -> ExPolygons {
        self.perimeter_surfaces.expolygons()
    }
}

/// A perimeter routine.
///
/// Implementations must keep `perimeter_surfaces ∪ fill_surfaces` equal in
/// area to the input and must not overlap the two. They are shared between
/// the worker threads processing layers.
pub trait PerimeterGenerator: Sync {
    /// Generate perimeter and fill surfaces for `slices`.
    fn generate(
        &self,
        slices: &SurfaceCollection,
        config: &PerimeterConfig,
    ) -> Result<PerimeterOutput>;
}

/// Offset-based perimeter generator.
///
/// Generates fixed-width perimeters by insetting each surface, in the
/// nearest-neighbour order of the surfaces' first contour points.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicPerimeterGenerator;

impl ClassicPerimeterGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Perimeter loops for one surface, innermost last.
    fn loops_for(
        expoly: &ExPolygon,
        loop_count: usize,
        config: &PerimeterConfig,
    ) -> Vec<PerimeterLoop> {
        let mut loops = Vec::new();
        for idx in 0..loop_count {
            let inset = config.perimeter_extrusion_width / 2.0 + config.perimeter_spacing * idx as CoordF;
            let centerlines = shrink(std::slice::from_ref(expoly), inset, config.join_type);
            if centerlines.is_empty() {
                break;
            }
            for area in centerlines {
                loops.push(PerimeterLoop::new(
                    area.contour,
                    true,
                    idx,
                    config.perimeter_extrusion_width,
                ));
                loops.extend(area.holes.into_iter().map(|hole| {
                    PerimeterLoop::new(hole, false, idx, config.perimeter_extrusion_width)
                }));
            }
        }
        loops
    }

    fn generate_surface(
        surface: &Surface,
        config: &PerimeterConfig,
        output: &mut PerimeterOutput,
    ) {
        let loop_count = config.perimeter_count + surface.extra_perimeters;
        if loop_count == 0 {
            output.fill_surfaces.push(surface.clone());
            return;
        }

        let source = std::slice::from_ref(&surface.expolygon);
        let fill = shrink(source, config.inset_depth(surface.extra_perimeters), config.join_type);
        let perimeter = if fill.is_empty() {
            source.to_vec()
        } else {
            difference(source, &fill)
        };

        let mut loops = Self::loops_for(&surface.expolygon, loop_count, config);
        if config.external_perimeters_first {
            loops.sort_by_key(|l| l.perimeter_index);
        } else {
            loops.sort_by_key(|l| std::cmp::Reverse(l.perimeter_index));
        }

        trace!(
            "surface {:?}: {} loops, {} fill pieces",
            surface,
            loops.len(),
            fill.len()
        );

        output
            .perimeter_surfaces
            .append(SurfaceCollection::from_expolygons(perimeter, surface));
        output
            .fill_surfaces
            .append(SurfaceCollection::from_expolygons(fill, surface));
        output.loops.extend(loops);
    }
}

impl PerimeterGenerator for ClassicPerimeterGenerator {
    fn generate(
        &self,
        slices: &SurfaceCollection,
        config: &PerimeterConfig,
    ) -> Result<PerimeterOutput> {
        let starts: Vec<_> = slices
            .iter()
            .map(|s| s.expolygon.contour.first_point().unwrap_or_default())
            .collect();

        let mut output = PerimeterOutput::new();
        for idx in chained_path(&starts) {
            Self::generate_surface(&slices.surfaces[idx], config, &mut output);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::{intersection, total_area, union_ex};
    use crate::config::FloatOrPercent;
    use crate::geometry::{square_mm, Point};
    use crate::slice::SurfaceType;
    use crate::unscale_area;

    fn make_square_with_hole_mm(x: f64, y: f64, outer: f64, hole_offset: f64, hole: f64) -> ExPolygon {
        let contour = square_mm(x, y, outer).contour;
        let mut inner = square_mm(x + hole_offset, y + hole_offset, hole).contour;
        inner.make_clockwise();
        ExPolygon::with_holes(contour, vec![inner])
    }

    fn collection(expolys: Vec<ExPolygon>) -> SurfaceCollection {
        expolys.into_iter().map(Surface::internal).collect()
    }

    fn area_mm2(c: &SurfaceCollection) -> f64 {
        unscale_area(c.total_area())
    }

    #[test]
    fn test_perimeter_config_default() {
        let config = PerimeterConfig::default();
        assert_eq!(config.perimeter_count, 3);
        assert!((config.perimeter_extrusion_width - 0.45).abs() < 1e-6);
        assert!(config.perimeter_spacing < config.perimeter_extrusion_width);
        assert!(config.perimeter_spacing > 0.0);
    }

    #[test]
    fn test_perimeter_config_spacing() {
        let config = PerimeterConfig::new(0.45, 0.2, 3);

        // spacing = width - height × (1 - π/4) ≈ 0.45 - 0.2 × 0.2146 ≈ 0.407
        let expected_spacing = 0.45 - 0.2 * (1.0 - 0.25 * std::f64::consts::PI);
        assert!(
            (config.perimeter_spacing - expected_spacing).abs() < 1e-9,
            "Expected spacing ~{:.4}, got {:.4}",
            expected_spacing,
            config.perimeter_spacing
        );
        assert!((config.inset_depth(1) - 4.0 * expected_spacing).abs() < 1e-9);
    }

    #[test]
    fn test_from_region_widths() {
        let region = PrintRegionConfig::default().perimeters(2);
        let auto = PerimeterConfig::from_region(&region, 0.2).unwrap();
        assert!((auto.perimeter_extrusion_width - 0.45).abs() < 1e-9);
        assert_eq!(auto.perimeter_count, 2);

        let pct = region
            .clone()
            .perimeter_extrusion_width(FloatOrPercent::Percent(150.0));
        let cfg = PerimeterConfig::from_region(&pct, 0.2).unwrap();
        assert!((cfg.perimeter_extrusion_width - 0.6).abs() < 1e-9);

        let abs = region
            .clone()
            .perimeter_extrusion_width(FloatOrPercent::Value(0.5))
            .external_perimeters_first(true);
        let cfg = PerimeterConfig::from_region(&abs, 0.3).unwrap();
        assert!((cfg.perimeter_extrusion_width - 0.5).abs() < 1e-9);
        assert!(cfg.external_perimeters_first);
    }

    #[test]
    fn test_from_region_rejects_bad_input() {
        let region = PrintRegionConfig::default();
        assert!(matches!(
            PerimeterConfig::from_region(&region, 0.0),
            Err(Error::Config(_))
        ));

        let thin = region.perimeter_extrusion_width(FloatOrPercent::Value(0.01));
        assert!(matches!(
            PerimeterConfig::from_region(&thin, 0.2),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_generator_simple_square() {
        let slices = collection(vec![square_mm(0.0, 0.0, 20.0)]);
        let config = PerimeterConfig::new(0.5, 0.2, 2);

        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        assert_eq!(output.loops.len(), 2);
        assert_eq!(output.fill_surfaces.len(), 1);
        assert!(!output.perimeter_surfaces.is_empty());

        let depth = config.inset_depth(0);
        let fill_side = 20.0 - 2.0 * depth;
        assert!((area_mm2(&output.fill_surfaces) - fill_side * fill_side).abs() < 0.1);
        assert!(output.loops.iter().map(PerimeterLoop::length_mm).sum::<f64>() > 0.0);
    }

    #[test]
    fn test_generator_partition() {
        let slices = collection(vec![
            square_mm(0.0, 0.0, 20.0),
            make_square_with_hole_mm(30.0, 0.0, 30.0, 10.0, 10.0),
        ]);
        let config = PerimeterConfig::default();
        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        let input = area_mm2(&slices);
        let covered = area_mm2(&output.fill_surfaces) + area_mm2(&output.perimeter_surfaces);
        assert!((covered - input).abs() < 1e-2, "{covered} vs {input}");

        let overlap = intersection(
            &output.fill_surfaces.expolygons(),
            &output.perimeter_expolygons(),
        );
        assert!(unscale_area(total_area(&overlap)) < 1e-3);

        let merged = union_ex(
            &[output.fill_surfaces.expolygons(), output.perimeter_expolygons()].concat(),
        );
        assert!((unscale_area(total_area(&merged)) - input).abs() < 1e-2);
    }

    #[test]
    fn test_generator_with_hole() {
        let slices = collection(vec![make_square_with_hole_mm(0.0, 0.0, 30.0, 10.0, 10.0)]);
        let config = PerimeterConfig::new(0.45, 0.2, 3);
        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        // Contour and hole loop for each of the three levels
        assert_eq!(output.loops.len(), 6);
        assert_eq!(output.loops.iter().filter(|l| !l.is_contour).count(), 3);
        assert_eq!(output.fill_surfaces.len(), 1);
        assert_eq!(output.fill_surfaces.surfaces[0].expolygon.holes.len(), 1);
    }

    #[test]
    fn test_generator_too_small() {
        // Inset depth exceeds half the side, so everything is perimeter
        let slices = collection(vec![square_mm(0.0, 0.0, 1.0)]);
        let config = PerimeterConfig::new(0.5, 0.2, 3);
        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        assert!(output.fill_surfaces.is_empty());
        assert!((area_mm2(&output.perimeter_surfaces) - 1.0).abs() < 1e-6);
        assert!(!output.loops.is_empty());
    }

    #[test]
    fn test_generator_zero_perimeters() {
        let slices = collection(vec![square_mm(0.0, 0.0, 20.0)]);
        let config = PerimeterConfig::new(0.45, 0.2, 0);
        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        assert!(output.loops.is_empty());
        assert!(output.perimeter_surfaces.is_empty());
        assert_eq!(output.fill_surfaces, slices);
    }

    #[test]
    fn test_extra_perimeters_deepen_inset() {
        let plain = collection(vec![square_mm(0.0, 0.0, 20.0)]);
        let extra: SurfaceCollection = plain
            .iter()
            .map(|s| s.clone().with_extra_perimeters(2))
            .collect();
        let config = PerimeterConfig::new(0.45, 0.2, 1);

        let a = ClassicPerimeterGenerator.generate(&plain, &config).unwrap();
        let b = ClassicPerimeterGenerator.generate(&extra, &config).unwrap();
        assert!(area_mm2(&b.fill_surfaces) < area_mm2(&a.fill_surfaces));
        assert_eq!(b.loops.len(), 3);
        assert!(b.fill_surfaces.iter().all(|s| s.extra_perimeters == 2));
    }

    #[test]
    fn test_outputs_copy_source_attributes() {
        let slices: SurfaceCollection = vec![
            Surface::new(square_mm(0.0, 0.0, 20.0), SurfaceType::Bottom),
            Surface::new(square_mm(30.0, 0.0, 20.0), SurfaceType::Top),
        ]
        .into_iter()
        .collect();
        let output = ClassicPerimeterGenerator
            .generate(&slices, &PerimeterConfig::default())
            .unwrap();

        assert_eq!(output.fill_surfaces.iter().filter(|s| s.surface_type == SurfaceType::Bottom).count(), 1);
        assert_eq!(output.fill_surfaces.iter().filter(|s| s.surface_type == SurfaceType::Top).count(), 1);
        assert!(output
            .perimeter_surfaces
            .iter()
            .all(|s| s.surface_type != SurfaceType::Internal));
    }

    #[test]
    fn test_ordering_outside_in() {
        let slices = collection(vec![square_mm(0.0, 0.0, 20.0)]);
        let mut config = PerimeterConfig::new(0.45, 0.2, 3);
        config.external_perimeters_first = true;
        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        assert!(output.loops[0].is_external);
        assert_eq!(output.loops[0].perimeter_index, 0);
        assert_eq!(output.loops[2].perimeter_index, 2);
    }

    #[test]
    fn test_ordering_inside_out() {
        let slices = collection(vec![square_mm(0.0, 0.0, 20.0)]);
        let config = PerimeterConfig::new(0.45, 0.2, 3);
        let output = ClassicPerimeterGenerator.generate(&slices, &config).unwrap();

        assert_eq!(output.loops[0].perimeter_index, 2);
        assert!(output.loops.last().unwrap().is_external);
    }

    #[test]
    fn test_pinched_slice_generates() {
        // Pooled output of two squares meeting at (10, 10)
        let pinched = ExPolygon::new(Polygon::from_points(
            [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 10.0), (20.0, 20.0), (10.0, 20.0), (10.0, 10.0), (0.0, 10.0)]
                .iter()
                .map(|&(x, y)| Point::new_scale(x, y))
                .collect(),
        ));
        let config = PerimeterConfig::new(0.45, 0.2, 1);
        let output = ClassicPerimeterGenerator
            .generate(&collection(vec![pinched]), &config)
            .unwrap();

        assert!(!output.loops.is_empty());
        assert!(!output.fill_surfaces.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let output = ClassicPerimeterGenerator
            .generate(&SurfaceCollection::new(), &PerimeterConfig::default())
            .unwrap();
        assert_eq!(output, PerimeterOutput::new());
    }
}
