//! Layer data structure.
//!
//! A [`Layer`] is one horizontal cross-section of an object. It owns one
//! [`LayerRegion`] per print region present at its height and produces:
//! - the layer's islands ([`Layer::make_slices`])
//! - perimeter and fill areas for every region ([`Layer::make_perimeters`])
//!
//! Layers do not own their neighbours. The links to the layers above and
//! below are indices into the owning [`PrintObject`](crate::print::PrintObject),
//! which keeps them symmetric.

use crate::clipper::{intersection, union_ex, union_safety_offset_ex, validate_expolygons};
use crate::geometry::{chained_path, ExPolygon, ExPolygons, Point, SliceProbe};
use crate::perimeter::{ClassicPerimeterGenerator, PerimeterGenerator, PerimeterLoop};
use crate::print::{ObjectId, PrintRegion};
use crate::slice::{LayerRegion, Surface, SurfaceCollection};
use crate::{unscale_area, CoordF, Error, Result};
use log::{debug, trace, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single layer of a sliced object.
#[derive(Clone)]
pub struct Layer {
    /// Position in the owning stack.
    id: usize,

    /// The object this layer slices.
    object: ObjectId,

    /// Layer thickness (mm).
    height: CoordF,

    /// Z of the top of the layer (mm).
    print_z: CoordF,

    /// Z at which the cross-section was taken (mm).
    slice_z: CoordF,

    /// Set when the slicer found a non-manifold condition at this height.
    slicing_errors: bool,

    /// Islands: the union of every region's raw slices, in chained order.
    pub slices: ExPolygons,

    /// Perimeter areas of every region, for consumers that need the whole layer.
    pub perimeter_expolygons: ExPolygons,

    upper_layer: Option<usize>,
    lower_layer: Option<usize>,

    regions: Vec<LayerRegion>,
}

/// Perimeter outputs staged for one region until the whole layer succeeded.
struct RegionSplit {
    perimeter_surfaces: SurfaceCollection,
    fill_surfaces: SurfaceCollection,
    perimeters: Vec<PerimeterLoop>,
}

impl Layer {
    /// Create a new layer. Heights are in mm.
    pub fn new(id: usize, object: ObjectId, height: CoordF, print_z: CoordF, slice_z: CoordF) -> Self {
        Self {
            id,
            object,
            height,
            print_z,
            slice_z,
            slicing_errors: false,
            slices: Vec::new(),
            perimeter_expolygons: Vec::new(),
            upper_layer: None,
            lower_layer: None,
            regions: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Renumber the layer and every region it owns.
    pub fn set_id(&mut self, id: usize) {
        self.id = id;
        for region in &mut self.regions {
            region.set_layer_id(id);
        }
    }

    #[inline]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    #[inline]
    pub fn height(&self) -> CoordF {
        self.height
    }

    #[inline]
    pub fn print_z(&self) -> CoordF {
        self.print_z
    }

    #[inline]
    pub fn slice_z(&self) -> CoordF {
        self.slice_z
    }

    #[inline]
    pub fn slicing_errors(&self) -> bool {
        self.slicing_errors
    }

    pub fn set_slicing_errors(&mut self, errors: bool) {
        self.slicing_errors = errors;
    }

    /// Index of the layer above in the owning stack.
    #[inline]
    pub fn upper_layer(&self) -> Option<usize> {
        self.upper_layer
    }

    /// Index of the layer below in the owning stack.
    #[inline]
    pub fn lower_layer(&self) -> Option<usize> {
        self.lower_layer
    }

    pub(crate) fn set_upper_layer(&mut self, idx: Option<usize>) {
        self.upper_layer = idx;
    }

    pub(crate) fn set_lower_layer(&mut self, idx: Option<usize>) {
        self.lower_layer = idx;
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn regions(&self) -> &[LayerRegion] {
        &self.regions
    }

    pub fn get_region(&self, idx: usize) -> Result<&LayerRegion> {
        let len = self.regions.len();
        self.regions.get(idx).ok_or(Error::out_of_range(idx, len))
    }

    pub fn get_region_mut(&mut self, idx: usize) -> Result<&mut LayerRegion> {
        let len = self.regions.len();
        self.regions
            .get_mut(idx)
            .ok_or(Error::out_of_range(idx, len))
    }

    /// Append an empty region bound to this layer and `region`.
    pub fn add_region(&mut self, region: Arc<PrintRegion>) -> &mut LayerRegion {
        let idx = self.regions.len();
        self.regions.push(LayerRegion::new(self.id, region));
        &mut self.regions[idx]
    }

    /// Remove and drop the region at `idx`.
    pub fn delete_region(&mut self, idx: usize) -> Result<()> {
        if idx >= self.regions.len() {
            return Err(Error::out_of_range(idx, self.regions.len()));
        }
        self.regions.remove(idx);
        Ok(())
    }

    /// Remove every region, last first.
    pub fn clear_regions(&mut self) {
        while self.regions.pop().is_some() {}
    }

    // ------------------------------------------------------------------
    // Slices
    // ------------------------------------------------------------------

    /// Merge the regions' raw slices into the layer's islands.
    ///
    /// Islands are ordered by nearest-neighbour chaining of the first point
    /// of each outer contour. On error the previous islands are kept.
    pub fn make_slices(&mut self) -> Result<()> {
        let merged = if let [region] = self.regions.as_slice() {
            let raw = region.slices.expolygons();
            validate_expolygons(&raw)?;
            raw
        } else {
            let raw: ExPolygons = self
                .regions
                .iter()
                .flat_map(|r| r.slices.iter().map(|s| s.expolygon.clone()))
                .collect();
            validate_expolygons(&raw)?;
            union_ex(&raw)
        };

        let starts: Vec<Point> = merged
            .iter()
            .map(|island| island.contour.first_point().unwrap_or_default())
            .collect();
        let mut islands: Vec<Option<ExPolygon>> = merged.into_iter().map(Some).collect();
        self.slices = chained_path(&starts)
            .into_iter()
            .filter_map(|idx| islands[idx].take())
            .collect();

        if self.slicing_errors {
            warn!(
                "layer {} (z={:.3}) has slicing errors, {} islands",
                self.id,
                self.print_z,
                self.slices.len()
            );
        }
        debug!(
            "layer {}: {} regions merged into {} islands",
            self.id,
            self.regions.len(),
            self.slices.len()
        );
        Ok(())
    }

    /// Union each region's own raw slices into internal surfaces.
    ///
    /// All regions are merged before any is updated.
    pub fn merge_slices(&mut self) -> Result<()> {
        let merged = self
            .regions
            .iter()
            .map(LayerRegion::merged_slices)
            .collect::<Result<Vec<_>>>()?;
        for (region, slices) in self.regions.iter_mut().zip(merged) {
            region.slices = slices;
        }
        Ok(())
    }

    /// Total island area (scaled units squared).
    pub fn slices_area(&self) -> CoordF {
        self.slices.iter().map(|s| s.area()).sum()
    }

    // ------------------------------------------------------------------
    // Perimeters
    // ------------------------------------------------------------------

    /// Generate perimeters with the default offset-based routine.
    pub fn make_perimeters(&mut self) -> Result<()> {
        self.make_perimeters_with(&ClassicPerimeterGenerator)
    }

    /// Generate perimeters for every group of regions sharing perimeter settings.
    ///
    /// Each group runs `generator` once. Single-region groups use the
    /// region's raw slices directly; larger groups pool their slices by
    /// extra perimeter count and split the results back per region by
    /// intersecting with each region's raw slices.
    ///
    /// Raw slices are validated once up front; pooled clipper output is not
    /// re-checked, so regions touching at a corner pool into a pinched ring.
    /// Nothing is modified unless every group succeeds.
    pub fn make_perimeters_with(&mut self, generator: &dyn PerimeterGenerator) -> Result<()> {
        for region in &self.regions {
            validate_expolygons(&region.slices.expolygons())?;
        }

        let count = self.regions.len();
        let mut done = vec![false; count];
        let mut staged: Vec<Option<RegionSplit>> = (0..count).map(|_| None).collect();
        let mut perimeter_expolygons = ExPolygons::new();

        for first in 0..count {
            if done[first] {
                continue;
            }
            done[first] = true;

            let config = self.regions[first].config();
            let mut group = vec![first];
            for other in (first + 1)..count {
                if !done[other] && config.shares_perimeters_with(self.regions[other].config()) {
                    group.push(other);
                    done[other] = true;
                }
            }
            debug!("layer {}: perimeter group {:?}", self.id, group);

            let leader = &self.regions[first];
            if group.len() == 1 {
                let output = leader.make_perimeters(&leader.slices, self.height, generator)?;
                perimeter_expolygons.extend(output.perimeter_expolygons());
                staged[first] = Some(RegionSplit {
                    perimeter_surfaces: output.perimeter_surfaces,
                    fill_surfaces: output.fill_surfaces,
                    perimeters: output.loops,
                });
                continue;
            }

            let pooled = self.pool_group_slices(&group);
            let output = leader.make_perimeters(&pooled, self.height, generator)?;
            perimeter_expolygons.extend(output.perimeter_expolygons());

            let mut loops = Some(output.loops);
            for &member in &group {
                let own = self.regions[member].slices.expolygons();
                staged[member] = Some(RegionSplit {
                    perimeter_surfaces: split_to_region(&output.perimeter_surfaces, &own),
                    fill_surfaces: split_to_region(&output.fill_surfaces, &own),
                    perimeters: loops.take().unwrap_or_default(),
                });
                trace!(
                    "layer {}: region {} gets {:.3}mm² fill",
                    self.id,
                    member,
                    unscale_area(staged[member].as_ref().map_or(0.0, |s| s.fill_surfaces.total_area()))
                );
            }
        }

        for (region, split) in self.regions.iter_mut().zip(staged) {
            if let Some(split) = split {
                region.set_perimeter_output(split.perimeter_surfaces, split.fill_surfaces, split.perimeters);
            }
        }
        self.perimeter_expolygons = perimeter_expolygons;
        Ok(())
    }

    /// Pool the raw slices of `group`, merged per extra perimeter count.
    fn pool_group_slices(&self, group: &[usize]) -> SurfaceCollection {
        let mut buckets: BTreeMap<usize, Vec<&Surface>> = BTreeMap::new();
        for &idx in group {
            for surface in &self.regions[idx].slices {
                buckets.entry(surface.extra_perimeters).or_default().push(surface);
            }
        }

        let mut pooled = SurfaceCollection::new();
        for surfaces in buckets.values() {
            let expolygons: ExPolygons = surfaces.iter().map(|s| s.expolygon.clone()).collect();
            let merged = union_safety_offset_ex(&expolygons);
            // Buckets are never empty
            if let Some(template) = surfaces.first() {
                pooled.append(SurfaceCollection::from_expolygons(merged, template));
            }
        }
        pooled
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// True iff an internal raw slice of any region contains the probe.
    pub fn any_internal_region_slice_contains<T: SliceProbe + ?Sized>(&self, item: &T) -> bool {
        self.regions.iter().any(|r| r.slices.any_internal_contains(item))
    }

    /// True iff a bottom raw slice of any region contains the probe.
    pub fn any_bottom_region_slice_contains<T: SliceProbe + ?Sized>(&self, item: &T) -> bool {
        self.regions.iter().any(|r| r.slices.any_bottom_contains(item))
    }
}

/// The part of each pooled surface lying inside `own`, keeping the pooled
/// surface's attributes.
fn split_to_region(pooled: &SurfaceCollection, own: &[ExPolygon]) -> SurfaceCollection {
    pooled
        .iter()
        .flat_map(|surface| {
            intersection(std::slice::from_ref(&surface.expolygon), own)
                .into_iter()
                .map(move |piece| surface.with_expolygon(piece))
        })
        .collect()
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer(id={}, z={:.3}mm, height={:.3}mm, {} regions, {} islands)",
            self.id,
            self.print_z,
            self.height,
            self.regions.len(),
            self.slices.len()
        )
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer {} at z={:.3}mm (height={:.3}mm)",
            self.id, self.print_z, self.height
        )
    }
}
