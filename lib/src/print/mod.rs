//! Print objects: the owning stack of layers.
//!
//! A [`PrintObject`] owns its layers and the shared [`PrintRegion`]s. It is
//! the only place where neighbour links change, so it keeps them symmetric:
//! whenever `layers[a].upper_layer() == Some(b)`, `layers[b].lower_layer() == Some(a)`.
//!
//! Slice merging and perimeter generation run one worker per layer on the
//! rayon pool; they never touch the links.

mod description;

pub use description::{
    LayerDescription, LayerSummary, ObjectDescription, ObjectSummary, RegionSlicesDescription,
    RegionSummary, SurfaceDescription,
};

use crate::config::PrintRegionConfig;
use crate::perimeter::{ClassicPerimeterGenerator, PerimeterGenerator};
use crate::slice::{Layer, LayerRegion};
use crate::{CoordF, Error, Result};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a print object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// A material region: settings shared by every layer that prints it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRegion {
    id: usize,
    config: PrintRegionConfig,
}

impl PrintRegion {
    pub fn new(id: usize, config: PrintRegionConfig) -> Self {
        Self { id, config }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &PrintRegionConfig {
        &self.config
    }
}

/// An object being printed, as a stack of layers ordered by Z.
#[derive(Debug, Default)]
pub struct PrintObject {
    id: ObjectId,
    regions: Vec<Arc<PrintRegion>>,
    layers: Vec<Layer>,
}

impl PrintObject {
    pub fn new(id: usize) -> Self {
        Self {
            id: ObjectId(id),
            regions: Vec::new(),
            layers: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    /// Register a region and return its index.
    pub fn add_region(&mut self, config: PrintRegionConfig) -> usize {
        let idx = self.regions.len();
        self.regions.push(Arc::new(PrintRegion::new(idx, config)));
        idx
    }

    pub fn region(&self, idx: usize) -> Result<&Arc<PrintRegion>> {
        self.regions
            .get(idx)
            .ok_or_else(|| Error::out_of_range(idx, self.regions.len()))
    }

    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, idx: usize) -> Result<&Layer> {
        self.layers
            .get(idx)
            .ok_or_else(|| Error::out_of_range(idx, self.layers.len()))
    }

    pub fn layer_mut(&mut self, idx: usize) -> Result<&mut Layer> {
        let len = self.layers.len();
        self.layers
            .get_mut(idx)
            .ok_or_else(|| Error::out_of_range(idx, len))
    }

    /// The layer above `idx`, if linked.
    pub fn upper_layer(&self, idx: usize) -> Result<Option<&Layer>> {
        Ok(self.layer(idx)?.upper_layer().map(|up| &self.layers[up]))
    }

    /// The layer below `idx`, if linked.
    pub fn lower_layer(&self, idx: usize) -> Result<Option<&Layer>> {
        Ok(self.layer(idx)?.lower_layer().map(|down| &self.layers[down]))
    }

    /// Append a layer on top of the stack, linked to the previous top layer.
    pub fn add_layer(&mut self, height: CoordF, print_z: CoordF, slice_z: CoordF) -> usize {
        let idx = self.layers.len();
        self.layers
            .push(Layer::new(idx, self.id, height, print_z, slice_z));
        if idx > 0 {
            self.layers[idx - 1].set_upper_layer(Some(idx));
            self.layers[idx].set_lower_layer(Some(idx - 1));
        }
        idx
    }

    /// Insert a layer at `idx`, shifting the layers above it up by one.
    ///
    /// Ids are renumbered and the new layer is linked between its neighbours.
    pub fn insert_layer(
        &mut self,
        idx: usize,
        height: CoordF,
        print_z: CoordF,
        slice_z: CoordF,
    ) -> Result<usize> {
        if idx > self.layers.len() {
            return Err(Error::out_of_range(idx, self.layers.len()));
        }

        // Shift links pointing at or above the insertion point
        for layer in &mut self.layers {
            layer.set_upper_layer(layer.upper_layer().map(|i| if i >= idx { i + 1 } else { i }));
            layer.set_lower_layer(layer.lower_layer().map(|i| if i >= idx { i + 1 } else { i }));
        }
        self.layers
            .insert(idx, Layer::new(idx, self.id, height, print_z, slice_z));
        self.renumber();

        let below = idx.checked_sub(1);
        let above = (idx + 1 < self.layers.len()).then_some(idx + 1);
        if let (Some(b), Some(a)) = (below, above) {
            // Break the direct link the new layer sits in
            if self.layers[b].upper_layer() == Some(a) {
                self.layers[b].set_upper_layer(None);
                self.layers[a].set_lower_layer(None);
            }
        }
        if let Some(b) = below {
            self.link_layers(b, idx)?;
        }
        if let Some(a) = above {
            self.link_layers(idx, a)?;
        }
        Ok(idx)
    }

    /// Remove the layer at `idx`.
    ///
    /// The neighbours' references to it are cleared first, then its regions
    /// are released and it is dropped. If it had a layer on both sides, those
    /// two are linked to each other afterwards.
    pub fn delete_layer(&mut self, idx: usize) -> Result<()> {
        let layer = self.layer(idx)?;
        let (upper, lower) = (layer.upper_layer(), layer.lower_layer());
        if let Some(up) = upper {
            self.layers[up].set_lower_layer(None);
        }
        if let Some(down) = lower {
            self.layers[down].set_upper_layer(None);
        }

        let mut removed = self.layers.remove(idx);
        removed.clear_regions();
        drop(removed);

        let shift = |i: usize| if i > idx { i - 1 } else { i };
        for layer in &mut self.layers {
            layer.set_upper_layer(layer.upper_layer().map(shift));
            layer.set_lower_layer(layer.lower_layer().map(shift));
        }
        if let (Some(down), Some(up)) = (lower, upper) {
            self.link_layers(shift(down), shift(up))?;
        }
        self.renumber();
        debug!("{}: deleted layer {}, {} left", self.id, idx, self.layers.len());
        Ok(())
    }

    /// Link `below` and `above` as neighbours.
    ///
    /// Any previous partner on either side is unlinked so symmetry holds.
    pub fn link_layers(&mut self, below: usize, above: usize) -> Result<()> {
        self.layer(below)?;
        self.layer(above)?;
        if below == above {
            return Err(Error::Config(format!("cannot link layer {below} to itself")));
        }

        if let Some(old) = self.layers[below].upper_layer() {
            self.layers[old].set_lower_layer(None);
        }
        if let Some(old) = self.layers[above].lower_layer() {
            self.layers[old].set_upper_layer(None);
        }
        self.layers[below].set_upper_layer(Some(above));
        self.layers[above].set_lower_layer(Some(below));
        Ok(())
    }

    /// Rebuild the whole chain from stack order.
    pub fn relink(&mut self) {
        let count = self.layers.len();
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            layer.set_lower_layer(idx.checked_sub(1));
            layer.set_upper_layer((idx + 1 < count).then_some(idx + 1));
        }
    }

    /// Check that every neighbour link has its mirror.
    pub fn links_are_symmetric(&self) -> bool {
        self.layers.iter().enumerate().all(|(idx, layer)| {
            let up_ok = layer
                .upper_layer()
                .map_or(true, |up| self.layers.get(up).and_then(Layer::lower_layer) == Some(idx));
            let down_ok = layer
                .lower_layer()
                .map_or(true, |down| self.layers.get(down).and_then(Layer::upper_layer) == Some(idx));
            up_ok && down_ok
        })
    }

    fn renumber(&mut self) {
        for (idx, layer) in self.layers.iter_mut().enumerate() {
            layer.set_id(idx);
        }
    }

    /// Add the region `region` to layer `layer` and return it.
    pub fn add_layer_region(&mut self, layer: usize, region: usize) -> Result<&mut LayerRegion> {
        let region = Arc::clone(self.region(region)?);
        Ok(self.layer_mut(layer)?.add_region(region))
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Merge slices on every layer in parallel.
    ///
    /// Every layer is attempted; the error of the lowest failing layer is returned.
    pub fn make_slices(&mut self) -> Result<()> {
        first_error(self.layers.par_iter_mut().map(Layer::make_slices).collect())
    }

    /// Generate perimeters on every layer in parallel with the default routine.
    pub fn make_perimeters(&mut self) -> Result<()> {
        self.make_perimeters_with(&ClassicPerimeterGenerator)
    }

    pub fn make_perimeters_with(&mut self, generator: &dyn PerimeterGenerator) -> Result<()> {
        first_error(
            self.layers
                .par_iter_mut()
                .map(|layer| layer.make_perimeters_with(generator))
                .collect(),
        )
    }

    /// Merge slices and generate perimeters, one worker per layer.
    ///
    /// `on_layer_done` is called from the worker once a layer finished
    /// successfully.
    pub fn process_layers<F>(&mut self, generator: &dyn PerimeterGenerator, on_layer_done: F) -> Result<()>
    where
        F: Fn(&Layer) + Sync,
    {
        first_error(
            self.layers
                .par_iter_mut()
                .map(|layer| {
                    layer.make_slices()?;
                    layer.make_perimeters_with(generator)?;
                    on_layer_done(layer);
                    Ok(())
                })
                .collect(),
        )
    }
}

fn first_error(results: Vec<Result<()>>) -> Result<()> {
    results.into_iter().collect()
}

impl fmt::Display for PrintObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} regions, {} layers)",
            self.id,
            self.regions.len(),
            self.layers.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{square_mm, ExPolygon};
    use crate::slice::SurfaceType;
    use crate::unscale_area;

    fn make_stack(count: usize) -> PrintObject {
        let mut object = PrintObject::new(1);
        for i in 0..count {
            let z = 0.2 * (i + 1) as f64;
            object.add_layer(0.2, z, z - 0.1);
        }
        object
    }

    fn ids(object: &PrintObject) -> Vec<usize> {
        object.layers().iter().map(Layer::id).collect()
    }

    #[test]
    fn test_add_layer_links_neighbours() {
        let object = make_stack(3);
        assert_eq!(object.layer_count(), 3);
        assert!(object.links_are_symmetric());

        assert_eq!(object.layer(0).unwrap().lower_layer(), None);
        assert_eq!(object.layer(0).unwrap().upper_layer(), Some(1));
        assert_eq!(object.layer(1).unwrap().lower_layer(), Some(0));
        assert_eq!(object.layer(2).unwrap().upper_layer(), None);

        let above = object.upper_layer(0).unwrap().unwrap();
        assert_eq!(above.id(), 1);
        assert!(object.lower_layer(0).unwrap().is_none());
        assert_eq!(object.layer(2).unwrap().object(), ObjectId(1));
    }

    #[test]
    fn test_delete_layer_links_neighbours() {
        let mut object = make_stack(3);
        object.delete_layer(1).unwrap();

        assert_eq!(object.layer_count(), 2);
        assert_eq!(ids(&object), vec![0, 1]);
        assert_eq!(object.layer(0).unwrap().upper_layer(), Some(1));
        assert_eq!(object.layer(1).unwrap().lower_layer(), Some(0));
        assert!(object.links_are_symmetric());

        // Deleting from the middle of a longer stack keeps the chain whole
        let mut object = make_stack(5);
        object.delete_layer(2).unwrap();
        for idx in 0..3 {
            assert_eq!(object.upper_layer(idx).unwrap().map(Layer::id), Some(idx + 1));
        }
        assert!(object.links_are_symmetric());
    }

    #[test]
    fn test_delete_top_and_bottom() {
        let mut object = make_stack(3);
        object.delete_layer(2).unwrap();
        assert_eq!(object.layer(1).unwrap().upper_layer(), None);
        assert_eq!(object.layer(1).unwrap().lower_layer(), Some(0));

        object.delete_layer(0).unwrap();
        assert_eq!(object.layer_count(), 1);
        assert_eq!(object.layer(0).unwrap().lower_layer(), None);
        assert!(object.links_are_symmetric());

        assert!(matches!(
            object.delete_layer(5),
            Err(Error::OutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_delete_layer_shifts_links_above() {
        let mut object = make_stack(4);
        object.delete_layer(0).unwrap();
        // Former layers 1..4 are now 0..3 and still chained
        assert_eq!(object.layer(0).unwrap().upper_layer(), Some(1));
        assert_eq!(object.layer(2).unwrap().lower_layer(), Some(1));
        assert!(object.links_are_symmetric());
    }

    #[test]
    fn test_insert_layer() {
        let mut object = make_stack(2);
        let idx = object.insert_layer(1, 0.1, 0.3, 0.25).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(ids(&object), vec![0, 1, 2]);
        assert_eq!(object.layer(0).unwrap().upper_layer(), Some(1));
        assert_eq!(object.layer(1).unwrap().upper_layer(), Some(2));
        assert_eq!(object.layer(2).unwrap().lower_layer(), Some(1));
        assert!((object.layer(1).unwrap().height() - 0.1).abs() < 1e-12);
        assert!(object.links_are_symmetric());

        let top = object.insert_layer(3, 0.2, 0.6, 0.5).unwrap();
        assert_eq!(object.layer(top).unwrap().lower_layer(), Some(2));
        let bottom = object.insert_layer(0, 0.1, 0.1, 0.05).unwrap();
        assert_eq!(object.layer(bottom).unwrap().upper_layer(), Some(1));
        assert!(object.links_are_symmetric());

        assert!(object.insert_layer(10, 0.2, 1.0, 0.9).is_err());
    }

    #[test]
    fn test_link_layers_keeps_symmetry() {
        let mut object = make_stack(3);
        object.link_layers(0, 2).unwrap();
        assert_eq!(object.layer(0).unwrap().upper_layer(), Some(2));
        assert_eq!(object.layer(2).unwrap().lower_layer(), Some(0));
        // Layer 1 lost both partners
        assert_eq!(object.layer(1).unwrap().lower_layer(), None);
        assert_eq!(object.layer(1).unwrap().upper_layer(), None);
        assert!(object.links_are_symmetric());

        assert!(object.link_layers(1, 1).is_err());
        assert!(object.link_layers(0, 7).is_err());
    }

    #[test]
    fn test_regions_and_layer_regions() {
        let mut object = make_stack(2);
        let r = object.add_region(PrintRegionConfig::default());
        assert_eq!(r, 0);
        assert_eq!(object.region_count(), 1);
        assert!(object.region(1).is_err());

        object
            .add_layer_region(1, r)
            .unwrap()
            .add_slice(square_mm(0.0, 0.0, 10.0), SurfaceType::Internal);
        let layer = object.layer(1).unwrap();
        assert_eq!(layer.region_count(), 1);
        assert_eq!(layer.get_region(0).unwrap().layer_id(), 1);
        assert!(Arc::ptr_eq(layer.get_region(0).unwrap().region(), object.region(r).unwrap()));

        assert!(matches!(
            object.add_layer_region(5, r),
            Err(Error::OutOfRange { index: 5, len: 2 })
        ));
        assert!(matches!(
            object.add_layer_region(0, 3),
            Err(Error::OutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_parallel_processing() {
        let mut object = make_stack(8);
        let r = object.add_region(PrintRegionConfig::default());
        for i in 0..8 {
            let size = 10.0 + i as f64;
            object
                .add_layer_region(i, r)
                .unwrap()
                .add_slice(square_mm(0.0, 0.0, size), SurfaceType::Internal);
        }

        object.make_slices().unwrap();
        object.make_perimeters().unwrap();
        for (i, layer) in object.layers().iter().enumerate() {
            let size = 10.0 + i as f64;
            assert_eq!(layer.slices.len(), 1);
            assert!((unscale_area(layer.slices_area()) - size * size).abs() < 1e-6);
            assert!(!layer.get_region(0).unwrap().fill_surfaces.is_empty());
        }
        assert!(object.links_are_symmetric());
    }

    #[test]
    fn test_parallel_error_reports_lowest_layer() {
        let mut object = make_stack(4);
        let r = object.add_region(PrintRegionConfig::default());
        for i in [1, 3] {
            object
                .add_layer_region(i, r)
                .unwrap()
                .add_slice(ExPolygon::default(), SurfaceType::Internal);
        }
        object
            .add_layer_region(0, r)
            .unwrap()
            .add_slice(square_mm(0.0, 0.0, 5.0), SurfaceType::Internal);

        let err = object.make_slices().unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry(_)));
        // Healthy layers were still processed
        assert_eq!(object.layer(0).unwrap().slices.len(), 1);
    }

    #[test]
    fn test_process_layers_reports_progress() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut object = make_stack(5);
        let r = object.add_region(PrintRegionConfig::default());
        for i in 0..5 {
            object
                .add_layer_region(i, r)
                .unwrap()
                .add_slice(square_mm(0.0, 0.0, 10.0), SurfaceType::Internal);
        }

        let done = AtomicUsize::new(0);
        object
            .process_layers(&ClassicPerimeterGenerator, |_| {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 5);
        assert!(object.layers().iter().all(|l| !l.perimeter_expolygons.is_empty()));
    }
}
