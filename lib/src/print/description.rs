//! JSON job descriptions and processing summaries.
//!
//! A job lists the object's regions (as [`PrintRegionConfig`]s) and, per
//! layer, the raw slices of each region in mm:
//!
//! ```json
//! {
//!   "regions": [{ "perimeters": 2 }],
//!   "layers": [
//!     { "height": 0.2, "print_z": 0.2,
//!       "regions": [{ "region": 0, "surfaces": [
//!         { "contour": [[0,0],[10,0],[10,10],[0,10]], "surface_type": "bottom" }
//!       ]}]
//!     }
//!   ]
//! }
//! ```

use super::PrintObject;
use crate::config::PrintRegionConfig;
use crate::geometry::{ExPolygon, Point, Polygon};
use crate::perimeter::PerimeterLoop;
use crate::slice::{Layer, Surface, SurfaceType};
use crate::{unscale_area, CoordF, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A whole object to process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    #[serde(default)]
    pub id: usize,
    pub regions: Vec<PrintRegionConfig>,
    pub layers: Vec<LayerDescription>,
}

/// One layer of a job, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescription {
    pub height: CoordF,
    pub print_z: CoordF,
    /// Defaults to the middle of the layer.
    #[serde(default)]
    pub slice_z: Option<CoordF>,
    #[serde(default)]
    pub slicing_errors: bool,
    #[serde(default)]
    pub regions: Vec<RegionSlicesDescription>,
}

/// The raw slices of one region at one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSlicesDescription {
    /// Index into [`ObjectDescription::regions`].
    pub region: usize,
    #[serde(default)]
    pub surfaces: Vec<SurfaceDescription>,
}

/// A classified polygon with holes, in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDescription {
    pub contour: Vec<[CoordF; 2]>,
    #[serde(default)]
    pub holes: Vec<Vec<[CoordF; 2]>>,
    #[serde(default)]
    pub surface_type: SurfaceType,
    #[serde(default)]
    pub extra_perimeters: usize,
}

impl ObjectDescription {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the region configs and every region reference.
    pub fn validate(&self) -> Result<()> {
        for (idx, config) in self.regions.iter().enumerate() {
            config
                .validate()
                .map_err(|e| Error::Config(format!("region {idx}: {e}")))?;
        }
        for layer in &self.layers {
            if layer.height.is_nan() || layer.height <= 0.0 {
                return Err(Error::Config(format!(
                    "layer at z={} has non-positive height {}",
                    layer.print_z, layer.height
                )));
            }
            for slices in &layer.regions {
                if slices.region >= self.regions.len() {
                    return Err(Error::out_of_range(slices.region, self.regions.len()));
                }
            }
        }
        Ok(())
    }
}

impl SurfaceDescription {
    /// Convert to a scaled surface. Contours are made counter-clockwise and
    /// holes clockwise.
    pub fn to_surface(&self) -> Surface {
        let mut contour = ring(&self.contour);
        contour.make_counter_clockwise();
        let holes = self
            .holes
            .iter()
            .map(|h| {
                let mut hole = ring(h);
                hole.make_clockwise();
                hole
            })
            .collect();
        Surface::new(ExPolygon::with_holes(contour, holes), self.surface_type)
            .with_extra_perimeters(self.extra_perimeters)
    }
}

fn ring(points: &[[CoordF; 2]]) -> Polygon {
    Polygon::from_points(points.iter().map(|&[x, y]| Point::new_scale(x, y)).collect())
}

impl PrintObject {
    /// Build a linked stack from a job description.
    pub fn from_description(description: &ObjectDescription) -> Result<Self> {
        description.validate()?;

        let mut object = PrintObject::new(description.id);
        for config in &description.regions {
            object.add_region(config.clone());
        }
        for layer in &description.layers {
            let slice_z = layer.slice_z.unwrap_or(layer.print_z - layer.height / 2.0);
            let idx = object.add_layer(layer.height, layer.print_z, slice_z);
            object.layer_mut(idx)?.set_slicing_errors(layer.slicing_errors);
            for slices in &layer.regions {
                let region = object.add_layer_region(idx, slices.region)?;
                for surface in &slices.surfaces {
                    region.slices.push(surface.to_surface());
                }
            }
        }
        Ok(object)
    }

    /// Areas and counts of every layer, for reporting.
    pub fn summary(&self) -> ObjectSummary {
        ObjectSummary {
            id: self.id().0,
            layers: self.layers().iter().map(LayerSummary::from_layer).collect(),
        }
    }
}

/// Result of processing an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub id: usize,
    pub layers: Vec<LayerSummary>,
}

/// Per-layer figures, areas in mm².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub id: usize,
    pub print_z: CoordF,
    pub slicing_errors: bool,
    pub islands: usize,
    pub island_area: CoordF,
    pub perimeter_area: CoordF,
    pub regions: Vec<RegionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: usize,
    pub slice_area: CoordF,
    pub fill_surfaces: usize,
    pub fill_area: CoordF,
    pub perimeter_area: CoordF,
    pub loops: usize,
    /// Summed length of the region's loops, in mm.
    pub loop_length: CoordF,
}

impl LayerSummary {
    fn from_layer(layer: &Layer) -> Self {
        Self {
            id: layer.id(),
            print_z: layer.print_z(),
            slicing_errors: layer.slicing_errors(),
            islands: layer.slices.len(),
            island_area: unscale_area(layer.slices_area()),
            perimeter_area: unscale_area(layer.perimeter_expolygons.iter().map(ExPolygon::area).sum()),
            regions: layer
                .regions()
                .iter()
                .map(|r| RegionSummary {
                    region: r.region().id(),
                    slice_area: unscale_area(r.slices_area()),
                    fill_surfaces: r.fill_surfaces.len(),
                    fill_area: unscale_area(r.fill_surfaces.total_area()),
                    perimeter_area: unscale_area(r.perimeter_surfaces.total_area()),
                    loops: r.perimeters.len(),
                    loop_length: r.perimeters.iter().map(PerimeterLoop::length_mm).sum(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = r#"{
        "id": 7,
        "regions": [
            { "perimeters": 2 },
            { "perimeters": 2, "nozzle_diameter": 0.6 },
            { "perimeters": 4 }
        ],
        "layers": [
            { "height": 0.2, "print_z": 0.2, "regions": [
                { "region": 0, "surfaces": [
                    { "contour": [[0,0],[10,0],[10,10],[0,10]], "surface_type": "bottom" }
                ]},
                { "region": 1, "surfaces": [
                    { "contour": [[10,0],[20,0],[20,10],[10,10]] }
                ]}
            ]},
            { "height": 0.2, "print_z": 0.4, "slicing_errors": true, "regions": [
                { "region": 2, "surfaces": [
                    { "contour": [[0,0],[0,20],[20,20],[20,0]],
                      "holes": [[[5,5],[15,5],[15,15],[5,15]]],
                      "extra_perimeters": 1 }
                ]}
            ]}
        ]
    }"#;

    #[test]
    fn test_from_description() {
        let description = ObjectDescription::from_json_str(JOB).unwrap();
        let object = PrintObject::from_description(&description).unwrap();

        assert_eq!(object.id().0, 7);
        assert_eq!(object.region_count(), 3);
        assert_eq!(object.layer_count(), 2);
        assert!(object.links_are_symmetric());

        let first = object.layer(0).unwrap();
        assert!((first.slice_z() - 0.1).abs() < 1e-12);
        assert_eq!(first.region_count(), 2);
        assert_eq!(
            first.get_region(0).unwrap().slices.iter().next().unwrap().surface_type,
            SurfaceType::Bottom
        );

        let second = object.layer(1).unwrap();
        assert!(second.slicing_errors());
        let surface = second.get_region(0).unwrap().slices.iter().next().unwrap();
        assert_eq!(surface.extra_perimeters, 1);
        assert_eq!(surface.surface_type, SurfaceType::Internal);
        // Clockwise input contour was reoriented; hole area subtracted
        assert!(surface.expolygon.contour.signed_area() > 0.0);
        assert!((unscale_area(surface.area()) - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_region_rejected() {
        let job = r#"{ "regions": [{}], "layers": [
            { "height": 0.2, "print_z": 0.2, "regions": [{ "region": 3 }] }
        ]}"#;
        let description = ObjectDescription::from_json_str(job).unwrap();
        assert!(matches!(
            PrintObject::from_description(&description),
            Err(Error::OutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let job = r#"{ "regions": [{ "nozzle_diameter": -1 }], "layers": [] }"#;
        let description = ObjectDescription::from_json_str(job).unwrap();
        assert!(matches!(description.validate(), Err(Error::Config(_))));

        let job = r#"{ "regions": [{}], "layers": [{ "height": 0, "print_z": 0.2 }] }"#;
        let description = ObjectDescription::from_json_str(job).unwrap();
        assert!(matches!(description.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_summary_after_processing() {
        let description = ObjectDescription::from_json_str(JOB).unwrap();
        let mut object = PrintObject::from_description(&description).unwrap();
        object.make_slices().unwrap();
        object.make_perimeters().unwrap();

        let summary = object.summary();
        assert_eq!(summary.layers.len(), 2);

        // Two touching squares merge into one island
        let first = &summary.layers[0];
        assert_eq!(first.islands, 1);
        assert!((first.island_area - 200.0).abs() < 1e-6);
        assert_eq!(first.regions.len(), 2);
        for region in &first.regions {
            let covered = region.fill_area + region.perimeter_area;
            assert!(covered <= region.slice_area + 1e-3);
            assert!(region.fill_area > 0.0);
        }

        let second = &summary.layers[1];
        assert!(second.slicing_errors);
        // Four perimeters plus one extra, each around the contour and the hole
        assert_eq!(second.regions[0].loops, 5 * 2);
        // Contour loops are shorter than 80mm and hole loops longer than 40mm
        let length = second.regions[0].loop_length;
        assert!(length > 10.0 * 40.0 && length < 10.0 * 80.0, "{length}");

        let json = serde_json::to_string(&summary).unwrap();
        let back: ObjectSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
