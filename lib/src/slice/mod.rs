//! Layers and their per-region geometry.
//!
//! - [`Layer`] - One cross-section of an object: islands, neighbour links, regions
//! - [`LayerRegion`] - A region's raw slices and perimeter/fill outputs at one layer
//! - [`Surface`] / [`SurfaceCollection`] - Classified polygons-with-holes

mod layer;
mod layer_region;
mod surface;
#[cfg(feature = "debug-svg")]
mod svg;

pub use layer::Layer;
pub use layer_region::LayerRegion;
pub use surface::{Surface, SurfaceCollection, SurfaceType, Surfaces};
#[cfg(feature = "debug-svg")]
pub use svg::surface_type_color;
