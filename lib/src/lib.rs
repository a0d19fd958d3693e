//! # Slicer layers
//!
//! The layer-composition stage of a 3D-printing slicing pipeline.
//!
//! Given a stack of horizontal cross-sections of a model, each already split
//! by print region, this library:
//! - merges per-region slice polygons into the layer's islands
//! - keeps every layer linked to its neighbours above and below
//! - generates perimeters once per group of regions sharing perimeter settings
//!   and splits the resulting fill/perimeter areas back to each region
//!
//! ## Example
//!
//! ```rust,ignore
//! use slicer_layers::geometry::square_mm;
//! use slicer_layers::{PrintObject, PrintRegionConfig, SurfaceType};
//!
//! let mut object = PrintObject::new(0);
//! let region = object.add_region(PrintRegionConfig::default());
//! let layer = object.add_layer(0.2, 0.2, 0.1);
//! object
//!     .add_layer_region(layer, region)?
//!     .add_slice(square_mm(0.0, 0.0, 10.0), SurfaceType::Internal);
//! object.make_slices()?;
//! object.make_perimeters()?;
//! ```

// Core modules
pub mod clipper;
pub mod config;
pub mod geometry;
pub mod perimeter;
pub mod print;
pub mod slice;

pub use config::{FloatOrPercent, PrintRegionConfig};
pub use geometry::{
    chained_path, BoundingBox, ExPolygon, ExPolygons, Line, Point, Polygon, Polyline, SliceProbe,
};
pub use perimeter::{
    ClassicPerimeterGenerator, PerimeterConfig, PerimeterGenerator, PerimeterLoop,
    PerimeterOutput,
};
pub use print::{ObjectDescription, ObjectId, ObjectSummary, PrintObject, PrintRegion};
pub use slice::{Layer, LayerRegion, Surface, SurfaceCollection, SurfaceType, Surfaces};

/// Coordinate type used throughout the library.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid floating-point issues.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values.
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Scale a floating-point coordinate to integer.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer coordinate to floating-point.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Convert a scaled area (nm²) to mm².
#[inline]
pub fn unscale_area(area: CoordF) -> CoordF {
    area / (SCALING_FACTOR * SCALING_FACTOR)
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for layer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an out-of-range error for an index into a collection of `len` items.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
