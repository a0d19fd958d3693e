//! Region configuration.

mod print_config;

pub use print_config::{FloatOrPercent, PrintRegionConfig};
