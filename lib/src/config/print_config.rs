//! Print region configuration types.
//!
//! A [`PrintRegionConfig`] holds the settings of one material region. It is
//! shared (read-only) by every layer that prints the region, and it decides
//! which regions of a layer may have their perimeters generated together.

use crate::{CoordF, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Settings of a single print region.
///
/// Only the eight perimeter fields take part in
/// [`shares_perimeters_with`](Self::shares_perimeters_with). The nozzle
/// diameter only resolves automatic and relative widths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintRegionConfig {
    // === Perimeters ===
    /// Extruder used for perimeters (1-based).
    pub perimeter_extruder: u32,
    /// Number of perimeter loops.
    pub perimeters: u32,
    /// Perimeter print speed (mm/s).
    pub perimeter_speed: CoordF,
    /// Gap fill speed (mm/s).
    pub gap_fill_speed: CoordF,
    /// Detect and slow down on overhangs.
    pub overhangs: bool,
    /// Perimeter extrusion width. `0` means automatic.
    pub perimeter_extrusion_width: FloatOrPercent,
    /// Generate single-line walls for features thinner than two perimeters.
    pub thin_walls: bool,
    /// Print the outermost perimeter before the inner ones.
    pub external_perimeters_first: bool,

    // === Extrusion ===
    /// Nozzle diameter of the perimeter extruder (mm).
    pub nozzle_diameter: CoordF,
}

impl PrintRegionConfig {
    /// Create a new PrintRegionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Builder method: set perimeter extruder.
    pub fn perimeter_extruder(mut self, extruder: u32) -> Self {
        self.perimeter_extruder = extruder;
        self
    }

    /// Builder method: set perimeter count.
    pub fn perimeters(mut self, count: u32) -> Self {
        self.perimeters = count;
        self
    }

    /// Builder method: set perimeter speed.
    pub fn perimeter_speed(mut self, speed: CoordF) -> Self {
        self.perimeter_speed = speed;
        self
    }

    /// Builder method: set gap fill speed.
    pub fn gap_fill_speed(mut self, speed: CoordF) -> Self {
        self.gap_fill_speed = speed;
        self
    }

    /// Builder method: enable or disable overhang detection.
    pub fn overhangs(mut self, enabled: bool) -> Self {
        self.overhangs = enabled;
        self
    }

    /// Builder method: set perimeter extrusion width.
    pub fn perimeter_extrusion_width(mut self, width: FloatOrPercent) -> Self {
        self.perimeter_extrusion_width = width;
        self
    }

    /// Builder method: enable or disable thin walls.
    pub fn thin_walls(mut self, enabled: bool) -> Self {
        self.thin_walls = enabled;
        self
    }

    /// Builder method: print external perimeters first.
    pub fn external_perimeters_first(mut self, enabled: bool) -> Self {
        self.external_perimeters_first = enabled;
        self
    }

    /// Builder method: set nozzle diameter.
    pub fn nozzle_diameter(mut self, diameter: CoordF) -> Self {
        self.nozzle_diameter = diameter;
        self
    }

    /// Check whether perimeters of both regions can be generated in one pass.
    ///
    /// Compares the eight perimeter-relevant fields exactly; the extrusion
    /// width is compared through its serialized form so that equivalent
    /// spellings ("0.45" and 0.45) match.
    pub fn shares_perimeters_with(&self, other: &PrintRegionConfig) -> bool {
        self.perimeter_extruder == other.perimeter_extruder
            && self.perimeters == other.perimeters
            && self.perimeter_speed == other.perimeter_speed
            && self.gap_fill_speed == other.gap_fill_speed
            && self.overhangs == other.overhangs
            && self.perimeter_extrusion_width.serialize()
                == other.perimeter_extrusion_width.serialize()
            && self.thin_walls == other.thin_walls
            && self.external_perimeters_first == other.external_perimeters_first
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.perimeter_extruder == 0 {
            return Err(Error::Config("Perimeter extruder must be at least 1".into()));
        }
        if self.nozzle_diameter <= 0.0 {
            return Err(Error::Config("Nozzle diameter must be positive".into()));
        }
        if self.perimeter_speed <= 0.0 || self.gap_fill_speed <= 0.0 {
            return Err(Error::Config("Speeds must be positive".into()));
        }
        if self.perimeter_extrusion_width.value() < 0.0 {
            return Err(Error::Config(
                "Perimeter extrusion width must not be negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PrintRegionConfig {
    fn default() -> Self {
        Self {
            // Perimeters
            perimeter_extruder: 1,
            perimeters: 3,
            perimeter_speed: 30.0,
            gap_fill_speed: 20.0,
            overhangs: true,
            perimeter_extrusion_width: FloatOrPercent::Value(0.0), // auto
            thin_walls: true,
            external_perimeters_first: false,

            // Extrusion
            nozzle_diameter: 0.4,
        }
    }
}

impl fmt::Display for PrintRegionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PrintRegionConfig(perimeters={}, width={}, extruder={}, nozzle={})",
            self.perimeters,
            self.perimeter_extrusion_width,
            self.perimeter_extruder,
            self.nozzle_diameter
        )
    }
}

/// A value that is either absolute (mm) or a percentage of a reference value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFloatOrPercent", into = "RawFloatOrPercent")]
pub enum FloatOrPercent {
    /// Absolute value in mm.
    Value(CoordF),
    /// Percentage (`110.0` means 110%).
    Percent(CoordF),
}

impl FloatOrPercent {
    /// The raw number, without regard to the unit.
    pub fn value(&self) -> CoordF {
        match *self {
            FloatOrPercent::Value(v) | FloatOrPercent::Percent(v) => v,
        }
    }

    /// Resolve to an absolute value, taking percentages relative to `reference`.
    pub fn resolve(&self, reference: CoordF) -> CoordF {
        match *self {
            FloatOrPercent::Value(v) => v,
            FloatOrPercent::Percent(p) => reference * p / 100.0,
        }
    }

    /// Canonical string form: the number, followed by `%` for percentages.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Default for FloatOrPercent {
    fn default() -> Self {
        FloatOrPercent::Value(0.0)
    }
}

impl fmt::Display for FloatOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FloatOrPercent::Value(v) => write!(f, "{v}"),
            FloatOrPercent::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for FloatOrPercent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (number, percent) = match s.strip_suffix('%') {
            Some(number) => (number.trim_end(), true),
            None => (s, false),
        };
        let v: CoordF = number
            .parse()
            .map_err(|_| Error::Config(format!("Invalid float or percent: {s:?}")))?;
        if !v.is_finite() {
            return Err(Error::Config(format!("Invalid float or percent: {s:?}")));
        }
        Ok(if percent {
            FloatOrPercent::Percent(v)
        } else {
            FloatOrPercent::Value(v)
        })
    }
}

/// On-disk form: a bare number or a string such as `"0.45"` or `"110%"`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFloatOrPercent {
    Number(CoordF),
    Text(String),
}

impl TryFrom<RawFloatOrPercent> for FloatOrPercent {
    type Error = Error;

    fn try_from(raw: RawFloatOrPercent) -> Result<Self> {
        match raw {
            RawFloatOrPercent::Number(v) => Ok(FloatOrPercent::Value(v)),
            RawFloatOrPercent::Text(s) => s.parse(),
        }
    }
}

impl From<FloatOrPercent> for RawFloatOrPercent {
    fn from(v: FloatOrPercent) -> Self {
        match v {
            FloatOrPercent::Value(v) => RawFloatOrPercent::Number(v),
            FloatOrPercent::Percent(_) => RawFloatOrPercent::Text(v.serialize()),
        }
    }
}
