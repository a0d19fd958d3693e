//! SVG snapshots of a layer's surfaces, colored by classification.
//!
//! Only compiled with the `debug-svg` feature. Exporting never modifies the
//! layer.

use crate::geometry::{BoundingBox, ExPolygon, Polygon};
use crate::slice::{Layer, Surface, SurfaceCollection, SurfaceType};
use crate::{unscale, Result};
use std::path::Path;
use svg::node::element::path::Data;
use svg::node::element::{Group, Path as SvgPath, Rectangle, Text};
use svg::Document;

/// Fill color for a surface classification.
pub fn surface_type_color(surface_type: SurfaceType) -> &'static str {
    match surface_type {
        SurfaceType::Top => "rgb(255,0,0)",
        SurfaceType::Bottom => "rgb(0,255,0)",
        SurfaceType::BottomBridge => "rgb(0,0,255)",
        SurfaceType::Internal => "rgb(0,0,0)",
        SurfaceType::InternalSolid => "rgb(255,0,255)",
        SurfaceType::InternalBridge => "rgb(0,255,255)",
        SurfaceType::InternalVoid => "rgb(128,128,128)",
    }
}

const LEGEND_ROW: f64 = 2.0;
const LEGEND_WIDTH: f64 = 30.0;
const MARGIN: f64 = 2.0;

impl Layer {
    /// Write every region's raw slices to `path`.
    pub fn export_region_slices_to_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let surfaces = self.regions().iter().map(|r| &r.slices);
        save(render(surfaces, 0.5), path)
    }

    /// Write every region's fill surfaces to `path`.
    pub fn export_region_fill_surfaces_to_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let surfaces = self.regions().iter().map(|r| &r.fill_surfaces);
        save(render(surfaces, 0.5), path)
    }
}

fn save(document: Document, path: impl AsRef<Path>) -> Result<()> {
    svg::save(path, &document)?;
    Ok(())
}

fn render<'a>(collections: impl Iterator<Item = &'a SurfaceCollection> + Clone, opacity: f64) -> Document {
    let mut bbox = BoundingBox::new();
    for surface in collections.clone().flat_map(|c| c.iter()) {
        bbox.merge(&surface.expolygon.bounding_box());
    }
    let (min_x, min_y, width, height) = if bbox.defined {
        (
            unscale(bbox.min.x),
            unscale(bbox.min.y),
            bbox.width_mm(),
            bbox.height_mm(),
        )
    } else {
        (0.0, 0.0, 0.0, 0.0)
    };

    // Flip Y so the drawing reads like a top view
    let mut shapes = Group::new().set(
        "transform",
        format!("translate(0,{}) scale(1,-1)", 2.0 * min_y + height),
    );
    for surface in collections.flat_map(|c| c.iter()) {
        shapes = shapes.add(surface_path(surface, opacity));
    }

    let legend_x = min_x + width + MARGIN;
    let legend = legend(legend_x, min_y);
    let total_w = width + LEGEND_WIDTH + 3.0 * MARGIN;
    let total_h = height.max(LEGEND_ROW * SurfaceType::ALL.len() as f64) + 2.0 * MARGIN;

    Document::new()
        .set("viewBox", (min_x - MARGIN, min_y - MARGIN, total_w, total_h))
        .add(shapes)
        .add(legend)
}

fn surface_path(surface: &Surface, opacity: f64) -> SvgPath {
    SvgPath::new()
        .set("fill", surface_type_color(surface.surface_type))
        .set("fill-opacity", opacity)
        .set("fill-rule", "evenodd")
        .set("stroke", "none")
        .set("d", expolygon_data(&surface.expolygon))
}

fn expolygon_data(expolygon: &ExPolygon) -> Data {
    expolygon
        .rings()
        .fold(Data::new(), |data, ring| ring_data(data, ring))
}

fn ring_data(data: Data, ring: &Polygon) -> Data {
    let mut points = ring.points().iter().map(|p| p.to_mm());
    let Some(first) = points.next() else {
        return data;
    };
    points
        .fold(data.move_to(first), |d, p| d.line_to(p))
        .close()
}

fn legend(x: f64, y: f64) -> Group {
    SurfaceType::ALL
        .iter()
        .enumerate()
        .fold(Group::new(), |group, (row, &surface_type)| {
            let row_y = y + row as f64 * LEGEND_ROW;
            group
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", row_y)
                        .set("width", LEGEND_ROW * 0.8)
                        .set("height", LEGEND_ROW * 0.8)
                        .set("fill", surface_type_color(surface_type)),
                )
                .add(
                    Text::new(surface_type.name())
                        .set("x", x + LEGEND_ROW)
                        .set("y", row_y + LEGEND_ROW * 0.7)
                        .set("font-size", LEGEND_ROW * 0.7),
                )
        })
}
