//! DXF (R12-style ASCII) export of contours, features, labels and frame.
//!
//! Coordinates are sheet millimeters with the Y axis flipped so that north
//! points up. All geometry is clipped to the outline before it is written.

use log::info;
use topo_core::config::RenderConfig;
use topo_core::features::FeatureSet;
use topo_core::types::{Point, Rgb};
use topo_terrain::polyline::{ensure_closed, is_closed};
use topo_terrain::{GeometryClipper, ShapeMask};

use crate::error::ExportError;
use crate::scene::{label_size, ContourSet};

const HEADER: &str = "0\nSECTION\n2\nHEADER\n0\nENDSEC\n0\nSECTION\n2\nENTITIES\n";
const FOOTER: &str = "0\nENDSEC\n0\nEOF";

/// Drawing layers, in the order entities are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DxfLayer {
    Contours,
    GreenAreas,
    WaterAreas,
    Rivers,
    Roads,
    Labels,
    Frame,
}

impl DxfLayer {
    pub fn name(&self) -> &'static str {
        match self {
            DxfLayer::Contours => "CONTOURS",
            DxfLayer::GreenAreas => "GREEN_AREAS",
            DxfLayer::WaterAreas => "WATER_AREAS",
            DxfLayer::Rivers => "RIVERS",
            DxfLayer::Roads => "ROADS",
            DxfLayer::Labels => "LABELS",
            DxfLayer::Frame => "FRAME",
        }
    }
}

/// Nearest basic AutoCAD color index by dominant channel.
pub fn rgb_to_aci(c: Rgb) -> u8 {
    let max = c.r.max(c.g).max(c.b);
    let min = c.r.min(c.g).min(c.b);
    if max < 40 {
        return 7;
    }
    if max - min < 20 && max > 200 {
        return 7;
    }
    if c.r >= c.g && c.r >= c.b {
        if c.g > 200 && c.b < 120 {
            return 2;
        }
        if c.b > 200 && c.g < 120 {
            return 6;
        }
        return 1;
    }
    if c.g >= c.r && c.g >= c.b {
        return if c.b > 200 { 4 } else { 3 };
    }
    5
}

/// Incremental ENTITIES-section writer.
#[derive(Debug, Clone)]
pub struct DxfWriter {
    sheet_height: f64,
    out: String,
    entities: usize,
}

impl DxfWriter {
    pub fn new(sheet_height: f64) -> Self {
        Self {
            sheet_height,
            out: HEADER.to_string(),
            entities: 0,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities
    }

    /// Write an LWPOLYLINE. `closed = None` detects rings by endpoint
    /// proximity. Closed rings drop their repeated last point.
    pub fn polyline(&mut self, layer: DxfLayer, color: Rgb, points: &[Point], closed: Option<bool>) {
        if points.len() < 2 {
            return;
        }
        let closed = closed.unwrap_or_else(|| is_closed(points));
        let points = if closed {
            &points[..points.len() - 1]
        } else {
            points
        };

        self.out.push_str(&format!(
            "0\nLWPOLYLINE\n8\n{}\n62\n{}\n420\n{}\n90\n{}\n70\n{}\n",
            layer.name(),
            rgb_to_aci(color),
            color.true_color(),
            points.len(),
            u8::from(closed)
        ));
        for p in points {
            self.out.push_str(&format!(
                "10\n{:.4}\n20\n{:.4}\n",
                p.x,
                self.sheet_height - p.y
            ));
        }
        self.entities += 1;
    }

    /// Write a TEXT entity. Control whitespace collapses to one space;
    /// empty text is skipped.
    pub fn text(&mut self, layer: DxfLayer, color: Rgb, at: Point, height: f64, text: &str) {
        let text = text
            .split(['\r', '\n', '\t'])
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.out.push_str(&format!(
            "0\nTEXT\n8\n{}\n62\n{}\n420\n{}\n10\n{:.4}\n20\n{:.4}\n40\n{:.4}\n1\n{}\n50\n0\n",
            layer.name(),
            rgb_to_aci(color),
            color.true_color(),
            at.x,
            self.sheet_height - at.y,
            height,
            text
        ));
        self.entities += 1;
    }

    pub fn finish(mut self) -> String {
        self.out.push_str(FOOTER);
        self.out
    }
}

/// Export contours, enabled feature layers, labels and the outline frame.
///
/// Fails with [`ExportError::MissingContours`] before writing anything when
/// no contour paths have been computed.
pub fn write_dxf(
    config: &RenderConfig,
    contours: &ContourSet,
    features: &FeatureSet,
) -> Result<String, ExportError> {
    if contours.is_empty() {
        return Err(ExportError::MissingContours);
    }
    let mask = ShapeMask::from_outline(&config.outline);
    let clipper = GeometryClipper::for_mask(&mask);
    let mut dxf = DxfWriter::new(mask.height());

    if config.contour.enabled {
        for path in contours.paths() {
            for piece in clipper.clip_polyline(path) {
                dxf.polyline(DxfLayer::Contours, config.contour.color, &piece, None);
            }
        }
    }

    let areas = [
        (DxfLayer::GreenAreas, &config.green_areas, &features.green_polygons),
        (DxfLayer::WaterAreas, &config.water_areas, &features.water_polygons),
    ];
    for (layer, style, polygons) in areas {
        if !style.enabled {
            continue;
        }
        for polygon in polygons {
            let clipped = clipper.clip_polygon(polygon);
            if clipped.len() >= 3 {
                dxf.polyline(layer, style.color, &ensure_closed(&clipped), Some(true));
            }
        }
    }

    let lines = [
        (DxfLayer::Rivers, &config.rivers, &features.river_lines),
        (DxfLayer::Roads, &config.roads, &features.road_lines),
    ];
    for (layer, style, polylines) in lines {
        if !style.enabled {
            continue;
        }
        for line in polylines {
            for piece in clipper.clip_polyline(line) {
                dxf.polyline(layer, style.color, &piece, Some(false));
            }
        }
    }

    if config.labels.enabled {
        for label in features.labels.iter().filter(|l| clipper.contains(l.position)) {
            dxf.text(
                DxfLayer::Labels,
                config.labels.color,
                label.position,
                label_size(&config.labels, label.kind),
                &label.name,
            );
        }
    }

    dxf.polyline(
        DxfLayer::Frame,
        config.contour.color,
        &ensure_closed(clipper.polygon()),
        Some(true),
    );

    info!("DXF export: {} entities", dxf.entity_count());
    Ok(dxf.finish())
}
