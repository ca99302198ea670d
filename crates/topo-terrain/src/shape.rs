//! ShapeMask: point-in-outline test and boundary polygon for the sheet outline.

use std::f64::consts::{FRAC_PI_3, FRAC_PI_6, TAU};

use topo_core::config::OutlineConfig;
use topo_core::constants::CIRCLE_SEGMENTS;
use topo_core::enums::OutlineKind;
use topo_core::types::Point;

/// Slope factor of the hexagon membership test.
const HEX_SLOPE: f64 = 0.577;

/// Sheet outline with its physical size (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMask {
    kind: OutlineKind,
    width: f64,
    height: f64,
}

impl ShapeMask {
    pub fn new(kind: OutlineKind, width: f64, height: f64) -> Self {
        Self {
            kind,
            width,
            height,
        }
    }

    pub fn from_outline(outline: &OutlineConfig) -> Self {
        Self::new(outline.kind, outline.width_mm, outline.height_mm)
    }

    pub fn kind(&self) -> OutlineKind {
        self.kind
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Point-in-outline test in sheet millimeters.
    ///
    /// Rectangular outlines cover the whole canvas. The circle is the disk
    /// of diameter `width`; the hexagon test is a slanted diamond
    /// `|dx|/(w/2) + 0.577·|dy|/(h/2) ≤ 1`.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.width / 2.0;
        let dy = y - self.height / 2.0;
        match self.kind {
            OutlineKind::Circle => {
                let r = self.width / 2.0;
                dx * dx + dy * dy <= r * r
            }
            OutlineKind::Hexagon => {
                let qx = dx.abs() / (self.width / 2.0);
                let qy = dy.abs() / (self.height / 2.0);
                qx + qy * HEX_SLOPE <= 1.0
            }
            _ => true,
        }
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.contains(p.x, p.y)
    }

    /// Convex boundary polygon used for clipping, with positive signed area.
    ///
    /// Rectangles give their 4 corners, the hexagon 6 vertices at
    /// `i·60° − 30°` with circumradius `width/2`, and the circle a 48-gon.
    pub fn boundary_polygon(&self) -> Vec<Point> {
        let w = self.width;
        let h = self.height;
        let c = self.center();
        let r = w / 2.0;

        let mut polygon: Vec<Point> = match self.kind {
            OutlineKind::Hexagon => (0..6)
                .map(|i| {
                    let a = i as f64 * FRAC_PI_3 - FRAC_PI_6;
                    c + r * Point::new(a.cos(), a.sin())
                })
                .collect(),
            OutlineKind::Circle => (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let a = i as f64 / CIRCLE_SEGMENTS as f64 * TAU;
                    c + r * Point::new(a.cos(), a.sin())
                })
                .collect(),
            _ => vec![
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
        };

        if signed_area(&polygon) < 0.0 {
            polygon.reverse();
        }
        polygon
    }
}

/// Shoelace signed area of a polygon (open or closed form).
pub fn signed_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}
