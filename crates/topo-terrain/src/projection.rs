//! Linear projection between a geographic bounding box and sheet millimeters.
//!
//! Equirectangular over the box: longitude maps linearly to x (west = 0),
//! latitude maps linearly to y (north = 0). No geodetic correction.

use topo_core::constants::ALIGNMENT_TOLERANCE_MM;
use topo_core::types::{GeoBounds, GeoPoint, Point};

/// Projection of a bounding box onto a `width_mm × height_mm` sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsProjection {
    pub bounds: GeoBounds,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl BoundsProjection {
    pub fn new(bounds: GeoBounds, width_mm: f64, height_mm: f64) -> Self {
        Self {
            bounds,
            width_mm,
            height_mm,
        }
    }

    /// Geographic point to sheet millimeters.
    pub fn to_mm(&self, point: GeoPoint) -> Point {
        let b = &self.bounds;
        let x = (point.lon - b.west) / b.lon_span() * self.width_mm;
        let y = (b.north - point.lat) / b.lat_span() * self.height_mm;
        Point::new(x, y)
    }

    /// Sheet millimeters back to a geographic point.
    pub fn to_geo(&self, p: Point) -> GeoPoint {
        let b = &self.bounds;
        let lon = b.west + p.x / self.width_mm * b.lon_span();
        let lat = b.north - p.y / self.height_mm * b.lat_span();
        GeoPoint::new(lat, lon)
    }

    /// Sample locations of a `rows × cols` elevation grid over the box,
    /// row-major from north to south and west to east, corners included.
    pub fn sample_locations(&self, rows: usize, cols: usize) -> Vec<GeoPoint> {
        let b = &self.bounds;
        let d_lat = if rows > 1 {
            b.lat_span() / (rows - 1) as f64
        } else {
            0.0
        };
        let d_lon = if cols > 1 {
            b.lon_span() / (cols - 1) as f64
        } else {
            0.0
        };

        let mut locations = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let lat = b.north - r as f64 * d_lat;
            for c in 0..cols {
                locations.push(GeoPoint::new(lat, b.west + c as f64 * d_lon));
            }
        }
        locations
    }

    /// Largest deviation (mm) between where the NW, NE and SW corners and the
    /// center project and where they belong on the sheet.
    pub fn alignment_error(&self) -> f64 {
        let b = &self.bounds;
        if !b.is_valid() {
            return f64::INFINITY;
        }
        let w = self.width_mm;
        let h = self.height_mm;
        let checks = [
            (GeoPoint::new(b.north, b.west), Point::new(0.0, 0.0)),
            (GeoPoint::new(b.north, b.east), Point::new(w, 0.0)),
            (GeoPoint::new(b.south, b.west), Point::new(0.0, h)),
            (b.center(), Point::new(w / 2.0, h / 2.0)),
        ];
        checks
            .iter()
            .map(|(geo, expected)| self.to_mm(*geo).distance(*expected))
            .fold(0.0, f64::max)
    }

    /// True when the overlay lands within 0.5 mm of its expected position.
    pub fn is_aligned(&self) -> bool {
        let err = self.alignment_error();
        err.is_finite() && err <= ALIGNMENT_TOLERANCE_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_projection() -> BoundsProjection {
        BoundsProjection::new(GeoBounds::new(46.0, 7.0, 46.5, 8.0), 200.0, 140.0)
    }

    #[test]
    fn test_projection_roundtrip() {
        let proj = make_projection();
        let geo = GeoPoint::new(46.3, 7.25);
        let p = proj.to_mm(geo);
        let back = proj.to_geo(p);
        assert!((geo.lat - back.lat).abs() < 1e-10, "lat roundtrip: {} vs {}", geo.lat, back.lat);
        assert!((geo.lon - back.lon).abs() < 1e-10, "lon roundtrip: {} vs {}", geo.lon, back.lon);
    }

    #[test]
    fn test_corners_map_to_sheet_corners() {
        let proj = make_projection();
        let nw = proj.to_mm(GeoPoint::new(46.5, 7.0));
        assert!(nw.length() < 1e-9, "NW corner should be the origin, got {nw}");
        let se = proj.to_mm(GeoPoint::new(46.0, 8.0));
        assert!((se.x - 200.0).abs() < 1e-9 && (se.y - 140.0).abs() < 1e-9, "SE got {se}");
        let mid = proj.to_mm(GeoPoint::new(46.25, 7.5));
        assert!((mid.x - 100.0).abs() < 1e-9 && (mid.y - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_locations_order() {
        let proj = make_projection();
        let locs = proj.sample_locations(3, 5);
        assert_eq!(locs.len(), 15);
        assert_eq!(locs[0], GeoPoint::new(46.5, 7.0), "First sample is the NW corner");
        assert_eq!(locs[4], GeoPoint::new(46.5, 8.0), "Row runs west to east");
        assert_eq!(locs[5].lat, 46.25, "Second row is further south");
        let last = locs[14];
        assert!((last.lat - 46.0).abs() < 1e-12 && (last.lon - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_alignment() {
        let proj = make_projection();
        assert!(proj.alignment_error() < 1e-9);
        assert!(proj.is_aligned());

        let degenerate = BoundsProjection::new(GeoBounds::new(46.0, 7.0, 46.0, 8.0), 200.0, 140.0);
        assert!(!degenerate.is_aligned(), "Zero-height bounds cannot align");
    }
}
