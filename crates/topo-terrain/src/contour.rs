//! Contour extraction by marching squares.
//!
//! Each grid cell classifies its four corners against the level into a
//! 4-bit code (top-left, top-right, bottom-right, bottom-left) and emits
//! zero, one or two segments between crossed edges. Edges are numbered
//! 0 = top, 1 = right, 2 = bottom, 3 = left.

use topo_core::constants::{
    CONTOUR_SPACING_PER_WIDTH, MIN_CONTOUR_LINES, MIN_CONTOUR_SPACING_MM, PX_TO_MM,
};
use topo_core::types::{Point, Polyline, Segment};

use crate::grid::TerrainGrid;
use crate::polyline::{smooth_polyline, stitch_segments};
use crate::shape::ShapeMask;

type EdgePair = (u8, u8);

/// Crossed-edge pairs per corner code. Codes 5 and 10 are saddles and are
/// resolved per cell; 0 and 15 have no crossing.
const CASES: [&[EdgePair]; 16] = [
    &[],
    &[(3, 2)],
    &[(2, 1)],
    &[(3, 1)],
    &[(0, 1)],
    &[],
    &[(0, 2)],
    &[(0, 3)],
    &[(0, 3)],
    &[(0, 2)],
    &[],
    &[(0, 1)],
    &[(3, 1)],
    &[(2, 1)],
    &[(3, 2)],
    &[],
];

/// Saddle resolution. The cell-center average (mean of the 4 corners) is
/// compared against the level; at or above it selects the first pair set.
fn saddle_pairs(code: u8, center_above: bool) -> [EdgePair; 2] {
    match (code, center_above) {
        (5, true) | (10, false) => [(0, 1), (2, 3)],
        _ => [(0, 3), (1, 2)],
    }
}

/// Number of contour lines for the requested density, limited so that
/// levels stay at least `max(1.2, stroke_mm·8)` apart on the sheet.
pub fn contour_line_count(density: u32, stroke_width_px: f64, width_mm: f64, height_mm: f64) -> usize {
    let desired = (density as usize).max(MIN_CONTOUR_LINES);
    let min_spacing =
        (stroke_width_px * PX_TO_MM * CONTOUR_SPACING_PER_WIDTH).max(MIN_CONTOUR_SPACING_MM);
    let max_lines = ((width_mm.min(height_mm) / min_spacing).floor() as usize).max(MIN_CONTOUR_LINES);
    desired.min(max_lines).max(MIN_CONTOUR_LINES)
}

/// `line_count − 1` equally spaced levels strictly between `min` and `max`.
/// Empty when the range is empty.
pub fn contour_levels(min: f64, max: f64, line_count: usize) -> Vec<f64> {
    if !(max > min) || line_count < 2 {
        return Vec::new();
    }
    let interval = (max - min) / line_count as f64;
    (1..line_count).map(|i| min + interval * i as f64).collect()
}

/// Marching-squares extractor over a grid scaled to the outline's sheet size.
#[derive(Debug, Clone, Copy)]
pub struct ContourExtractor<'a> {
    grid: &'a TerrainGrid,
    mask: &'a ShapeMask,
}

impl<'a> ContourExtractor<'a> {
    pub fn new(grid: &'a TerrainGrid, mask: &'a ShapeMask) -> Self {
        Self { grid, mask }
    }

    /// Raw segments for one level (normalized units), in sheet millimeters.
    /// Segments with an endpoint outside the outline are dropped.
    pub fn segments(&self, level: f64) -> Vec<Segment> {
        let grid = self.grid;
        let rows = grid.rows();
        let cols = grid.cols();
        let h = grid.heights();
        let xs = self.mask.width() / (cols - 1) as f64;
        let ys = self.mask.height() / (rows - 1) as f64;

        let mut segments = Vec::new();
        for r in 0..rows - 1 {
            for c in 0..cols - 1 {
                let cell = Cell {
                    origin: Point::new(c as f64 * xs, r as f64 * ys),
                    size: Point::new(xs, ys),
                    tl: h[r * cols + c],
                    tr: h[r * cols + c + 1],
                    bl: h[(r + 1) * cols + c],
                    br: h[(r + 1) * cols + c + 1],
                };

                let code = cell.code(level);
                let saddle;
                let pairs: &[EdgePair] = match code {
                    0 | 15 => continue,
                    5 | 10 => {
                        saddle = saddle_pairs(code, cell.center() >= level);
                        &saddle
                    }
                    _ => CASES[code as usize],
                };

                for &(e0, e1) in pairs {
                    let a = cell.edge_point(e0, level);
                    let b = cell.edge_point(e1, level);
                    if self.mask.contains_point(a) && self.mask.contains_point(b) {
                        segments.push(Segment::new(a, b));
                    }
                }
            }
        }
        segments
    }

    /// Stitched and smoothed contour lines for one level.
    pub fn polylines(&self, level: f64, smoothing: u32) -> Vec<Polyline> {
        stitch_segments(&self.segments(level))
            .into_iter()
            .map(|line| smooth_polyline(&line, smoothing))
            .filter(|line| line.len() >= 2)
            .collect()
    }
}

/// One grid cell in sheet coordinates with its corner heights.
struct Cell {
    origin: Point,
    size: Point,
    tl: f64,
    tr: f64,
    bl: f64,
    br: f64,
}

impl Cell {
    fn code(&self, level: f64) -> u8 {
        let bit = |h: f64| u8::from(h >= level);
        (bit(self.tl) << 3) | (bit(self.tr) << 2) | (bit(self.br) << 1) | bit(self.bl)
    }

    fn center(&self) -> f64 {
        (self.tl + self.tr + self.br + self.bl) / 4.0
    }

    /// Level crossing on an edge, interpolated linearly between its corners.
    fn edge_point(&self, edge: u8, level: f64) -> Point {
        let Point { x, y } = self.origin;
        let Point { x: xs, y: ys } = self.size;
        match edge {
            0 => {
                let t = crossing_ratio(level - self.tl, self.tr - self.tl);
                Point::new(x + xs * t, y)
            }
            1 => {
                let t = crossing_ratio(level - self.tr, self.br - self.tr);
                Point::new(x + xs, y + ys * t)
            }
            2 => {
                let t = crossing_ratio(level - self.br, self.bl - self.br);
                Point::new(x + xs * (1.0 - t), y + ys)
            }
            _ => {
                let t = crossing_ratio(level - self.bl, self.tl - self.bl);
                Point::new(x, y + ys * (1.0 - t))
            }
        }
    }
}

/// `num / den` clamped to [0, 1]; the edge midpoint for flat edges.
fn crossing_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.5;
    }
    let t = num / den;
    if t.is_finite() {
        t.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_core::enums::OutlineKind;

    fn unit_mask() -> ShapeMask {
        ShapeMask::new(OutlineKind::Rectangle, 1.0, 1.0)
    }

    fn assert_point(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got {p}"
        );
    }

    #[test]
    fn test_flat_grid_has_no_segments() {
        let grid = TerrainGrid::from_samples(4, 4, vec![12.0; 16]).unwrap();
        let mask = ShapeMask::new(OutlineKind::Rectangle, 30.0, 30.0);
        let extractor = ContourExtractor::new(&grid, &mask);
        for level in [-1.0, 0.0, 0.5, 1.0] {
            assert!(
                extractor.segments(level).is_empty(),
                "Flat grid should produce no segments at level {level}"
            );
        }
    }

    #[test]
    fn test_horizontal_crossing() {
        // Row-major: TL, TR, BL, BR.
        let grid = TerrainGrid::from_samples(2, 2, vec![0.0, 0.0, 10.0, 10.0]).unwrap();
        let mask = unit_mask();
        let segments = ContourExtractor::new(&grid, &mask).segments(5.0);
        assert_eq!(segments.len(), 1);
        // Midpoints of the left and right edges.
        assert_point(segments[0].a, 0.0, 0.5);
        assert_point(segments[0].b, 1.0, 0.5);
    }

    #[test]
    fn test_interpolation_ratio() {
        let grid = TerrainGrid::from_samples(2, 2, vec![0.0, 10.0, 0.0, 10.0]).unwrap();
        let mask = ShapeMask::new(OutlineKind::Rectangle, 10.0, 10.0);
        let segments = ContourExtractor::new(&grid, &mask).segments(2.5);
        assert_eq!(segments.len(), 1);
        // Code 6 (TR, BR above): top edge to bottom edge at x = 2.5.
        assert_point(segments[0].a, 2.5, 0.0);
        assert_point(segments[0].b, 2.5, 10.0);
    }

    #[test]
    fn test_saddle_center_at_level() {
        // Diagonal highs TL and BR, center average exactly 5.
        let grid = TerrainGrid::from_samples(2, 2, vec![10.0, 0.0, 0.0, 10.0]).unwrap();
        let mask = unit_mask();
        let segments = ContourExtractor::new(&grid, &mask).segments(5.0);
        assert_eq!(segments.len(), 2, "Saddle should emit two segments");
        // Code 10 with center >= level: (top, left) and (right, bottom).
        assert_point(segments[0].a, 0.5, 0.0);
        assert_point(segments[0].b, 0.0, 0.5);
        assert_point(segments[1].a, 1.0, 0.5);
        assert_point(segments[1].b, 0.5, 1.0);
    }

    #[test]
    fn test_saddle_center_below_level() {
        // TR and BL high (code 5), center average 4 < 4.5.
        let grid = TerrainGrid::from_samples(2, 2, vec![0.0, 8.0, 8.0, 0.0]).unwrap();
        let mask = unit_mask();
        let segments = ContourExtractor::new(&grid, &mask).segments(4.5);
        assert_eq!(segments.len(), 2);
        // (top, left) then (right, bottom).
        assert!(segments[0].a.y.abs() < 1e-9, "first pair starts on the top edge");
        assert!(segments[0].b.x.abs() < 1e-9, "first pair ends on the left edge");
        assert!((segments[1].a.x - 1.0).abs() < 1e-9, "second pair starts on the right edge");
        assert!((segments[1].b.y - 1.0).abs() < 1e-9, "second pair ends on the bottom edge");
    }

    #[test]
    fn test_segments_outside_shape_are_dropped() {
        // 3×3 grid with a ridge along the top row corners only.
        #[rustfmt::skip]
        let heights = vec![
            10.0, 0.0, 10.0,
             0.0, 0.0,  0.0,
             0.0, 0.0,  0.0,
        ];
        let grid = TerrainGrid::from_samples(3, 3, heights).unwrap();
        let rect = ShapeMask::new(OutlineKind::Rectangle, 100.0, 100.0);
        let circle = ShapeMask::new(OutlineKind::Circle, 100.0, 100.0);
        let inside_rect = ContourExtractor::new(&grid, &rect).segments(5.0);
        let inside_circle = ContourExtractor::new(&grid, &circle).segments(5.0);
        assert_eq!(inside_rect.len(), 2);
        assert!(
            inside_circle.is_empty(),
            "Corner crossings lie outside the circle, got {inside_circle:?}"
        );
    }

    #[test]
    fn test_line_count_limits() {
        // Default density, thin line, 200 mm wide.
        assert_eq!(contour_line_count(24, 0.2, 200.0, 140.0), 24);
        // Minimum spacing 1.2 mm on a 10 mm sheet caps at 8 lines.
        assert_eq!(contour_line_count(24, 0.2, 10.0, 10.0), 8);
        // Never fewer than 4.
        assert_eq!(contour_line_count(1, 0.2, 200.0, 140.0), 4);
        assert_eq!(contour_line_count(24, 2.0, 3.0, 3.0), 4);
        // 2 px → 4.23 mm spacing: floor(100 / 4.233) = 23.
        assert_eq!(contour_line_count(40, 2.0, 100.0, 100.0), 23);
    }

    #[test]
    fn test_levels_strictly_inside_range() {
        let levels = contour_levels(0.0, 100.0, 4);
        assert_eq!(levels, vec![25.0, 50.0, 75.0]);
        let shifted = contour_levels(10.0, 20.0, 5);
        assert_eq!(shifted.len(), 4);
        assert!(shifted.iter().all(|&l| l > 10.0 && l < 20.0));
        assert!(contour_levels(5.0, 5.0, 10).is_empty());
        assert!(contour_levels(6.0, 5.0, 10).is_empty());
    }

    #[test]
    fn test_polylines_form_closed_ring_around_peak() {
        #[rustfmt::skip]
        let heights = vec![
            0.0,  0.0, 0.0,
            0.0, 10.0, 0.0,
            0.0,  0.0, 0.0,
        ];
        let grid = TerrainGrid::from_samples(3, 3, heights).unwrap();
        let mask = ShapeMask::new(OutlineKind::Rectangle, 100.0, 100.0);
        let lines = ContourExtractor::new(&grid, &mask).polylines(5.0, 0);
        assert_eq!(lines.len(), 1, "Peak should produce one ring");
        let ring = &lines[0];
        assert_eq!(ring.len(), 5, "Diamond ring: 4 corners plus closing point");
        assert!(ring[0].distance(*ring.last().unwrap()) < 0.01);
    }
}
