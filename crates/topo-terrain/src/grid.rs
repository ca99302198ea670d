//! TerrainGrid: normalized height field with bilinear sampling.

use log::debug;
use topo_core::constants::SMOOTH_CENTER_WEIGHT;

use crate::shape::ShapeMask;

/// Errors raised while building a terrain grid from raw samples.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("terrain grid must be at least 2×2, got {rows}×{cols}")]
    TooSmall { rows: usize, cols: usize },

    #[error("expected {expected} samples for a {rows}×{cols} grid, got {actual}")]
    SampleCount {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("no finite elevation samples")]
    NoData,
}

/// Normalized height field.
///
/// Samples are stored row-major (north-to-south, west-to-east) and shifted
/// so the lowest sample is 0. `min` keeps the original lowest elevation and
/// `delta` the original range, so `min + h` recovers meters.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    rows: usize,
    cols: usize,
    heights: Vec<f64>,
    min: f64,
    delta: f64,
}

impl TerrainGrid {
    /// Build a grid from elevation samples (meters) without smoothing.
    pub fn from_samples(rows: usize, cols: usize, samples: Vec<f64>) -> Result<Self, GridError> {
        check_dimensions(rows, cols, samples.len())?;
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(GridError::NoData);
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let heights = samples.into_iter().map(|z| z - min).collect();

        Ok(Self {
            rows,
            cols,
            heights,
            min,
            delta: max - min,
        })
    }

    /// Build a grid from raw elevation samples: voids (non-finite values)
    /// are filled from their neighbors, then `smooth_passes` rounds of the
    /// weighted 3×3 kernel are applied before normalization.
    pub fn from_raw_elevations(
        rows: usize,
        cols: usize,
        mut samples: Vec<f64>,
        smooth_passes: usize,
    ) -> Result<Self, GridError> {
        check_dimensions(rows, cols, samples.len())?;
        if !samples.iter().any(|v| v.is_finite()) {
            return Err(GridError::NoData);
        }

        let voids = fill_voids(&mut samples, rows, cols);
        if voids > 0 {
            debug!("Filled {voids} void elevation samples");
        }
        for _ in 0..smooth_passes {
            samples = smooth_pass(&samples, rows, cols);
        }
        Self::from_samples(rows, cols, samples)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Normalized samples, row-major.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Lowest original elevation (meters).
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Highest original elevation (meters).
    pub fn max(&self) -> f64 {
        self.min + self.delta
    }

    /// Elevation range (meters). Never negative.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Normalized height at integer grid coordinates (clamped to the grid).
    pub fn height_at(&self, row: usize, col: usize) -> f64 {
        let r = row.min(self.rows - 1);
        let c = col.min(self.cols - 1);
        self.heights[r * self.cols + c]
    }

    /// Bilinear sample at normalized coordinates `nx, ny ∈ [0, 1]`
    /// (0,0 = north-west corner). Inputs outside the range are clamped.
    pub fn sample(&self, nx: f64, ny: f64) -> f64 {
        let nx = clamp_unit(nx);
        let ny = clamp_unit(ny);

        let c_float = nx * (self.cols - 1) as f64;
        let r_float = ny * (self.rows - 1) as f64;
        let c0 = (c_float.floor() as usize).min(self.cols - 1);
        let r0 = (r_float.floor() as usize).min(self.rows - 1);
        let c1 = (c0 + 1).min(self.cols - 1);
        let r1 = (r0 + 1).min(self.rows - 1);
        let tx = c_float - c0 as f64;
        let ty = r_float - r0 as f64;

        let h00 = self.height_at(r0, c0);
        let h01 = self.height_at(r0, c1);
        let h10 = self.height_at(r1, c0);
        let h11 = self.height_at(r1, c1);

        let top = h00 * (1.0 - tx) + h01 * tx;
        let bottom = h10 * (1.0 - tx) + h11 * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Resample the grid onto a `width × height` lattice whose corners
    /// coincide with the grid corners.
    pub fn resample(&self, width: usize, height: usize) -> HeightMap {
        let max_col = self.cols - 2;
        let max_row = self.rows - 2;

        let axis = |n: usize, cells: usize, max_index: usize| -> Vec<(usize, f64)> {
            (0..n)
                .map(|i| {
                    let t = if n == 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
                    let f = t * cells as f64;
                    let i0 = (f.floor().max(0.0) as usize).min(max_index);
                    (i0, f - i0 as f64)
                })
                .collect()
        };
        let cols = axis(width, self.cols - 1, max_col);
        let rows = axis(height, self.rows - 1, max_row);

        let mut values = Vec::with_capacity(width * height);
        for &(r0, ty) in &rows {
            for &(c0, tx) in &cols {
                let h00 = self.heights[r0 * self.cols + c0];
                let h01 = self.heights[r0 * self.cols + c0 + 1];
                let h10 = self.heights[(r0 + 1) * self.cols + c0];
                let h11 = self.heights[(r0 + 1) * self.cols + c0 + 1];
                let top = h00 * (1.0 - tx) + h01 * tx;
                let bottom = h10 * (1.0 - tx) + h11 * tx;
                values.push(top * (1.0 - ty) + bottom * ty);
            }
        }

        HeightMap {
            width,
            height,
            values,
        }
    }

    /// Elevation range over the grid samples that fall inside the outline.
    /// Falls back to the full range when no sample is inside.
    pub fn shape_height_range(&self, mask: &ShapeMask) -> HeightRange {
        let mut min_z = f64::INFINITY;
        let mut max_z = f64::NEG_INFINITY;

        for r in 0..self.rows {
            let y = r as f64 / (self.rows - 1) as f64 * mask.height();
            for c in 0..self.cols {
                let x = c as f64 / (self.cols - 1) as f64 * mask.width();
                if !mask.contains(x, y) {
                    continue;
                }
                let z = self.min + self.heights[r * self.cols + c];
                min_z = min_z.min(z);
                max_z = max_z.max(z);
            }
        }

        if !min_z.is_finite() || !max_z.is_finite() {
            min_z = self.min;
            max_z = self.max();
        }

        HeightRange {
            min_z,
            max_z,
            min_norm: min_z - self.min,
            max_norm: max_z - self.min,
        }
    }
}

/// `sample` for an optional grid: no terrain reads as height 0.
pub fn sample_or_zero(grid: Option<&TerrainGrid>, nx: f64, ny: f64) -> f64 {
    grid.map_or(0.0, |g| g.sample(nx, ny))
}

fn check_dimensions(rows: usize, cols: usize, len: usize) -> Result<(), GridError> {
    if rows < 2 || cols < 2 {
        return Err(GridError::TooSmall { rows, cols });
    }
    if len != rows * cols {
        return Err(GridError::SampleCount {
            rows,
            cols,
            expected: rows * cols,
            actual: len,
        });
    }
    Ok(())
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Visible elevation range, in meters and in normalized units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightRange {
    pub min_z: f64,
    pub max_z: f64,
    pub min_norm: f64,
    pub max_norm: f64,
}

impl HeightRange {
    /// Fraction of the visible range at a normalized height (0 for a flat range).
    pub fn fraction(&self, grid_min: f64, z_norm: f64) -> f64 {
        if self.max_z == self.min_z {
            0.0
        } else {
            (grid_min + z_norm - self.min_z) / (self.max_z - self.min_z)
        }
    }
}

/// Dense resampled height field (normalized units).
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl HeightMap {
    /// Height at pixel coordinates, clamped to the map edge.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        self.values[y * self.width + x]
    }
}

// --- Preprocessing ---

/// One pass of the 3×3 weighted-average kernel (center weight 8, neighbors 1).
/// Neighbors outside the grid are skipped and the weights renormalized.
pub fn smooth_pass(data: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    let mut out = vec![0.0; data.len()];
    for r in 0..rows {
        for c in 0..cols {
            let mut sum = 0.0;
            let mut weight_sum = 0.0;
            for rr in r.saturating_sub(1)..=(r + 1).min(rows - 1) {
                for cc in c.saturating_sub(1)..=(c + 1).min(cols - 1) {
                    let w = if rr == r && cc == c {
                        SMOOTH_CENTER_WEIGHT
                    } else {
                        1.0
                    };
                    sum += data[rr * cols + cc] * w;
                    weight_sum += w;
                }
            }
            out[r * cols + c] = sum / weight_sum;
        }
    }
    out
}

/// Replace non-finite samples by the average of their finite 8-neighbors
/// (0 when none are finite). Returns the number of samples replaced.
pub fn fill_voids(samples: &mut [f64], rows: usize, cols: usize) -> usize {
    let snapshot = samples.to_vec();
    let mut filled = 0;

    for r in 0..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            if snapshot[idx].is_finite() {
                continue;
            }

            let mut sum = 0.0;
            let mut count = 0u32;
            for rr in r.saturating_sub(1)..=(r + 1).min(rows - 1) {
                for cc in c.saturating_sub(1)..=(c + 1).min(cols - 1) {
                    let v = snapshot[rr * cols + cc];
                    if (rr, cc) != (r, c) && v.is_finite() {
                        sum += v;
                        count += 1;
                    }
                }
            }

            samples[idx] = if count > 0 { sum / count as f64 } else { 0.0 };
            filled += 1;
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_core::enums::OutlineKind;

    /// 5×5 grid with a 100 m peak in the center, rising from a 1000 m floor.
    fn make_test_grid() -> TerrainGrid {
        #[rustfmt::skip]
        let elevations: Vec<f64> = vec![
            1000.0, 1000.0, 1000.0, 1000.0, 1000.0,
            1000.0, 1050.0, 1050.0, 1050.0, 1000.0,
            1000.0, 1050.0, 1100.0, 1050.0, 1000.0,
            1000.0, 1050.0, 1050.0, 1050.0, 1000.0,
            1000.0, 1000.0, 1000.0, 1000.0, 1000.0,
        ];
        TerrainGrid::from_samples(5, 5, elevations).unwrap()
    }

    #[test]
    fn test_normalization() {
        let grid = make_test_grid();
        assert_eq!(grid.min(), 1000.0);
        assert_eq!(grid.delta(), 100.0);
        assert_eq!(grid.max(), 1100.0);
        assert_eq!(grid.heights().len(), 25);
        assert_eq!(grid.height_at(0, 0), 0.0);
        assert_eq!(grid.height_at(2, 2), 100.0);
    }

    #[test]
    fn test_sample_center_and_corners() {
        let grid = make_test_grid();
        let e = grid.sample(0.5, 0.5);
        assert!((e - 100.0).abs() < 1e-9, "Peak should be ~100m, got {e}");
        assert_eq!(grid.sample(0.0, 0.0), 0.0);
        assert_eq!(grid.sample(1.0, 1.0), 0.0, "nx=ny=1 must map to the last cell");
        assert_eq!(grid.sample(2.0, -1.0), 0.0, "Out-of-range inputs are clamped");
    }

    #[test]
    fn test_sample_bilinear_interpolation() {
        let grid = make_test_grid();
        // Between row 1 (50) and row 2 (100) at the center column.
        let e = grid.sample(0.5, 0.375);
        assert!((e - 75.0).abs() < 1e-9, "Interpolated height should be 75, got {e}");
    }

    #[test]
    fn test_sample_or_zero_without_grid() {
        assert_eq!(sample_or_zero(None, 0.5, 0.5), 0.0);
        let grid = make_test_grid();
        assert_eq!(sample_or_zero(Some(&grid), 0.5, 0.5), 100.0);
    }

    #[test]
    fn test_dimension_errors() {
        assert_eq!(
            TerrainGrid::from_samples(1, 4, vec![0.0; 4]),
            Err(GridError::TooSmall { rows: 1, cols: 4 })
        );
        assert!(matches!(
            TerrainGrid::from_samples(2, 2, vec![0.0; 3]),
            Err(GridError::SampleCount { expected: 4, actual: 3, .. })
        ));
        assert_eq!(
            TerrainGrid::from_raw_elevations(2, 2, vec![f64::NAN; 4], 0),
            Err(GridError::NoData)
        );
    }

    #[test]
    fn test_flat_grid_has_zero_delta() {
        let grid = TerrainGrid::from_samples(3, 3, vec![42.0; 9]).unwrap();
        assert_eq!(grid.delta(), 0.0);
        assert!(grid.heights().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_smooth_pass_weights() {
        #[rustfmt::skip]
        let data = vec![
            0.0, 0.0, 0.0,
            0.0, 16.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let out = smooth_pass(&data, 3, 3);
        // Center: 16*8 / 16 = 8. Corner sees the center with weight 1 of 8+3.
        assert!((out[4] - 8.0).abs() < 1e-12, "center got {}", out[4]);
        assert!((out[0] - 16.0 / 11.0).abs() < 1e-12, "corner got {}", out[0]);
        // Edge: 8 + 5 neighbors.
        assert!((out[1] - 16.0 / 13.0).abs() < 1e-12, "edge got {}", out[1]);
    }

    #[test]
    fn test_smooth_pass_preserves_constant() {
        let out = smooth_pass(&[7.0; 12], 3, 4);
        assert!(out.iter().all(|v| (v - 7.0).abs() < 1e-12));
    }

    #[test]
    fn test_fill_voids() {
        let mut samples = vec![100.0, 200.0, 300.0, 100.0, f64::NAN, 300.0, 100.0, 200.0, 300.0];
        let filled = fill_voids(&mut samples, 3, 3);
        assert_eq!(filled, 1);
        // Average of 8 neighbors = 200.
        assert!((samples[4] - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_raw_elevations_fill_and_smooth() {
        let raw = vec![10.0, f64::NAN, 10.0, 10.0];
        let grid = TerrainGrid::from_raw_elevations(2, 2, raw, 4).unwrap();
        assert_eq!(grid.min(), 10.0);
        assert_eq!(grid.delta(), 0.0);
    }

    #[test]
    fn test_resample_corners_match_grid() {
        let grid = make_test_grid();
        let map = grid.resample(9, 9);
        assert_eq!(map.values.len(), 81);
        assert_eq!(map.get(0, 0), 0.0);
        assert!((map.get(4, 4) - 100.0).abs() < 1e-9, "center {}", map.get(4, 4));
        assert_eq!(map.get(8, 8), 0.0);
        assert_eq!(map.get(20, 20), 0.0, "Out-of-range pixels clamp to the edge");
        // Same lattice as sample() at the lattice points.
        let s = grid.sample(3.0 / 8.0, 1.0 / 8.0);
        assert!((map.get(3, 1) - s).abs() < 1e-9);
    }

    #[test]
    fn test_shape_height_range() {
        let grid = make_test_grid();
        let rect = ShapeMask::new(OutlineKind::Rectangle, 100.0, 100.0);
        let full = grid.shape_height_range(&rect);
        assert_eq!((full.min_z, full.max_z), (1000.0, 1100.0));
        assert_eq!((full.min_norm, full.max_norm), (0.0, 100.0));

        // A circle excludes the four corner samples but keeps the edge midpoints.
        let circle = ShapeMask::new(OutlineKind::Circle, 100.0, 100.0);
        let range = grid.shape_height_range(&circle);
        assert_eq!(range.min_z, 1000.0);
        assert_eq!(range.max_z, 1100.0);
        assert!((range.fraction(grid.min(), 50.0) - 0.5).abs() < 1e-12);
    }
}
