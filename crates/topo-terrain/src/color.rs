//! Hypsometric band coloring.
//!
//! Elevation is split into bands at the contour levels; each band gets one
//! color from a ramp, and colors are blended across a narrow smoothstep
//! window at each boundary to avoid hard seams.

use topo_core::config::RasterStyle;
use topo_core::constants::{BAND_BLEND_FRACTION, BAND_BLEND_WINDOW};
use topo_core::enums::ColorScheme;
use topo_core::types::Rgb;

use crate::grid::{HeightRange, TerrainGrid};

const MONO_STOPS: [Rgb; 9] = [
    Rgb::new(0xFF, 0xFF, 0xFF),
    Rgb::new(0xE6, 0xE6, 0xE6),
    Rgb::new(0xCC, 0xCC, 0xCC),
    Rgb::new(0xB3, 0xB3, 0xB3),
    Rgb::new(0x99, 0x99, 0x99),
    Rgb::new(0x7F, 0x7F, 0x7F),
    Rgb::new(0x66, 0x66, 0x66),
    Rgb::new(0x4D, 0x4D, 0x4D),
    Rgb::new(0x33, 0x33, 0x33),
];

const TERRA_STOPS: [Rgb; 9] = [
    Rgb::new(0x1F, 0x4E, 0x5F),
    Rgb::new(0x3E, 0x6F, 0x6E),
    Rgb::new(0x6A, 0x8E, 0x6D),
    Rgb::new(0x9C, 0xAD, 0x68),
    Rgb::new(0xC9, 0xB8, 0x6A),
    Rgb::new(0xD5, 0xA8, 0x6A),
    Rgb::new(0xC9, 0x8B, 0x5E),
    Rgb::new(0xB1, 0x6F, 0x50),
    Rgb::new(0x8C, 0x5A, 0x44),
];

const GLACIER_STOPS: [Rgb; 9] = [
    Rgb::new(0x0E, 0x2A, 0x47),
    Rgb::new(0x1D, 0x4C, 0x6B),
    Rgb::new(0x2F, 0x6E, 0x8E),
    Rgb::new(0x4D, 0x90, 0xA8),
    Rgb::new(0x7B, 0xB1, 0xC2),
    Rgb::new(0xA6, 0xCA, 0xD5),
    Rgb::new(0xCD, 0xE1, 0xE6),
    Rgb::new(0xE5, 0xEF, 0xF2),
    Rgb::new(0xF4, 0xF8, 0xFA),
];

const COLOR_STOPS: [Rgb; 10] = [
    Rgb::new(0x0F, 0x3E, 0x63),
    Rgb::new(0x1F, 0x5C, 0x83),
    Rgb::new(0x3B, 0x7E, 0xA6),
    Rgb::new(0x6A, 0xA1, 0xC2),
    Rgb::new(0x9E, 0xC3, 0xD9),
    Rgb::new(0xBF, 0xD9, 0xB3),
    Rgb::new(0x9F, 0xBE, 0x7E),
    Rgb::new(0xCB, 0xB8, 0x78),
    Rgb::new(0xB1, 0x8D, 0x5B),
    Rgb::new(0x8E, 0x6C, 0x45),
];

/// Cubic smoothstep on [0, 1].
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Color stops of a hypsometric ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct HypsometricRamp {
    stops: Vec<Rgb>,
}

impl HypsometricRamp {
    /// Ramp for a scheme. The default `Color` ramp has its low stops tinted
    /// by the water and green-area colors when those layers are enabled.
    pub fn for_scheme(scheme: ColorScheme, water: Option<Rgb>, green: Option<Rgb>) -> Self {
        let stops = match scheme {
            ColorScheme::Mono => MONO_STOPS.to_vec(),
            ColorScheme::Terra => TERRA_STOPS.to_vec(),
            ColorScheme::Glacier => GLACIER_STOPS.to_vec(),
            ColorScheme::Color => {
                let mut stops = COLOR_STOPS.to_vec();
                match (water, green) {
                    (Some(w), Some(g)) => {
                        stops[0] = w;
                        stops[1] = w.mix(g, 0.55);
                        stops[2] = g;
                    }
                    (Some(w), None) => {
                        stops[0] = w;
                        stops[1] = w.mix(stops[2], 0.5);
                    }
                    (None, Some(g)) => {
                        stops[0] = g.mix(stops[0], 0.6);
                        stops[1] = g;
                    }
                    (None, None) => {}
                }
                stops
            }
        };
        Self { stops }
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// Color of band `index` out of `band_count`, spread evenly across the stops.
    pub fn band_color(&self, index: usize, band_count: usize) -> Rgb {
        if band_count <= 1 || self.stops.len() < 2 {
            return self.stops.first().copied().unwrap_or(Rgb::BLACK);
        }
        let scaled = index.min(band_count - 1) as f64 / (band_count - 1) as f64;
        let stop_index = scaled * (self.stops.len() - 1) as f64;
        let low = stop_index.floor() as usize;
        let high = (low + 1).min(self.stops.len() - 1);
        self.stops[low].mix(self.stops[high], stop_index - low as f64)
    }
}

/// Remap of the elevation fraction: scale around the midpoint, then shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientRemap {
    scale: f64,
    shift: f64,
}

impl GradientRemap {
    /// From percent values; scale is clamped to 30..=200 %, shift to ±80 %.
    pub fn new(scale_percent: f64, shift_percent: f64) -> Self {
        let scale = if scale_percent.is_finite() { scale_percent } else { 100.0 };
        let shift = if shift_percent.is_finite() { shift_percent } else { 0.0 };
        Self {
            scale: (scale / 100.0).clamp(0.3, 2.0),
            shift: (shift / 100.0).clamp(-0.8, 0.8),
        }
    }

    pub fn from_style(style: &RasterStyle) -> Self {
        Self::new(style.gradient_scale, style.gradient_shift)
    }

    pub fn apply(&self, t: f64) -> f64 {
        ((t - 0.5) / self.scale + 0.5 + self.shift).clamp(0.0, 1.0)
    }

    /// Color for elevation fraction `t` when the range is split into `band_count` bands.
    pub fn band_color(&self, ramp: &HypsometricRamp, t: f64, band_count: usize) -> Rgb {
        let t = self.apply(t);
        let index = ((t * band_count as f64).floor() as usize).min(band_count.saturating_sub(1));
        ramp.band_color(index, band_count)
    }
}

/// Banded colors over sorted boundaries, with smoothstep blending near each boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BandColorizer {
    boundaries: Vec<f64>,
    colors: Vec<Rgb>,
}

impl BandColorizer {
    /// `colors.len()` must be `boundaries.len() - 1`; extra entries on
    /// either side are ignored and missing colors repeat the last one.
    pub fn new(boundaries: Vec<f64>, mut colors: Vec<Rgb>) -> Self {
        let bands = boundaries.len().saturating_sub(1).max(1);
        let fill = colors.last().copied().unwrap_or(Rgb::BLACK);
        colors.resize(bands, fill);
        Self { boundaries, colors }
    }

    /// Colorizer for a terrain grid: boundaries are the visible range split
    /// at the contour levels, each band colored at its midpoint elevation.
    pub fn for_terrain(
        grid: &TerrainGrid,
        range: &HeightRange,
        levels: &[f64],
        ramp: &HypsometricRamp,
        remap: GradientRemap,
    ) -> Self {
        let mut boundaries = Vec::with_capacity(levels.len() + 2);
        boundaries.push(range.min_norm);
        boundaries.extend_from_slice(levels);
        boundaries.push(range.max_norm);

        let band_count = (boundaries.len() - 1).max(2);
        let colors = boundaries
            .windows(2)
            .map(|w| {
                let mid = (w[0] + w[1]) / 2.0;
                let t = range.fraction(grid.min(), mid);
                remap.band_color(ramp, t, band_count)
            })
            .collect();
        Self::new(boundaries, colors)
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Band index `i` with `b[i] ≤ v < b[i+1]`. Values at or below the first
    /// boundary give 0, at or above the last give the last band; a value on
    /// an interior boundary belongs to the band above it.
    pub fn band_of(&self, v: f64) -> usize {
        let b = &self.boundaries;
        if b.len() < 2 || v <= b[0] {
            return 0;
        }
        let last_band = b.len() - 2;
        if v >= b[b.len() - 1] {
            return last_band;
        }
        // Count of interior boundaries ≤ v.
        b[1..=last_band].partition_point(|&x| x <= v)
    }

    /// Pure band color without edge blending.
    pub fn band_color(&self, band: usize) -> Rgb {
        self.colors[band.min(self.colors.len() - 1)]
    }

    /// Band color blended with its neighbors within the boundary window.
    pub fn color_at(&self, v: f64) -> Rgb {
        let band = self.band_of(v);
        let mut color = self.band_color(band);
        if self.boundaries.len() < 2 {
            return color;
        }

        let lower = self.boundaries[band];
        let upper = self.boundaries[band + 1];
        let span = (upper - lower).max(1e-6);
        let window = BAND_BLEND_WINDOW.min(span * BAND_BLEND_FRACTION);
        if window > 0.0 {
            // Each side of a boundary fades toward an even mix at the boundary.
            if band > 0 {
                let t = smoothstep((v - lower) / window);
                color = self.colors[band - 1].mix(color, 0.5 + 0.5 * t);
            }
            if band + 1 < self.colors.len() {
                let t = smoothstep((upper - v) / window);
                color = color.mix(self.colors[band + 1], 0.5 * (1.0 - t));
            }
        }
        color
    }
}
