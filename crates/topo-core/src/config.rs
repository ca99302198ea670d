//! Per-render configuration snapshot.
//!
//! A `RenderConfig` is built once per render or export and passed by
//! reference through the pipeline. Nothing downstream mutates it; a change
//! in any field produces a fresh render from the same terrain.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{BlendMode, ColorScheme, LabelFont, LayerKind, OutlineKind, ThemePreset};
use crate::types::Rgb;

/// Allowed outline width range (mm).
pub const OUTLINE_WIDTH_RANGE: (f64, f64) = (50.0, 1200.0);

/// Allowed stroke width range (user units).
pub const LINE_WIDTH_RANGE: (f64, f64) = (0.1, 2.0);

/// Maximum contour emphasis period.
pub const MAX_EMPHASIS_EVERY: u32 = 20;

/// Complete render/export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub outline: OutlineConfig,
    pub contour: ContourStyle,
    pub raster: RasterStyle,
    pub theme: Theme,
    pub water_areas: AreaStyle,
    pub green_areas: AreaStyle,
    pub rivers: LineStyle,
    pub roads: LineStyle,
    pub labels: LabelStyle,
    /// Vector layers, topmost first.
    pub layer_order: Vec<LayerKind>,
    pub mesh: MeshConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            outline: OutlineConfig::default(),
            contour: ContourStyle::default(),
            raster: RasterStyle::default(),
            theme: Theme::default(),
            water_areas: AreaStyle {
                enabled: false,
                color: Rgb::new(0x7D, 0xB5, 0xD3),
                opacity: 45.0,
            },
            green_areas: AreaStyle {
                enabled: false,
                color: Rgb::new(0x7F, 0xAE, 0x8A),
                opacity: 15.0,
            },
            rivers: LineStyle {
                enabled: false,
                color: Rgb::new(0x7D, 0xB5, 0xD3),
                width: 0.2,
                opacity: 85.0,
            },
            roads: LineStyle {
                enabled: false,
                color: Rgb::new(0x5B, 0x3A, 0x1C),
                width: 0.2,
                opacity: 75.0,
            },
            labels: LabelStyle::default(),
            layer_order: LayerKind::DEFAULT_ORDER.to_vec(),
            mesh: MeshConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Apply a theme preset: background, line color (also used for contours)
    /// and the feature colors change together.
    pub fn apply_preset(&mut self, preset: ThemePreset) {
        let colors = PresetColors::for_preset(preset);
        self.theme = Theme {
            preset,
            background: colors.background,
            line: colors.line,
        };
        self.contour.color = colors.line;
        self.water_areas.color = colors.water;
        self.rivers.color = colors.water;
        self.green_areas.color = colors.green;
        self.roads.color = colors.roads;
        self.labels.color = colors.labels;
        self.labels.halo_color = colors.background;
    }

    /// Copy with every user-facing value clamped into its valid range and
    /// the outline height re-derived for fixed-ratio outlines.
    pub fn sanitized(&self) -> RenderConfig {
        let mut out = self.clone();
        out.outline = self.outline.sanitized();

        let (lo, hi) = LINE_WIDTH_RANGE;
        out.contour.width = clamp_or(self.contour.width, lo, hi, 0.2);
        out.contour.density = self.contour.density.max(1);
        out.contour.emphasis_every = self.contour.emphasis_every.min(MAX_EMPHASIS_EVERY);
        out.contour.opacity = clamp_or(self.contour.opacity, 0.0, 100.0, 80.0);
        out.rivers.width = clamp_or(self.rivers.width, lo, hi, 0.2);
        out.roads.width = clamp_or(self.roads.width, lo, hi, 0.2);
        out.rivers.opacity = clamp_or(self.rivers.opacity, 0.0, 100.0, 85.0);
        out.roads.opacity = clamp_or(self.roads.opacity, 0.0, 100.0, 75.0);
        out.water_areas.opacity = clamp_or(self.water_areas.opacity, 0.0, 100.0, 45.0);
        out.green_areas.opacity = clamp_or(self.green_areas.opacity, 0.0, 100.0, 15.0);
        out.labels.opacity = clamp_or(self.labels.opacity, 0.0, 100.0, 85.0);
        out.labels.size = clamp_or(self.labels.size, 0.1, 4.0, 0.4);
        out.raster.gradient_opacity = clamp_or(self.raster.gradient_opacity, 0.0, 100.0, 0.0);
        out.raster.relief_strength = clamp_or(self.raster.relief_strength, 0.0, 1.0, 0.48);

        // Unknown or repeated layers would draw twice; keep the first occurrence.
        let mut seen = Vec::with_capacity(out.layer_order.len());
        for layer in &self.layer_order {
            if !seen.contains(layer) {
                seen.push(*layer);
            }
        }
        out.layer_order = seen;

        out.mesh.resolution = self.mesh.resolution.clamp(2, 2000);
        out.mesh.base_mm = clamp_or(self.mesh.base_mm, 0.0, 100.0, MESH_BASE_MM);
        out.mesh.target_height_mm =
            clamp_or(self.mesh.target_height_mm, 0.0, 1000.0, MESH_TARGET_HEIGHT_MM);
        out
    }
}

fn clamp_or(value: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

/// Percent opacity (0..=100) to unit alpha.
pub fn unit_opacity(percent: f64) -> f64 {
    (percent / 100.0).clamp(0.0, 1.0)
}

// --- Outline ---

/// Sheet outline and physical size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    pub kind: OutlineKind,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            kind: OutlineKind::Rectangle,
            width_mm: 200.0,
            height_mm: 140.0,
        }
    }
}

impl OutlineConfig {
    /// Build an outline, deriving the height for fixed-ratio kinds.
    pub fn new(kind: OutlineKind, width_mm: f64, height_mm: f64) -> Self {
        Self {
            kind,
            width_mm,
            height_mm,
        }
        .sanitized()
    }

    /// Width clamped to the allowed range (non-finite widths reset to 200 mm);
    /// height derived from the kind where it is fixed.
    pub fn sanitized(&self) -> Self {
        let (lo, hi) = OUTLINE_WIDTH_RANGE;
        let width_mm = clamp_or(self.width_mm.round(), lo, hi, 200.0);
        let height_mm = match self.kind.derived_height(width_mm) {
            Some(h) => h,
            None => clamp_or(self.height_mm.round(), lo, hi * 1.5, 140.0),
        };
        Self {
            kind: self.kind,
            width_mm,
            height_mm,
        }
    }

    /// Height-to-width ratio.
    pub fn aspect(&self) -> f64 {
        if self.width_mm > 0.0 {
            self.height_mm / self.width_mm
        } else {
            1.0
        }
    }
}

// --- Contours ---

/// Contour line styling and density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourStyle {
    pub enabled: bool,
    /// Requested number of contour lines.
    pub density: u32,
    /// Stroke width in user units (CSS px, converted with `PX_TO_MM` for spacing).
    pub width: f64,
    pub color: Rgb,
    /// Chaikin smoothing iterations (0 = off).
    pub smoothing: u32,
    /// Opacity percent.
    pub opacity: f64,
    /// Every Nth level is drawn with double width (0 = off).
    pub emphasis_every: u32,
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            density: 24,
            width: 0.2,
            color: Rgb::new(0x10, 0x14, 0x1B),
            smoothing: 4,
            opacity: 80.0,
            emphasis_every: 10,
        }
    }
}

impl ContourStyle {
    /// Stroke width for the level at `index` (0-based).
    pub fn width_for_level(&self, index: usize) -> f64 {
        let every = self.emphasis_every as usize;
        if every > 0 && (index + 1) % every == 0 {
            self.width * 2.0
        } else {
            self.width
        }
    }
}

// --- Raster ---

/// Hypsometric gradient and relief settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterStyle {
    /// Draw the gradient raster beneath the vector layers.
    pub layered: bool,
    pub scheme: ColorScheme,
    pub blend: BlendMode,
    /// Gradient opacity percent.
    pub gradient_opacity: f64,
    /// Percent shift of the elevation fraction (clamped to ±80).
    pub gradient_shift: f64,
    /// Percent scale around the midpoint (clamped to 30..=200).
    pub gradient_scale: f64,
    /// Relief overlay strength in [0, 1].
    pub relief_strength: f64,
    pub relief_warm: Rgb,
    pub relief_shadow: Rgb,
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            layered: true,
            scheme: ColorScheme::Color,
            blend: BlendMode::Normal,
            gradient_opacity: 0.0,
            gradient_shift: 0.0,
            gradient_scale: 100.0,
            relief_strength: 0.48,
            relief_warm: Rgb::new(0xF3, 0xA1, 0x5F),
            relief_shadow: Rgb::new(0x0A, 0x16, 0x24),
        }
    }
}

// --- Theme ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub preset: ThemePreset,
    pub background: Rgb,
    pub line: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            preset: ThemePreset::Bright,
            background: Rgb::new(0xF5, 0xF2, 0xEB),
            line: Rgb::new(0x10, 0x14, 0x1B),
        }
    }
}

/// Colors set together by a theme preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetColors {
    pub background: Rgb,
    pub line: Rgb,
    pub water: Rgb,
    pub green: Rgb,
    pub roads: Rgb,
    pub labels: Rgb,
}

impl PresetColors {
    pub fn for_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Dark => Self {
                background: Rgb::new(0x14, 0x1A, 0x22),
                line: Rgb::new(0xD7, 0xE3, 0xFF),
                water: Rgb::new(0x4C, 0x86, 0xA8),
                green: Rgb::new(0x4E, 0x7E, 0x5A),
                roads: Rgb::new(0x6A, 0x43, 0x22),
                labels: Rgb::new(0xF5, 0xF7, 0xFB),
            },
            ThemePreset::Bright => Self {
                background: Rgb::new(0xF5, 0xF2, 0xEB),
                line: Rgb::new(0x10, 0x14, 0x1B),
                water: Rgb::new(0x7D, 0xB5, 0xD3),
                green: Rgb::new(0x7F, 0xAE, 0x8A),
                roads: Rgb::new(0x5B, 0x3A, 0x1C),
                labels: Rgb::new(0x1E, 0x23, 0x2B),
            },
            ThemePreset::Grayscale => Self {
                background: Rgb::new(0x1C, 0x1C, 0x1C),
                line: Rgb::new(0xD6, 0xD6, 0xD6),
                water: Rgb::new(0x5A, 0x5A, 0x5A),
                green: Rgb::new(0x44, 0x44, 0x44),
                roads: Rgb::new(0x4F, 0x3E, 0x34),
                labels: Rgb::new(0xF2, 0xF2, 0xF2),
            },
        }
    }
}

// --- Feature styles ---

/// Filled polygon layer style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaStyle {
    pub enabled: bool,
    pub color: Rgb,
    /// Fill opacity percent.
    pub opacity: f64,
}

impl Default for AreaStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgb::new(0x7D, 0xB5, 0xD3),
            opacity: 45.0,
        }
    }
}

/// Stroked polyline layer style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    pub enabled: bool,
    pub color: Rgb,
    /// Stroke width in user units.
    pub width: f64,
    /// Stroke opacity percent.
    pub opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgb::new(0x7D, 0xB5, 0xD3),
            width: 0.2,
            opacity: 85.0,
        }
    }
}

/// Place label style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub enabled: bool,
    pub color: Rgb,
    /// Base text size (mm), multiplied by the rank scale when `scale_by_rank`.
    pub size: f64,
    pub font: LabelFont,
    pub opacity: f64,
    /// Draw a halo stroke behind the text.
    pub halo: bool,
    pub halo_color: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub scale_by_rank: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgb::new(0x1E, 0x23, 0x2B),
            size: 0.4,
            font: LabelFont::System,
            opacity: 85.0,
            halo: true,
            halo_color: Rgb::new(0xF5, 0xF2, 0xEB),
            bold: false,
            italic: false,
            scale_by_rank: true,
        }
    }
}

// --- Mesh ---

/// 3D export parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Lattice cells per side.
    pub resolution: usize,
    /// Flat base thickness (mm).
    pub base_mm: f64,
    /// Height of the full elevation range above the base (mm).
    pub target_height_mm: f64,
    pub smoothing_passes: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            resolution: MESH_RESOLUTION,
            base_mm: MESH_BASE_MM,
            target_height_mm: MESH_TARGET_HEIGHT_MM,
            smoothing_passes: MESH_SMOOTH_PASSES,
        }
    }
}
