//! Preview gradient cache.
//!
//! The embedded preview gradient is the most expensive part of a preview
//! render, so the encoded image is kept together with the exact inputs it
//! was built from and rebuilt only when one of them changes.

use log::debug;
use topo_core::config::RenderConfig;
use topo_core::enums::ColorScheme;
use topo_core::types::Rgb;

/// Every input that affects the preview gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewKey {
    /// Bumped by the caller whenever the terrain grid is replaced.
    pub terrain_revision: u64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub contour_density: u32,
    pub contour_width: f64,
    pub scheme: ColorScheme,
    pub gradient_opacity: f64,
    pub gradient_shift: f64,
    pub gradient_scale: f64,
    pub relief_strength: f64,
    pub relief_warm: Rgb,
    pub relief_shadow: Rgb,
    /// Ramp tint colors; `None` when the layer is disabled.
    pub water_color: Option<Rgb>,
    pub green_color: Option<Rgb>,
}

impl PreviewKey {
    pub fn new(config: &RenderConfig, terrain_revision: u64) -> Self {
        let raster = &config.raster;
        Self {
            terrain_revision,
            width_mm: config.outline.width_mm,
            height_mm: config.outline.height_mm,
            contour_density: config.contour.density,
            contour_width: config.contour.width,
            scheme: raster.scheme,
            gradient_opacity: raster.gradient_opacity,
            gradient_shift: raster.gradient_shift,
            gradient_scale: raster.gradient_scale,
            relief_strength: raster.relief_strength,
            relief_warm: raster.relief_warm,
            relief_shadow: raster.relief_shadow,
            water_color: config.water_areas.enabled.then_some(config.water_areas.color),
            green_color: config.green_areas.enabled.then_some(config.green_areas.color),
        }
    }
}

/// Single-entry cache of the encoded preview gradient.
#[derive(Debug, Clone, Default)]
pub struct PreviewCache {
    entry: Option<(PreviewKey, String)>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if present.
    pub fn get(&self, key: &PreviewKey) -> Option<&str> {
        match &self.entry {
            Some((k, v)) if k == key => Some(v.as_str()),
            _ => None,
        }
    }

    /// Return the cached value for `key`, building and storing it on a miss.
    /// A failed build leaves the previous entry untouched.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: PreviewKey,
        build: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        if let Some(hit) = self.get(&key) {
            debug!("Preview gradient cache hit");
            return Ok(hit.to_string());
        }
        let value = build()?;
        self.entry = Some((key, value.clone()));
        Ok(value)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
