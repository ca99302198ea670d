//! Hillshading and the warm/shadow relief overlay.

use glam::DVec3;
use topo_core::config::RasterStyle;
use topo_core::constants::{
    HILLSHADE_AMBIENT, LIGHT_DIRECTION, RELIEF_DELTA_REFERENCE, RELIEF_MAX, RELIEF_MIN,
};
use topo_core::types::Rgb;

use crate::grid::{HeightMap, TerrainGrid};

/// Normalized direction toward the light (down-left, raised).
pub fn light_direction() -> DVec3 {
    let [x, y, z] = LIGHT_DIRECTION;
    DVec3::new(x, y, z).try_normalize().unwrap_or(DVec3::Z)
}

/// Normal exaggeration for a terrain spanning `delta` meters.
pub fn relief_factor(delta: f64) -> f64 {
    (delta / RELIEF_DELTA_REFERENCE).clamp(RELIEF_MIN, RELIEF_MAX)
}

/// Shade in [ambient, 1] for a surface with the given gradients.
pub fn hillshade(dzdx: f64, dzdy: f64, delta: f64) -> f64 {
    let relief = relief_factor(delta);
    let normal = DVec3::new(-dzdx * relief, -dzdy * relief, 1.0)
        .try_normalize()
        .unwrap_or(DVec3::Z);
    let lit = normal.dot(light_direction()).max(0.0);
    (HILLSHADE_AMBIENT + lit * (1.0 - HILLSHADE_AMBIENT)).clamp(0.0, 1.0)
}

/// Hillshade at a normalized grid position from forward differences of
/// bilinear samples `step` apart; neighbors past the edge are clamped.
pub fn hillshade_at(grid: &TerrainGrid, nx: f64, ny: f64, step: f64, center: Option<f64>) -> f64 {
    let step = step.max(1e-6);
    let z0 = center.unwrap_or_else(|| grid.sample(nx, ny));
    let z_right = grid.sample((nx + step).min(1.0), ny);
    let z_down = grid.sample(nx, (ny + step).min(1.0));
    hillshade((z_right - z0) / step, (z_down - z0) / step, grid.delta())
}

/// Hillshade at a pixel of a resampled height map, stepping one pixel in
/// each direction.
pub fn hillshade_pixel(map: &HeightMap, x: usize, y: usize, delta: f64) -> f64 {
    let step_x = 1.0 / map.width.saturating_sub(1).max(1) as f64;
    let step_y = 1.0 / map.height.saturating_sub(1).max(1) as f64;
    let z0 = map.get(x, y);
    let dzdx = (map.get(x + 1, y) - z0) / step_x;
    let dzdy = (map.get(x, y + 1) - z0) / step_y;
    hillshade(dzdx, dzdy, delta)
}

/// Mixes a warm highlight into lit slopes and peaks, and a shadow color
/// into slopes facing away from the light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliefOverlay {
    pub strength: f64,
    pub warm: Rgb,
    pub shadow: Rgb,
}

impl ReliefOverlay {
    pub fn from_style(style: &RasterStyle) -> Self {
        Self {
            strength: style.relief_strength,
            warm: style.relief_warm,
            shadow: style.relief_shadow,
        }
    }

    pub fn apply(&self, base: Rgb, shade: f64, elevation_t: f64) -> Rgb {
        let strength = if self.strength.is_finite() {
            self.strength.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if strength <= 0.0 {
            return base;
        }
        let highlight = ((shade - 0.5) * 2.0).clamp(0.0, 1.0) * strength;
        let shadow_mix = ((0.5 - shade) * 2.0).clamp(0.0, 1.0) * strength;
        let peak_boost = ((elevation_t - 0.6) / 0.4).clamp(0.0, 1.0) * strength * 0.45;
        base.mix(self.warm, (highlight + peak_boost).clamp(0.0, 1.0))
            .mix(self.shadow, shadow_mix)
    }
}
