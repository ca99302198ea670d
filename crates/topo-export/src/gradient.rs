//! Hypsometric band raster: band colors, hillshade and relief overlay per pixel.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, RgbaImage};
use log::debug;
use topo_core::config::{unit_opacity, RenderConfig};
use topo_core::constants::PREVIEW_RASTER_SIZE;
use topo_core::types::Rgb;
use topo_terrain::contour::{contour_levels, contour_line_count};
use topo_terrain::relief::{hillshade_at, hillshade_pixel};
use topo_terrain::{
    BandColorizer, GradientRemap, HeightRange, HypsometricRamp, ReliefOverlay, ShapeMask,
    TerrainGrid,
};

use crate::error::ExportError;

/// Opaque RGB raster, row-major from the north-west corner.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgb>,
}

/// Everything needed to color one elevation sample.
struct BandShader {
    colorizer: BandColorizer,
    range: HeightRange,
    grid_min: f64,
    overlay: ReliefOverlay,
}

impl BandShader {
    fn new(grid: &TerrainGrid, config: &RenderConfig) -> Self {
        let mask = ShapeMask::from_outline(&config.outline);
        let range = grid.shape_height_range(&mask);
        let count = contour_line_count(
            config.contour.density,
            config.contour.width,
            mask.width(),
            mask.height(),
        );
        let levels = contour_levels(range.min_norm, range.max_norm, count);

        let water = config.water_areas.enabled.then_some(config.water_areas.color);
        let green = config.green_areas.enabled.then_some(config.green_areas.color);
        let ramp = HypsometricRamp::for_scheme(config.raster.scheme, water, green);
        let remap = GradientRemap::from_style(&config.raster);

        Self {
            colorizer: BandColorizer::for_terrain(grid, &range, &levels, &ramp, remap),
            range,
            grid_min: grid.min(),
            overlay: ReliefOverlay::from_style(&config.raster),
        }
    }

    fn shade(&self, z_norm: f64, hillshade: f64) -> Rgb {
        let base = self.colorizer.color_at(z_norm);
        let t = self.range.fraction(self.grid_min, z_norm);
        self.overlay.apply(base, hillshade, t)
    }
}

/// Pixel size whose long side is `long_side`, keeping the sheet aspect.
pub fn fit_long_side(width_mm: f64, height_mm: f64, long_side: u32) -> (u32, u32) {
    let ratio = height_mm / width_mm;
    if width_mm >= height_mm {
        (long_side, ((long_side as f64 * ratio).round() as u32).max(1))
    } else {
        (((long_side as f64 / ratio).round() as u32).max(1), long_side)
    }
}

impl BandRaster {
    /// Low-resolution preview sampled straight from the grid, with the
    /// hillshade step set to one grid cell.
    pub fn preview(grid: &TerrainGrid, config: &RenderConfig) -> Self {
        let (width, height) = fit_long_side(
            config.outline.width_mm,
            config.outline.height_mm,
            PREVIEW_RASTER_SIZE,
        );
        let shader = BandShader::new(grid, config);
        let step = 1.0 / (grid.cols().max(grid.rows()) - 1) as f64;

        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            let ny = unit_coord(y, height);
            for x in 0..width {
                let nx = unit_coord(x, width);
                let z = grid.sample(nx, ny);
                let shade = hillshade_at(grid, nx, ny, step, Some(z));
                pixels.push(shader.shade(z, shade));
            }
        }
        debug!("Preview band raster {width}×{height}");
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Full-resolution raster from a resampled height map, with the
    /// hillshade step set to one output pixel.
    pub fn render(grid: &TerrainGrid, config: &RenderConfig, width: u32, height: u32) -> Self {
        let shader = BandShader::new(grid, config);
        let map = grid.resample(width as usize, height as usize);

        let mut pixels = Vec::with_capacity(map.values.len());
        for y in 0..map.height {
            for x in 0..map.width {
                let z = map.get(x, y);
                let shade = hillshade_pixel(&map, x, y, grid.delta());
                pixels.push(shader.shade(z, shade));
            }
        }
        debug!("Band raster {width}×{height}");
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Straight (non-premultiplied) RGBA bytes with a uniform alpha.
    pub fn to_rgba(&self, alpha: u8) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| [c.r, c.g, c.b, alpha])
            .collect()
    }

    pub fn to_png(&self, alpha: u8) -> Result<Vec<u8>, ExportError> {
        encode_png(self.width, self.height, self.to_rgba(alpha))
    }

    /// PNG data URL with the gradient opacity baked into the alpha channel.
    pub fn to_data_url(&self, opacity_percent: f64) -> Result<String, ExportError> {
        let alpha = (255.0 * unit_opacity(opacity_percent)).round() as u8;
        let png = self.to_png(alpha)?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

/// Encode straight RGBA bytes as PNG.
pub fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>, ExportError> {
    let img = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| ExportError::raster("pixel buffer does not match image size"))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn unit_coord(i: u32, n: u32) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}
