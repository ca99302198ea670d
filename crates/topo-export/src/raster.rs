//! Raster (PNG) export.
//!
//! The sheet is drawn into a tiny-skia pixmap scaled from millimeters to
//! pixels: background, then the hypsometric band raster clipped to the
//! outline, then the vector overlay. Label and placeholder text use the
//! bitmap glyphs from [`crate::glyphs`].

use log::debug;
use tiny_skia::{
    BlendMode as SkiaBlend, Color, FillRule, IntSize, LineCap, LineJoin, Mask, Paint, Path,
    PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};
use topo_core::config::{unit_opacity, LabelStyle};
use topo_core::enums::{BlendMode, OutlineKind};
use topo_core::types::{Point, Rgb};
use topo_terrain::ShapeMask;

use crate::error::ExportError;
use crate::glyphs::{text_path, TextStyle};
use crate::gradient::{encode_png, fit_long_side, BandRaster};
use crate::scene::{
    PlacedLabel, Scene, SceneItem, LABEL_HALO_WIDTH, PLACEHOLDER_COLOR, PLACEHOLDER_SIZE,
};

const FRAME_COLOR: Rgb = Rgb::new(36, 48, 65);
const FRAME_ALPHA: f64 = 0.6;
const FRAME_WIDTH: f32 = 0.5;

/// Band raster drawn under the vector layers.
#[derive(Debug, Clone, Copy)]
pub struct BandLayer<'a> {
    /// Must match the writer's pixel size.
    pub raster: &'a BandRaster,
    /// Unit opacity in [0, 1].
    pub opacity: f64,
    pub blend: BlendMode,
}

/// Rasterizes scenes at a fixed pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterWriter {
    width: u32,
    height: u32,
}

impl RasterWriter {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Writer whose long side is `long_side` pixels, keeping the sheet aspect.
    pub fn for_sheet(width_mm: f64, height_mm: f64, long_side: u32) -> Self {
        let (width, height) = fit_long_side(width_mm, height_mm, long_side);
        Self::new(width, height)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draw background, optional band raster and the overlay scene.
    pub fn render(
        &self,
        overlay: &Scene,
        background: Rgb,
        band: Option<BandLayer<'_>>,
    ) -> Result<Pixmap, ExportError> {
        let mut pixmap = Pixmap::new(self.width, self.height).ok_or_else(|| {
            ExportError::raster(format!("cannot allocate {}×{} pixmap", self.width, self.height))
        })?;
        pixmap.fill(Color::from_rgba8(background.r, background.g, background.b, 255));

        let transform = Transform::from_scale(
            (self.width as f64 / overlay.width()) as f32,
            (self.height as f64 / overlay.height()) as f32,
        );
        let clip = self.outline_mask(&overlay.outline, transform)?;

        if let Some(band) = band {
            self.draw_band(&mut pixmap, band, &clip)?;
        }

        for item in &overlay.items {
            draw_item(&mut pixmap, item, transform, &clip);
        }

        if overlay.frame {
            if let Some(rect) = Rect::from_xywh(
                0.5,
                0.5,
                (overlay.width() - 1.0) as f32,
                (overlay.height() - 1.0) as f32,
            ) {
                let path = PathBuilder::from_rect(rect);
                let paint = solid_paint(FRAME_COLOR, FRAME_ALPHA);
                let stroke = Stroke {
                    width: FRAME_WIDTH,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &paint, &stroke, transform, None);
            }
        }

        debug!("Rasterized {} scene items at {}×{}", overlay.items.len(), self.width, self.height);
        Ok(pixmap)
    }

    /// Render and encode as PNG.
    pub fn render_png(
        &self,
        overlay: &Scene,
        background: Rgb,
        band: Option<BandLayer<'_>>,
    ) -> Result<Vec<u8>, ExportError> {
        let pixmap = self.render(overlay, background, band)?;
        encode_pixmap(&pixmap)
    }

    fn outline_mask(&self, outline: &ShapeMask, transform: Transform) -> Result<Mask, ExportError> {
        let mut mask = Mask::new(self.width, self.height)
            .ok_or_else(|| ExportError::raster("cannot allocate clip mask"))?;
        if let Some(path) = outline_path(outline) {
            mask.fill_path(&path, FillRule::Winding, true, transform);
        }
        Ok(mask)
    }

    fn draw_band(&self, pixmap: &mut Pixmap, band: BandLayer<'_>, clip: &Mask) -> Result<(), ExportError> {
        let raster = band.raster;
        if (raster.width, raster.height) != (self.width, self.height) {
            return Err(ExportError::raster(format!(
                "band raster is {}×{}, expected {}×{}",
                raster.width, raster.height, self.width, self.height
            )));
        }
        let size = IntSize::from_wh(raster.width, raster.height)
            .ok_or_else(|| ExportError::raster("empty band raster"))?;
        // Opaque pixels are their own premultiplied form.
        let band_pixmap = Pixmap::from_vec(raster.to_rgba(255), size)
            .ok_or_else(|| ExportError::raster("band raster size mismatch"))?;

        let paint = PixmapPaint {
            opacity: band.opacity.clamp(0.0, 1.0) as f32,
            blend_mode: skia_blend(band.blend),
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, band_pixmap.as_ref(), &paint, Transform::identity(), Some(clip));
        Ok(())
    }
}

/// Encode a pixmap as PNG with straight alpha.
pub fn encode_pixmap(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    encode_png(pixmap.width(), pixmap.height(), rgba)
}

fn skia_blend(mode: BlendMode) -> SkiaBlend {
    match mode {
        BlendMode::Normal => SkiaBlend::SourceOver,
        BlendMode::Multiply => SkiaBlend::Multiply,
        BlendMode::Color => SkiaBlend::Color,
    }
}

fn solid_paint(color: Rgb, opacity: f64) -> Paint<'static> {
    let mut paint = Paint::default();
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    paint.set_color_rgba8(color.r, color.g, color.b, alpha);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f64) -> Stroke {
    Stroke {
        width: width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn build_path(points: &[Point], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

fn outline_path(outline: &ShapeMask) -> Option<Path> {
    match outline.kind() {
        OutlineKind::Circle => {
            let c = outline.center();
            PathBuilder::from_circle(c.x as f32, c.y as f32, (outline.width() / 2.0) as f32)
        }
        _ => build_path(&outline.boundary_polygon(), true),
    }
}

fn draw_item(pixmap: &mut Pixmap, item: &SceneItem, transform: Transform, clip: &Mask) {
    match item {
        SceneItem::Background(color) => {
            if let Some(rect) = Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32) {
                let paint = solid_paint(*color, 1.0);
                pixmap.fill_rect(rect, &paint, Transform::identity(), Some(clip));
            }
        }
        SceneItem::Areas {
            color,
            opacity,
            polygons,
            ..
        } => {
            let paint = solid_paint(*color, *opacity);
            for path in polygons.iter().filter_map(|p| build_path(p, true)) {
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, Some(clip));
            }
        }
        SceneItem::Lines {
            color,
            width,
            opacity,
            lines,
            ..
        } => {
            let paint = solid_paint(*color, *opacity);
            let stroke = round_stroke(*width);
            for path in lines.iter().filter_map(|l| build_path(l, false)) {
                pixmap.stroke_path(&path, &paint, &stroke, transform, Some(clip));
            }
        }
        SceneItem::Contours {
            color,
            opacity,
            paths,
        } => {
            let paint = solid_paint(*color, *opacity);
            for (width, line) in paths {
                if let Some(path) = build_path(line, false) {
                    pixmap.stroke_path(&path, &paint, &round_stroke(*width), transform, Some(clip));
                }
            }
        }
        SceneItem::Placeholder { position, text } => {
            if let Some(path) = text_path(text, *position, PLACEHOLDER_SIZE, TextStyle::default()) {
                let paint = solid_paint(PLACEHOLDER_COLOR, 1.0);
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, Some(clip));
            }
        }
        SceneItem::Labels { style, labels } => draw_labels(pixmap, style, labels, transform, clip),
        SceneItem::Gradient(_) => {
            // The band layer stands in for the preview image.
            debug!("Skipping gradient image in raster overlay");
        }
    }
}

/// Halo first, then the fill, so the halo only shows around the glyphs.
fn draw_labels(
    pixmap: &mut Pixmap,
    style: &LabelStyle,
    labels: &[PlacedLabel],
    transform: Transform,
    clip: &Mask,
) {
    let fill = solid_paint(style.color, unit_opacity(style.opacity));
    let halo = style
        .halo
        .then(|| (solid_paint(style.halo_color, 1.0), round_stroke(LABEL_HALO_WIDTH)));
    let text_style = TextStyle {
        bold: style.bold,
        italic: style.italic,
    };
    for label in labels {
        let Some(path) = text_path(&label.name, label.position, label.size, text_style) else {
            continue;
        };
        if let Some((paint, stroke)) = &halo {
            pixmap.stroke_path(&path, paint, stroke, transform, Some(clip));
        }
        pixmap.fill_path(&path, &fill, FillRule::Winding, transform, Some(clip));
    }
}
