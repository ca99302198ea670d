//! Scene composition: the ordered, styled layer list shared by the vector
//! preview and the raster overlay.

use topo_core::config::{unit_opacity, ContourStyle, LabelStyle, RenderConfig};
use topo_core::enums::{BlendMode, LayerKind, PlaceKind};
use topo_core::features::FeatureSet;
use topo_core::types::{Point, Polyline, Rgb};
use topo_terrain::contour::{contour_levels, contour_line_count, ContourExtractor};
use topo_terrain::{ShapeMask, TerrainGrid};

/// Placeholder shown when contours are on but there is no usable terrain.
pub const MISSING_TERRAIN_TEXT: &str = "Elevation data missing. Try generating again.";
pub const PLACEHOLDER_COLOR: Rgb = Rgb::new(0x9A, 0xA3, 0xB2);
/// Placeholder font size (mm).
pub const PLACEHOLDER_SIZE: f64 = 6.0;
/// Halo stroke width around label text (mm).
pub const LABEL_HALO_WIDTH: f64 = 0.6;

// --- Contours ---

/// Contour lines of one level.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourLevel {
    /// Normalized height of the level.
    pub level: f64,
    /// Stroke width in user units (doubled on emphasized levels).
    pub width: f64,
    pub lines: Vec<Polyline>,
}

/// Stitched, smoothed contours for every level of a terrain grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    levels: Vec<ContourLevel>,
}

impl ContourSet {
    /// Extract contours over the full normalized range `(0, delta)`.
    /// Levels without any segment inside the outline are dropped.
    pub fn build(grid: &TerrainGrid, mask: &ShapeMask, style: &ContourStyle) -> Self {
        let count = contour_line_count(style.density, style.width, mask.width(), mask.height());
        let extractor = ContourExtractor::new(grid, mask);

        let levels = contour_levels(0.0, grid.delta(), count)
            .into_iter()
            .enumerate()
            .filter_map(|(i, level)| {
                let lines = extractor.polylines(level, style.smoothing);
                (!lines.is_empty()).then(|| ContourLevel {
                    level,
                    width: style.width_for_level(i),
                    lines,
                })
            })
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> &[ContourLevel] {
        &self.levels
    }

    /// Every contour path, lowest level first.
    pub fn paths(&self) -> impl Iterator<Item = &Polyline> {
        self.levels.iter().flat_map(|l| l.lines.iter())
    }

    pub fn path_count(&self) -> usize {
        self.levels.iter().map(|l| l.lines.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.path_count() == 0
    }
}

// --- Scene ---

/// Which optional decorations a composition includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    pub background: bool,
    pub gradient: bool,
    pub frame: bool,
}

impl ComposeOptions {
    /// Full interactive preview.
    pub fn preview() -> Self {
        Self {
            background: true,
            gradient: true,
            frame: true,
        }
    }

    /// Vector layers only, drawn over an exported raster.
    pub fn overlay() -> Self {
        Self {
            background: false,
            gradient: false,
            frame: true,
        }
    }
}

/// Pre-encoded gradient image embedded in the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientImage {
    /// `data:image/png;base64,...` URL.
    pub href: String,
    pub blend: BlendMode,
}

/// A label ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub name: String,
    pub position: Point,
    /// Text size in mm.
    pub size: f64,
}

/// One drawable element of a scene, bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Background(Rgb),
    Gradient(GradientImage),
    Areas {
        layer: LayerKind,
        color: Rgb,
        opacity: f64,
        polygons: Vec<Polyline>,
    },
    Lines {
        layer: LayerKind,
        color: Rgb,
        width: f64,
        opacity: f64,
        lines: Vec<Polyline>,
    },
    Contours {
        color: Rgb,
        opacity: f64,
        /// `(stroke width, path)` pairs.
        paths: Vec<(f64, Polyline)>,
    },
    Placeholder {
        position: Point,
        text: &'static str,
    },
    Labels {
        style: LabelStyle,
        labels: Vec<PlacedLabel>,
    },
}

/// Composed scene in sheet millimeters. Everything in `items` is clipped
/// to the outline; the frame is drawn on top, unclipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub outline: ShapeMask,
    pub items: Vec<SceneItem>,
    pub frame: bool,
}

impl Scene {
    pub fn width(&self) -> f64 {
        self.outline.width()
    }

    pub fn height(&self) -> f64 {
        self.outline.height()
    }
}

/// Label text size: base size times the rank scale when scaling is on.
pub fn label_size(style: &LabelStyle, kind: PlaceKind) -> f64 {
    if style.scale_by_rank {
        style.size * kind.size_scale()
    } else {
        style.size
    }
}

/// Builds scenes from one configuration snapshot and its derived data.
#[derive(Debug, Clone, Copy)]
pub struct SceneComposer<'a> {
    config: &'a RenderConfig,
    terrain: Option<&'a TerrainGrid>,
    contours: &'a ContourSet,
    features: &'a FeatureSet,
}

impl<'a> SceneComposer<'a> {
    pub fn new(
        config: &'a RenderConfig,
        terrain: Option<&'a TerrainGrid>,
        contours: &'a ContourSet,
        features: &'a FeatureSet,
    ) -> Self {
        Self {
            config,
            terrain,
            contours,
            features,
        }
    }

    /// Compose the layers in reverse of the configured top-first order.
    pub fn compose(&self, options: ComposeOptions, gradient: Option<GradientImage>) -> Scene {
        let outline = ShapeMask::from_outline(&self.config.outline);
        let mut items = Vec::new();

        if options.background {
            items.push(SceneItem::Background(self.config.theme.background));
        }
        if options.gradient && self.config.raster.layered && self.terrain.is_some() {
            if let Some(image) = gradient {
                items.push(SceneItem::Gradient(image));
            }
        }

        for layer in self.config.layer_order.iter().rev() {
            if let Some(item) = self.layer(*layer, &outline) {
                items.push(item);
            }
        }

        Scene {
            outline,
            items,
            frame: options.frame,
        }
    }

    fn layer(&self, layer: LayerKind, outline: &ShapeMask) -> Option<SceneItem> {
        let cfg = self.config;
        let f = self.features;
        match layer {
            LayerKind::Green => areas(layer, &cfg.green_areas, &f.green_polygons),
            LayerKind::Water => areas(layer, &cfg.water_areas, &f.water_polygons),
            LayerKind::Rivers => lines(layer, &cfg.rivers, &f.river_lines),
            LayerKind::Roads => lines(layer, &cfg.roads, &f.road_lines),
            LayerKind::Contours => self.contour_item(outline),
            LayerKind::Labels => {
                let style = cfg.labels;
                if !style.enabled || f.labels.is_empty() {
                    return None;
                }
                let labels = f
                    .labels
                    .iter()
                    .map(|l| PlacedLabel {
                        name: l.name.clone(),
                        position: l.position,
                        size: label_size(&style, l.kind),
                    })
                    .collect();
                Some(SceneItem::Labels { style, labels })
            }
        }
    }

    fn contour_item(&self, outline: &ShapeMask) -> Option<SceneItem> {
        let style = &self.config.contour;
        if !style.enabled {
            return None;
        }
        match self.terrain {
            Some(grid) if grid.delta() > 0.0 => {
                let paths = self
                    .contours
                    .levels()
                    .iter()
                    .flat_map(|l| l.lines.iter().map(move |line| (l.width, line.clone())))
                    .collect();
                Some(SceneItem::Contours {
                    color: style.color,
                    opacity: unit_opacity(style.opacity),
                    paths,
                })
            }
            _ => Some(SceneItem::Placeholder {
                position: outline.center(),
                text: MISSING_TERRAIN_TEXT,
            }),
        }
    }
}

fn areas(
    layer: LayerKind,
    style: &topo_core::config::AreaStyle,
    polygons: &[Polyline],
) -> Option<SceneItem> {
    (style.enabled && !polygons.is_empty()).then(|| SceneItem::Areas {
        layer,
        color: style.color,
        opacity: unit_opacity(style.opacity),
        polygons: polygons.to_vec(),
    })
}

fn lines(
    layer: LayerKind,
    style: &topo_core::config::LineStyle,
    lines: &[Polyline],
) -> Option<SceneItem> {
    (style.enabled && !lines.is_empty()).then(|| SceneItem::Lines {
        layer,
        color: style.color,
        width: style.width,
        opacity: unit_opacity(style.opacity),
        lines: lines.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_core::config::OutlineConfig;
    use topo_core::enums::OutlineKind;
    use topo_core::features::MapLabel;
    use topo_core::types::GeoPoint;

    fn make_peak_grid() -> TerrainGrid {
        #[rustfmt::skip]
        let samples = vec![
            0.0, 0.0,   0.0,   0.0, 0.0,
            0.0, 50.0,  50.0,  50.0, 0.0,
            0.0, 50.0,  100.0, 50.0, 0.0,
            0.0, 50.0,  50.0,  50.0, 0.0,
            0.0, 0.0,   0.0,   0.0, 0.0,
        ];
        TerrainGrid::from_samples(5, 5, samples).unwrap()
    }

    fn make_config() -> RenderConfig {
        let mut cfg = RenderConfig::default();
        cfg.outline = OutlineConfig::new(OutlineKind::Rectangle, 100.0, 100.0);
        cfg.contour.smoothing = 0;
        cfg
    }

    fn item_names(scene: &Scene) -> Vec<&'static str> {
        scene
            .items
            .iter()
            .map(|item| match item {
                SceneItem::Background(_) => "background",
                SceneItem::Gradient(_) => "gradient",
                SceneItem::Areas { layer, .. } | SceneItem::Lines { layer, .. } => layer.group_id(),
                SceneItem::Contours { .. } => "contours",
                SceneItem::Placeholder { .. } => "placeholder",
                SceneItem::Labels { .. } => "placeLabels",
            })
            .collect()
    }

    #[test]
    fn test_contour_set_levels_and_emphasis() {
        let grid = make_peak_grid();
        let mask = ShapeMask::new(OutlineKind::Rectangle, 100.0, 100.0);
        let mut style = ContourStyle::default();
        style.density = 4;
        style.smoothing = 0;
        style.emphasis_every = 2;

        let set = ContourSet::build(&grid, &mask, &style);
        let levels: Vec<f64> = set.levels().iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![25.0, 50.0, 75.0]);
        assert_eq!(set.levels()[1].width, style.width * 2.0, "Second level is emphasized");
        assert_eq!(set.levels()[0].width, style.width);
        assert!(set.paths().all(|p| p.len() >= 2));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_layer_order_is_reversed() {
        let grid = make_peak_grid();
        let mut cfg = make_config();
        cfg.rivers.enabled = true;
        cfg.water_areas.enabled = true;
        let mut features = FeatureSet::default();
        features.river_lines.push(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        features.water_polygons.push(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 0.0),
        ]);
        let mask = ShapeMask::from_outline(&cfg.outline);
        let contours = ContourSet::build(&grid, &mask, &cfg.contour);

        let composer = SceneComposer::new(&cfg, Some(&grid), &contours, &features);
        let scene = composer.compose(ComposeOptions::preview(), None);
        assert_eq!(
            item_names(&scene),
            vec!["background", "contours", "waterAreas", "rivers"],
            "Bottom-most configured layer is drawn first"
        );

        cfg.layer_order = vec![LayerKind::Contours, LayerKind::Rivers, LayerKind::Water];
        let composer = SceneComposer::new(&cfg, Some(&grid), &contours, &features);
        let scene = composer.compose(ComposeOptions::overlay(), None);
        assert_eq!(item_names(&scene), vec!["waterAreas", "rivers", "contours"]);
        assert!(scene.frame);
    }

    #[test]
    fn test_placeholder_without_terrain() {
        let cfg = make_config();
        let contours = ContourSet::default();
        let features = FeatureSet::default();
        let composer = SceneComposer::new(&cfg, None, &contours, &features);
        let scene = composer.compose(ComposeOptions::preview(), None);
        let placeholder = scene.items.iter().find_map(|i| match i {
            SceneItem::Placeholder { position, text } => Some((*position, *text)),
            _ => None,
        });
        assert_eq!(placeholder, Some((Point::new(50.0, 50.0), MISSING_TERRAIN_TEXT)));
    }

    #[test]
    fn test_gradient_only_when_layered_with_terrain() {
        let grid = make_peak_grid();
        let mut cfg = make_config();
        let contours = ContourSet::default();
        let features = FeatureSet::default();
        let image = GradientImage {
            href: "data:image/png;base64,".into(),
            blend: BlendMode::Multiply,
        };

        let with = SceneComposer::new(&cfg, Some(&grid), &contours, &features)
            .compose(ComposeOptions::preview(), Some(image.clone()));
        assert_eq!(item_names(&with)[1], "gradient");

        cfg.raster.layered = false;
        let without = SceneComposer::new(&cfg, Some(&grid), &contours, &features)
            .compose(ComposeOptions::preview(), Some(image));
        assert!(!item_names(&without).contains(&"gradient"));
    }

    #[test]
    fn test_labels_scale_by_rank() {
        let mut cfg = make_config();
        cfg.labels.enabled = true;
        let mut features = FeatureSet::default();
        features.labels.push(MapLabel {
            name: "Zermatt".into(),
            kind: PlaceKind::Town,
            geo: GeoPoint::new(46.02, 7.75),
            position: Point::new(40.0, 60.0),
        });
        let contours = ContourSet::default();
        let scene = SceneComposer::new(&cfg, None, &contours, &features)
            .compose(ComposeOptions::overlay(), None);
        let size = scene.items.iter().find_map(|i| match i {
            SceneItem::Labels { labels, .. } => Some(labels[0].size),
            _ => None,
        });
        let size = size.unwrap();
        assert!((size - 0.4 * 2.6).abs() < 1e-12, "Town label size, got {size}");

        cfg.labels.scale_by_rank = false;
        assert_eq!(label_size(&cfg.labels, PlaceKind::City), 0.4);
    }

    #[test]
    fn test_disabled_or_empty_layers_are_skipped() {
        let mut cfg = make_config();
        cfg.contour.enabled = false;
        cfg.roads.enabled = true;
        let contours = ContourSet::default();
        let features = FeatureSet::default();
        let scene = SceneComposer::new(&cfg, None, &contours, &features)
            .compose(ComposeOptions::overlay(), None);
        assert!(scene.items.is_empty(), "No features and no contours leave an empty scene");
    }
}
