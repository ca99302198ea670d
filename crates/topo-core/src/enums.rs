//! Enumeration types used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Physical outline of the printed or cut sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineKind {
    #[default]
    #[serde(alias = "rect")]
    Rectangle,
    #[serde(alias = "sq")]
    Square,
    Circle,
    #[serde(alias = "hex")]
    Hexagon,
    /// DIN paper ratio, landscape (height = width / 1.414).
    #[serde(alias = "din_l")]
    DinLandscape,
    /// DIN paper ratio, portrait (height = width × 1.414).
    #[serde(alias = "din_p")]
    DinPortrait,
}

impl OutlineKind {
    /// Height implied by this outline for a given width, or `None` if the
    /// height is chosen freely.
    pub fn derived_height(&self, width_mm: f64) -> Option<f64> {
        match self {
            OutlineKind::Rectangle => None,
            OutlineKind::Square | OutlineKind::Circle | OutlineKind::Hexagon => Some(width_mm),
            OutlineKind::DinLandscape => Some((width_mm / 1.414).round()),
            OutlineKind::DinPortrait => Some((width_mm * 1.414).round()),
        }
    }

    /// True for outlines whose point-in-shape test is the full canvas.
    pub fn fills_canvas(&self) -> bool {
        !matches!(self, OutlineKind::Circle | OutlineKind::Hexagon)
    }
}

/// Hypsometric color ramp selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// Blue → green → brown ramp, low stops tinted by water/green colors.
    #[default]
    Color,
    /// Neutral white → dark gray.
    Mono,
    /// Natural teal → olive → sienna.
    Terra,
    /// Deep blue → ice.
    Glacier,
}

/// How the gradient raster is composited over the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    /// Hue and saturation of the gradient, luminosity of the backdrop.
    Color,
}

impl BlendMode {
    /// CSS `mix-blend-mode` keyword.
    pub fn css_name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Color => "color",
        }
    }
}

/// Drawable vector layer. Ordered top-to-bottom in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Labels,
    Roads,
    Rivers,
    Water,
    Green,
    Contours,
}

impl LayerKind {
    /// Default stacking order, topmost first.
    pub const DEFAULT_ORDER: [LayerKind; 6] = [
        LayerKind::Labels,
        LayerKind::Roads,
        LayerKind::Rivers,
        LayerKind::Water,
        LayerKind::Green,
        LayerKind::Contours,
    ];

    /// Group id used in vector previews.
    pub fn group_id(&self) -> &'static str {
        match self {
            LayerKind::Labels => "placeLabels",
            LayerKind::Roads => "roads",
            LayerKind::Rivers => "rivers",
            LayerKind::Water => "waterAreas",
            LayerKind::Green => "greenAreas",
            LayerKind::Contours => "contours",
        }
    }
}

/// Category of a place label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    City,
    Town,
    Village,
    Suburb,
    Neighbourhood,
    Hamlet,
    Peak,
    River,
    #[default]
    Other,
}

impl PlaceKind {
    /// Map a free-form place tag (`city`, `town`, `peak`, ...) to a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "city" => PlaceKind::City,
            "town" => PlaceKind::Town,
            "village" => PlaceKind::Village,
            "suburb" => PlaceKind::Suburb,
            "neighbourhood" | "neighborhood" => PlaceKind::Neighbourhood,
            "hamlet" => PlaceKind::Hamlet,
            "peak" => PlaceKind::Peak,
            "river" => PlaceKind::River,
            _ => PlaceKind::Other,
        }
    }

    /// Sort rank; lower values are kept first when labels are truncated.
    pub fn rank(&self) -> u32 {
        match self {
            PlaceKind::City => 1,
            PlaceKind::Town | PlaceKind::Peak => 2,
            PlaceKind::Village => 3,
            PlaceKind::Suburb => 4,
            PlaceKind::Neighbourhood => 5,
            PlaceKind::Hamlet | PlaceKind::River => 6,
            PlaceKind::Other => 99,
        }
    }

    /// Font size multiplier applied when labels scale by rank.
    pub fn size_scale(&self) -> f64 {
        match self {
            PlaceKind::City => 3.0,
            PlaceKind::Town => 2.6,
            PlaceKind::Village => 2.3,
            PlaceKind::Suburb => 2.2,
            PlaceKind::Neighbourhood => 2.1,
            PlaceKind::Hamlet => 2.0,
            PlaceKind::Peak => 2.4,
            PlaceKind::River => 1.8,
            PlaceKind::Other => 1.0,
        }
    }
}

/// Color theme preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreset {
    Dark,
    #[default]
    Bright,
    Grayscale,
}

/// Font family used for place labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFont {
    #[default]
    System,
    Serif,
    Mono,
    Rounded,
    Condensed,
    Display,
}

impl LabelFont {
    /// CSS font-family stack.
    pub fn family(&self) -> &'static str {
        match self {
            LabelFont::System => "Inter, SF Pro Text, Segoe UI, Roboto, sans-serif",
            LabelFont::Serif => "Merriweather, Georgia, Times New Roman, serif",
            LabelFont::Mono => "'Roboto Mono', 'SF Mono', Menlo, Consolas, monospace",
            LabelFont::Rounded => "Nunito, 'Arial Rounded MT Bold', 'Trebuchet MS', sans-serif",
            LabelFont::Condensed => {
                "'Roboto Condensed', 'Arial Narrow', 'Helvetica Neue Condensed', sans-serif"
            }
            LabelFont::Display => {
                "'Bebas Neue', 'Impact', 'Haettenschweiler', 'Franklin Gothic Heavy', sans-serif"
            }
        }
    }
}
