//! Fundamental geometric and color types.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D point in output space (millimeters).
/// x = right, y = down (origin at the top-left corner of the sheet).
pub type Point = DVec2;

/// Ordered sequence of points. Closed rings repeat their first point at the end.
pub type Polyline = Vec<Point>;

/// A single straight contour piece produced by one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Segment length in millimeters.
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }
}

/// 8-bit sRGB color. Serialized as a `#RRGGBB` hex string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB` or the short `#RGB` form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::new(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    /// Upper-case `#RRGGBB` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Packed 24-bit value `r << 16 | g << 8 | b`.
    pub fn true_color(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Linear blend towards `other`; `t` is clamped to [0, 1] and channels are rounded.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }

    /// CSS `rgba(...)` form with the given alpha in [0, 1].
    pub fn css_rgba(&self, alpha: f64) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid hex color: {value:?}"))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned geographic bounding box (degrees).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// True if the box has finite, strictly positive extent.
    pub fn is_valid(&self) -> bool {
        [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.north > self.south
            && self.east > self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Quantized key used to cache fetched data: `south,west:north,east` at 4 decimals.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.4},{:.4}:{:.4},{:.4}",
            self.south, self.west, self.north, self.east
        )
    }

    /// Split into four equal tiles: SW, SE, NW, NE.
    pub fn quadrants(&self) -> [GeoBounds; 4] {
        let mid = self.center();
        [
            GeoBounds::new(self.south, self.west, mid.lat, mid.lon),
            GeoBounds::new(self.south, mid.lon, mid.lat, self.east),
            GeoBounds::new(mid.lat, self.west, self.north, mid.lon),
            GeoBounds::new(mid.lat, mid.lon, self.north, self.east),
        ]
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }
}

impl std::str::FromStr for GeoBounds {
    type Err = String;

    /// Parse `south,west,north,east`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid bounds {s:?}: {e}"))?;
        let [south, west, north, east] = values[..] else {
            return Err(format!(
                "bounds need 4 values (south,west,north,east), got {}",
                values.len()
            ));
        };
        let bounds = GeoBounds::new(south, west, north, east);
        if !bounds.is_valid() {
            return Err(format!("bounds {s:?} are empty or inverted"));
        }
        Ok(bounds)
    }
}
