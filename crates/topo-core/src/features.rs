//! Map features projected into output millimeter space.

use serde::{Deserialize, Serialize};

use crate::enums::PlaceKind;
use crate::types::{GeoPoint, Point, Polyline};

/// A ranked place label anchored at a projected point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLabel {
    pub name: String,
    pub kind: PlaceKind,
    /// Original geographic location (used for deduplication).
    pub geo: GeoPoint,
    /// Anchor in output millimeters.
    pub position: Point,
}

/// All vector features of one map area, already in output millimeters.
///
/// Polygons are closed rings (first point repeated at the end).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub water_polygons: Vec<Polyline>,
    pub green_polygons: Vec<Polyline>,
    pub river_lines: Vec<Polyline>,
    pub road_lines: Vec<Polyline>,
    pub labels: Vec<MapLabel>,
}

/// Per-category feature counts, reported in status messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    pub water: usize,
    pub rivers: usize,
    pub roads: usize,
    pub green: usize,
    pub labels: usize,
}

impl FeatureSet {
    pub fn is_empty(&self) -> bool {
        self.counts() == FeatureCounts::default()
    }

    pub fn counts(&self) -> FeatureCounts {
        FeatureCounts {
            water: self.water_polygons.len(),
            rivers: self.river_lines.len(),
            roads: self.road_lines.len(),
            green: self.green_polygons.len(),
            labels: self.labels.len(),
        }
    }
}
