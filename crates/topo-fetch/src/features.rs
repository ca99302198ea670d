//! Geographic feature payloads and their reduction into a projected
//! [`FeatureSet`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use topo_core::constants::MAX_LABELS;
use topo_core::enums::PlaceKind;
use topo_core::features::{FeatureSet, MapLabel};
use topo_core::types::{GeoBounds, GeoPoint, Polyline};
use topo_terrain::polyline::{ensure_closed, join_rings};
use topo_terrain::BoundsProjection;

/// Open way in geographic coordinates.
pub type GeoLine = Vec<GeoPoint>;

/// Area feature made of one or more outer member ways.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoArea {
    pub members: Vec<GeoLine>,
}

/// Named place with its free-form category tag (`city`, `peak`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    pub location: GeoPoint,
}

impl GeoPlace {
    pub fn kind(&self) -> PlaceKind {
        PlaceKind::from_tag(&self.tag)
    }
}

/// Raw feature-source payload in geographic coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoFeatures {
    pub water_areas: Vec<GeoArea>,
    pub green_areas: Vec<GeoArea>,
    pub rivers: Vec<GeoLine>,
    pub roads: Vec<GeoLine>,
    pub places: Vec<GeoPlace>,
}

impl GeoFeatures {
    /// Append another payload, e.g. one tile of a tiled fetch.
    pub fn merge(&mut self, other: GeoFeatures) {
        self.water_areas.extend(other.water_areas);
        self.green_areas.extend(other.green_areas);
        self.rivers.extend(other.rivers);
        self.roads.extend(other.roads);
        self.places.extend(other.places);
    }

    /// Features touching `bounds`: lines and areas with any point inside,
    /// places located inside.
    pub fn within(&self, bounds: &GeoBounds) -> GeoFeatures {
        let touches = |line: &GeoLine| line.iter().any(|p| bounds.contains(*p));
        let areas = |list: &[GeoArea]| -> Vec<GeoArea> {
            list.iter()
                .filter(|a| a.members.iter().any(touches))
                .cloned()
                .collect()
        };
        GeoFeatures {
            water_areas: areas(&self.water_areas),
            green_areas: areas(&self.green_areas),
            rivers: self.rivers.iter().filter(|l| touches(l)).cloned().collect(),
            roads: self.roads.iter().filter(|l| touches(l)).cloned().collect(),
            places: self
                .places
                .iter()
                .filter(|p| bounds.contains(p.location))
                .cloned()
                .collect(),
        }
    }
}

/// Drop duplicate labels (same name, location and kind), order them by
/// rank (stable within a rank) and keep the first 36.
pub fn reduce_labels(labels: Vec<MapLabel>) -> Vec<MapLabel> {
    let mut seen = HashSet::new();
    let mut unique: Vec<MapLabel> = labels
        .into_iter()
        .filter(|l| seen.insert((l.name.clone(), l.geo.lat.to_bits(), l.geo.lon.to_bits(), l.kind)))
        .collect();
    unique.sort_by_key(|l| l.kind.rank());
    unique.truncate(MAX_LABELS);
    unique
}

/// Rings of one area feature in sheet millimeters. Members are joined by
/// endpoint proximity; when nothing joins, each member is closed on its own.
fn area_rings(area: &GeoArea, projection: &BoundsProjection) -> Vec<Polyline> {
    let members: Vec<Polyline> = area
        .members
        .iter()
        .map(|m| project_line(m, projection))
        .collect();
    let rings = join_rings(&members);
    if !rings.is_empty() {
        return rings;
    }
    members
        .iter()
        .filter(|m| m.len() >= 3)
        .map(|m| ensure_closed(m))
        .collect()
}

fn project_line(line: &GeoLine, projection: &BoundsProjection) -> Polyline {
    line.iter().map(|p| projection.to_mm(*p)).collect()
}

/// Project a payload onto the sheet and reduce it.
pub fn project_features(geo: &GeoFeatures, projection: &BoundsProjection) -> FeatureSet {
    let lines = |list: &[GeoLine]| -> Vec<Polyline> {
        list.iter()
            .filter(|l| l.len() >= 2)
            .map(|l| project_line(l, projection))
            .collect()
    };
    let labels = geo
        .places
        .iter()
        .filter(|p| !p.name.trim().is_empty())
        .map(|p| MapLabel {
            name: p.name.clone(),
            kind: p.kind(),
            geo: p.location,
            position: projection.to_mm(p.location),
        })
        .collect();

    FeatureSet {
        water_polygons: geo.water_areas.iter().flat_map(|a| area_rings(a, projection)).collect(),
        green_polygons: geo.green_areas.iter().flat_map(|a| area_rings(a, projection)).collect(),
        river_lines: lines(&geo.rivers),
        road_lines: lines(&geo.roads),
        labels: reduce_labels(labels),
    }
}
