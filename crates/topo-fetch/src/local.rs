//! Local data sources: HGT tiles, seeded synthetic terrain and JSON feature
//! files.

use std::path::Path;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use topo_core::types::{GeoBounds, GeoPoint};
use topo_terrain::hgt::{load_hgt, HgtTile};
use topo_terrain::BoundsProjection;

use crate::error::FetchError;
use crate::features::GeoFeatures;
use crate::source::{ElevationSource, FeatureSource};

// --- HGT ---

/// Elevations sampled bilinearly from a set of 1° HGT tiles.
#[derive(Debug, Clone, Default)]
pub struct HgtElevationSource {
    tiles: Vec<HgtTile>,
}

impl HgtElevationSource {
    pub fn new(tiles: Vec<HgtTile>) -> Self {
        Self { tiles }
    }

    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, FetchError> {
        let tiles = paths
            .iter()
            .map(|p| load_hgt(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Loaded {} HGT tile(s)", tiles.len());
        Ok(Self::new(tiles))
    }

    /// Elevation from the first tile covering `point`.
    pub fn elevation_at(&self, point: GeoPoint) -> Option<f64> {
        self.tiles.iter().find_map(|t| t.elevation_at(point))
    }
}

impl ElevationSource for HgtElevationSource {
    async fn elevation_grid(&self, bounds: GeoBounds, rows: usize, cols: usize) -> Result<Vec<f64>, FetchError> {
        let locations = BoundsProjection::new(bounds, 1.0, 1.0).sample_locations(rows, cols);
        let samples: Vec<f64> = locations
            .into_iter()
            .map(|p| self.elevation_at(p).unwrap_or(f64::NAN))
            .collect();
        let missing = samples.iter().filter(|v| v.is_nan()).count();
        if missing == samples.len() {
            return Err(FetchError::failed(format!(
                "no HGT tile covers {}",
                bounds.cache_key()
            )));
        }
        if missing > 0 {
            debug!("{missing} samples fall outside the loaded HGT tiles");
        }
        Ok(samples)
    }
}

// --- Synthetic ---

/// One elliptical hill in unit coordinates of the requested box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hill {
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    peak: f64,
}

impl Hill {
    /// Smooth `peak·(1−d²)²` falloff, zero outside the ellipse.
    fn elevation(&self, nx: f64, ny: f64) -> f64 {
        let dx = (nx - self.cx) / self.rx;
        let dy = (ny - self.cy) / self.ry;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > 1.0 {
            return 0.0;
        }
        let t = 1.0 - dist_sq;
        self.peak * t * t
    }
}

/// Deterministic terrain built from seeded hills over a tilted plain. The
/// same seed gives the same landscape for any bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticElevationSource {
    seed: u64,
    base: f64,
    hills: Vec<Hill>,
}

impl SyntheticElevationSource {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let count = rng.gen_range(5..=9);
        let hills = (0..count)
            .map(|_| Hill {
                cx: rng.gen_range(0.1..0.9),
                cy: rng.gen_range(0.1..0.9),
                rx: rng.gen_range(0.15..0.45),
                ry: rng.gen_range(0.15..0.45),
                peak: rng.gen_range(150.0..1200.0),
            })
            .collect();
        Self {
            seed,
            base: rng.gen_range(200.0..800.0),
            hills,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Elevation (meters) at unit coordinates, (0,0) = north-west.
    pub fn elevation(&self, nx: f64, ny: f64) -> f64 {
        let plain = self.base + 60.0 * (1.0 - ny) + 25.0 * (nx * 7.0).sin() * (ny * 5.0).cos();
        plain + self.hills.iter().map(|h| h.elevation(nx, ny)).sum::<f64>()
    }
}

impl ElevationSource for SyntheticElevationSource {
    async fn elevation_grid(&self, _bounds: GeoBounds, rows: usize, cols: usize) -> Result<Vec<f64>, FetchError> {
        let unit = |i: usize, n: usize| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        let mut samples = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                samples.push(self.elevation(unit(c, cols), unit(r, rows)));
            }
        }
        Ok(samples)
    }
}

// --- Features ---

/// Feature source backed by a JSON [`GeoFeatures`] document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonFeatureSource {
    features: GeoFeatures,
}

impl JsonFeatureSource {
    pub fn new(features: GeoFeatures) -> Self {
        Self { features }
    }

    pub fn from_path(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&text)?))
    }
}

impl FeatureSource for JsonFeatureSource {
    async fn features(&self, bounds: GeoBounds) -> Result<GeoFeatures, FetchError> {
        Ok(self.features.within(&bounds))
    }
}

/// Feature source with no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFeatures;

impl FeatureSource for NoFeatures {
    async fn features(&self, _bounds: GeoBounds) -> Result<GeoFeatures, FetchError> {
        Ok(GeoFeatures::default())
    }
}
