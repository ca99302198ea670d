//! Fetch coordination: timeout, cancellation, per-bounds caching and the
//! tiled fallback for feature requests.
//!
//! Results are cached per quantized bounding box. Each cache slot is a
//! `OnceCell`, so concurrent requests for the same box share one in-flight
//! fetch and a failed fetch leaves the slot empty for the next caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use topo_core::constants::{FETCH_TIMEOUT_MS, TERRAIN_GRID_SIZE, TERRAIN_SMOOTH_PASSES};
use topo_core::features::FeatureSet;
use topo_core::types::GeoBounds;
use topo_terrain::{BoundsProjection, TerrainGrid};

use crate::error::FetchError;
use crate::features::{project_features, GeoFeatures};
use crate::source::{ElevationSource, FeatureSource};
use crate::status::FeatureStatus;

/// Request tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// Rows and columns of the requested elevation grid.
    pub grid_size: usize,
    pub smooth_passes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
            grid_size: TERRAIN_GRID_SIZE,
            smooth_passes: TERRAIN_SMOOTH_PASSES,
        }
    }
}

/// Projected features plus the status to show for them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFetch {
    pub features: FeatureSet,
    pub status: FeatureStatus,
}

#[derive(Debug, Clone)]
struct CachedFeatures {
    geo: GeoFeatures,
    tiles: usize,
}

type Slot<T> = Arc<OnceCell<T>>;
type SlotMap<T> = Mutex<HashMap<String, Slot<T>>>;

fn slot<T>(cache: &SlotMap<T>, key: &str) -> Slot<T> {
    let mut map = cache.lock().unwrap_or_else(PoisonError::into_inner);
    map.entry(key.to_string()).or_default().clone()
}

fn check_bounds(bounds: &GeoBounds) -> Result<(), FetchError> {
    if bounds.is_valid() {
        Ok(())
    } else {
        Err(FetchError::InvalidBounds(bounds.cache_key()))
    }
}

/// Coordinates terrain and feature requests against two sources.
pub struct Fetcher<E, F> {
    elevation: E,
    features: F,
    options: FetchOptions,
    terrain_cache: SlotMap<TerrainGrid>,
    feature_cache: SlotMap<CachedFeatures>,
}

impl<E: ElevationSource, F: FeatureSource> Fetcher<E, F> {
    pub fn new(elevation: E, features: F) -> Self {
        Self::with_options(elevation, features, FetchOptions::default())
    }

    pub fn with_options(elevation: E, features: F, options: FetchOptions) -> Self {
        Self {
            elevation,
            features,
            options,
            terrain_cache: Mutex::new(HashMap::new()),
            feature_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Run one request under a child of `cancel` and the request timeout,
    /// whichever fires first.
    async fn guarded<T>(
        &self,
        cancel: &CancellationToken,
        request: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        let token = cancel.child_token();
        let timeout = self.options.timeout;
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(FetchError::Cancelled),
            result = tokio::time::timeout(timeout, request) => {
                result.unwrap_or(Err(FetchError::Timeout(timeout.as_millis() as u64)))
            }
        }
    }

    /// Smoothed, normalized terrain grid for `bounds`.
    ///
    /// Callers treat an error as "no terrain"; failures are not cached.
    pub async fn fetch_terrain(
        &self,
        bounds: GeoBounds,
        cancel: &CancellationToken,
    ) -> Result<TerrainGrid, FetchError> {
        check_bounds(&bounds)?;
        let key = bounds.cache_key();
        let cell = slot(&self.terrain_cache, &key);
        if cell.initialized() {
            debug!("Terrain cache hit for {key}");
        }

        let result = cell
            .get_or_try_init(|| async {
                let n = self.options.grid_size;
                let samples = self
                    .guarded(cancel, self.elevation.elevation_grid(bounds, n, n))
                    .await?;
                if samples.len() != n * n {
                    return Err(FetchError::InvalidResponse(format!(
                        "expected {} elevation samples, got {}",
                        n * n,
                        samples.len()
                    )));
                }
                TerrainGrid::from_raw_elevations(n, n, samples, self.options.smooth_passes)
                    .map_err(|e| FetchError::InvalidResponse(e.to_string()))
            })
            .await;

        match result {
            Ok(grid) => Ok(grid.clone()),
            Err(e) => {
                warn!("Terrain fetch for {key} failed: {e}");
                Err(e)
            }
        }
    }

    /// Map features for `bounds`, projected with `projection`.
    ///
    /// Never fails: a failed fetch yields an empty set and a failed status.
    pub async fn fetch_features(
        &self,
        bounds: GeoBounds,
        projection: &BoundsProjection,
        cancel: &CancellationToken,
    ) -> FeatureFetch {
        if let Err(e) = check_bounds(&bounds) {
            warn!("Feature fetch skipped: {e}");
            return FeatureFetch {
                features: FeatureSet::default(),
                status: FeatureStatus::failed(),
            };
        }
        let key = bounds.cache_key();
        let cell = slot(&self.feature_cache, &key);
        if cell.initialized() {
            debug!("Feature cache hit for {key}");
        }

        match cell.get_or_try_init(|| self.load_features(bounds, cancel)).await {
            Ok(cached) => {
                let features = project_features(&cached.geo, projection);
                let status = FeatureStatus::Loaded {
                    counts: features.counts(),
                    tiles: cached.tiles,
                };
                FeatureFetch { features, status }
            }
            Err(e) => {
                warn!("Feature fetch for {key} failed: {e}");
                FeatureFetch {
                    features: FeatureSet::default(),
                    status: FeatureStatus::failed(),
                }
            }
        }
    }

    async fn load_features(
        &self,
        bounds: GeoBounds,
        cancel: &CancellationToken,
    ) -> Result<CachedFeatures, FetchError> {
        match self.guarded(cancel, self.features.features(bounds)).await {
            Ok(geo) => Ok(CachedFeatures { geo, tiles: 1 }),
            Err(FetchError::Cancelled) => Err(FetchError::Cancelled),
            Err(e) => {
                info!("Feature fetch failed ({e}); retrying as 4 tiles");
                let tiles = bounds.quadrants();
                let mut merged = GeoFeatures::default();
                for tile in tiles {
                    merged.merge(self.guarded(cancel, self.features.features(tile)).await?);
                }
                Ok(CachedFeatures {
                    geo: merged,
                    tiles: tiles.len(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::GeoPlace;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use topo_core::types::GeoPoint;

    const N: usize = 5;

    fn bounds() -> GeoBounds {
        GeoBounds::new(46.0, 7.0, 47.0, 8.0)
    }

    fn options() -> FetchOptions {
        FetchOptions {
            grid_size: N,
            smooth_passes: 0,
            ..FetchOptions::default()
        }
    }

    /// Peak in the middle; sleeps `delay` before answering.
    #[derive(Default)]
    struct PeakSource {
        calls: AtomicUsize,
        delay: Duration,
        samples: Option<usize>,
    }

    impl ElevationSource for PeakSource {
        async fn elevation_grid(&self, _: GeoBounds, rows: usize, cols: usize) -> Result<Vec<f64>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let n = self.samples.unwrap_or(rows * cols);
            Ok((0..n).map(|i| if i == n / 2 { 900.0 } else { 400.0 }).collect())
        }
    }

    /// Fails for boxes larger than `max_span` degrees; otherwise one place
    /// at the box center.
    #[derive(Default)]
    struct TiledSource {
        calls: AtomicUsize,
        max_span: f64,
    }

    impl FeatureSource for TiledSource {
        async fn features(&self, bounds: GeoBounds) -> Result<GeoFeatures, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if bounds.lat_span() > self.max_span {
                return Err(FetchError::failed("HTTP 504"));
            }
            let c = bounds.center();
            Ok(GeoFeatures {
                places: vec![GeoPlace {
                    name: format!("{:.2},{:.2}", c.lat, c.lon),
                    tag: "village".into(),
                    location: GeoPoint::new(c.lat, c.lon),
                }],
                ..GeoFeatures::default()
            })
        }
    }

    fn projection() -> BoundsProjection {
        BoundsProjection::new(bounds(), 100.0, 100.0)
    }

    #[tokio::test]
    async fn test_terrain_is_cached_per_bounds() {
        let fetcher = Fetcher::with_options(PeakSource::default(), TiledSource::default(), options());
        let cancel = CancellationToken::new();

        let grid = fetcher.fetch_terrain(bounds(), &cancel).await.unwrap();
        assert_eq!((grid.rows(), grid.cols()), (N, N));
        assert_eq!(grid.delta(), 500.0);

        // Differs only beyond the 4th decimal: same cache key.
        let nearby = GeoBounds::new(46.00001, 7.0, 47.0, 8.0);
        fetcher.fetch_terrain(nearby, &cancel).await.unwrap();
        assert_eq!(fetcher.elevation.calls.load(Ordering::SeqCst), 1);

        fetcher
            .fetch_terrain(GeoBounds::new(45.0, 7.0, 47.0, 8.0), &cancel)
            .await
            .unwrap();
        assert_eq!(fetcher.elevation.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_one_fetch() {
        let source = PeakSource {
            delay: Duration::from_secs(1),
            ..PeakSource::default()
        };
        let fetcher = Fetcher::with_options(source, TiledSource::default(), options());
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            fetcher.fetch_terrain(bounds(), &cancel),
            fetcher.fetch_terrain(bounds(), &cancel)
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fetcher.elevation.calls.load(Ordering::SeqCst), 1, "Single flight per key");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let source = PeakSource {
            delay: Duration::from_secs(30),
            ..PeakSource::default()
        };
        let fetcher = Fetcher::with_options(source, TiledSource::default(), options());
        let result = fetcher.fetch_terrain(bounds(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(FetchError::Timeout(12_000))), "got {result:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_propagates() {
        let source = PeakSource {
            delay: Duration::from_secs(5),
            ..PeakSource::default()
        };
        let fetcher = Fetcher::with_options(source, TiledSource::default(), options());
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });
        let result = fetcher.fetch_terrain(bounds(), &cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)), "got {result:?}");
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let source = PeakSource {
            samples: Some(3),
            ..PeakSource::default()
        };
        let fetcher = Fetcher::with_options(source, TiledSource::default(), options());
        let cancel = CancellationToken::new();
        for _ in 0..2 {
            let result = fetcher.fetch_terrain(bounds(), &cancel).await;
            assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
        }
        assert_eq!(fetcher.elevation.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_bounds() {
        let fetcher = Fetcher::with_options(PeakSource::default(), TiledSource::default(), options());
        let inverted = GeoBounds::new(47.0, 7.0, 46.0, 8.0);
        let result = fetcher.fetch_terrain(inverted, &CancellationToken::new()).await;
        assert!(matches!(result, Err(FetchError::InvalidBounds(_))));
        assert_eq!(fetcher.elevation.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_features_fall_back_to_tiles() {
        let features = TiledSource {
            max_span: 0.6,
            ..TiledSource::default()
        };
        let fetcher = Fetcher::with_options(PeakSource::default(), features, options());
        let cancel = CancellationToken::new();

        let fetch = fetcher.fetch_features(bounds(), &projection(), &cancel).await;
        assert_eq!(fetch.features.labels.len(), 4, "One place per quadrant");
        match fetch.status {
            FeatureStatus::Loaded { tiles, counts } => {
                assert_eq!(tiles, 4);
                assert_eq!(counts.labels, 4);
            }
            other => panic!("expected loaded status, got {other:?}"),
        }
        assert_eq!(fetcher.features.calls.load(Ordering::SeqCst), 5, "Full box plus 4 tiles");

        fetcher.fetch_features(bounds(), &projection(), &cancel).await;
        assert_eq!(fetcher.features.calls.load(Ordering::SeqCst), 5, "Cached");
    }

    #[tokio::test]
    async fn test_feature_failure_yields_empty_set() {
        let features = TiledSource {
            max_span: 0.1,
            ..TiledSource::default()
        };
        let fetcher = Fetcher::with_options(PeakSource::default(), features, options());
        let fetch = fetcher
            .fetch_features(bounds(), &projection(), &CancellationToken::new())
            .await;
        assert!(fetch.features.is_empty());
        assert_eq!(fetch.status, FeatureStatus::failed());
    }
}
