//! Collaborator contracts for elevation and map-feature data.

use std::future::Future;

use topo_core::types::GeoBounds;

use crate::error::FetchError;
use crate::features::GeoFeatures;

/// Provides raw elevation samples for a bounding box.
pub trait ElevationSource: Send + Sync {
    /// `rows × cols` elevations in meters over `bounds`, row-major from the
    /// north-west corner with both edges included. Non-finite values mark
    /// voids.
    fn elevation_grid(
        &self,
        bounds: GeoBounds,
        rows: usize,
        cols: usize,
    ) -> impl Future<Output = Result<Vec<f64>, FetchError>> + Send;
}

/// Provides map features for a bounding box.
pub trait FeatureSource: Send + Sync {
    fn features(&self, bounds: GeoBounds) -> impl Future<Output = Result<GeoFeatures, FetchError>> + Send;
}
