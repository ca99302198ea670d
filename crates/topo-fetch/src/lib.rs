//! Asynchronous data retrieval for topographic maps.
//!
//! Defines the elevation and feature source contracts, coordinates requests
//! (timeout, cancellation, per-bounds cache, tiled fallback), reduces raw
//! feature payloads into projected [`topo_core::features::FeatureSet`]s, and
//! debounces re-render requests. Local HGT, synthetic and JSON sources are
//! included.

pub mod debounce;
pub mod error;
pub mod features;
pub mod fetcher;
pub mod local;
pub mod source;
pub mod status;

pub use debounce::Debouncer;
pub use error::FetchError;
pub use features::{project_features, reduce_labels, GeoArea, GeoFeatures, GeoPlace};
pub use fetcher::{FeatureFetch, FetchOptions, Fetcher};
pub use local::{HgtElevationSource, JsonFeatureSource, NoFeatures, SyntheticElevationSource};
pub use source::{ElevationSource, FeatureSource};
pub use status::FeatureStatus;
