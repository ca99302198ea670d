//! Terrain processing for topographic maps.
//!
//! Height grid sampling, contour extraction and stitching, outline
//! masking and clipping, hypsometric coloring, hillshading, and HGT
//! tile loading.

pub use topo_core as core;

pub mod clip;
pub mod color;
pub mod contour;
pub mod grid;
pub mod hgt;
pub mod polyline;
pub mod projection;
pub mod relief;
pub mod shape;

// Re-export key types for convenience.
pub use clip::GeometryClipper;
pub use color::{BandColorizer, GradientRemap, HypsometricRamp};
pub use contour::{contour_levels, contour_line_count, ContourExtractor};
pub use grid::{GridError, HeightMap, HeightRange, TerrainGrid};
pub use projection::BoundsProjection;
pub use relief::ReliefOverlay;
pub use shape::ShapeMask;
