//! Map exporters.
//!
//! Scene composition shared by the SVG preview and the raster overlay,
//! plus the DXF, PNG and 3MF writers and the preview gradient cache.

pub mod cache;
pub mod document;
pub mod dxf;
pub mod error;
pub mod glyphs;
pub mod gradient;
pub mod mesh;
pub mod output;
pub mod raster;
pub mod scene;
pub mod svg;
pub mod threemf;

pub use cache::{PreviewCache, PreviewKey};
pub use document::MapDocument;
pub use dxf::{rgb_to_aci, write_dxf, DxfLayer, DxfWriter};
pub use error::ExportError;
pub use gradient::BandRaster;
pub use mesh::{MeshBuilder, TerrainMesh};
pub use output::write_atomic;
pub use raster::{BandLayer, RasterWriter};
pub use scene::{ComposeOptions, ContourSet, Scene, SceneComposer, SceneItem};
pub use svg::render_svg;
pub use threemf::write_3mf;
