//! MapDocument: one render's inputs and derived contours, with every export.

use log::{debug, warn};
use topo_core::config::{unit_opacity, RenderConfig};
use topo_core::features::FeatureSet;
use topo_terrain::{ShapeMask, TerrainGrid};

use crate::cache::{PreviewCache, PreviewKey};
use crate::dxf::write_dxf;
use crate::error::ExportError;
use crate::gradient::BandRaster;
use crate::mesh::{MeshBuilder, TerrainMesh};
use crate::raster::{BandLayer, RasterWriter};
use crate::scene::{ComposeOptions, ContourSet, GradientImage, Scene, SceneComposer};
use crate::svg::render_svg;
use crate::threemf::write_3mf;

/// Sanitized configuration, optional terrain, projected features and the
/// contours derived from them. Built once per render; never mutated.
#[derive(Debug, Clone)]
pub struct MapDocument {
    config: RenderConfig,
    terrain: Option<TerrainGrid>,
    features: FeatureSet,
    contours: ContourSet,
}

impl MapDocument {
    pub fn new(config: &RenderConfig, terrain: Option<TerrainGrid>, features: FeatureSet) -> Self {
        let config = config.sanitized();
        let mask = ShapeMask::from_outline(&config.outline);
        let contours = match &terrain {
            Some(grid) if grid.delta() > 0.0 => ContourSet::build(grid, &mask, &config.contour),
            Some(_) => {
                warn!("Flat terrain; no contours to extract");
                ContourSet::default()
            }
            None => ContourSet::default(),
        };
        debug!(
            "Map document: {} contour paths over {} levels",
            contours.path_count(),
            contours.levels().len()
        );
        Self {
            config,
            terrain,
            features,
            contours,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn terrain(&self) -> Option<&TerrainGrid> {
        self.terrain.as_ref()
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn contours(&self) -> &ContourSet {
        &self.contours
    }

    pub fn scene(&self, options: ComposeOptions, gradient: Option<GradientImage>) -> Scene {
        SceneComposer::new(&self.config, self.terrain.as_ref(), &self.contours, &self.features)
            .compose(options, gradient)
    }

    /// Embedded preview gradient, served from `cache` while none of its
    /// inputs change. `None` when not layered or without terrain.
    pub fn preview_gradient(
        &self,
        cache: &mut PreviewCache,
        terrain_revision: u64,
    ) -> Result<Option<GradientImage>, ExportError> {
        let grid = match &self.terrain {
            Some(grid) if self.config.raster.layered => grid,
            _ => return Ok(None),
        };
        let key = PreviewKey::new(&self.config, terrain_revision);
        let href = cache.get_or_try_insert_with(key, || {
            BandRaster::preview(grid, &self.config).to_data_url(self.config.raster.gradient_opacity)
        })?;
        Ok(Some(GradientImage {
            href,
            blend: self.config.raster.blend,
        }))
    }

    /// Full SVG preview.
    pub fn to_svg(&self, cache: &mut PreviewCache, terrain_revision: u64) -> Result<String, ExportError> {
        let gradient = self.preview_gradient(cache, terrain_revision)?;
        Ok(render_svg(&self.scene(ComposeOptions::preview(), gradient)))
    }

    /// PNG whose long side is `long_side` pixels. In layered mode the band
    /// raster is drawn under the vector overlay.
    pub fn to_png(&self, long_side: u32) -> Result<Vec<u8>, ExportError> {
        let outline = &self.config.outline;
        let writer = RasterWriter::for_sheet(outline.width_mm, outline.height_mm, long_side);
        let (width, height) = writer.size();

        let band = match &self.terrain {
            Some(grid) if self.config.raster.layered => Some(BandRaster::render(grid, &self.config, width, height)),
            _ => None,
        };
        let layer = band.as_ref().map(|raster| BandLayer {
            raster,
            opacity: unit_opacity(self.config.raster.gradient_opacity),
            blend: self.config.raster.blend,
        });

        let overlay = self.scene(ComposeOptions::overlay(), None);
        writer.render_png(&overlay, self.config.theme.background, layer)
    }

    pub fn to_dxf(&self) -> Result<String, ExportError> {
        write_dxf(&self.config, &self.contours, &self.features)
    }

    pub fn mesh(&self) -> Result<TerrainMesh, ExportError> {
        let grid = self.terrain.as_ref().ok_or(ExportError::MissingTerrain)?;
        let mask = ShapeMask::from_outline(&self.config.outline);
        MeshBuilder::new(grid, &mask, self.config.mesh).build()
    }

    pub fn to_3mf(&self) -> Result<Vec<u8>, ExportError> {
        write_3mf(&self.mesh()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_core::config::OutlineConfig;
    use topo_core::enums::OutlineKind;

    fn make_config() -> RenderConfig {
        let mut cfg = RenderConfig::default();
        cfg.outline = OutlineConfig::new(OutlineKind::Rectangle, 100.0, 100.0);
        cfg.mesh.resolution = 10;
        cfg
    }

    fn make_grid() -> TerrainGrid {
        let samples = (0..25).map(|i| if i == 12 { 200.0 } else { 100.0 }).collect();
        TerrainGrid::from_samples(5, 5, samples).unwrap()
    }

    #[test]
    fn test_config_is_sanitized() {
        let mut cfg = make_config();
        cfg.contour.width = 40.0;
        let doc = MapDocument::new(&cfg, None, FeatureSet::default());
        assert_eq!(doc.config().contour.width, 2.0);
        assert!(doc.contours().is_empty());
    }

    #[test]
    fn test_exports_without_terrain() {
        let doc = MapDocument::new(&make_config(), None, FeatureSet::default());
        assert!(matches!(doc.to_dxf(), Err(ExportError::MissingContours)));
        assert!(matches!(doc.to_3mf(), Err(ExportError::MissingTerrain)));

        let mut cache = PreviewCache::new();
        let svg = doc.to_svg(&mut cache, 0).unwrap();
        assert!(svg.contains("Elevation data missing."), "Placeholder replaces contours");
        assert!(cache.is_empty(), "No gradient without terrain");

        let png = doc.to_png(64).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn test_preview_gradient_is_cached() {
        let doc = MapDocument::new(&make_config(), Some(make_grid()), FeatureSet::default());
        let mut cache = PreviewCache::new();
        let first = doc.preview_gradient(&mut cache, 7).unwrap().unwrap();
        assert!(first.href.starts_with("data:image/png;base64,"));
        assert!(!cache.is_empty());
        let second = doc.preview_gradient(&mut cache, 7).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flat_terrain_has_no_contours() {
        let flat = TerrainGrid::from_samples(3, 3, vec![10.0; 9]).unwrap();
        let doc = MapDocument::new(&make_config(), Some(flat), FeatureSet::default());
        assert!(doc.contours().is_empty());
        assert!(doc.to_3mf().is_ok(), "Flat terrain still meshes as a slab");
    }
}
