//! topo: render topographic maps from elevation data.
//!
//! Usage:
//!   topo render --synthetic 42 --bounds 46.0,7.0,46.5,7.5 --svg map.svg --png map.png
//!   topo render --hgt N46E007.hgt --bounds 46.1,7.2,46.4,7.6 --shape circle --mesh map.3mf
//!   topo default-config > config.json

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use tokio_util::sync::CancellationToken;
use topo_core::config::{OutlineConfig, RenderConfig};
use topo_core::constants::DEFAULT_EXPORT_SIZE;
use topo_core::enums::{OutlineKind, ThemePreset};
use topo_core::types::GeoBounds;
use topo_export::{write_atomic, MapDocument, PreviewCache};
use topo_fetch::{
    ElevationSource, FeatureSource, FetchError, Fetcher, HgtElevationSource, JsonFeatureSource,
    NoFeatures, SyntheticElevationSource,
};
use topo_terrain::BoundsProjection;

#[derive(Parser, Debug)]
#[command(name = "topo", version, about = "Topographic map renderer (SVG, PNG, DXF, 3MF)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch terrain and features for a bounding box and write the requested outputs
    Render(RenderArgs),
    /// Print the default render configuration as JSON
    DefaultConfig,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("elevation").required(true).args(["hgt", "synthetic"])))]
struct RenderArgs {
    /// HGT tile to sample elevations from (repeatable)
    #[arg(long, value_name = "FILE")]
    hgt: Vec<PathBuf>,

    /// Seed for synthetic terrain instead of HGT tiles
    #[arg(long, value_name = "SEED")]
    synthetic: Option<u64>,

    /// Bounding box as south,west,north,east
    #[arg(long, allow_hyphen_values = true)]
    bounds: GeoBounds,

    /// Render configuration JSON (see `topo default-config`)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Map features JSON (water and green areas, rivers, roads, places)
    #[arg(long, value_name = "FILE")]
    features: Option<PathBuf>,

    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    #[arg(long, value_enum)]
    shape: Option<ShapeArg>,

    /// Sheet width in mm
    #[arg(long)]
    width: Option<f64>,

    /// Sheet height in mm (ignored for fixed-ratio shapes)
    #[arg(long)]
    height: Option<f64>,

    #[arg(long, value_name = "FILE")]
    svg: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    png: Option<PathBuf>,

    /// Long side of the PNG in pixels
    #[arg(long, default_value_t = DEFAULT_EXPORT_SIZE)]
    png_size: u32,

    #[arg(long, value_name = "FILE")]
    dxf: Option<PathBuf>,

    /// 3MF output path
    #[arg(long, value_name = "FILE")]
    mesh: Option<PathBuf>,

    /// Relief height above the base plate in mm
    #[arg(long)]
    target_height: Option<f64>,
}

impl RenderArgs {
    fn has_output(&self) -> bool {
        self.svg.is_some() || self.png.is_some() || self.dxf.is_some() || self.mesh.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShapeArg {
    #[value(alias = "rect")]
    Rectangle,
    Square,
    Circle,
    #[value(alias = "hex")]
    Hexagon,
    DinLandscape,
    DinPortrait,
}

impl From<ShapeArg> for OutlineKind {
    fn from(value: ShapeArg) -> Self {
        match value {
            ShapeArg::Rectangle => OutlineKind::Rectangle,
            ShapeArg::Square => OutlineKind::Square,
            ShapeArg::Circle => OutlineKind::Circle,
            ShapeArg::Hexagon => OutlineKind::Hexagon,
            ShapeArg::DinLandscape => OutlineKind::DinLandscape,
            ShapeArg::DinPortrait => OutlineKind::DinPortrait,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    Dark,
    Bright,
    Grayscale,
}

impl From<PresetArg> for ThemePreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Dark => ThemePreset::Dark,
            PresetArg::Bright => ThemePreset::Bright,
            PresetArg::Grayscale => ThemePreset::Grayscale,
        }
    }
}

/// Elevation input chosen on the command line.
enum Elevation {
    Hgt(HgtElevationSource),
    Synthetic(SyntheticElevationSource),
}

impl ElevationSource for Elevation {
    async fn elevation_grid(&self, bounds: GeoBounds, rows: usize, cols: usize) -> Result<Vec<f64>, FetchError> {
        match self {
            Elevation::Hgt(source) => source.elevation_grid(bounds, rows, cols).await,
            Elevation::Synthetic(source) => source.elevation_grid(bounds, rows, cols).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Render(args) => render(args).await,
        Command::DefaultConfig => {
            let json = serde_json::to_string_pretty(&RenderConfig::default())?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Config file (or defaults) with command-line overrides applied, sanitized.
fn load_config(args: &RenderArgs) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<RenderConfig>(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => RenderConfig::default(),
    };

    if let Some(preset) = args.preset {
        config.apply_preset(preset.into());
    }
    let kind = args.shape.map(OutlineKind::from).unwrap_or(config.outline.kind);
    config.outline = OutlineConfig::new(
        kind,
        args.width.unwrap_or(config.outline.width_mm),
        args.height.unwrap_or(config.outline.height_mm),
    );
    if let Some(target) = args.target_height {
        config.mesh.target_height_mm = target;
    }
    Ok(config.sanitized())
}

fn elevation_source(args: &RenderArgs) -> Result<Elevation> {
    match args.synthetic {
        Some(seed) => {
            info!("Using synthetic terrain (seed {seed})");
            Ok(Elevation::Synthetic(SyntheticElevationSource::new(seed)))
        }
        None => {
            let source = HgtElevationSource::from_paths(&args.hgt).context("failed to load HGT tiles")?;
            Ok(Elevation::Hgt(source))
        }
    }
}

async fn render(args: RenderArgs) -> Result<()> {
    if !args.has_output() {
        bail!("nothing to write: pass at least one of --svg, --png, --dxf or --mesh");
    }
    let config = load_config(&args)?;
    let elevation = elevation_source(&args)?;

    match &args.features {
        Some(path) => {
            let features = JsonFeatureSource::from_path(path)
                .with_context(|| format!("failed to load features {}", path.display()))?;
            render_with(&args, &config, Fetcher::new(elevation, features)).await
        }
        None => render_with(&args, &config, Fetcher::new(elevation, NoFeatures)).await,
    }
}

async fn render_with<E, F>(args: &RenderArgs, config: &RenderConfig, fetcher: Fetcher<E, F>) -> Result<()>
where
    E: ElevationSource,
    F: FeatureSource,
{
    let bounds = args.bounds;
    let cancel = CancellationToken::new();
    let projection = BoundsProjection::new(bounds, config.outline.width_mm, config.outline.height_mm);

    let (terrain, fetched) = tokio::join!(
        fetcher.fetch_terrain(bounds, &cancel),
        fetcher.fetch_features(bounds, &projection, &cancel),
    );
    let terrain = match terrain {
        Ok(grid) => Some(grid),
        Err(e) => {
            warn!("Continuing without terrain: {e}");
            None
        }
    };

    let mut status = fetched.status;
    if args.features.is_some() || !status.is_loaded() {
        status.ignore();
        println!("{status}");
    }

    let doc = MapDocument::new(config, terrain, fetched.features);
    info!(
        "{:.0}×{:.0} mm {:?} sheet, {} contour path(s)",
        config.outline.width_mm,
        config.outline.height_mm,
        config.outline.kind,
        doc.contours().path_count()
    );

    if let Some(path) = &args.svg {
        let svg = doc.to_svg(&mut PreviewCache::new(), 0).context("SVG export failed")?;
        write_output(path, svg.as_bytes(), "SVG")?;
    }
    if let Some(path) = &args.png {
        let png = doc.to_png(args.png_size).context("PNG export failed")?;
        write_output(path, &png, "PNG")?;
    }
    if let Some(path) = &args.dxf {
        let dxf = doc.to_dxf().context("DXF export failed")?;
        write_output(path, dxf.as_bytes(), "DXF")?;
    }
    if let Some(path) = &args.mesh {
        let model = doc.to_3mf().context("3MF export failed")?;
        write_output(path, &model, "3MF")?;
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8], what: &str) -> Result<()> {
    write_atomic(path, bytes).with_context(|| format!("failed to write {what} to {}", path.display()))?;
    println!("Wrote {what}: {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
