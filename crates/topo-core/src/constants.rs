//! Pipeline constants and tuning parameters.

// --- Units ---

/// CSS pixel to millimeter factor (96 dpi).
pub const PX_TO_MM: f64 = 0.264583;

// --- Terrain preprocessing ---

/// Rows and columns of the raw elevation grid requested from the elevation source.
pub const TERRAIN_GRID_SIZE: usize = 120;

/// Number of 3×3 weighted-average passes applied to raw elevation samples.
pub const TERRAIN_SMOOTH_PASSES: usize = 4;

/// Center weight of the 3×3 smoothing kernel (neighbors weigh 1).
pub const SMOOTH_CENTER_WEIGHT: f64 = 8.0;

// --- Contours ---

/// Lower bound on the number of contour lines.
pub const MIN_CONTOUR_LINES: usize = 4;

/// Minimum on-canvas spacing between contour levels (mm).
pub const MIN_CONTOUR_SPACING_MM: f64 = 1.2;

/// Multiplier applied to the stroke width (mm) to get the minimum level spacing.
pub const CONTOUR_SPACING_PER_WIDTH: f64 = 8.0;

/// Bucket precision (decimal places) for endpoint matching when stitching.
pub const STITCH_KEY_DECIMALS: i32 = 2;

/// Endpoints closer than this (mm) make a polyline a closed ring.
pub const RING_CLOSE_TOLERANCE: f64 = 0.01;

// --- Clipping ---

/// Gap (mm) beyond which clipped polyline pieces are split.
pub const CLIP_JOIN_TOLERANCE: f64 = 1e-4;

/// Parallel-edge threshold for intersection and half-plane tests.
pub const CLIP_EPSILON: f64 = 1e-9;

/// Vertex count of the circle outline polygon used for clipping.
pub const CIRCLE_SEGMENTS: usize = 48;

// --- Feature reduction ---

/// Endpoint tolerance (mm) when joining area member ways into rings.
pub const RING_JOIN_TOLERANCE: f64 = 0.4;

/// Maximum number of place labels kept after ranking.
pub const MAX_LABELS: usize = 36;

/// Maximum deviation (mm) tolerated by the overlay alignment check.
pub const ALIGNMENT_TOLERANCE_MM: f64 = 0.5;

// --- Shading ---

/// Unnormalized light direction (down-and-to-the-left, moderately raised).
pub const LIGHT_DIRECTION: [f64; 3] = [-0.62, -0.48, 0.6];

/// Ambient floor of the hillshade.
pub const HILLSHADE_AMBIENT: f64 = 0.36;

/// Elevation delta (m) at which relief exaggeration reaches 1.
pub const RELIEF_DELTA_REFERENCE: f64 = 700.0;

/// Bounds of the relief exaggeration factor.
pub const RELIEF_MIN: f64 = 0.35;
pub const RELIEF_MAX: f64 = 1.25;

/// Maximum half-width of the blend window at band boundaries.
pub const BAND_BLEND_WINDOW: f64 = 0.04;

/// Fraction of the band span used as blend window when the band is narrow.
pub const BAND_BLEND_FRACTION: f64 = 0.35;

// --- Raster ---

/// Long-side pixel size of the embedded preview gradient.
pub const PREVIEW_RASTER_SIZE: u32 = 320;

/// Default long-side pixel size of raster exports.
pub const DEFAULT_EXPORT_SIZE: u32 = 2000;

// --- Mesh ---

/// Lattice resolution (cells per side) of the 3D export.
pub const MESH_RESOLUTION: usize = 220;

/// Height of the flat base under the terrain surface (mm).
pub const MESH_BASE_MM: f64 = 2.0;

/// Default relief height of the 3D export (mm).
pub const MESH_TARGET_HEIGHT_MM: f64 = 20.0;

/// Smoothing passes over the mesh height field.
pub const MESH_SMOOTH_PASSES: usize = 2;

// --- Fetching ---

/// Per-request timeout for collaborator fetches (milliseconds).
pub const FETCH_TIMEOUT_MS: u64 = 12_000;

/// Quiet period before a scheduled re-render runs (milliseconds).
pub const RENDER_DEBOUNCE_MS: u64 = 120;
