//! Export error type.

/// Errors surfaced by the exporters. Precondition failures are raised
/// before any output is produced.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("Elevation data missing.")]
    MissingTerrain,

    #[error("Generate contours first.")]
    MissingContours,

    #[error("no grid cells inside the outline; nothing to mesh")]
    EmptyMesh,

    #[error("raster error: {0}")]
    Raster(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("3MF packaging error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ExportError {
    pub fn raster<T: ToString>(msg: T) -> Self {
        ExportError::Raster(msg.to_string())
    }
}
