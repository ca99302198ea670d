//! File output.

use std::io::{self, Write};
use std::path::Path;

use log::info;
use tempfile::NamedTempFile;

/// Write `bytes` to `path` through a temporary sibling file that is renamed
/// into place, so readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
