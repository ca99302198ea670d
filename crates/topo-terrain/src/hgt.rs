//! SRTM/NASADEM HGT tile reader.
//!
//! HGT files are flat arrays of big-endian i16 elevation values covering a
//! 1° × 1° tile, rows north to south. The filename encodes the SW corner
//! coordinates (e.g., N46E007.hgt).

use std::io;
use std::path::Path;

use log::debug;
use topo_core::types::{GeoBounds, GeoPoint};

/// Void value in HGT files (no data).
pub const HGT_VOID: i16 = -32768;

/// Parse an HGT filename to extract the SW corner coordinates.
/// Format: `N46E007.hgt` or `S10W045.hgt`
pub fn parse_hgt_filename(filename: &str) -> Option<(f64, f64)> {
    let name = filename
        .strip_suffix(".hgt")
        .or_else(|| filename.strip_suffix(".HGT"))?;

    if name.len() < 7 || !name.is_ascii() {
        return None;
    }

    let lat_sign = match &name[0..1] {
        "N" | "n" => 1.0,
        "S" | "s" => -1.0,
        _ => return None,
    };
    let lat: f64 = name[1..3].parse().ok()?;

    let lon_sign = match &name[3..4] {
        "E" | "e" => 1.0,
        "W" | "w" => -1.0,
        _ => return None,
    };
    let lon: f64 = name[4..7].parse().ok()?;

    Some((lat * lat_sign, lon * lon_sign))
}

/// Side length of a square tile from its byte count.
/// 1 arc-second: 3601 × 3601, 3 arc-second: 1201 × 1201. Smaller square
/// tiles are accepted as long as they have at least 2 samples per side.
fn grid_side_from_byte_count(byte_count: usize) -> Option<usize> {
    if byte_count % 2 != 0 {
        return None;
    }
    let sample_count = byte_count / 2;
    let side = (sample_count as f64).sqrt().round() as usize;
    (side >= 2 && side * side == sample_count).then_some(side)
}

/// Parse raw HGT bytes into elevation values and the tile side length.
pub fn parse_hgt_bytes(data: &[u8]) -> io::Result<(Vec<i16>, usize)> {
    let side = grid_side_from_byte_count(data.len()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Unexpected HGT file size: {} bytes (expected {} or {})",
                data.len(),
                3601 * 3601 * 2,
                1201 * 1201 * 2
            ),
        )
    })?;

    let elevations = data
        .chunks_exact(2)
        .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    Ok((elevations, side))
}

/// Fill void values (-32768) by averaging non-void neighbors.
/// Returns the number of voids replaced.
pub fn fill_voids(elevations: &mut [i16], width: usize, height: usize) -> usize {
    let snapshot = elevations.to_vec();
    let mut filled = 0;
    for r in 0..height {
        for c in 0..width {
            let idx = r * width + c;
            if snapshot[idx] != HGT_VOID {
                continue;
            }

            let mut sum = 0i64;
            let mut count = 0i64;
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let nr = r as i64 + dr;
                    let nc = c as i64 + dc;
                    if nr >= 0 && nr < height as i64 && nc >= 0 && nc < width as i64 {
                        let nidx = nr as usize * width + nc as usize;
                        if snapshot[nidx] != HGT_VOID {
                            sum += snapshot[nidx] as i64;
                            count += 1;
                        }
                    }
                }
            }

            // Isolated voids fall back to sea level.
            elevations[idx] = if count > 0 { (sum / count) as i16 } else { 0 };
            filled += 1;
        }
    }
    filled
}

/// One decoded HGT tile.
#[derive(Debug, Clone, PartialEq)]
pub struct HgtTile {
    /// SW corner latitude.
    pub south: f64,
    /// SW corner longitude.
    pub west: f64,
    /// Samples per side.
    pub side: usize,
    /// Row-major elevations, north row first.
    pub samples: Vec<i16>,
}

impl HgtTile {
    /// Decode a tile whose SW corner is `(south, west)`; voids are filled.
    pub fn from_bytes(south: f64, west: f64, data: &[u8]) -> io::Result<Self> {
        let (mut samples, side) = parse_hgt_bytes(data)?;
        let voids = fill_voids(&mut samples, side, side);
        if voids > 0 {
            debug!("HGT tile {south},{west}: filled {voids} voids");
        }
        Ok(Self {
            south,
            west,
            side,
            samples,
        })
    }

    pub fn bounds(&self) -> GeoBounds {
        GeoBounds::new(self.south, self.west, self.south + 1.0, self.west + 1.0)
    }

    /// Bilinear elevation (meters) at a point, or `None` outside the tile.
    pub fn elevation_at(&self, point: GeoPoint) -> Option<f64> {
        if !self.bounds().contains(point) {
            return None;
        }
        let last = (self.side - 1) as f64;
        let row_f = ((self.south + 1.0 - point.lat) * last).clamp(0.0, last);
        let col_f = ((point.lon - self.west) * last).clamp(0.0, last);
        let r0 = (row_f.floor() as usize).min(self.side - 2);
        let c0 = (col_f.floor() as usize).min(self.side - 2);
        let tr = row_f - r0 as f64;
        let tc = col_f - c0 as f64;

        let at = |r: usize, c: usize| self.samples[r * self.side + c] as f64;
        let top = at(r0, c0) + (at(r0, c0 + 1) - at(r0, c0)) * tc;
        let bottom = at(r0 + 1, c0) + (at(r0 + 1, c0 + 1) - at(r0 + 1, c0)) * tc;
        Some(top + (bottom - top) * tr)
    }
}

/// Load a single HGT file; the SW corner comes from its filename.
pub fn load_hgt(path: &Path) -> io::Result<HgtTile> {
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid HGT filename"))?;

    let (south, west) = parse_hgt_filename(filename).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Cannot parse HGT coordinates from filename: {filename}"),
        )
    })?;

    let data = std::fs::read(path)?;
    HgtTile::from_bytes(south, west, &data)
}
