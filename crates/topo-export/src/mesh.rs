//! MeshBuilder: watertight terrain solid for 3D printing.
//!
//! The height field is sampled on a `(res+1)²` lattice over the sheet and
//! smoothed. Lattice cells whose four corners lie inside the outline are
//! solid; each solid cell gets a top quad, a bottom quad, and a wall on every
//! side that borders a non-solid cell or the lattice edge.

use glam::DVec3;
use log::info;
use topo_core::config::MeshConfig;
use topo_terrain::grid::smooth_pass;
use topo_terrain::{ShapeMask, TerrainGrid};

use crate::error::ExportError;

/// Indexed triangle mesh in millimeters, Y pointing north.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainMesh {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TerrainMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Every directed edge is matched by exactly one opposite edge.
    pub fn is_watertight(&self) -> bool {
        use std::collections::HashMap;

        let mut edges: HashMap<(u32, u32), usize> = HashMap::new();
        for t in &self.triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a, b)).or_default() += 1;
            }
        }
        edges
            .iter()
            .all(|(&(a, b), &n)| n == 1 && edges.get(&(b, a)) == Some(&1))
    }
}

/// Builds a [`TerrainMesh`] from a terrain grid and outline.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuilder<'a> {
    grid: &'a TerrainGrid,
    mask: &'a ShapeMask,
    config: MeshConfig,
}

/// Lazily allocated top/bottom vertex pair per lattice node.
struct VertexLattice {
    side: usize,
    top: Vec<Option<u32>>,
    bottom: Vec<Option<u32>>,
    vertices: Vec<DVec3>,
}

impl VertexLattice {
    fn new(side: usize) -> Self {
        Self {
            side,
            top: vec![None; side * side],
            bottom: vec![None; side * side],
            vertices: Vec::new(),
        }
    }

    fn get(slots: &mut [Option<u32>], vertices: &mut Vec<DVec3>, idx: usize, at: DVec3) -> u32 {
        *slots[idx].get_or_insert_with(|| {
            vertices.push(at);
            (vertices.len() - 1) as u32
        })
    }

    fn top(&mut self, r: usize, c: usize, at: DVec3) -> u32 {
        Self::get(&mut self.top, &mut self.vertices, r * self.side + c, at)
    }

    fn bottom(&mut self, r: usize, c: usize, at: DVec3) -> u32 {
        Self::get(&mut self.bottom, &mut self.vertices, r * self.side + c, at)
    }
}

impl<'a> MeshBuilder<'a> {
    pub fn new(grid: &'a TerrainGrid, mask: &'a ShapeMask, config: MeshConfig) -> Self {
        Self { grid, mask, config }
    }

    /// Smoothed lattice heights, row-major `(res+1)²`, north row first.
    pub fn height_field(&self) -> Vec<f64> {
        let res = self.config.resolution.max(1);
        let side = res + 1;
        let mut heights = Vec::with_capacity(side * side);
        for r in 0..side {
            for c in 0..side {
                heights.push(self.grid.sample(c as f64 / res as f64, r as f64 / res as f64));
            }
        }
        for _ in 0..self.config.smoothing_passes {
            heights = smooth_pass(&heights, side, side);
        }
        heights
    }

    /// Millimeters of relief per normalized meter.
    pub fn vertical_scale(&self) -> f64 {
        let delta = self.grid.delta();
        if delta > 0.0 {
            self.config.target_height_mm / delta
        } else {
            1.0
        }
    }

    pub fn build(&self) -> Result<TerrainMesh, ExportError> {
        let res = self.config.resolution.max(1);
        let side = res + 1;
        let (w, h) = (self.mask.width(), self.mask.height());
        let heights = self.height_field();
        let scale = self.vertical_scale();
        let base = self.config.base_mm;

        let node_x = |c: usize| c as f64 / res as f64 * w;
        let node_y = |r: usize| r as f64 / res as f64 * h;

        let inside: Vec<bool> = (0..side * side)
            .map(|i| self.mask.contains(node_x(i % side), node_y(i / side)))
            .collect();
        let solid: Vec<bool> = (0..res * res)
            .map(|i| {
                let (r, c) = (i / res, i % res);
                inside[r * side + c]
                    && inside[r * side + c + 1]
                    && inside[(r + 1) * side + c]
                    && inside[(r + 1) * side + c + 1]
            })
            .collect();
        let is_solid = |r: isize, c: isize| {
            r >= 0 && c >= 0 && (r as usize) < res && (c as usize) < res && solid[r as usize * res + c as usize]
        };

        let mut lattice = VertexLattice::new(side);
        let mut triangles = Vec::new();
        let top_at = |r: usize, c: usize| DVec3::new(node_x(c), h - node_y(r), base + heights[r * side + c] * scale);
        let bottom_at = |r: usize, c: usize| DVec3::new(node_x(c), h - node_y(r), 0.0);

        for r in 0..res {
            for c in 0..res {
                if !solid[r * res + c] {
                    continue;
                }
                // Corners as (row, col): top-left, top-right, bottom-right, bottom-left.
                let corners = [(r, c), (r, c + 1), (r + 1, c + 1), (r + 1, c)];
                let t = corners.map(|(rr, cc)| lattice.top(rr, cc, top_at(rr, cc)));
                let b = corners.map(|(rr, cc)| lattice.bottom(rr, cc, bottom_at(rr, cc)));
                let [tl, tr, br, bl] = [0, 1, 2, 3];

                triangles.push([t[tl], t[bl], t[br]]);
                triangles.push([t[tl], t[br], t[tr]]);
                triangles.push([b[tl], b[br], b[bl]]);
                triangles.push([b[tl], b[tr], b[br]]);

                let (ri, ci) = (r as isize, c as isize);
                // Boundary edges in counter-clockwise order seen from above.
                let walls = [
                    (bl, br, ri + 1, ci),
                    (br, tr, ri, ci + 1),
                    (tr, tl, ri - 1, ci),
                    (tl, bl, ri, ci - 1),
                ];
                for (a, z, nr, nc) in walls {
                    if is_solid(nr, nc) {
                        continue;
                    }
                    triangles.push([b[a], b[z], t[z]]);
                    triangles.push([b[a], t[z], t[a]]);
                }
            }
        }

        if triangles.is_empty() {
            return Err(ExportError::EmptyMesh);
        }
        let mesh = TerrainMesh {
            vertices: lattice.vertices,
            triangles,
        };
        info!(
            "Terrain mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}
