//! GeometryClipper: polygon and polyline clipping against a convex outline.
//!
//! Polygons use Sutherland–Hodgman, one clip edge at a time. Open
//! polylines clip each segment to its surviving parameter interval
//! (Liang–Barsky) and are re-joined while the pieces stay connected.

use topo_core::constants::{CLIP_EPSILON, CLIP_JOIN_TOLERANCE};
use topo_core::types::{Point, Polyline};

use crate::shape::{signed_area, ShapeMask};

/// Convex clip region with positive signed area.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryClipper {
    polygon: Vec<Point>,
}

impl GeometryClipper {
    /// Clipper for an arbitrary convex polygon; winding is normalized.
    pub fn new(mut polygon: Vec<Point>) -> Self {
        if signed_area(&polygon) < 0.0 {
            polygon.reverse();
        }
        Self { polygon }
    }

    pub fn for_mask(mask: &ShapeMask) -> Self {
        Self::new(mask.boundary_polygon())
    }

    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.polygon.len();
        (0..n).map(move |i| (self.polygon[i], self.polygon[(i + 1) % n]))
    }

    /// True if `p` lies inside or on the clip polygon.
    pub fn contains(&self, p: Point) -> bool {
        self.polygon.len() >= 3 && self.edges().all(|(a, b)| is_inside(p, a, b))
    }

    /// Sutherland–Hodgman clip. The subject may be open or closed; the
    /// result is open, free of coincident neighbours, and may be empty.
    /// Fewer than 3 vertices means the polygon vanished.
    pub fn clip_polygon(&self, subject: &[Point]) -> Vec<Point> {
        let mut output = subject.to_vec();
        for (cp1, cp2) in self.edges() {
            if output.is_empty() {
                break;
            }
            let input = std::mem::take(&mut output);
            let mut s = input[input.len() - 1];
            for &e in &input {
                let e_inside = is_inside(e, cp1, cp2);
                let s_inside = is_inside(s, cp1, cp2);
                if e_inside {
                    if !s_inside {
                        output.push(line_intersection(s, e, cp1, cp2));
                    }
                    output.push(e);
                } else if s_inside {
                    output.push(line_intersection(s, e, cp1, cp2));
                }
                s = e;
            }
        }
        dedup_vertices(&mut output);
        output
    }

    /// Portion of segment `p0 → p1` inside the clip polygon, if any.
    pub fn clip_segment(&self, p0: Point, p1: Point) -> Option<(Point, Point)> {
        let d = p1 - p0;
        let mut t0: f64 = 0.0;
        let mut t1: f64 = 1.0;

        for (a, b) in self.edges() {
            let edge = b - a;
            let normal = Point::new(edge.y, -edge.x);
            let denom = normal.dot(d);
            let numer = -normal.dot(p0 - a);
            if denom.abs() < CLIP_EPSILON {
                if numer < 0.0 {
                    return None;
                }
                continue;
            }
            let t = numer / denom;
            if denom < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }

        Some((p0 + d * t0, p0 + d * t1))
    }

    /// Clip an open polyline. Surviving pieces are merged while consecutive
    /// pieces touch (within 1e-4 mm) and split where the line leaves the
    /// region, so a line crossing the boundary several times yields several
    /// sub-polylines.
    pub fn clip_polyline(&self, line: &[Point]) -> Vec<Polyline> {
        let mut out = Vec::new();
        let mut current: Polyline = Vec::new();

        for w in line.windows(2) {
            match self.clip_segment(w[0], w[1]) {
                Some((c0, c1)) => match current.last() {
                    None => current.extend([c0, c1]),
                    Some(last) if last.distance(c0) > CLIP_JOIN_TOLERANCE => {
                        out.push(std::mem::replace(&mut current, vec![c0, c1]));
                    }
                    Some(_) => current.push(c1),
                },
                None => {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

/// Drop vertices that coincide with their predecessor, including across the
/// closing edge. Clip vertices lying on the subject's boundary otherwise
/// appear twice.
fn dedup_vertices(points: &mut Vec<Point>) {
    points.dedup_by(|b, a| a.distance(*b) < CLIP_EPSILON);
    while points.len() > 1 && points[0].distance(points[points.len() - 1]) < CLIP_EPSILON {
        points.pop();
    }
}

/// Left-of-edge test (inclusive) for a positive-area polygon.
fn is_inside(p: Point, edge_start: Point, edge_end: Point) -> bool {
    (edge_end - edge_start).perp_dot(p - edge_start) >= 0.0
}

/// Intersection of line `s–e` with the clip line `cp1–cp2`; `e` when parallel.
fn line_intersection(s: Point, e: Point, cp1: Point, cp2: Point) -> Point {
    let dc = cp1 - cp2;
    let dp = s - e;
    let n1 = cp1.perp_dot(cp2);
    let n2 = s.perp_dot(e);
    let denom = dc.perp_dot(dp);
    if denom.abs() < CLIP_EPSILON {
        return e;
    }
    (n1 * dp - n2 * dc) / denom
}
