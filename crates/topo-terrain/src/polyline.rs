//! Polyline assembly: segment stitching, Chaikin smoothing and ring joining.

use std::collections::{HashMap, VecDeque};

use topo_core::constants::{RING_CLOSE_TOLERANCE, RING_JOIN_TOLERANCE, STITCH_KEY_DECIMALS};
use topo_core::types::{Point, Polyline, Segment};

/// Distance below which `normalize_ring` treats a ring as already closed.
const RING_NORMALIZE_TOLERANCE: f64 = 1e-6;

/// Distance below which `ensure_closed` treats a polygon as already closed.
const ENSURE_CLOSED_TOLERANCE: f64 = 1e-4;

/// Endpoint bucket: coordinates rounded to `STITCH_KEY_DECIMALS` places.
type EndpointKey = (i64, i64);

fn endpoint_key(p: Point) -> EndpointKey {
    let scale = 10f64.powi(STITCH_KEY_DECIMALS);
    ((p.x * scale).round() as i64, (p.y * scale).round() as i64)
}

/// True if the polyline's endpoints are within 0.01 mm.
pub fn is_closed(line: &[Point]) -> bool {
    match (line.first(), line.last()) {
        (Some(a), Some(b)) if line.len() > 2 => a.distance(*b) < RING_CLOSE_TOLERANCE,
        _ => false,
    }
}

/// Merge segments that share endpoints into polylines.
///
/// Each unused segment seeds a chain which is extended at the tail, then
/// at the head, through any unused segment whose endpoint falls in the same
/// bucket. Every segment is consumed exactly once. Rings come back with
/// their first point repeated at the end.
pub fn stitch_segments(segments: &[Segment]) -> Vec<Polyline> {
    let mut endpoints: HashMap<EndpointKey, Vec<(usize, bool)>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        endpoints.entry(endpoint_key(seg.a)).or_default().push((i, false));
        endpoints.entry(endpoint_key(seg.b)).or_default().push((i, true));
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let mut line = VecDeque::from([seg.a, seg.b]);
        while let Some(next) = line
            .back()
            .and_then(|&p| take_next(&endpoints, segments, &mut used, p))
        {
            line.push_back(next);
        }
        while let Some(next) = line
            .front()
            .and_then(|&p| take_next(&endpoints, segments, &mut used, p))
        {
            line.push_front(next);
        }
        lines.push(Vec::from(line));
    }
    lines
}

/// Far endpoint of the first unused segment touching `p`, marking it used.
fn take_next(
    endpoints: &HashMap<EndpointKey, Vec<(usize, bool)>>,
    segments: &[Segment],
    used: &mut [bool],
    p: Point,
) -> Option<Point> {
    let candidates = endpoints.get(&endpoint_key(p))?;
    let &(index, at_b) = candidates.iter().find(|&&(i, _)| !used[i])?;
    used[index] = true;
    let seg = &segments[index];
    Some(if at_b { seg.a } else { seg.b })
}

/// Chaikin corner cutting.
///
/// Each pass replaces every edge by its 25 % and 75 % points. Closed rings
/// (endpoints within 0.01 mm) also cut the wrap-around edge and are closed
/// again afterwards. Fewer than 3 points or zero iterations return the
/// input unchanged.
pub fn smooth_polyline(points: &[Point], iterations: u32) -> Polyline {
    if points.len() < 3 || iterations == 0 {
        return points.to_vec();
    }

    let closed = is_closed(points);
    let mut pts: Vec<Point> = if closed {
        points[..points.len() - 1].to_vec()
    } else {
        points.to_vec()
    };

    for _ in 0..iterations {
        let edges = if closed { pts.len() } else { pts.len() - 1 };
        let mut next = Vec::with_capacity(edges * 2);
        for i in 0..edges {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            next.push(a * 0.75 + b * 0.25);
            next.push(a * 0.25 + b * 0.75);
        }
        pts = next;
    }

    if closed {
        if let Some(&first) = pts.first() {
            pts.push(first);
        }
    }
    pts
}

/// Join open member ways into rings by endpoint proximity (0.4 mm),
/// accepting either orientation. Joined chains with at least 3 points are
/// returned closed.
pub fn join_rings(members: &[Polyline]) -> Vec<Polyline> {
    let close_enough = |a: Point, b: Point| a.distance(b) <= RING_JOIN_TOLERANCE;
    let mut remaining: Vec<Polyline> = members.iter().filter(|m| !m.is_empty()).cloned().collect();
    let mut rings = Vec::new();

    while let Some(mut ring) = remaining.pop() {
        loop {
            let (Some(&ring_start), Some(&ring_end)) = (ring.first(), ring.last()) else {
                break;
            };
            let found = remaining.iter().enumerate().rev().find_map(|(i, seg)| {
                let seg_start = *seg.first()?;
                let seg_end = *seg.last()?;
                if close_enough(ring_end, seg_start) {
                    Some((i, Join::AppendForward))
                } else if close_enough(ring_end, seg_end) {
                    Some((i, Join::AppendReversed))
                } else if close_enough(ring_start, seg_end) {
                    Some((i, Join::PrependForward))
                } else if close_enough(ring_start, seg_start) {
                    Some((i, Join::PrependReversed))
                } else {
                    None
                }
            });
            let Some((index, join)) = found else {
                break;
            };

            let seg = remaining.remove(index);
            ring = match join {
                Join::AppendForward => ring.into_iter().chain(seg.into_iter().skip(1)).collect(),
                Join::AppendReversed => {
                    let tail = seg.len() - 1;
                    ring.into_iter().chain(seg.into_iter().take(tail).rev()).collect()
                }
                Join::PrependForward => {
                    let head = seg.len() - 1;
                    seg.into_iter().take(head).chain(ring).collect()
                }
                Join::PrependReversed => seg.into_iter().skip(1).rev().chain(ring).collect(),
            };
        }

        if ring.len() >= 3 {
            rings.push(normalize_ring(ring));
        }
    }
    rings
}

enum Join {
    AppendForward,
    AppendReversed,
    PrependForward,
    PrependReversed,
}

/// Repeat the first point at the end unless the ring is already closed.
pub fn normalize_ring(mut ring: Polyline) -> Polyline {
    if ring.len() < 3 {
        return ring;
    }
    let first = ring[0];
    if let Some(last) = ring.last() {
        if first.distance(*last) >= RING_NORMALIZE_TOLERANCE {
            ring.push(first);
        }
    }
    ring
}

/// Close a polygon of at least 3 points whose ends are more than 1e-4 mm apart.
pub fn ensure_closed(polygon: &[Point]) -> Polyline {
    let mut out = polygon.to_vec();
    if out.len() >= 3 && out[0].distance(out[out.len() - 1]) > ENSURE_CLOSED_TOLERANCE {
        out.push(out[0]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn square_ring() -> Polyline {
        vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(0.0, 0.0)]
    }

    fn segments_of(lines: &[Polyline]) -> Vec<Segment> {
        lines
            .iter()
            .flat_map(|l| l.windows(2).map(|w| Segment::new(w[0], w[1])))
            .collect()
    }

    /// Direction-agnostic, rotation-agnostic signature of a polyline.
    fn signature(line: &[Point]) -> Vec<EndpointKey> {
        let mut keys: Vec<EndpointKey> = line.iter().map(|&q| endpoint_key(q)).collect();
        if is_closed(line) {
            keys.pop();
            keys.sort();
        } else if keys.first() > keys.last() {
            keys.reverse();
        }
        keys
    }

    #[test]
    fn test_stitch_open_chain_out_of_order() {
        let segments = vec![
            Segment::new(p(1.0, 0.0), p(2.0, 0.0)),
            Segment::new(p(3.0, 0.0), p(2.0, 0.0)),
            Segment::new(p(0.0, 0.0), p(1.0, 0.0)),
        ];
        let lines = stitch_segments(&segments);
        assert_eq!(lines.len(), 1, "All segments should join into one chain");
        assert_eq!(lines[0], vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)]);
    }

    #[test]
    fn test_stitch_tolerates_rounding() {
        let segments = vec![
            Segment::new(p(0.0, 0.0), p(1.000_001, 1.0)),
            Segment::new(p(0.999_999, 1.0), p(2.0, 2.0)),
        ];
        let lines = stitch_segments(&segments);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 3);
    }

    #[test]
    fn test_stitch_consumes_every_segment_once() {
        let ring = square_ring();
        let mut segments = segments_of(&[ring]);
        segments.push(Segment::new(p(50.0, 50.0), p(60.0, 50.0)));
        let lines = stitch_segments(&segments);
        assert_eq!(lines.len(), 2);
        let edges: usize = lines.iter().map(|l| l.len() - 1).sum();
        assert_eq!(edges, segments.len(), "Each segment contributes exactly one edge");
        assert!(lines.iter().any(|l| is_closed(l)), "Square should come back as a ring");
    }

    #[test]
    fn test_stitch_is_idempotent() {
        let segments = vec![
            Segment::new(p(0.0, 0.0), p(5.0, 0.0)),
            Segment::new(p(5.0, 0.0), p(5.0, 5.0)),
            Segment::new(p(0.0, 5.0), p(0.0, 0.0)),
            Segment::new(p(5.0, 5.0), p(0.0, 5.0)),
            Segment::new(p(20.0, 0.0), p(21.0, 1.0)),
            Segment::new(p(22.0, 1.0), p(21.0, 1.0)),
        ];
        let first = stitch_segments(&segments);
        let second = stitch_segments(&segments_of(&first));
        let mut a: Vec<_> = first.iter().map(|l| signature(l)).collect();
        let mut b: Vec<_> = second.iter().map(|l| signature(l)).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b, "Re-stitching must reproduce the same polylines");
    }

    #[test]
    fn test_smooth_zero_iterations_is_identity() {
        let ring = square_ring();
        assert_eq!(smooth_polyline(&ring, 0), ring);
        let short = vec![p(0.0, 0.0), p(1.0, 1.0)];
        assert_eq!(smooth_polyline(&short, 3), short);
    }

    #[test]
    fn test_smooth_closed_ring_doubles_points() {
        let ring = square_ring();
        let once = smooth_polyline(&ring, 1);
        // 4 distinct vertices → 8, plus the closing point.
        assert_eq!(once.len(), 9);
        assert!(is_closed(&once));
        let twice = smooth_polyline(&ring, 2);
        assert_eq!(twice.len(), 17);
        assert!(is_closed(&twice));

        let distinct = &twice[..twice.len() - 1];
        let centroid = distinct.iter().fold(Point::ZERO, |acc, &q| acc + q) / distinct.len() as f64;
        assert!(
            centroid.distance(p(5.0, 5.0)) < 1e-9,
            "Centroid should stay at (5, 5), got {centroid}"
        );
    }

    #[test]
    fn test_smooth_open_line_keeps_topology() {
        let line = vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)];
        let out = smooth_polyline(&line, 1);
        assert_eq!(out.len(), 4);
        assert!(!is_closed(&out));
        assert_eq!(out[0], p(2.5, 0.0));
        assert_eq!(out[3], p(10.0, 7.5));
    }

    #[test]
    fn test_join_rings_any_orientation() {
        let members = vec![
            vec![p(0.0, 0.0), p(10.0, 0.0)],
            vec![p(10.0, 10.0), p(10.0, 0.1)],
            vec![p(0.0, 10.0), p(10.0, 10.0)],
            vec![p(0.0, 0.2), p(0.0, 10.0)],
        ];
        let rings = join_rings(&members);
        assert_eq!(rings.len(), 1, "Four members should form one ring, got {rings:?}");
        let ring = &rings[0];
        assert_eq!(ring.len(), 6, "Five joined vertices plus the closing point");
        assert!(ring[0].distance(ring[ring.len() - 1]) < 1e-6);
    }

    #[test]
    fn test_join_rings_drops_short_chains() {
        let members = vec![vec![p(0.0, 0.0), p(1.0, 0.0)], vec![p(50.0, 50.0), p(60.0, 60.0)]];
        assert!(join_rings(&members).is_empty());
    }

    #[test]
    fn test_ring_closing_helpers() {
        let open = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)];
        assert_eq!(normalize_ring(open.clone()).len(), 4);
        assert_eq!(normalize_ring(square_ring()).len(), 5);
        assert_eq!(ensure_closed(&open).len(), 4);
        let nearly = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.000_05, 0.0)];
        assert_eq!(ensure_closed(&nearly).len(), 4, "Within 1e-4 counts as closed");
        assert_eq!(ensure_closed(&open[..2]).len(), 2);
    }
}
