use std::collections::{HashMap, HashSet};

use log::trace;

use crate::error::TopologyError;
use crate::math::intersect_2d::{point_to_segment_dist, segment_segment_intersect_2d};
use crate::math::Point2;

use super::graph::EdgeOwner;
use super::CancelFlag;

/// Upper bound on split/snap passes before regularization is declared
/// divergent. Well-formed input settles in two or three passes.
pub(crate) const MAX_MERGE_PASSES: u32 = 8;

/// An imprinted polyline, already in working coordinates.
#[derive(Debug, Clone)]
pub(crate) struct RawChain {
    pub points: Vec<Point2>,
    pub owner: EdgeOwner,
}

/// A physical edge between two snapped vertices, oriented along its owning
/// boundary's loop direction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Segment {
    pub a: u32,
    pub b: u32,
    pub owner: EdgeOwner,
}

/// Output of the regularization step: a segment soup with no two edges
/// crossing away from a shared vertex.
#[derive(Debug)]
pub(crate) struct Regularized {
    pub vertices: Vec<Point2>,
    pub segments: Vec<Segment>,
}

/// Tolerance-driven vertex snapping via a uniform grid.
///
/// The first point registered in a neighbourhood becomes the cluster
/// representative; later points within `tol` collapse onto it. Registration
/// order is the imprint order, so representatives are deterministic.
struct VertexClusters {
    cell: f64,
    tol: f64,
    grid: HashMap<(i64, i64), Vec<u32>>,
    points: Vec<Point2>,
}

impl VertexClusters {
    fn new(tol: f64) -> Self {
        Self {
            cell: tol.max(1e-9),
            tol,
            grid: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: &Point2) -> (i64, i64) {
        ((p.x / self.cell).floor() as i64, (p.y / self.cell).floor() as i64)
    }

    fn find_or_add(&mut self, p: Point2) -> u32 {
        let (cx, cy) = self.cell_of(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &idx in bucket {
                    let q = self.points[idx as usize];
                    let dist = ((p.x - q.x).powi(2) + (p.y - q.y).powi(2)).sqrt();
                    if dist <= self.tol {
                        return idx;
                    }
                }
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let idx = self.points.len() as u32;
        self.points.push(p);
        self.grid.entry((cx, cy)).or_default().push(idx);
        idx
    }
}

/// Regularizes imprinted chains into a valid planar subdivision.
///
/// Vertices within `vv_tol` of each other merge onto one representative;
/// edges are split wherever a vertex (including a crossing point with
/// another edge) lies within `ve_tol` of their interior. The passes repeat
/// until a fixed point is reached.
///
/// Two builds of the same boundary set with different tolerances may produce
/// different face counts; that approximation is inherited from the CAD
/// tolerance model and is not corrected here.
///
/// # Errors
///
/// [`TopologyError::MergeDiverged`] when no fixed point is reached within
/// [`MAX_MERGE_PASSES`], [`TopologyError::Cancelled`] when the cancel flag
/// is raised between passes.
pub(crate) fn regularize(
    chains: &[RawChain],
    vv_tol: f64,
    ve_tol: f64,
    cancel: &CancelFlag,
) -> Result<Regularized, TopologyError> {
    let mut clusters = VertexClusters::new(vv_tol);
    let mut segments: Vec<Segment> = Vec::new();

    for chain in chains {
        let indices: Vec<u32> = chain
            .points
            .iter()
            .map(|&p| clusters.find_or_add(p))
            .collect();
        for pair in indices.windows(2) {
            if pair[0] != pair[1] {
                segments.push(Segment {
                    a: pair[0],
                    b: pair[1],
                    owner: chain.owner,
                });
            }
        }
    }

    for _pass in 0..MAX_MERGE_PASSES {
        if cancel.is_cancelled() {
            return Err(TopologyError::Cancelled);
        }

        register_crossings(&segments, &mut clusters);
        let (next_segments, changed) = split_at_vertices(&segments, &clusters, vv_tol, ve_tol);
        segments = dedupe_segments(next_segments);

        if !changed {
            return Ok(Regularized {
                vertices: clusters.points,
                segments,
            });
        }
    }

    Err(TopologyError::MergeDiverged {
        passes: MAX_MERGE_PASSES,
    })
}

/// Registers every pairwise segment crossing as a snapped vertex, so the
/// split pass can treat crossings and T-junctions uniformly.
fn register_crossings(segments: &[Segment], clusters: &mut VertexClusters) {
    for i in 0..segments.len() {
        let si = segments[i];
        let (ia, ib) = (
            clusters.points[si.a as usize],
            clusters.points[si.b as usize],
        );
        for sj in &segments[i + 1..] {
            if si.a == sj.a || si.a == sj.b || si.b == sj.a || si.b == sj.b {
                continue;
            }
            let (ja, jb) = (
                clusters.points[sj.a as usize],
                clusters.points[sj.b as usize],
            );
            if let Some((pt, _, _)) = segment_segment_intersect_2d(&ia, &ib, &ja, &jb) {
                clusters.find_or_add(pt);
            }
        }
    }
}

/// Splits each segment at every snapped vertex lying within `ve_tol` of its
/// interior. Returns the new segment soup and whether anything changed.
fn split_at_vertices(
    segments: &[Segment],
    clusters: &VertexClusters,
    vv_tol: f64,
    ve_tol: f64,
) -> (Vec<Segment>, bool) {
    let mut out = Vec::with_capacity(segments.len());
    let mut changed = false;

    for seg in segments {
        let pa = clusters.points[seg.a as usize];
        let pb = clusters.points[seg.b as usize];
        let min_x = pa.x.min(pb.x) - ve_tol;
        let max_x = pa.x.max(pb.x) + ve_tol;
        let min_y = pa.y.min(pb.y) - ve_tol;
        let max_y = pa.y.max(pb.y) + ve_tol;

        let mut splits: Vec<(f64, u32)> = Vec::new();
        for (vi, vp) in clusters.points.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let vi = vi as u32;
            if vi == seg.a || vi == seg.b {
                continue;
            }
            if vp.x < min_x || vp.x > max_x || vp.y < min_y || vp.y > max_y {
                continue;
            }
            let (dist, t) = point_to_segment_dist(vp, &pa, &pb);
            if dist > ve_tol {
                continue;
            }
            // A vertex this close to an endpoint belongs to vertex merging,
            // not edge splitting.
            let da = ((vp.x - pa.x).powi(2) + (vp.y - pa.y).powi(2)).sqrt();
            let db = ((vp.x - pb.x).powi(2) + (vp.y - pb.y).powi(2)).sqrt();
            if da <= vv_tol || db <= vv_tol {
                continue;
            }
            splits.push((t, vi));
        }

        if splits.is_empty() {
            out.push(*seg);
            continue;
        }

        changed = true;
        splits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        let mut prev = seg.a;
        for &(_, vi) in &splits {
            if vi != prev {
                out.push(Segment {
                    a: prev,
                    b: vi,
                    owner: seg.owner,
                });
                prev = vi;
            }
        }
        if prev != seg.b {
            out.push(Segment {
                a: prev,
                b: seg.b,
                owner: seg.owner,
            });
        }
    }

    (out, changed)
}

/// Drops zero-length segments and coincident duplicates (first owner wins).
///
/// A boundary sharing a full edge with an earlier imprint loses its identity
/// and orientation on that edge; its membership evidence must come from its
/// remaining edges. Another approximation inherited from the CAD tolerance
/// model, not corrected here.
fn dedupe_segments(segments: Vec<Segment>) -> Vec<Segment> {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut out = Vec::with_capacity(segments.len());
    for seg in segments {
        if seg.a == seg.b {
            continue;
        }
        let key = (seg.a.min(seg.b), seg.a.max(seg.b));
        if !seen.insert(key) {
            trace!(
                "regularize: dropping duplicate edge {}-{} owned by boundary {}",
                seg.a,
                seg.b,
                seg.owner.id
            );
            continue;
        }
        out.push(seg);
    }
    out
}
