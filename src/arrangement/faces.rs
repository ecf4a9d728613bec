use slotmap::SlotMap;

use crate::math::polygon_2d::{point_in_polygon_2d, signed_area_2d};
use crate::math::Point2;

use super::graph::{HalfEdgeGraph, NodeId};
use super::range_index::RangeIndex;
use super::regularize::Regularized;

slotmap::new_key_type! {
    /// Unique identifier for a face cycle in the arrangement.
    pub struct FaceId;
}

/// Signed-area magnitude below which a face is considered null: a
/// topologically collapsed cycle, such as an antenna edge walked on both
/// sides, enclosing no real region.
pub(crate) const NULL_FACE_AREA: f64 = 1e-9;

/// A face of the regularized subdivision.
///
/// Positive area marks a normal bounded region; negative area marks the
/// cycle seen from outside (a hole loop or a component's outer contour).
#[derive(Debug, Clone)]
pub struct FaceData {
    /// Bounding half-edges, starting at the canonical (lowest) node.
    pub cycle: Vec<NodeId>,
    /// Signed area in working units².
    pub area: f64,
    /// Stable face key: the lowest node id in the cycle.
    pub canonical: NodeId,
    /// Negative cycles nested inside this face.
    pub holes: Vec<FaceId>,
    /// Face whose hole-loop structurally contains this face's component.
    pub parent: Option<FaceId>,
    /// Connected-component label of the underlying graph.
    pub(crate) component: u32,
}

/// Builds the half-edge graph for a regularized segment soup.
pub(crate) fn build_graph(reg: &Regularized) -> HalfEdgeGraph {
    let mut graph = HalfEdgeGraph {
        vertices: reg.vertices.clone(),
        halves: Vec::with_capacity(reg.segments.len() * 2),
    };
    for seg in &reg.segments {
        graph.add_pair(seg.a, seg.b, Some(seg.owner));
    }
    graph.build_rotation();
    graph
}

/// Extracts every face cycle from the rotation system.
///
/// Returns the face arena and the node-to-face lookup table.
pub(crate) fn extract_faces(graph: &HalfEdgeGraph) -> (SlotMap<FaceId, FaceData>, Vec<FaceId>) {
    let components = label_components(graph);

    let mut faces: SlotMap<FaceId, FaceData> = SlotMap::with_key();
    let mut node_face = vec![FaceId::default(); graph.node_count()];
    let mut visited = vec![false; graph.node_count()];

    for start in 0..graph.node_count() {
        if visited[start] {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let start = NodeId(start as u32);

        let mut cycle = Vec::new();
        let mut cur = start;
        loop {
            visited[cur.index()] = true;
            cycle.push(cur);
            cur = graph.successor(cur);
            if cur == start {
                break;
            }
            debug_assert!(cycle.len() <= graph.node_count(), "face walk escaped");
        }

        // Rotate so the canonical (lowest) node leads; `start` is already
        // the minimum because nodes are visited in ascending id order.
        let canonical = start;
        let points: Vec<Point2> = cycle.iter().map(|&n| graph.origin_point(n)).collect();
        let area = signed_area_2d(&points);
        let component = components[graph.origin(canonical) as usize];

        let face_id = faces.insert(FaceData {
            cycle: cycle.clone(),
            area,
            canonical,
            holes: Vec::new(),
            parent: None,
            component,
        });
        for n in cycle {
            node_face[n.index()] = face_id;
        }
    }

    (faces, node_face)
}

/// Assigns each component's outer (negative) cycle as a hole of the
/// smallest positive face of another component containing it, and records
/// the resulting parent for every face of the nested component.
pub(crate) fn assign_holes(
    graph: &HalfEdgeGraph,
    faces: &mut SlotMap<FaceId, FaceData>,
    face_index: &RangeIndex<FaceId>,
) {
    struct Nesting {
        negative: FaceId,
        parent: FaceId,
        component: u32,
    }

    let mut nestings: Vec<Nesting> = Vec::new();

    for (face_id, face) in &*faces {
        if face.area >= -NULL_FACE_AREA {
            continue;
        }
        let rep = leftmost_cycle_point(graph, &face.cycle);

        let mut best: Option<(f64, FaceId)> = None;
        for candidate in face_index.query_point(&rep, 0.0) {
            let Some(cand) = faces.get(candidate) else {
                continue;
            };
            if cand.component == face.component || cand.area <= NULL_FACE_AREA {
                continue;
            }
            let polygon: Vec<Point2> =
                cand.cycle.iter().map(|&n| graph.origin_point(n)).collect();
            if !point_in_polygon_2d(&rep, &polygon) {
                continue;
            }
            if best.is_none_or(|(area, _)| cand.area < area) {
                best = Some((cand.area, candidate));
            }
        }

        if let Some((_, parent)) = best {
            nestings.push(Nesting {
                negative: face_id,
                parent,
                component: face.component,
            });
        }
    }

    for nesting in &nestings {
        if let Some(parent_face) = faces.get_mut(nesting.parent) {
            parent_face.holes.push(nesting.negative);
        }
    }
    for nesting in &nestings {
        let ids: Vec<FaceId> = faces
            .iter()
            .filter(|(_, f)| f.component == nesting.component)
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            if let Some(face) = faces.get_mut(id) {
                face.parent = Some(nesting.parent);
            }
        }
    }
}

/// Leftmost-bottommost origin point of a face cycle (deterministic
/// representative for containment queries).
fn leftmost_cycle_point(graph: &HalfEdgeGraph, cycle: &[NodeId]) -> Point2 {
    let mut best = graph.origin_point(cycle[0]);
    for &n in &cycle[1..] {
        let p = graph.origin_point(n);
        if p.x < best.x || (p.x == best.x && p.y < best.y) {
            best = p;
        }
    }
    best
}

/// Labels graph vertices by connected component.
fn label_components(graph: &HalfEdgeGraph) -> Vec<u32> {
    let n = graph.vertices.len();
    let mut parent: Vec<u32> = (0..n).map(|i| {
        #[allow(clippy::cast_possible_truncation)]
        let i = i as u32;
        i
    }).collect();

    fn find(parent: &mut [u32], x: u32) -> u32 {
        let mut root = x;
        while parent[root as usize] != root {
            root = parent[root as usize];
        }
        let mut cur = x;
        while parent[cur as usize] != root {
            let next = parent[cur as usize];
            parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    for i in (0..graph.node_count()).step_by(2) {
        #[allow(clippy::cast_possible_truncation)]
        let n = NodeId(i as u32);
        let a = find(&mut parent, graph.origin(n));
        let b = find(&mut parent, graph.target(n));
        if a != b {
            parent[b as usize] = a;
        }
    }

    (0..n).map(|i| {
        #[allow(clippy::cast_possible_truncation)]
        let i = i as u32;
        find(&mut parent, i)
    }).collect()
}
