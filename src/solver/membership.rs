use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::arrangement::{Arrangement, FaceId, NodeId};
use crate::geometry::BoundaryKind;

/// Per-boundary membership data accumulated by the deep walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveInfo {
    pub kind: BoundaryKind,
    /// Number of distinct edges of the immediate face contributed by this
    /// boundary (counted on the generation-0 pass only).
    pub primary_use_count: u32,
    /// Edges of the immediate face owned by this boundary.
    pub contributing_edges: BTreeSet<NodeId>,
}

impl CurveInfo {
    fn new(kind: BoundaryKind) -> Self {
        Self {
            kind,
            primary_use_count: 0,
            contributing_edges: BTreeSet::new(),
        }
    }
}

/// Which boundaries bound a face from the inside and from the outside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    pub inside: BTreeMap<i64, CurveInfo>,
    pub outside: BTreeMap<i64, CurveInfo>,
}

/// Resolves boundary membership for a face by walking past collapsed faces
/// and up through hole-nesting ancestors.
///
/// Generation 0 is the face itself: its edges count toward
/// `primary_use_count` and record contributing edge handles. Faces reached
/// by crossing edge mates or stepping to the structural parent contribute
/// boundary identity only. The walk is an explicit breadth-first traversal
/// so pathological nestings cannot exhaust the stack.
#[must_use]
pub fn resolve_deep(arrangement: &Arrangement, face: FaceId) -> Membership {
    let mut membership = Membership::default();
    if arrangement.is_face_null(face) || arrangement.has_negative_area(face) {
        return membership;
    }

    let mut queue: VecDeque<(FaceId, u32)> = VecDeque::new();
    let mut visited: HashSet<FaceId> = HashSet::new();
    queue.push_back((face, 0));

    while let Some((current, generation)) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        if generation > 0
            && (arrangement.is_face_null(current) || arrangement.has_negative_area(current))
        {
            continue;
        }
        let Ok(data) = arrangement.face(current) else {
            continue;
        };

        for &node in &data.cycle {
            if let Some(owner) = arrangement.edge_owner(node) {
                let directed = arrangement.edge_is_directed(node);
                classify_edge(&mut membership, owner, node, directed, generation);
            }

            // Cross to the neighbouring face, hopping through collapsed
            // regions that enclose no real area.
            let mut mate = node.mate();
            let mut hops = 0usize;
            while let Some(neighbour) = arrangement.face_of(mate) {
                if !arrangement.is_face_null(neighbour) {
                    queue.push_back((neighbour, generation + 1));
                    break;
                }
                if hops >= arrangement.node_count() {
                    break;
                }
                mate = arrangement.face_successor(mate).mate();
                hops += 1;
            }
        }

        // A region's effective boundary set includes the loop containing it
        // as a hole, one nesting level up.
        if let Some(parent) = arrangement.parent_face(current) {
            queue.push_back((parent, generation + 1));
        }
    }

    membership
}

fn classify_edge(
    membership: &mut Membership,
    owner: crate::arrangement::EdgeOwner,
    node: NodeId,
    directed: bool,
    generation: u32,
) {
    // A boundary already seen from one side never flips to the other.
    let entry = if directed {
        if membership.outside.contains_key(&owner.id) {
            return;
        }
        membership
            .inside
            .entry(owner.id)
            .or_insert_with(|| CurveInfo::new(owner.kind))
    } else {
        if membership.inside.contains_key(&owner.id) {
            return;
        }
        membership
            .outside
            .entry(owner.id)
            .or_insert_with(|| CurveInfo::new(owner.kind))
    };
    entry.kind = owner.kind;
    if generation == 0 {
        entry.primary_use_count += 1;
        entry.contributing_edges.insert(node);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arrangement::{CancelFlag, SignFilter};
    use crate::math::{Matrix4, Point3};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point3> {
        vec![p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1), p(x0, y0)]
    }

    fn build(boundaries: &[(Vec<Point3>, BoundaryKind, i64)]) -> Arrangement {
        let mut arr = Arrangement::new(Matrix4::identity(), 1.0).unwrap();
        for (points, kind, id) in boundaries {
            assert!(arr.imprint(points, *kind, *id));
        }
        arr.infer_topology(0.01, 0.01, &CancelFlag::new()).unwrap();
        arr
    }

    #[test]
    fn lone_square_is_inside_its_own_loop() {
        let arr = build(&[(square(0.0, 0.0, 10.0, 10.0), BoundaryKind::Inner, 5)]);
        let face = arr.face_at(&p(5.0, 5.0)).unwrap();
        let m = resolve_deep(&arr, face);

        assert_eq!(m.inside.len(), 1);
        assert!(m.outside.is_empty());
        let info = &m.inside[&5];
        assert_eq!(info.kind, BoundaryKind::Inner);
        assert_eq!(info.primary_use_count, 4);
        assert_eq!(info.contributing_edges.len(), 4);
    }

    #[test]
    fn nested_face_sees_container_through_parent() {
        let arr = build(&[
            (square(0.0, 0.0, 10.0, 10.0), BoundaryKind::Container, 1),
            (square(3.0, 3.0, 7.0, 7.0), BoundaryKind::Inner, 2),
        ]);
        let inner = arr.face_at(&p(5.0, 5.0)).unwrap();
        let m = resolve_deep(&arr, inner);

        assert_eq!(m.inside.len(), 2);
        assert_eq!(m.inside[&2].kind, BoundaryKind::Inner);
        assert_eq!(m.inside[&1].kind, BoundaryKind::Container);
        // The container loop is an ancestor, not an immediate edge.
        assert_eq!(m.inside[&1].primary_use_count, 0);
        assert!(m.inside[&1].contributing_edges.is_empty());
        assert_eq!(m.inside[&2].primary_use_count, 4);
    }

    #[test]
    fn overlap_lens_is_inside_both_boundaries() {
        let arr = build(&[
            (square(0.0, 0.0, 6.0, 6.0), BoundaryKind::Inner, 1),
            (square(4.0, 4.0, 10.0, 10.0), BoundaryKind::Inner, 2),
        ]);
        let lens = arr.face_at(&p(5.0, 5.0)).unwrap();
        let m = resolve_deep(&arr, lens);

        assert_eq!(m.inside.len(), 2);
        assert!(m.outside.is_empty());
        assert!(m.inside[&1].primary_use_count > 0);
        assert!(m.inside[&2].primary_use_count > 0);
    }

    #[test]
    fn overlap_remainder_is_outside_the_other_boundary() {
        let arr = build(&[
            (square(0.0, 0.0, 6.0, 6.0), BoundaryKind::Inner, 1),
            (square(4.0, 4.0, 10.0, 10.0), BoundaryKind::Inner, 2),
        ]);
        // Inside square 1 but outside square 2.
        let remainder = arr.face_at(&p(1.0, 1.0)).unwrap();
        let m = resolve_deep(&arr, remainder);

        assert_eq!(m.inside.len(), 1);
        assert!(m.inside.contains_key(&1));
        assert_eq!(m.outside.len(), 1);
        assert!(m.outside.contains_key(&2));
    }

    #[test]
    fn negative_face_resolves_to_nothing() {
        let arr = build(&[(square(0.0, 0.0, 10.0, 10.0), BoundaryKind::Inner, 5)]);
        let negative = arr.faces(SignFilter::Negative);
        assert_eq!(negative.len(), 1);
        let m = resolve_deep(&arr, negative[0]);
        assert!(m.inside.is_empty());
        assert!(m.outside.is_empty());
    }
}
