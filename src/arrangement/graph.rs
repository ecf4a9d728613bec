use crate::geometry::BoundaryKind;
use crate::math::Point2;

/// Opaque half-edge handle into the arrangement's node arena.
///
/// Nodes come in mated pairs representing the two sides of a physical edge;
/// the pair is allocated contiguously so `mate()` is a bit flip. Handles are
/// never raw pointers and stay valid for the lifetime of the arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The opposite half-edge of the same physical edge.
    #[must_use]
    pub fn mate(self) -> Self {
        Self(self.0 ^ 1)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Boundary metadata recorded for a physical edge at imprint time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeOwner {
    pub kind: BoundaryKind,
    pub id: i64,
}

/// One directed side of a physical edge.
#[derive(Debug, Clone)]
pub(crate) struct HalfEdge {
    /// Vertex index this half-edge leaves from.
    pub origin: u32,
    /// Originating boundary, if any.
    pub owner: Option<EdgeOwner>,
    /// `true` when this half-edge runs along its boundary's loop direction.
    pub directed: bool,
    /// Face successor: next half-edge around the face on the left.
    pub next: NodeId,
}

/// Flat arena of half-edges plus the shared vertex table.
#[derive(Debug, Default)]
pub(crate) struct HalfEdgeGraph {
    pub vertices: Vec<Point2>,
    pub halves: Vec<HalfEdge>,
}

impl HalfEdgeGraph {
    /// Adds a mated half-edge pair for the physical segment `from`→`to`.
    ///
    /// The forward half-edge follows the owning boundary's loop direction and
    /// is flagged `directed`; its mate is not. Returns the forward handle.
    pub fn add_pair(&mut self, from: u32, to: u32, owner: Option<EdgeOwner>) -> NodeId {
        #[allow(clippy::cast_possible_truncation)]
        let id = NodeId(self.halves.len() as u32);
        self.halves.push(HalfEdge {
            origin: from,
            owner,
            directed: true,
            next: id,
        });
        self.halves.push(HalfEdge {
            origin: to,
            owner,
            directed: false,
            next: id.mate(),
        });
        id
    }

    pub fn node_count(&self) -> usize {
        self.halves.len()
    }

    pub fn origin(&self, n: NodeId) -> u32 {
        self.halves[n.index()].origin
    }

    pub fn target(&self, n: NodeId) -> u32 {
        self.halves[n.mate().index()].origin
    }

    pub fn origin_point(&self, n: NodeId) -> Point2 {
        self.vertices[self.origin(n) as usize]
    }

    pub fn successor(&self, n: NodeId) -> NodeId {
        self.halves[n.index()].next
    }

    pub fn owner(&self, n: NodeId) -> Option<EdgeOwner> {
        self.halves.get(n.index()).and_then(|h| h.owner)
    }

    pub fn is_directed(&self, n: NodeId) -> bool {
        self.halves.get(n.index()).is_some_and(|h| h.directed)
    }

    /// Computes the face-successor pointers from the vertex rotation system.
    ///
    /// Outgoing half-edges at each vertex are sorted counter-clockwise by
    /// angle; the successor of `h` is the clockwise neighbour of `mate(h)` in
    /// the rotation at the head vertex of `h`. With this convention every
    /// face cycle keeps its region on the left, so interior cycles have
    /// positive signed area.
    pub fn build_rotation(&mut self) {
        let mut rings: Vec<Vec<NodeId>> = vec![Vec::new(); self.vertices.len()];
        for i in 0..self.halves.len() {
            #[allow(clippy::cast_possible_truncation)]
            let n = NodeId(i as u32);
            rings[self.origin(n) as usize].push(n);
        }

        for ring in &mut rings {
            let angles: Vec<(f64, NodeId)> = ring
                .iter()
                .map(|&n| {
                    let from = self.vertices[self.origin(n) as usize];
                    let to = self.vertices[self.target(n) as usize];
                    ((to.y - from.y).atan2(to.x - from.x), n)
                })
                .collect();
            let mut sorted = angles;
            // Tie-break equal angles by node id for determinism.
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            *ring = sorted.into_iter().map(|(_, n)| n).collect();
        }

        for vertex_ring in &rings {
            let len = vertex_ring.len();
            for (pos, &outgoing) in vertex_ring.iter().enumerate() {
                // outgoing = mate(h) for some h ending at this vertex; the
                // face successor of h is the clockwise-previous outgoing edge.
                let cw_prev = vertex_ring[(pos + len - 1) % len];
                let h = outgoing.mate();
                self.halves[h.index()].next = cw_prev;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mate_is_an_involution() {
        let n = NodeId(6);
        assert_eq!(n.mate(), NodeId(7));
        assert_eq!(n.mate().mate(), n);
    }

    #[test]
    fn pair_orientation_flags() {
        let mut g = HalfEdgeGraph::default();
        g.vertices.push(Point2::new(0.0, 0.0));
        g.vertices.push(Point2::new(1.0, 0.0));
        let owner = EdgeOwner {
            kind: BoundaryKind::Inner,
            id: 42,
        };
        let n = g.add_pair(0, 1, Some(owner));
        assert!(g.is_directed(n));
        assert!(!g.is_directed(n.mate()));
        assert_eq!(g.owner(n.mate()).unwrap().id, 42);
        assert_eq!(g.origin(n), 0);
        assert_eq!(g.target(n), 1);
    }

    #[test]
    fn triangle_rotation_closes_both_cycles() {
        let mut g = HalfEdgeGraph::default();
        g.vertices.push(Point2::new(0.0, 0.0));
        g.vertices.push(Point2::new(4.0, 0.0));
        g.vertices.push(Point2::new(0.0, 4.0));
        let a = g.add_pair(0, 1, None);
        let b = g.add_pair(1, 2, None);
        let c = g.add_pair(2, 0, None);
        g.build_rotation();

        // Interior cycle (CCW triangle).
        assert_eq!(g.successor(a), b);
        assert_eq!(g.successor(b), c);
        assert_eq!(g.successor(c), a);

        // Exterior cycle through the mates.
        assert_eq!(g.successor(b.mate()), a.mate());
        assert_eq!(g.successor(a.mate()), c.mate());
        assert_eq!(g.successor(c.mate()), b.mate());
    }
}
