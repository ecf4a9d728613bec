mod faces;
mod graph;
mod range_index;
mod regularize;

pub use faces::{FaceData, FaceId};
pub use graph::{EdgeOwner, NodeId};

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use slotmap::SlotMap;

use crate::error::{GeometryError, TopologyError};
use crate::geometry::BoundaryKind;
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Matrix4, Point2, Point3};

use graph::HalfEdgeGraph;
use range_index::{Aabb, RangeIndex};
use regularize::RawChain;

/// Cooperative cancellation token for topology inference.
///
/// Regularization is the only potentially unbounded step of a solve (its
/// cost scales with segment count and crossing density), so it polls this
/// flag between passes. All other steps are bounded graph walks.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of an in-flight topology inference.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Face enumeration filter by area sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignFilter {
    /// Positive-area faces: normal bounded regions.
    Positive,
    /// Negative-area faces: hole loops and component contours.
    Negative,
    /// Every face cycle.
    All,
}

/// An undirected planar graph built from imprinted polylines.
///
/// Built once per solve request: imprint all chains, run
/// [`Arrangement::infer_topology`], then read faces. The arrangement is
/// read-only after inference; a new solve constructs a new arrangement.
#[derive(Debug)]
pub struct Arrangement {
    to_local: Matrix4,
    local_to_world: Matrix4,
    scale: f64,
    chains: Vec<RawChain>,
    graph: HalfEdgeGraph,
    faces: SlotMap<FaceId, FaceData>,
    node_face: Vec<FaceId>,
    face_index: RangeIndex<FaceId>,
    edge_index: RangeIndex<NodeId>,
    ready: bool,
}

impl Arrangement {
    /// Creates an empty arrangement for the given working frame.
    ///
    /// `local_to_world` establishes the working plane; imprinted points are
    /// pulled through its inverse. `coordinate_scale_factor` is the size of
    /// one working unit in world units (tolerances are working units).
    ///
    /// # Errors
    ///
    /// [`GeometryError::SingularTransform`] if the transform has no inverse,
    /// [`GeometryError::Degenerate`] for a non-positive scale factor.
    pub fn new(local_to_world: Matrix4, coordinate_scale_factor: f64) -> Result<Self, GeometryError> {
        if coordinate_scale_factor <= 0.0 || !coordinate_scale_factor.is_finite() {
            return Err(GeometryError::Degenerate(format!(
                "coordinate scale factor {coordinate_scale_factor} must be positive and finite"
            )));
        }
        let to_local = local_to_world
            .try_inverse()
            .ok_or(GeometryError::SingularTransform)?;
        Ok(Self {
            to_local,
            local_to_world,
            scale: coordinate_scale_factor,
            chains: Vec::new(),
            graph: HalfEdgeGraph::default(),
            faces: SlotMap::with_key(),
            node_face: Vec::new(),
            face_index: RangeIndex::default(),
            edge_index: RangeIndex::default(),
            ready: false,
        })
    }

    /// Imprints a polyline chain tagged with its owning boundary.
    ///
    /// Points are transformed into the working frame and flattened to the
    /// plane. A chain whose first and last points coincide is treated as a
    /// closed loop and normalized counter-clockwise, so that the loop
    /// interior lies to the left of its directed edges.
    ///
    /// Returns `false` only for malformed input (fewer than two points, or
    /// an arrangement already frozen by topology inference); geometric
    /// degeneracies are resolved later by [`Arrangement::infer_topology`].
    pub fn imprint(&mut self, polyline: &[Point3], kind: BoundaryKind, id: i64) -> bool {
        if polyline.len() < 2 {
            debug!("imprint: chain for boundary {id} has fewer than two points");
            return false;
        }
        if self.ready {
            debug!("imprint: arrangement is frozen, rejecting boundary {id}");
            return false;
        }

        let mut points: Vec<Point2> = polyline.iter().map(|p| self.to_working(p)).collect();

        let closed = {
            let first = points[0];
            let last = points[points.len() - 1];
            (first - last).norm() < crate::math::TOLERANCE / self.scale
        };
        if closed {
            points.pop();
            if points.len() < 2 {
                return false;
            }
            if signed_area_2d(&points) < 0.0 {
                points.reverse();
            }
            // Re-close after normalization.
            points.push(points[0]);
        }

        self.chains.push(RawChain {
            points,
            owner: EdgeOwner { kind, id },
        });
        true
    }

    /// Regularizes the imprinted chains into a valid planar subdivision.
    ///
    /// Merges vertices within `vertex_vertex_tol`, splits edges at points
    /// within `vertex_edge_tol` of another edge so no two edges cross away
    /// from a shared vertex, derives the face cycles and hole nesting, and
    /// builds the face and edge range indices. After success the
    /// arrangement is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when regularization diverges or is
    /// cancelled; the caller must treat this as "no conflicts computable".
    pub fn infer_topology(
        &mut self,
        vertex_vertex_tol: f64,
        vertex_edge_tol: f64,
        cancel: &CancelFlag,
    ) -> Result<(), TopologyError> {
        let regularized =
            regularize::regularize(&self.chains, vertex_vertex_tol, vertex_edge_tol, cancel)
                .inspect_err(|err| warn!("topology inference failed: {err}"))?;

        self.graph = faces::build_graph(&regularized);
        let (faces, node_face) = faces::extract_faces(&self.graph);
        self.faces = faces;
        self.node_face = node_face;

        self.face_index.clear();
        for (face_id, face) in &self.faces {
            let bbox = Aabb::from_points(face.cycle.iter().map(|&n| {
                let v = self.graph.origin(n) as usize;
                &self.graph.vertices[v]
            }));
            self.face_index.insert(bbox, face_id);
        }

        self.edge_index.clear();
        for i in (0..self.graph.node_count()).step_by(2) {
            #[allow(clippy::cast_possible_truncation)]
            let n = NodeId(i as u32);
            let a = self.graph.origin(n) as usize;
            let b = self.graph.target(n) as usize;
            let bbox = Aabb::from_points(
                [&self.graph.vertices[a], &self.graph.vertices[b]].into_iter(),
            );
            self.edge_index.insert(bbox, n);
        }

        faces::assign_holes(&self.graph, &mut self.faces, &self.face_index);
        self.ready = true;
        Ok(())
    }

    /// Enumerates faces matching the sign filter, ordered by canonical node
    /// id for deterministic results.
    #[must_use]
    pub fn faces(&self, filter: SignFilter) -> Vec<FaceId> {
        let mut out: Vec<FaceId> = self
            .faces
            .iter()
            .filter(|(_, f)| match filter {
                SignFilter::Positive => f.area > faces::NULL_FACE_AREA,
                SignFilter::Negative => f.area < -faces::NULL_FACE_AREA,
                SignFilter::All => true,
            })
            .map(|(id, _)| id)
            .collect();
        out.sort_by_key(|&id| self.faces[id].canonical);
        out
    }

    /// Returns a reference to the face data.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is not found.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces.get(id).ok_or(TopologyError::EntityNotFound("face"))
    }

    /// Whether the face cycle is topologically collapsed (no real area).
    #[must_use]
    pub fn is_face_null(&self, id: FaceId) -> bool {
        self.faces
            .get(id)
            .is_none_or(|f| f.area.abs() <= faces::NULL_FACE_AREA)
    }

    /// Whether the face cycle has negative signed area (hole loop or
    /// component contour).
    #[must_use]
    pub fn has_negative_area(&self, id: FaceId) -> bool {
        self.faces.get(id).is_some_and(|f| f.area < 0.0)
    }

    /// Ordered cycle points of a face, in working coordinates.
    #[must_use]
    pub fn face_points(&self, id: FaceId) -> Vec<Point3> {
        self.faces.get(id).map_or_else(Vec::new, |f| {
            f.cycle
                .iter()
                .map(|&n| {
                    let p = self.graph.origin_point(n);
                    Point3::new(p.x, p.y, 0.0)
                })
                .collect()
        })
    }

    /// Whether the face has at least one hole loop.
    #[must_use]
    pub fn has_hole(&self, id: FaceId) -> bool {
        self.faces.get(id).is_some_and(|f| !f.holes.is_empty())
    }

    /// The hole loops nested directly inside a face.
    #[must_use]
    pub fn hole_faces(&self, id: FaceId) -> Vec<FaceId> {
        self.faces.get(id).map_or_else(Vec::new, |f| f.holes.clone())
    }

    /// The face whose hole-loop structurally contains this face, one level
    /// up in the nesting hierarchy, or `None` at the outermost level.
    #[must_use]
    pub fn parent_face(&self, id: FaceId) -> Option<FaceId> {
        self.faces.get(id).and_then(|f| f.parent)
    }

    /// Boundary metadata recorded for the physical edge under a half-edge
    /// handle. `None` for synthetic or degenerate edges.
    #[must_use]
    pub fn edge_owner(&self, node: NodeId) -> Option<EdgeOwner> {
        self.graph.owner(node)
    }

    /// Whether this half-edge was imprinted along its boundary's loop
    /// direction.
    #[must_use]
    pub fn edge_is_directed(&self, node: NodeId) -> bool {
        self.graph.is_directed(node)
    }

    /// The face bounded by this half-edge.
    #[must_use]
    pub fn face_of(&self, node: NodeId) -> Option<FaceId> {
        self.node_face.get(node.index()).copied()
    }

    /// The next half-edge around the same face.
    #[must_use]
    pub fn face_successor(&self, node: NodeId) -> NodeId {
        self.graph.successor(node)
    }

    /// The smallest positive-area face containing a world-space point.
    #[must_use]
    pub fn face_at(&self, point: &Point3) -> Option<FaceId> {
        let p = self.to_working(point);
        let mut best: Option<(f64, FaceId)> = None;
        for candidate in self.face_index.query_point(&p, 0.0) {
            let Some(face) = self.faces.get(candidate) else {
                continue;
            };
            if face.area <= faces::NULL_FACE_AREA {
                continue;
            }
            let polygon: Vec<Point2> = face
                .cycle
                .iter()
                .map(|&n| self.graph.origin_point(n))
                .collect();
            if !crate::math::polygon_2d::point_in_polygon_2d(&p, &polygon) {
                continue;
            }
            if best.is_none_or(|(area, _)| face.area < area) {
                best = Some((face.area, candidate));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Physical edges whose bounding box overlaps the world-space rectangle
    /// spanned by `min` and `max`, expanded by `pad` world units.
    #[must_use]
    pub fn edges_in_range(&self, min: &Point3, max: &Point3, pad: f64) -> Vec<NodeId> {
        let a = self.to_working(min);
        let b = self.to_working(max);
        let bbox = Aabb::from_points([&a, &b].into_iter());
        self.edge_index.query_box(bbox, pad / self.scale).collect()
    }

    /// Number of half-edge nodes in the arrangement.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Transforms a world-space point into working coordinates.
    fn to_working(&self, p: &Point3) -> Point2 {
        let local = self.to_local.transform_point(p);
        Point2::new(local.x / self.scale, local.y / self.scale)
    }

    /// Transforms a working-coordinate point back to world space.
    pub(crate) fn to_world(&self, p: &Point2) -> Point3 {
        let local = Point3::new(p.x * self.scale, p.y * self.scale, 0.0);
        self.local_to_world.transform_point(&local)
    }
}
