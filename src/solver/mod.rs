pub mod classify;
pub mod membership;

pub use classify::RegionPolygon;
pub use membership::{CurveInfo, Membership};

use std::collections::BTreeSet;

use log::debug;

use crate::arrangement::{Arrangement, CancelFlag, SignFilter};
use crate::error::Result;
use crate::geometry::{facet_boundary, Boundary, BoundaryKind};
use crate::math::{Matrix4, Point3, TOLERANCE};

/// Configuration for a solve request.
///
/// Tolerances are expressed in working units; `coordinate_scale_factor` is
/// the size of one working unit in world units, so smaller factors mean a
/// finer working grid. `max_facet_edge_length` applies to the input curves
/// before the working-unit transform.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum polyline edge length produced by faceting, in input units.
    pub max_facet_edge_length: f64,
    /// Vertex merge tolerance for topology inference, in working units.
    pub vertex_vertex_tolerance: f64,
    /// Vertex-to-edge split tolerance for topology inference, in working
    /// units.
    pub vertex_edge_tolerance: f64,
    /// Minimum area for reported regions and retained holes, in working
    /// units².
    pub minimum_region_area: f64,
    /// World units per working unit.
    pub coordinate_scale_factor: f64,
    /// Transform establishing the arrangement's working plane.
    pub local_to_world: Matrix4,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_facet_edge_length: 1000.0,
            vertex_vertex_tolerance: 1.0,
            vertex_edge_tolerance: 1.0,
            minimum_region_area: 0.1,
            coordinate_scale_factor: 1e-6,
            local_to_world: Matrix4::identity(),
        }
    }
}

/// A flagged region: the boundaries responsible and the reconstructed
/// geometry of the offending face.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// Never empty. Inner boundaries inside the region, plus non-inner
    /// boundaries bounding it from the outside.
    pub contributing_boundary_ids: BTreeSet<i64>,
    pub region: RegionPolygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SolverState {
    Empty,
    Imprinting,
    Merged,
    Analyzed,
}

/// One-shot orchestrator for a conflict query.
///
/// Add boundaries, then call [`ConflictSolver::solve`], which consumes the
/// solver: a fresh instance must be constructed per query. Independent
/// solver instances share no state, so parallelism is safe at the
/// granularity of whole solve requests.
#[derive(Debug)]
pub struct ConflictSolver {
    config: SolverConfig,
    arrangement: Arrangement,
    has_container_boundary: bool,
    state: SolverState,
}

impl ConflictSolver {
    /// Creates a solver for one coordinate frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured transform cannot be inverted or
    /// the scale factor is degenerate.
    pub fn new(config: SolverConfig) -> Result<Self> {
        let arrangement =
            Arrangement::new(config.local_to_world, config.coordinate_scale_factor)?;
        Ok(Self {
            config,
            arrangement,
            has_container_boundary: false,
            state: SolverState::Empty,
        })
    }

    /// Adds a container boundary. Invalid boundaries (no computable area)
    /// are silently skipped.
    pub fn add_container_boundary(&mut self, points: &[Point3], id: i64) {
        self.add_boundary(points, BoundaryKind::Container, id);
    }

    /// Adds an inner boundary. Invalid boundaries (no computable area) are
    /// silently skipped.
    pub fn add_inner_boundary(&mut self, points: &[Point3], id: i64) {
        self.add_boundary(points, BoundaryKind::Inner, id);
    }

    fn add_boundary(&mut self, points: &[Point3], kind: BoundaryKind, id: i64) {
        let boundary = Boundary::new(points.to_vec(), kind, id);
        if boundary.area() < TOLERANCE {
            debug!("solver: skipping boundary {id} with degenerate area");
            return;
        }

        let chains = facet_boundary(&boundary.points, self.config.max_facet_edge_length);
        if chains.is_empty() {
            debug!("solver: faceting produced no usable points for boundary {id}");
            return;
        }

        let mut imprinted = false;
        for chain in &chains {
            imprinted |= self.arrangement.imprint(chain, kind, id);
        }
        if imprinted {
            if kind == BoundaryKind::Container {
                self.has_container_boundary = true;
            }
            self.state = SolverState::Imprinting;
        }
    }

    /// Runs the full pipeline and returns the flagged regions.
    ///
    /// # Errors
    ///
    /// Returns a topology error when regularization cannot produce a
    /// consistent embedding; "no conflicts" and "no answer" stay
    /// distinguishable.
    pub fn solve(self) -> Result<Vec<Conflict>> {
        self.solve_cancellable(&CancelFlag::new())
    }

    /// Like [`ConflictSolver::solve`], polling `cancel` during the merge
    /// step, the only potentially unbounded part of a solve.
    ///
    /// # Errors
    ///
    /// Returns a topology error on regularization failure or cancellation.
    pub fn solve_cancellable(mut self, cancel: &CancelFlag) -> Result<Vec<Conflict>> {
        debug_assert!(matches!(
            self.state,
            SolverState::Empty | SolverState::Imprinting
        ));

        self.arrangement.infer_topology(
            self.config.vertex_vertex_tolerance,
            self.config.vertex_edge_tolerance,
            cancel,
        )?;
        self.state = SolverState::Merged;

        let mut conflicts = Vec::new();
        for face in self.arrangement.faces(SignFilter::Positive) {
            if self.arrangement.is_face_null(face) {
                continue;
            }
            let resolved = membership::resolve_deep(&self.arrangement, face);
            let Some(ids) = classify::classify(&resolved, self.has_container_boundary) else {
                continue;
            };
            let Some(region) = classify::rebuild_region(
                &self.arrangement,
                face,
                self.config.minimum_region_area,
            ) else {
                continue;
            };
            conflicts.push(Conflict {
                contributing_boundary_ids: ids,
                region,
            });
        }
        debug_assert_eq!(self.state, SolverState::Merged);
        self.state = SolverState::Analyzed;

        debug!(
            "solver: analyzed {} faces, {} conflicts",
            self.arrangement.faces(SignFilter::Positive).len(),
            conflicts.len()
        );
        Ok(conflicts)
    }
}
