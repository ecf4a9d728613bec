//! Planaris is a planar region conflict detection kernel.
//!
//! Closed boundary curves tagged as containers or inner regions are
//! imprinted onto a working plane, merged into a regularized planar
//! subdivision, and analyzed face by face: any bounded region where an
//! inner boundary floats outside every container, or where two or more
//! inner boundaries overlap, is reported as a [`Conflict`] together with
//! its reconstructed geometry.
//!
//! The high-level entry point is [`ConflictSolver`]; the underlying
//! subdivision is available through [`arrangement::Arrangement`] for
//! callers that need direct access to faces, holes, and edge ownership.

pub mod arrangement;
pub mod error;
pub mod geometry;
pub mod math;
pub mod solver;

pub use arrangement::CancelFlag;
pub use error::{PlanarisError, Result};
pub use geometry::{Boundary, BoundaryKind};
pub use solver::{Conflict, ConflictSolver, RegionPolygon, SolverConfig};
