use thiserror::Error;

/// Top-level error type for the Planaris conflict detection kernel.
#[derive(Debug, Error)]
pub enum PlanarisError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("coordinate transform is singular and cannot be inverted")]
    SingularTransform,
}

/// Errors related to the planar arrangement topology.
///
/// Topology inference failure is a typed error rather than an empty result
/// set, so callers can tell "no conflicts" apart from "no answer".
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("regularization did not converge after {passes} passes")]
    MergeDiverged { passes: u32 },

    #[error("topology inference was cancelled")]
    Cancelled,
}

/// Convenience type alias for results using [`PlanarisError`].
pub type Result<T> = std::result::Result<T, PlanarisError>;
