pub mod facet;

pub use facet::facet_boundary;

use crate::math::polygon_2d::{signed_area_xy, simplify_collinear_xy};
use crate::math::Point3;

/// Role of a boundary in the containment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundaryKind {
    /// A boundary that is expected to contain inner regions.
    Container,
    /// A boundary that must be nested inside a container and must not
    /// overlap other inner boundaries.
    Inner,
}

/// A caller-supplied closed boundary loop.
///
/// Points form a closed loop (the last segment connects back to the first
/// point). The `id` is externally meaningful and opaque to this crate;
/// several arrangement edges may map back to the same id after
/// regularization.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub points: Vec<Point3>,
    pub kind: BoundaryKind,
    pub id: i64,
}

impl Boundary {
    /// Creates a new boundary loop.
    #[must_use]
    pub fn new(points: Vec<Point3>, kind: BoundaryKind, id: i64) -> Self {
        Self { points, kind, id }
    }

    /// Enclosed area of the loop projected onto the XY plane, after
    /// consolidating duplicate and collinear vertices.
    ///
    /// Zero area means the boundary is degenerate and unusable.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area_xy(&simplify_collinear_xy(&self.points)).abs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn boundary_area_of_square() {
        let b = Boundary::new(
            vec![p(0.0, 0.0), p(3.0, 0.0), p(3.0, 3.0), p(0.0, 3.0)],
            BoundaryKind::Inner,
            7,
        );
        assert!((b.area() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_boundary_has_zero_area() {
        let b = Boundary::new(
            vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)],
            BoundaryKind::Container,
            1,
        );
        assert!(b.area() < 1e-9);
    }
}
