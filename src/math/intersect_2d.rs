use super::{Point2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are the parameters
/// on the first and second segment, clamped to `[0, 1]`. Parallel segments
/// report no intersection, including the collinear-overlap case (overlaps are
/// resolved by vertex snapping, not by this predicate).
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = da.x * db.y - da.y * db.x;
    if cross.abs() < TOLERANCE {
        return None;
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = (dx * db.y - dy * db.x) / cross;
    let u = (dx * da.y - dy * da.x) / cross;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        let pt = Point2::new(a0.x + da.x * t_clamped, a0.y + da.y * t_clamped);
        Some((pt, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns the minimum distance from `point` to the segment `a`→`b`, together
/// with the projection parameter `t` clamped to `[0, 1]`.
#[must_use]
pub fn point_to_segment_dist(point: &Point2, a: &Point2, b: &Point2) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        let d = ((point.x - a.x).powi(2) + (point.y - a.y).powi(2)).sqrt();
        return (d, 0.0);
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);

    let closest_x = a.x + t * dx;
    let closest_y = a.y + t * dy;

    let d = ((point.x - closest_x).powi(2) + (point.y - closest_y).powi(2)).sqrt();
    (d, t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn crossing_segments_intersect() {
        let (pt, t, u) =
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(4.0, 4.0), &p(0.0, 4.0), &p(4.0, 0.0))
                .unwrap();
        assert!((pt.x - 2.0).abs() < TOLERANCE);
        assert!((pt.y - 2.0).abs() < TOLERANCE);
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        assert!(segment_segment_intersect_2d(
            &p(0.0, 0.0),
            &p(1.0, 0.0),
            &p(0.0, 1.0),
            &p(1.0, 1.0)
        )
        .is_none());
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(segment_segment_intersect_2d(
            &p(0.0, 0.0),
            &p(4.0, 0.0),
            &p(1.0, 0.0),
            &p(3.0, 0.0)
        )
        .is_none());
    }

    #[test]
    fn touching_at_endpoint_intersects() {
        let (pt, t, u) =
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(2.0, 0.0), &p(2.0, 0.0), &p(2.0, 2.0))
                .unwrap();
        assert!((pt.x - 2.0).abs() < TOLERANCE);
        assert!((t - 1.0).abs() < TOLERANCE);
        assert!(u.abs() < TOLERANCE);
    }

    #[test]
    fn segment_dist_perpendicular_projection() {
        let (d, t) = point_to_segment_dist(&p(1.0, 1.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOLERANCE, "d={d}");
        assert!((t - 0.5).abs() < TOLERANCE, "t={t}");
    }

    #[test]
    fn segment_dist_endpoint_closest() {
        let (d, t) = point_to_segment_dist(&p(-1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOLERANCE, "d={d}");
        assert!(t.abs() < TOLERANCE, "t={t}");
    }

    #[test]
    fn segment_dist_degenerate() {
        let (d, _) = point_to_segment_dist(&p(3.0, 4.0), &p(0.0, 0.0), &p(0.0, 0.0));
        assert!((d - 5.0).abs() < TOLERANCE, "d={d}");
    }
}
