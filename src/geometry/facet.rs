use log::debug;

use crate::math::polygon_2d::{signed_area_xy, simplify_collinear_xy};
use crate::math::{Point3, TOLERANCE};

/// Facets a closed boundary loop into polylines with bounded edge length.
///
/// Adjacent duplicate and collinear vertices are consolidated first, then
/// every segment longer than `max_edge_length` is subdivided. The returned
/// chains are explicitly closed (last point equals the first), so a caller
/// can imprint consecutive point pairs directly.
///
/// A boundary that consolidates to fewer than three usable points yields an
/// empty result; the caller is expected to skip it (best-effort policy).
#[must_use]
pub fn facet_boundary(points: &[Point3], max_edge_length: f64) -> Vec<Vec<Point3>> {
    let mut loop_points = simplify_collinear_xy(points);

    // Drop an explicit closing point so the loop is held open internally.
    while loop_points.len() >= 2 {
        let first = loop_points[0];
        let last = loop_points[loop_points.len() - 1];
        if (first.x - last.x).abs() < TOLERANCE && (first.y - last.y).abs() < TOLERANCE {
            loop_points.pop();
        } else {
            break;
        }
    }

    if loop_points.len() < 3 || signed_area_xy(&loop_points).abs() < TOLERANCE {
        debug!(
            "facet: boundary consolidated to {} usable points, skipping",
            loop_points.len()
        );
        return Vec::new();
    }

    let n = loop_points.len();
    let mut chain = Vec::with_capacity(n + 1);
    for i in 0..n {
        let a = loop_points[i];
        let b = loop_points[(i + 1) % n];
        chain.push(a);

        let len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        if len > max_edge_length && max_edge_length > TOLERANCE {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pieces = (len / max_edge_length).ceil() as usize;
            for k in 1..pieces {
                #[allow(clippy::cast_precision_loss)]
                let t = k as f64 / pieces as f64;
                chain.push(Point3::new(
                    a.x + (b.x - a.x) * t,
                    a.y + (b.y - a.y) * t,
                    a.z + (b.z - a.z) * t,
                ));
            }
        }
    }
    // Close the chain.
    chain.push(loop_points[0]);

    vec![chain]
}
