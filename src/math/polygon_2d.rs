use super::{Point2, Point3, TOLERANCE};

/// Computes the signed area of a 2D polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Signed area of a polygon projected onto the XY plane.
#[must_use]
pub fn signed_area_xy(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Area centroid of a 2D polygon.
///
/// Returns `None` for polygons whose area is below [`TOLERANCE`], where the
/// centroid formula degenerates.
#[must_use]
pub fn polygon_centroid_2d(points: &[Point2]) -> Option<Point2> {
    let area = signed_area_2d(points);
    if area.abs() < TOLERANCE {
        return None;
    }
    let n = points.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let cross = points[i].x * points[j].y - points[j].x * points[i].y;
        cx += (points[i].x + points[j].x) * cross;
        cy += (points[i].y + points[j].y) * cross;
    }
    let f = 1.0 / (6.0 * area);
    Some(Point2::new(cx * f, cy * f))
}

/// Winding-number point-in-polygon test.
///
/// Returns `true` if the point is inside the polygon (non-zero winding).
/// Points exactly on the boundary may report either side.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut winding = 0i32;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        if a.y <= point.y {
            if b.y > point.y && cross_2d(b.x - a.x, b.y - a.y, point.x - a.x, point.y - a.y) > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y
            && cross_2d(b.x - a.x, b.y - a.y, point.x - a.x, point.y - a.y) < 0.0
        {
            winding -= 1;
        }
    }
    winding != 0
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Removes collinear mid-vertices and consecutive duplicates from a loop.
///
/// If simplification would leave fewer than three vertices the original
/// points are returned unchanged.
#[must_use]
pub fn simplify_collinear_xy(points: &[Point3]) -> Vec<Point3> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut result: Vec<Point3> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];

        let to_curr = (curr.x - prev.x, curr.y - prev.y);
        let to_next = (next.x - curr.x, next.y - curr.y);
        let len_sq = to_curr.0 * to_curr.0 + to_curr.1 * to_curr.1;
        if len_sq < TOLERANCE * TOLERANCE {
            // Duplicate of the previous vertex.
            continue;
        }
        let cross = to_curr.0 * to_next.1 - to_curr.1 * to_next.0;
        if cross.abs() > TOLERANCE {
            result.push(curr);
        }
    }

    if result.len() < 3 {
        return points.to_vec();
    }
    result
}

/// Rotates a closed polygon so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Ensures deterministic output for tests.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point3]) -> Vec<Point3> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    if best == 0 {
        return points.to_vec();
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}
