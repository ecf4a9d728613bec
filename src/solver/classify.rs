use std::collections::BTreeSet;

use log::{debug, trace};

use crate::arrangement::{Arrangement, FaceId};
use crate::geometry::BoundaryKind;
use crate::math::polygon_2d::{polygon_centroid_2d, rotate_to_canonical_start, signed_area_xy};
use crate::math::{Point2, Point3};

use super::membership::Membership;

/// Conflict geometry: an outer loop with zero or more hole loops, in world
/// coordinates.
#[derive(Debug, Clone)]
pub struct RegionPolygon {
    pub outer: Vec<Point3>,
    pub holes: Vec<Vec<Point3>>,
    area: f64,
    centroid: Point3,
}

impl RegionPolygon {
    /// Net enclosed area (outer minus holes), in working units².
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Area centroid of the assembled region, in world coordinates.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        self.centroid
    }
}

/// Applies the containment/overlap rule to a face's membership data.
///
/// A face is a conflict when an inner region exists that is not nested in
/// any container while containers are in play at all, or when two or more
/// inner boundaries lie inside the same face. Pure over its inputs, so
/// repeated evaluation is idempotent.
///
/// Returns the contributing boundary ids, or `None` for a clean face.
#[must_use]
pub(crate) fn classify(
    membership: &Membership,
    has_container_boundary: bool,
) -> Option<BTreeSet<i64>> {
    let inner_inside = membership
        .inside
        .values()
        .filter(|info| info.kind == BoundaryKind::Inner)
        .count();
    let container_inside = membership
        .inside
        .values()
        .filter(|info| info.kind == BoundaryKind::Container)
        .count();

    let floating = has_container_boundary && inner_inside > 0 && container_inside == 0;
    let overlap = inner_inside > 1;
    if !floating && !overlap {
        return None;
    }

    let mut ids = BTreeSet::new();
    for (&id, info) in &membership.inside {
        if info.kind != BoundaryKind::Container {
            ids.insert(id);
        }
    }
    for (&id, info) in &membership.outside {
        if info.kind != BoundaryKind::Inner {
            ids.insert(id);
        }
    }
    Some(ids)
}

/// Reconstructs the output geometry for a flagged face.
///
/// Walks the face's edge cycle for the outer loop, keeps only hole loops
/// whose area exceeds `minimum_region_area` (sliver holes are dropped), and
/// discards the whole region if the assembled area is itself below the
/// threshold. Areas are compared in working units²; the returned loops are
/// world coordinates.
pub(crate) fn rebuild_region(
    arrangement: &Arrangement,
    face: FaceId,
    minimum_region_area: f64,
) -> Option<RegionPolygon> {
    let outer_working = arrangement.face_points(face);
    if outer_working.len() < 3 {
        return None;
    }
    let outer_area = signed_area_xy(&outer_working).abs();

    let mut kept_holes: Vec<Vec<Point3>> = Vec::new();
    let mut holes_area = 0.0;
    for hole in arrangement.hole_faces(face) {
        let points = arrangement.face_points(hole);
        let area = signed_area_xy(&points).abs();
        if area <= minimum_region_area {
            trace!("rebuild: dropping sliver hole with area {area}");
            continue;
        }
        holes_area += area;
        kept_holes.push(points);
    }

    let assembled_area = outer_area - holes_area;
    if assembled_area <= minimum_region_area {
        debug!("rebuild: degenerate reconstruction with area {assembled_area}, dropping");
        return None;
    }

    let centroid_working = assembled_centroid(&outer_working, &kept_holes, assembled_area)?;
    let centroid = arrangement.to_world(&centroid_working);

    let outer = to_world_loop(arrangement, &rotate_to_canonical_start(&outer_working));
    let holes = kept_holes
        .iter()
        .map(|hole| to_world_loop(arrangement, &rotate_to_canonical_start(hole)))
        .collect();

    Some(RegionPolygon {
        outer,
        holes,
        area: assembled_area,
        centroid,
    })
}

/// Area-weighted centroid of an outer loop minus its holes, in working
/// coordinates.
fn assembled_centroid(
    outer: &[Point3],
    holes: &[Vec<Point3>],
    assembled_area: f64,
) -> Option<Point2> {
    let flatten = |loop_points: &[Point3]| -> Vec<Point2> {
        loop_points.iter().map(|p| Point2::new(p.x, p.y)).collect()
    };

    let outer_2d = flatten(outer);
    let outer_area = signed_area_xy(outer).abs();
    let outer_centroid = polygon_centroid_2d(&outer_2d)?;

    let mut cx = outer_centroid.x * outer_area;
    let mut cy = outer_centroid.y * outer_area;
    for hole in holes {
        let hole_2d = flatten(hole);
        let hole_area = signed_area_xy(hole).abs();
        let Some(hole_centroid) = polygon_centroid_2d(&hole_2d) else {
            continue;
        };
        cx -= hole_centroid.x * hole_area;
        cy -= hole_centroid.y * hole_area;
    }
    Some(Point2::new(cx / assembled_area, cy / assembled_area))
}

fn to_world_loop(arrangement: &Arrangement, loop_points: &[Point3]) -> Vec<Point3> {
    loop_points
        .iter()
        .map(|p| arrangement.to_world(&Point2::new(p.x, p.y)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::solver::membership::CurveInfo;
    use std::collections::BTreeMap;

    fn info(kind: BoundaryKind, uses: u32) -> CurveInfo {
        CurveInfo {
            kind,
            primary_use_count: uses,
            contributing_edges: BTreeSet::new(),
        }
    }

    fn membership(
        inside: &[(i64, BoundaryKind)],
        outside: &[(i64, BoundaryKind)],
    ) -> Membership {
        let build = |entries: &[(i64, BoundaryKind)]| -> BTreeMap<i64, CurveInfo> {
            entries
                .iter()
                .map(|&(id, kind)| (id, info(kind, 1)))
                .collect()
        };
        Membership {
            inside: build(inside),
            outside: build(outside),
        }
    }

    #[test]
    fn properly_nested_inner_is_clean() {
        let m = membership(
            &[(1, BoundaryKind::Container), (2, BoundaryKind::Inner)],
            &[],
        );
        assert!(classify(&m, true).is_none());
    }

    #[test]
    fn floating_inner_flags_with_container_present() {
        let m = membership(&[(2, BoundaryKind::Inner)], &[]);
        let ids = classify(&m, true).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn no_container_anywhere_means_no_floating_conflict() {
        let m = membership(&[(2, BoundaryKind::Inner)], &[]);
        assert!(classify(&m, false).is_none());
    }

    #[test]
    fn overlapping_inners_flag_even_inside_container() {
        let m = membership(
            &[
                (1, BoundaryKind::Container),
                (2, BoundaryKind::Inner),
                (3, BoundaryKind::Inner),
            ],
            &[],
        );
        let ids = classify(&m, true).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn outside_container_id_is_reported_for_floating_inner() {
        // An inner region poking out of its container: the container bounds
        // the face from the outside and is reported alongside the inner id.
        let m = membership(&[(9, BoundaryKind::Inner)], &[(1, BoundaryKind::Container)]);
        let ids = classify(&m, true).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 9]);
    }

    #[test]
    fn outside_inner_ids_are_filtered() {
        let m = membership(
            &[(1, BoundaryKind::Container), (2, BoundaryKind::Inner), (3, BoundaryKind::Inner)],
            &[(4, BoundaryKind::Inner)],
        );
        let ids = classify(&m, true).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn classification_is_idempotent() {
        let m = membership(
            &[(2, BoundaryKind::Inner), (3, BoundaryKind::Inner)],
            &[(1, BoundaryKind::Container)],
        );
        let first = classify(&m, true);
        let second = classify(&m, true);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn empty_membership_is_clean() {
        assert!(classify(&Membership::default(), true).is_none());
        assert!(classify(&Membership::default(), false).is_none());
    }
}
