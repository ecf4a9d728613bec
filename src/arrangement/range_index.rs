use crate::math::Point2;

/// Axis-aligned bounding box in working coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    /// Builds the bounding box of a non-empty point set.
    ///
    /// Returns an inverted (empty) box if no points are supplied.
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point2>) -> Self {
        let mut bbox = Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }

    pub fn contains_point(&self, p: &Point2, pad: f64) -> bool {
        p.x >= self.min_x - pad
            && p.x <= self.max_x + pad
            && p.y >= self.min_y - pad
            && p.y <= self.max_y + pad
    }

    pub fn intersects(&self, other: &Self, pad: f64) -> bool {
        self.min_x - pad <= other.max_x
            && self.max_x + pad >= other.min_x
            && self.min_y - pad <= other.max_y
            && self.max_y + pad >= other.min_y
    }
}

/// Flat bounding-box index over arrangement entities.
///
/// Built once by topology inference and valid for the rest of the
/// arrangement's lifetime. A linear scan is deliberate: candidate sets are
/// small and the prefilter only needs to beat re-walking face cycles.
#[derive(Debug)]
pub(crate) struct RangeIndex<T> {
    entries: Vec<(Aabb, T)>,
}

impl<T> Default for RangeIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Copy> RangeIndex<T> {
    pub fn insert(&mut self, bbox: Aabb, item: T) {
        self.entries.push((bbox, item));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entities whose bounding box contains `p`, padded by `pad`.
    pub fn query_point<'a>(&'a self, p: &'a Point2, pad: f64) -> impl Iterator<Item = T> + 'a {
        self.entries
            .iter()
            .filter(move |(bbox, _)| bbox.contains_point(p, pad))
            .map(|&(_, item)| item)
    }

    /// Entities whose bounding box overlaps `bbox`, padded by `pad`.
    pub fn query_box<'a>(&'a self, bbox: Aabb, pad: f64) -> impl Iterator<Item = T> + 'a {
        self.entries
            .iter()
            .filter(move |(candidate, _)| candidate.intersects(&bbox, pad))
            .map(|&(_, item)| item)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn query_point_filters_by_box() {
        let mut index = RangeIndex::default();
        let a = Aabb::from_points(
            [Point2::new(0.0, 0.0), Point2::new(2.0, 2.0)]
                .iter(),
        );
        let b = Aabb::from_points(
            [Point2::new(5.0, 5.0), Point2::new(8.0, 8.0)]
                .iter(),
        );
        index.insert(a, 1u32);
        index.insert(b, 2u32);

        let hits: Vec<u32> = index.query_point(&Point2::new(1.0, 1.0), 0.0).collect();
        assert_eq!(hits, vec![1]);

        let hits: Vec<u32> = index.query_point(&Point2::new(4.9, 4.9), 0.2).collect();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn query_box_reports_overlaps() {
        let mut index = RangeIndex::default();
        index.insert(
            Aabb::from_points([Point2::new(0.0, 0.0), Point2::new(4.0, 4.0)].iter()),
            7u32,
        );
        let probe = Aabb::from_points([Point2::new(3.0, 3.0), Point2::new(6.0, 6.0)].iter());
        let hits: Vec<u32> = index.query_box(probe, 0.0).collect();
        assert_eq!(hits, vec![7]);

        let far = Aabb::from_points([Point2::new(10.0, 10.0), Point2::new(11.0, 11.0)].iter());
        assert_eq!(index.query_box(far, 0.0).count(), 0);
    }
}
