use geo::{Coord, Rect};
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a MultiPolygon by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of corresponding MultiPolygon
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding MultiPolygon.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Smallest rectangle covering both inputs.
pub(crate) fn union_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Grow a rectangle by `margin` on every side.
pub(crate) fn expand_rect(rect: Rect<f64>, margin: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: rect.min().x - margin, y: rect.min().y - margin },
        Coord { x: rect.max().x + margin, y: rect.max().y + margin },
    )
}

/// Axis-aligned overlap test (touching counts).
pub(crate) fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && b.min().x <= a.max().x
        && a.min().y <= b.max().y
        && b.min().y <= a.max().y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
    }

    #[test]
    fn union_covers_both() {
        let u = union_rects(rect(0.0, 0.0, 1.0, 1.0), rect(2.0, -1.0, 3.0, 0.5));
        assert_eq!(u.min(), Coord { x: 0.0, y: -1.0 });
        assert_eq!(u.max(), Coord { x: 3.0, y: 1.0 });
    }

    #[test]
    fn expanded_rects_catch_near_misses() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.005, 0.0, 2.0, 1.0);
        assert!(!rects_intersect(&a, &b));
        assert!(rects_intersect(&expand_rect(a, 0.01), &b));
    }

    #[test]
    fn touching_rects_intersect() {
        assert!(rects_intersect(&rect(0.0, 0.0, 1.0, 1.0), &rect(1.0, 0.0, 2.0, 1.0)));
    }
}
