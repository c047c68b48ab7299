use geo::{Area, Geometry, Intersects, MultiPolygon, Point};

/// Boundary-inclusive point containment: true iff the point lies in the
/// geometry's interior or on its boundary.
pub(crate) fn contains_point(geometry: &Geometry<f64>, point: &Point<f64>) -> bool {
    match geometry {
        Geometry::Polygon(poly) => poly.intersects(point),
        Geometry::MultiPolygon(mp) => mp.intersects(point),
        Geometry::Point(p) => p == point,
        _ => false,
    }
}

/// Planar area of a projected MultiPolygon, in the projection's units.
/// Callers must reproject to the equal-area CRS first; geographic-degree
/// areas are meaningless for weighting.
#[inline]
pub(crate) fn planar_area(shape: &MultiPolygon<f64>) -> f64 {
    shape.unsigned_area()
}
