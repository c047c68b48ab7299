use geo::{BooleanOps, Geometry, MultiPolygon, Validation};

/// One deterministic fix-up pass for invalid polygonal geometries, applied at
/// load time. A self-union through the boolean kernel re-nodes rings and
/// discards self-intersections (the zero-width-buffer equivalent). If the
/// geometry is still invalid afterwards it is kept and flagged with a warning,
/// never dropped.
pub(crate) fn repair_geometry(geometry: Geometry<f64>, label: &str) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(poly) => {
            let repaired = repair_multi(MultiPolygon(vec![poly]), label);
            match <[_; 1]>::try_from(repaired.0) {
                Ok([single]) => Geometry::Polygon(single),
                Err(polys) => Geometry::MultiPolygon(MultiPolygon(polys)),
            }
        }
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(repair_multi(mp, label)),
        other => other,
    }
}

fn repair_multi(shape: MultiPolygon<f64>, label: &str) -> MultiPolygon<f64> {
    if shape.is_valid() {
        return shape;
    }

    let repaired = shape.union(&MultiPolygon::new(Vec::new()));

    // A repair that erased the geometry entirely is worse than the original.
    if repaired.0.is_empty() && !shape.0.is_empty() {
        log::warn!("repair emptied geometry for {label}; keeping original");
        return shape;
    }

    if !repaired.is_valid() {
        log::warn!("geometry for {label} still invalid after repair pass");
    }
    repaired
}
