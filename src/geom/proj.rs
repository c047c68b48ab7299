use anyhow::{anyhow, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// Source geographic CRS for all layer data (WGS84 lon/lat degrees).
const GEOGRAPHIC_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// California Albers (EPSG:3310), the fixed equal-area CRS for area math.
/// Meters out; chosen over Web Mercator because area on it is proportional
/// to true ground area across the region.
const EQUAL_AREA_PROJ4: &str =
    "+proj=aea +lat_1=34 +lat_2=40.5 +lat_0=0 +lon_0=-120 +x_0=0 +y_0=-4000000 \
     +datum=NAD83 +units=m +no_defs +type=crs";

/// Reprojects lon/lat geometries into the regional equal-area CRS.
pub(crate) struct EqualAreaProjection {
    from: Proj4,
    to: Proj4,
}

impl EqualAreaProjection {
    pub(crate) fn new() -> Result<Self> {
        let from = Proj4::from_proj_string(GEOGRAPHIC_PROJ4)
            .with_context(|| anyhow!("failed to build source PROJ.4: {GEOGRAPHIC_PROJ4}"))?;
        let to = Proj4::from_proj_string(EQUAL_AREA_PROJ4)
            .with_context(|| anyhow!("failed to build target PROJ.4: {EQUAL_AREA_PROJ4}"))?;
        Ok(Self { from, to })
    }

    /// Reproject a shape from lon/lat degrees to equal-area meters.
    pub(crate) fn project(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        // Map coords: radians in, meters out.
        shape.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
            transform(&self.from, &self.to, &mut point)
                .map_err(|e| anyhow!("CRS transform failed at ({}, {}): {e}", coord.x, coord.y))?;
            Ok(Coord { x: point.0, y: point.1 })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::planar_area;
    use geo::polygon;

    /// A 0.1 x 0.1 degree cell near downtown Los Angeles.
    fn la_cell() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: -118.3, y: 34.0),
            (x: -118.2, y: 34.0),
            (x: -118.2, y: 34.1),
            (x: -118.3, y: 34.1),
        ]])
    }

    #[test]
    fn projected_area_is_in_meters() {
        let proj = EqualAreaProjection::new().unwrap();
        let projected = proj.project(&la_cell()).unwrap();
        let area = planar_area(&projected);
        // ~9.2km x ~11.1km at this latitude; accept a generous band.
        assert!(area > 8.0e7 && area < 1.3e8, "unexpected area: {area}");
    }

    #[test]
    fn projection_preserves_area_ratios() {
        let proj = EqualAreaProjection::new().unwrap();
        let whole = proj.project(&la_cell()).unwrap();
        let half = proj
            .project(&MultiPolygon(vec![polygon![
                (x: -118.3, y: 34.0),
                (x: -118.25, y: 34.0),
                (x: -118.25, y: 34.1),
                (x: -118.3, y: 34.1),
            ]]))
            .unwrap();
        let ratio = planar_area(&half) / planar_area(&whole);
        approx::assert_relative_eq!(ratio, 0.5, epsilon = 1e-6);
    }
}
