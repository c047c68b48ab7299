//! GeoJSON FeatureCollection reading.
//!
//! Parses the subset of GeoJSON the layer sources produce: Point, Polygon and
//! MultiPolygon features with flat property maps. Malformed features are
//! skipped with a warning; only a structurally broken document is an error.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{anyhow, bail, ensure, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde_json::{Map, Value};

use crate::layer::Feature;

/// Read a GeoJSON FeatureCollection from a file.
pub fn read_geojson_file(path: &Path) -> Result<Vec<Feature>> {
    let file = File::open(path)
        .with_context(|| format!("[io::geojson] failed to open {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::geojson] failed to parse {}", path.display()))?;
    parse_feature_collection(&value)
}

/// Convert a parsed GeoJSON document into features.
pub fn parse_feature_collection(value: &Value) -> Result<Vec<Feature>> {
    ensure!(
        value.get("type").and_then(Value::as_str) == Some("FeatureCollection"),
        "[io::geojson] expected a FeatureCollection"
    );
    let raw = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("[io::geojson] FeatureCollection has no features array"))?;

    let mut features = Vec::with_capacity(raw.len());
    for (idx, entry) in raw.iter().enumerate() {
        match parse_feature(entry) {
            Ok(feature) => features.push(feature),
            Err(e) => log::warn!("skipping feature {idx}: {e}"),
        }
    }
    Ok(features)
}

fn parse_feature(value: &Value) -> Result<Feature> {
    let geometry = value
        .get("geometry")
        .filter(|g| !g.is_null())
        .ok_or_else(|| anyhow!("feature has null geometry"))?;
    let attributes = match value.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    Ok(Feature::new(parse_geometry(geometry)?, attributes))
}

fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let ty = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("geometry has no type"))?;
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| anyhow!("geometry has no coordinates"))?;

    match ty {
        "Point" => Ok(Geometry::Point(Point::from(parse_coord(coordinates)?))),
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coordinates)?)),
        "MultiPolygon" => {
            let polys = as_array(coordinates)?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polys)))
        }
        other => bail!("unsupported geometry type: {other}"),
    }
}

fn parse_polygon(coordinates: &Value) -> Result<Polygon<f64>> {
    let rings = as_array(coordinates)?;
    ensure!(!rings.is_empty(), "polygon has no rings");
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(Vec::new()));
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(coordinates: &Value) -> Result<LineString<f64>> {
    let coords = as_array(coordinates)?
        .iter()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pair = as_array(value)?;
    ensure!(pair.len() >= 2, "coordinate needs at least two values");
    let x = pair[0].as_f64().ok_or_else(|| anyhow!("non-numeric longitude"))?;
    let y = pair[1].as_f64().ok_or_else(|| anyhow!("non-numeric latitude"))?;
    Ok(Coord { x, y })
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("expected a JSON array"))
}
