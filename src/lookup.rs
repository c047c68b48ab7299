//! Multi-layer point lookup.
//!
//! Answers "which polygon of each boundary layer contains this point?" with
//! one entry per configured layer. Degraded layers answer `None` instead of
//! failing the query; callers cannot distinguish "layer failed to load" from
//! "point outside every feature", by design.

use std::{collections::BTreeMap, sync::Arc};

use anyhow::{ensure, Result};
use geo::Point;
use serde::Serialize;

use crate::{
    config::RegionBounds,
    geom::contains_point,
    layer::{Layer, LayerStore},
};

/// One value per configured layer, keyed by response key.
pub type QueryResult = BTreeMap<String, Option<String>>;

/// Point lookup over every layer in a store.
pub struct LookupEngine {
    store: Arc<LayerStore>,
    bounds: RegionBounds,
}

impl LookupEngine {
    pub fn new(store: Arc<LayerStore>, bounds: RegionBounds) -> Self {
        Self { store, bounds }
    }

    /// Query every configured layer for features containing the point.
    ///
    /// Layers are scanned fully in stored order; at city-county scale
    /// (thousands of features per layer) an index would cost more than it
    /// saves. Revisit if feature counts reach the hundreds of thousands.
    pub fn query_point(&self, lat: f64, lon: f64) -> Result<QueryResult> {
        validate_coordinates(lat, lon)?;

        if !self.bounds.contains(lat, lon) {
            log::warn!("coordinates ({lat}, {lon}) outside the configured region");
        }

        // Geometry coordinates are (lon, lat) order.
        let point = Point::new(lon, lat);

        let mut results = QueryResult::new();
        for config in self.store.configs() {
            let value = self
                .store
                .get_or_load(&config.name)
                .ok()
                .and_then(|layer| match_layer(&layer, &point, lat, lon));
            results.insert(config.response_key.clone(), value);
        }
        Ok(results)
    }
}

/// Scan one layer for containing features and reduce the matches to a single
/// display value.
fn match_layer(layer: &Layer, point: &Point<f64>, lat: f64, lon: f64) -> Option<String> {
    if !layer.is_loaded() {
        return None;
    }

    let mut matches = layer
        .features()
        .iter()
        .filter(|feature| contains_point(feature.geometry(), point));

    let first = matches.next()?;
    let extra = matches.count();
    if extra > 0 {
        // Overlapping source polygons. Deterministic policy: first match in
        // stored order wins; surfaced as a data-quality warning, not an error.
        log::warn!(
            "{} matches for {} at ({lat}, {lon}); using first in stored order",
            extra + 1,
            layer.name(),
        );
    }
    first.attribute_string(layer.name_field())
}

/// Reject out-of-range coordinates before any layer is touched.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    ensure!(
        (-90.0..=90.0).contains(&lat),
        "Invalid latitude: {lat}. Must be between -90 and 90."
    );
    ensure!(
        (-180.0..=180.0).contains(&lon),
        "Invalid longitude: {lon}. Must be between -180 and 180."
    );
    Ok(())
}

/// Wire shape of a lookup reply: `{"status": "success", "query": ..,
/// "results": ..}` or `{"status": "error", "message": ..}`. HTTP status
/// mapping is the caller's concern.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LookupOutcome {
    Success { query: QueryEcho, results: QueryResult },
    Error { message: String },
}

/// The queried coordinates, echoed back.
#[derive(Debug, Serialize)]
pub struct QueryEcho {
    pub lat: f64,
    pub lon: f64,
}

impl LookupOutcome {
    pub fn success(lat: f64, lon: f64, results: QueryResult) -> Self {
        Self::Success { query: QueryEcho { lat, lon }, results }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_out_of_range_mentions_latitude() {
        for lat in [91.0, -91.0] {
            let err = validate_coordinates(lat, 0.0).unwrap_err();
            assert!(err.to_string().contains("latitude"), "message: {err}");
        }
    }

    #[test]
    fn longitude_out_of_range_mentions_longitude() {
        for lon in [181.0, -181.0] {
            let err = validate_coordinates(0.0, lon).unwrap_err();
            assert!(err.to_string().contains("longitude"), "message: {err}");
        }
    }

    #[test]
    fn downtown_los_angeles_passes_validation() {
        validate_coordinates(34.05, -118.25).unwrap();
    }

    #[test]
    fn nan_coordinates_are_rejected() {
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(0.0, f64::NAN).is_err());
    }

    #[test]
    fn success_outcome_serializes_to_contract_shape() {
        let mut results = QueryResult::new();
        results.insert("city".to_string(), Some("Los Angeles".to_string()));
        results.insert("neighborhood".to_string(), None);

        let json = serde_json::to_value(LookupOutcome::success(34.05, -118.25, results)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["query"]["lat"], 34.05);
        assert_eq!(json["results"]["city"], "Los Angeles");
        assert!(json["results"]["neighborhood"].is_null());
    }

    #[test]
    fn error_outcome_serializes_to_contract_shape() {
        let json = serde_json::to_value(LookupOutcome::error("bad input")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "bad input");
    }
}
