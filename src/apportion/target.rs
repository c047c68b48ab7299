use anyhow::{ensure, Result};
use geo::{Geometry, MultiPolygon};
use serde_json::{Map, Value};

use crate::layer::Layer;

/// One target polygon for apportionment: a coarse area that census counts
/// get redistributed into.
#[derive(Debug, Clone)]
pub struct TargetPolygon {
    target_id: String,
    geometry: MultiPolygon<f64>,
    descriptive_attrs: Map<String, Value>,
}

impl TargetPolygon {
    pub fn new(target_id: String, geometry: MultiPolygon<f64>, descriptive_attrs: Map<String, Value>) -> Self {
        Self { target_id, geometry, descriptive_attrs }
    }

    #[inline] pub fn target_id(&self) -> &str { &self.target_id }

    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    #[inline] pub fn descriptive_attrs(&self) -> &Map<String, Value> { &self.descriptive_attrs }
}

/// Extract target polygons from a loaded layer.
///
/// Ids come from the layer's configured id field; when the field is not
/// configured or a feature lacks it, a synthetic sequential id is substituted
/// for this run. Non-areal features are skipped with a warning.
pub fn targets_from_layer(layer: &Layer) -> Result<Vec<TargetPolygon>> {
    ensure!(layer.is_loaded(), "target layer {} is not loaded", layer.name());

    let mut targets = Vec::with_capacity(layer.len());
    let mut seen = std::collections::HashSet::new();

    for (idx, feature) in layer.features().iter().enumerate() {
        let geometry = match feature.geometry() {
            Geometry::Polygon(poly) => MultiPolygon(vec![poly.clone()]),
            Geometry::MultiPolygon(mp) => mp.clone(),
            other => {
                log::warn!("target feature {idx} in {} is non-areal ({other:?}); skipping", layer.name());
                continue;
            }
        };

        let target_id = layer
            .id_field()
            .and_then(|field| feature.attribute_string(field))
            .unwrap_or_else(|| idx.to_string());
        ensure!(
            seen.insert(target_id.clone()),
            "duplicate target id {target_id} in layer {}",
            layer.name()
        );

        targets.push(TargetPolygon::new(target_id, geometry, feature.attributes().clone()));
    }
    Ok(targets)
}
