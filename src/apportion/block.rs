use std::collections::HashMap;

use anyhow::Result;
use geo::{Geometry, MultiPolygon};

use crate::layer::Feature;

/// Census attribute holding the block identifier.
pub const BLOCK_ID_FIELD: &str = "block_geoid";

/// One census block: fine-grained geometry plus demographic tallies.
/// Immutable once built; block ids are unique within a vintage.
#[derive(Debug, Clone)]
pub struct CensusBlock {
    block_id: String,
    geometry: MultiPolygon<f64>,
    counts: HashMap<String, f64>,
}

impl CensusBlock {
    pub fn new(block_id: String, geometry: MultiPolygon<f64>, counts: HashMap<String, f64>) -> Self {
        Self { block_id, geometry, counts }
    }

    #[inline] pub fn block_id(&self) -> &str { &self.block_id }

    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    #[inline] pub fn counts(&self) -> &HashMap<String, f64> { &self.counts }

    /// A demographic count; columns absent from the source read as zero.
    #[inline]
    pub fn count(&self, column: &str) -> f64 {
        self.counts.get(column).copied().unwrap_or(0.0)
    }

    /// Build blocks from a loaded feature sequence. Numeric attributes become
    /// counts; features without a usable id or polygonal geometry are skipped
    /// with a warning rather than failing the table.
    pub fn from_features(features: &[Feature]) -> Result<Vec<CensusBlock>> {
        let mut blocks = Vec::with_capacity(features.len());

        for (idx, feature) in features.iter().enumerate() {
            let Some(block_id) = feature.attribute_string(BLOCK_ID_FIELD) else {
                log::warn!("block feature {idx} has no {BLOCK_ID_FIELD}; skipping");
                continue;
            };
            let geometry = match feature.geometry() {
                Geometry::Polygon(poly) => MultiPolygon(vec![poly.clone()]),
                Geometry::MultiPolygon(mp) => mp.clone(),
                other => {
                    log::warn!("block {block_id} has non-areal geometry {other:?}; skipping");
                    continue;
                }
            };

            let counts = feature
                .attributes()
                .iter()
                .filter(|(key, _)| key.as_str() != BLOCK_ID_FIELD)
                .filter_map(|(key, value)| value.as_f64().map(|v| (key.clone(), v)))
                .collect();

            blocks.push(CensusBlock::new(block_id, geometry, counts));
        }
        Ok(blocks)
    }
}
