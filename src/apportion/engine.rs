use std::collections::BTreeMap;

use anyhow::Result;
use geo::{BooleanOps, BoundingRect, MultiPolygon};
use rstar::{RTree, AABB};
use serde_json::{Map, Value};

use crate::geom::{
    expand_rect, planar_area, rects_intersect, union_rects, BoundingBox, EqualAreaProjection,
};

use super::{block::CensusBlock, target::TargetPolygon};

/// Bbox pre-filter margin in degrees (~0.7 mile). Purely a performance
/// optimization: a block fully outside the buffered layer bbox cannot
/// intersect any target.
const BBOX_BUFFER_DEG: f64 = 0.01;

/// Area-weighted share of the census counts for one target polygon.
#[derive(Debug, Clone)]
pub struct ApportionmentRecord {
    pub target_id: String,
    /// One entry per requested value column, zero-filled.
    pub counts: BTreeMap<String, f64>,
    /// Distinct source blocks that contributed a non-zero-weight piece.
    pub source_block_count: usize,
    /// Non-demographic attributes inherited from the target polygon.
    pub descriptive_attrs: Map<String, Value>,
}

/// Redistribute block-level counts onto target polygons in proportion to
/// overlapping area.
///
/// Every target in the input yields a record; a target no block touches gets
/// all-zero counts rather than being dropped. A block's weight for a piece is
/// `piece_area / block_area` in the equal-area CRS, so a block straddling the
/// layer's edge contributes only the share that actually falls inside a
/// target. Grouping is a deterministic index-ordered reduction.
pub fn apportion(
    blocks: &[CensusBlock],
    targets: &[TargetPolygon],
    value_columns: &[String],
) -> Result<Vec<ApportionmentRecord>> {
    let projection = EqualAreaProjection::new()?;

    // 1. Restrict blocks to the buffered bbox of the whole target layer.
    let layer_bbox = targets
        .iter()
        .filter_map(|t| t.geometry().bounding_rect())
        .reduce(union_rects)
        .map(|bbox| expand_rect(bbox, BBOX_BUFFER_DEG));

    let candidates: Vec<&CensusBlock> = match layer_bbox {
        Some(bbox) => blocks
            .iter()
            .filter(|block| {
                block
                    .geometry()
                    .bounding_rect()
                    .is_some_and(|b| rects_intersect(&b, &bbox))
            })
            .collect(),
        None => Vec::new(),
    };
    log::info!(
        "apportioning {} of {} blocks over {} targets",
        candidates.len(),
        blocks.len(),
        targets.len()
    );

    // 2. Reproject before any area math; degree areas must never be weighted.
    let projected_targets: Vec<Option<MultiPolygon<f64>>> = targets
        .iter()
        .map(|target| match projection.project(target.geometry()) {
            Ok(shape) => Some(shape),
            Err(e) => {
                log::warn!("failed to project target {}: {e:#}", target.target_id());
                None
            }
        })
        .collect();

    // R-tree over projected target bboxes prunes the candidate pairs.
    let rtree = RTree::bulk_load(
        projected_targets
            .iter()
            .enumerate()
            .filter_map(|(idx, shape)| {
                shape
                    .as_ref()
                    .and_then(BoundingRect::bounding_rect)
                    .map(|bbox| BoundingBox::new(idx, bbox))
            })
            .collect(),
    );

    let mut accumulators: Vec<TargetAccumulator> = targets
        .iter()
        .map(|_| TargetAccumulator::new(value_columns))
        .collect();

    for block in &candidates {
        let projected_block = match projection.project(block.geometry()) {
            Ok(shape) => shape,
            Err(e) => {
                log::warn!("failed to project block {}: {e:#}", block.block_id());
                continue;
            }
        };
        let Some(block_bbox) = projected_block.bounding_rect() else { continue };
        let block_area = planar_area(&projected_block);

        // 3. Overlay against bbox-candidate targets, in index order so the
        // floating-point reduction is reproducible.
        let envelope = AABB::from_corners(block_bbox.min().into(), block_bbox.max().into());
        let mut target_idxs: Vec<usize> =
            rtree.locate_in_envelope_intersecting(&envelope).map(|bb| bb.idx()).collect();
        target_idxs.sort_unstable();

        for target_idx in target_idxs {
            let Some(target_shape) = &projected_targets[target_idx] else { continue };
            let piece = projected_block.intersection(target_shape);
            let piece_area = planar_area(&piece);
            if piece_area <= 0.0 {
                continue;
            }

            // 4. Degenerate zero-area blocks weigh nothing rather than NaN.
            let weight = if block_area > 0.0 { piece_area / block_area } else { 0.0 };
            if weight == 0.0 {
                continue;
            }

            // 5/6. Redistribute and aggregate; absent columns read as zero.
            let accumulator = &mut accumulators[target_idx];
            for column in value_columns {
                if let Some(total) = accumulator.counts.get_mut(column) {
                    *total += block.count(column) * weight;
                }
            }
            accumulator.block_count += 1;
        }
    }

    // 7. One record per input target, including untouched ones.
    Ok(targets
        .iter()
        .zip(accumulators)
        .map(|(target, accumulator)| ApportionmentRecord {
            target_id: target.target_id().to_string(),
            counts: accumulator.counts,
            source_block_count: accumulator.block_count,
            descriptive_attrs: target.descriptive_attrs().clone(),
        })
        .collect())
}

/// Running totals for one target. Each block intersects a target at most
/// once, so the piece count doubles as the distinct-block count.
struct TargetAccumulator {
    counts: BTreeMap<String, f64>,
    block_count: usize,
}

impl TargetAccumulator {
    fn new(value_columns: &[String]) -> Self {
        Self {
            counts: value_columns.iter().map(|c| (c.clone(), 0.0)).collect(),
            block_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use std::collections::HashMap;

    /// Blocks and targets in lon/lat degrees near Los Angeles; the engine
    /// projects them before area math.
    fn block(id: &str, x0: f64, x1: f64, pop: f64) -> CensusBlock {
        CensusBlock::new(
            id.to_string(),
            MultiPolygon(vec![polygon![
                (x: x0, y: 34.0),
                (x: x1, y: 34.0),
                (x: x1, y: 34.1),
                (x: x0, y: 34.1),
            ]]),
            HashMap::from([("pop_total".to_string(), pop)]),
        )
    }

    fn target(id: &str, x0: f64, x1: f64) -> TargetPolygon {
        TargetPolygon::new(
            id.to_string(),
            MultiPolygon(vec![polygon![
                (x: x0, y: 34.0),
                (x: x1, y: 34.0),
                (x: x1, y: 34.1),
                (x: x0, y: 34.1),
            ]]),
            Map::new(),
        )
    }

    fn columns() -> Vec<String> {
        vec!["pop_total".to_string()]
    }

    #[test]
    fn exact_tiling_conserves_totals() {
        let blocks = vec![
            block("b1", -118.3, -118.2, 120.0),
            block("b2", -118.2, -118.1, 80.0),
        ];
        // Two targets that exactly tile the two blocks, split off-grid.
        let targets = vec![target("left", -118.3, -118.25), target("right", -118.25, -118.1)];

        let records = apportion(&blocks, &targets, &columns()).unwrap();
        let total: f64 = records.iter().map(|r| r.counts["pop_total"]).sum();
        assert!((total - 200.0).abs() < 1e-6, "total: {total}");
    }

    #[test]
    fn half_block_gets_half_count() {
        let blocks = vec![block("b1", -118.3, -118.2, 100.0), block("b2", -118.2, -118.1, 100.0)];
        // Half of b1 plus all of b2.
        let targets = vec![target("t", -118.25, -118.1)];

        let records = apportion(&blocks, &targets, &columns()).unwrap();
        assert_eq!(records.len(), 1);
        approx::assert_relative_eq!(records[0].counts["pop_total"], 150.0, epsilon = 1e-3);
        assert_eq!(records[0].source_block_count, 2);
    }

    #[test]
    fn untouched_target_gets_zero_record() {
        let blocks = vec![block("b1", -118.3, -118.2, 100.0)];
        let targets = vec![target("near", -118.3, -118.2), target("far", -117.9, -117.8)];

        let records = apportion(&blocks, &targets, &columns()).unwrap();
        assert_eq!(records.len(), 2);
        let far = records.iter().find(|r| r.target_id == "far").unwrap();
        assert_eq!(far.counts["pop_total"], 0.0);
        assert_eq!(far.source_block_count, 0);
    }

    #[test]
    fn counts_are_never_negative() {
        let blocks = vec![
            block("b1", -118.3, -118.2, 55.0),
            block("b2", -118.2, -118.1, 0.0),
        ];
        let targets = vec![target("a", -118.3, -118.22), target("b", -118.22, -118.1)];

        let records = apportion(&blocks, &targets, &columns()).unwrap();
        for record in &records {
            for (column, value) in &record.counts {
                assert!(*value >= 0.0, "{column} negative for {}", record.target_id);
            }
        }
    }

    #[test]
    fn missing_value_column_is_zero_filled() {
        let blocks = vec![block("b1", -118.3, -118.2, 100.0)];
        let targets = vec![target("t", -118.3, -118.2)];
        let columns = vec!["pop_total".to_string(), "housing_total".to_string()];

        let records = apportion(&blocks, &targets, &columns).unwrap();
        assert!((records[0].counts["pop_total"] - 100.0).abs() < 1e-6);
        assert_eq!(records[0].counts["housing_total"], 0.0);
    }

    #[test]
    fn blocks_outside_layer_bbox_are_ignored() {
        let blocks = vec![
            block("inside", -118.3, -118.2, 10.0),
            block("faraway", -117.0, -116.9, 999.0),
        ];
        let targets = vec![target("t", -118.3, -118.2)];

        let records = apportion(&blocks, &targets, &columns()).unwrap();
        assert!((records[0].counts["pop_total"] - 10.0).abs() < 1e-6);
        assert_eq!(records[0].source_block_count, 1);
    }
}
