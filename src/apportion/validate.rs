use anyhow::Result;
use geo::{BoundingRect, Intersects};

use crate::{
    config::Benchmark,
    geom::{expand_rect, rects_intersect, union_rects},
};

use super::{block::CensusBlock, engine::ApportionmentRecord, target::TargetPolygon};

/// Bbox margin for the relevant-block filter, degrees.
const BBOX_BUFFER_DEG: f64 = 0.01;

/// Default conservation tolerance, percent.
pub const DEFAULT_TOLERANCE_PCT: f64 = 1.0;

/// Conservation outcome for one value column.
#[derive(Debug, Clone)]
pub struct ColumnCheck {
    pub column: String,
    pub source_total: f64,
    pub apportioned_total: f64,
    pub diff_pct: f64,
    pub passed: bool,
}

/// Comparison against an externally known total.
#[derive(Debug, Clone)]
pub struct BenchmarkCheck {
    pub description: String,
    pub column: String,
    pub expected: f64,
    pub actual: f64,
    pub diff_pct: f64,
    pub passed: bool,
}

/// Advisory validation result. Failures are for operator review; they never
/// roll back or block the apportionment output.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub columns: Vec<ColumnCheck>,
    pub benchmarks: Vec<BenchmarkCheck>,
    /// (target_id, column) pairs with a negative apportioned value.
    pub negatives: Vec<(String, String)>,
    /// (target_id, column) pairs missing where the source had data.
    pub missing: Vec<(String, String)>,
    /// Source blocks counted toward the totals (those touching the targets).
    pub relevant_blocks: usize,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.negatives.is_empty()
            && self.missing.is_empty()
            && self.columns.iter().all(|c| c.passed)
            && self.benchmarks.iter().all(|b| b.passed)
    }
}

/// Check apportioned totals against the source, per column.
///
/// Source totals are restricted to blocks that actually intersect a target
/// geometry; comparing against the full regional total would spuriously fail
/// for any target layer covering less than the whole region.
pub fn validate(
    blocks: &[CensusBlock],
    targets: &[TargetPolygon],
    records: &[ApportionmentRecord],
    value_columns: &[String],
    tolerance_pct: f64,
    benchmarks: &[Benchmark],
) -> Result<ValidationReport> {
    let relevant = relevant_blocks(blocks, targets);
    log::info!("validating against {} relevant of {} source blocks", relevant.len(), blocks.len());

    let mut columns = Vec::with_capacity(value_columns.len());
    for column in value_columns {
        let source_total: f64 = relevant.iter().map(|b| b.count(column)).sum();
        let apportioned_total: f64 =
            records.iter().filter_map(|r| r.counts.get(column)).sum();

        let diff_pct = relative_diff_pct(source_total, apportioned_total);
        columns.push(ColumnCheck {
            column: column.clone(),
            source_total,
            apportioned_total,
            diff_pct,
            passed: diff_pct <= tolerance_pct,
        });
    }

    let mut negatives = Vec::new();
    let mut missing = Vec::new();
    for record in records {
        for column in value_columns {
            match record.counts.get(column) {
                Some(value) if *value < 0.0 => {
                    negatives.push((record.target_id.clone(), column.clone()));
                }
                Some(_) => {}
                None => missing.push((record.target_id.clone(), column.clone())),
            }
        }
    }

    let benchmarks = benchmarks
        .iter()
        .map(|benchmark| {
            let actual: f64 =
                records.iter().filter_map(|r| r.counts.get(&benchmark.column)).sum();
            let diff_pct = relative_diff_pct(benchmark.expected, actual);
            BenchmarkCheck {
                description: benchmark.description.clone(),
                column: benchmark.column.clone(),
                expected: benchmark.expected,
                actual,
                diff_pct,
                passed: diff_pct <= benchmark.tolerance_pct,
            }
        })
        .collect();

    Ok(ValidationReport {
        columns,
        benchmarks,
        negatives,
        missing,
        relevant_blocks: relevant.len(),
    })
}

/// Blocks whose geometry intersects any target geometry, bbox-filtered first.
fn relevant_blocks<'a>(
    blocks: &'a [CensusBlock],
    targets: &[TargetPolygon],
) -> Vec<&'a CensusBlock> {
    let Some(layer_bbox) = targets
        .iter()
        .filter_map(|t| t.geometry().bounding_rect())
        .reduce(union_rects)
        .map(|bbox| expand_rect(bbox, BBOX_BUFFER_DEG))
    else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter(|block| {
            block
                .geometry()
                .bounding_rect()
                .is_some_and(|bbox| rects_intersect(&bbox, &layer_bbox))
        })
        .filter(|block| targets.iter().any(|t| block.geometry().intersects(t.geometry())))
        .collect()
}

fn relative_diff_pct(expected: f64, actual: f64) -> f64 {
    if expected == 0.0 {
        if actual == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        ((actual - expected) / expected).abs() * 100.0
    }
}
