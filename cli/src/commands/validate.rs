use std::path::PathBuf;

use anyhow::{ensure, Result};
use civicmap::{
    default_benchmarks, default_value_columns, read_geojson_file, read_records_csv,
    targets_from_layer, validate, write_report_csv, CensusBlock,
};

use crate::cli::{Cli, ValidateArgs};

pub fn run(cli: &Cli, args: &ValidateArgs) -> Result<()> {
    let demographics = args
        .demographics
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_demographics.csv", args.layer)));

    println!("[validate] loading census blocks from {}", args.blocks.display());
    let blocks = CensusBlock::from_features(&read_geojson_file(&args.blocks)?)?;

    let store = super::build_store(cli)?;
    let layer = store.get_or_load(&args.layer)?;
    ensure!(layer.is_loaded(), "target layer {} failed to load: {:?}", args.layer, layer.load_state());
    let targets = targets_from_layer(&layer)?;

    println!("[validate] reading apportionment from {}", demographics.display());
    let value_columns = default_value_columns();
    let records = read_records_csv(&demographics, &value_columns)?;

    let benchmarks: Vec<_> = default_benchmarks()
        .into_iter()
        .filter(|b| b.layer == args.layer)
        .collect();

    let report = validate(&blocks, &targets, &records, &value_columns, args.tolerance, &benchmarks)?;

    for check in &report.columns {
        let mark = if check.passed { "ok" } else { "FAIL" };
        println!(
            "[validate] {:>4} {}: source {:.0}, apportioned {:.0}, diff {:.2}%",
            mark, check.column, check.source_total, check.apportioned_total, check.diff_pct
        );
    }
    for check in &report.benchmarks {
        let mark = if check.passed { "ok" } else { "FAIL" };
        println!(
            "[validate] {:>4} benchmark {}: expected {:.0}, got {:.0}, diff {:.2}%",
            mark, check.description, check.expected, check.actual, check.diff_pct
        );
    }
    if !report.negatives.is_empty() {
        println!("[validate] FAIL {} negative values", report.negatives.len());
    }
    if !report.missing.is_empty() {
        println!("[validate] FAIL {} missing values", report.missing.len());
    }

    if let Some(report_path) = &args.report_output {
        write_report_csv(report_path, &report)?;
        println!("[validate] report written to {}", report_path.display());
    }

    if report.passed() {
        println!("[validate] PASSED ({} relevant blocks)", report.relevant_blocks);
        Ok(())
    } else {
        println!("[validate] FAILED ({} relevant blocks)", report.relevant_blocks);
        std::process::exit(1);
    }
}
