use std::path::PathBuf;

use anyhow::{ensure, Result};
use civicmap::{
    apportion, default_value_columns, read_geojson_file, targets_from_layer, write_records_csv,
    CensusBlock,
};

use crate::cli::{ApportionArgs, Cli};

pub fn run(cli: &Cli, args: &ApportionArgs) -> Result<()> {
    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_demographics.csv", args.layer)));

    println!("[apportion] loading census blocks from {}", args.blocks.display());
    let blocks = CensusBlock::from_features(&read_geojson_file(&args.blocks)?)?;
    println!("[apportion] {} blocks", blocks.len());

    let store = super::build_store(cli)?;
    let layer = store.get_or_load(&args.layer)?;
    ensure!(layer.is_loaded(), "target layer {} failed to load: {:?}", args.layer, layer.load_state());
    let targets = targets_from_layer(&layer)?;
    println!("[apportion] {} target features in {}", targets.len(), args.layer);

    let value_columns = default_value_columns();
    let records = apportion(&blocks, &targets, &value_columns)?;

    println!("[apportion] writing {} records to {}", records.len(), out_path.display());
    write_records_csv(&out_path, &records, &value_columns)?;

    if let Some(total) = records
        .iter()
        .map(|r| r.counts.get("pop_total").copied().unwrap_or(0.0))
        .reduce(|a, b| a + b)
    {
        println!("[apportion] total population apportioned: {total:.0}");
    }

    Ok(())
}
