//! Tabular rendering of apportionment output.
//!
//! The external writer contract is simple: every record column must survive
//! losslessly, with counts staying numeric. CSV is the interchange format;
//! identifier columns are pinned to strings so ids with leading zeros are
//! not mangled by type inference on the way back in.

use std::{
    collections::BTreeSet,
    fs::File,
    io::BufWriter,
    path::Path,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use polars::{
    frame::DataFrame,
    io::{SerReader, SerWriter},
    prelude::{Column, CsvReadOptions, CsvReader, CsvWriter, DataType, Field, Schema, SchemaRef},
};
use serde_json::{Map, Value};

use crate::apportion::{ApportionmentRecord, ValidationReport};

/// Render apportionment records to a DataFrame: target_id, one float column
/// per value column, source_block_count, then any descriptive attributes as
/// strings.
pub fn records_to_dataframe(
    records: &[ApportionmentRecord],
    value_columns: &[String],
) -> Result<DataFrame> {
    let ids: Vec<String> = records.iter().map(|r| r.target_id.clone()).collect();
    let block_counts: Vec<u32> = records.iter().map(|r| r.source_block_count as u32).collect();

    let mut columns = vec![Column::new("target_id".into(), ids)];
    for column in value_columns {
        let values: Vec<f64> =
            records.iter().map(|r| r.counts.get(column).copied().unwrap_or(0.0)).collect();
        columns.push(Column::new(column.as_str().into(), values));
    }
    columns.push(Column::new("source_block_count".into(), block_counts));

    for key in descriptive_keys(records, value_columns) {
        let values: Vec<Option<String>> = records
            .iter()
            .map(|r| match r.descriptive_attrs.get(&key) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect();
        columns.push(Column::new(key.as_str().into(), values));
    }

    DataFrame::new(columns).context("[io::table] failed to assemble records DataFrame")
}

/// Writes apportionment records to a CSV file at `path`.
pub fn write_records_csv(
    path: &Path,
    records: &[ApportionmentRecord],
    value_columns: &[String],
) -> Result<()> {
    let mut df = records_to_dataframe(records, value_columns)?;
    let file = File::create(path)
        .with_context(|| format!("[io::table] failed to create {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file)).finish(&mut df)?;
    Ok(())
}

/// Reads apportionment records back from a CSV written by
/// [`write_records_csv`]. Descriptive attributes come back as strings.
pub fn read_records_csv(path: &Path, value_columns: &[String]) -> Result<Vec<ApportionmentRecord>> {
    let file = File::open(path)
        .with_context(|| format!("[io::table] failed to open {}", path.display()))?;
    let options = CsvReadOptions::default().with_schema_overwrite(Some(records_csv_schema()));
    let df = CsvReader::new(file)
        .with_options(options)
        .finish()
        .with_context(|| format!("[io::table] failed to read {}", path.display()))?;
    dataframe_to_records(&df, value_columns)
}

fn dataframe_to_records(
    df: &DataFrame,
    value_columns: &[String],
) -> Result<Vec<ApportionmentRecord>> {
    let ids = df.column("target_id")?.cast(&DataType::String)?;
    let ids = ids.str()?;
    let block_counts = df.column("source_block_count")?.cast(&DataType::UInt32)?;
    let block_counts = block_counts.u32()?;

    let mut count_cols = Vec::with_capacity(value_columns.len());
    for column in value_columns {
        let values = df
            .column(column.as_str())
            .with_context(|| format!("[io::table] missing value column {column}"))?
            .cast(&DataType::Float64)?;
        count_cols.push((column.clone(), values));
    }

    let reserved: BTreeSet<&str> = ["target_id", "source_block_count"]
        .into_iter()
        .chain(value_columns.iter().map(String::as_str))
        .collect();
    let mut attr_cols = Vec::new();
    for name in df.get_column_names() {
        if !reserved.contains(name.as_str()) {
            attr_cols.push((name.to_string(), df.column(name.as_str())?.cast(&DataType::String)?));
        }
    }

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let target_id = ids
            .get(row)
            .ok_or_else(|| anyhow!("[io::table] null target_id in row {row}"))?
            .to_string();

        let mut counts = std::collections::BTreeMap::new();
        for (column, values) in &count_cols {
            counts.insert(column.clone(), values.f64()?.get(row).unwrap_or(0.0));
        }

        let mut descriptive_attrs = Map::new();
        for (name, values) in &attr_cols {
            let value = match values.str()?.get(row) {
                Some(s) => Value::String(s.to_string()),
                None => Value::Null,
            };
            descriptive_attrs.insert(name.clone(), value);
        }

        records.push(ApportionmentRecord {
            target_id,
            counts,
            source_block_count: block_counts.get(row).unwrap_or(0) as usize,
            descriptive_attrs,
        });
    }
    Ok(records)
}

/// Render a validation report as a per-column table.
pub fn report_to_dataframe(report: &ValidationReport) -> Result<DataFrame> {
    let columns: Vec<String> = report.columns.iter().map(|c| c.column.clone()).collect();
    let source: Vec<f64> = report.columns.iter().map(|c| c.source_total).collect();
    let apportioned: Vec<f64> = report.columns.iter().map(|c| c.apportioned_total).collect();
    let diff: Vec<f64> = report.columns.iter().map(|c| c.diff_pct).collect();
    let passed: Vec<bool> = report.columns.iter().map(|c| c.passed).collect();

    DataFrame::new(vec![
        Column::new("column".into(), columns),
        Column::new("source_total".into(), source),
        Column::new("apportioned_total".into(), apportioned),
        Column::new("diff_pct".into(), diff),
        Column::new("passed".into(), passed),
    ])
    .context("[io::table] failed to assemble report DataFrame")
}

/// Writes a validation report's per-column table to a CSV file.
pub fn write_report_csv(path: &Path, report: &ValidationReport) -> Result<()> {
    let mut df = report_to_dataframe(report)?;
    let file = File::create(path)
        .with_context(|| format!("[io::table] failed to create {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file)).finish(&mut df)?;
    Ok(())
}

/// Sorted union of descriptive attribute keys, minus reserved column names.
fn descriptive_keys(records: &[ApportionmentRecord], value_columns: &[String]) -> Vec<String> {
    let reserved: BTreeSet<&str> = ["target_id", "source_block_count"]
        .into_iter()
        .chain(value_columns.iter().map(String::as_str))
        .collect();

    records
        .iter()
        .flat_map(|r| r.descriptive_attrs.keys())
        .filter(|key| !reserved.contains(key.as_str()))
        .map(String::clone)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Forces identifier columns to strings so leading zeros survive.
fn records_csv_schema() -> SchemaRef {
    Arc::new(Schema::from_iter([Field::new("target_id".into(), DataType::String)]))
}
