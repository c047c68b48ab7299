// End-to-end apportionment pipeline: GeoJSON blocks in, area-weighted
// records out, conservation validated, CSV round-tripped.

use serde_json::json;

use civicmap::{
    apportion, parse_feature_collection, read_records_csv, targets_from_layer, validate,
    write_records_csv, CensusBlock, Layer, LayerConfig, DEFAULT_TOLERANCE_PCT,
};

fn block_doc() -> serde_json::Value {
    // Two adjacent 0.1-degree blocks near downtown LA, 100 people each.
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-118.4, 34.0], [-118.3, 34.0], [-118.3, 34.1], [-118.4, 34.1], [-118.4, 34.0]
                    ]]
                },
                "properties": {"block_geoid": "060370001001000", "pop_total": 100, "housing_total": 40}
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-118.3, 34.0], [-118.2, 34.0], [-118.2, 34.1], [-118.3, 34.1], [-118.3, 34.0]
                    ]]
                },
                "properties": {"block_geoid": "060370001001001", "pop_total": 100, "housing_total": 60}
            }
        ]
    })
}

fn target_layer(features: Vec<serde_json::Value>) -> Layer {
    let config = LayerConfig {
        name: "districts".to_string(),
        geojson_file: "districts.geojson".to_string(),
        response_key: "district".to_string(),
        name_field: "name".to_string(),
        id_field: Some("district".to_string()),
        description: String::new(),
    };
    let doc = json!({"type": "FeatureCollection", "features": features});
    Layer::loaded(&config, parse_feature_collection(&doc).unwrap())
}

fn rectangle(x0: f64, x1: f64, props: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [x0, 34.0], [x1, 34.0], [x1, 34.1], [x0, 34.1], [x0, 34.0]
            ]]
        },
        "properties": props
    })
}

fn columns() -> Vec<String> {
    vec!["pop_total".to_string(), "housing_total".to_string()]
}

#[test]
fn half_block_plus_full_block_yields_150() {
    let blocks = CensusBlock::from_features(&parse_feature_collection(&block_doc()).unwrap()).unwrap();
    // Half of the first block plus all of the second.
    let layer = target_layer(vec![rectangle(-118.35, -118.2, json!({"district": "d1", "name": "East"}))]);
    let targets = targets_from_layer(&layer).unwrap();

    let records = apportion(&blocks, &targets, &columns()).unwrap();
    assert_eq!(records.len(), 1);
    approx::assert_relative_eq!(records[0].counts["pop_total"], 150.0, epsilon = 1e-3);
    assert_eq!(records[0].source_block_count, 2);
    assert_eq!(records[0].descriptive_attrs["name"], json!("East"));
}

#[test]
fn tiling_targets_conserve_every_column() {
    let blocks = CensusBlock::from_features(&parse_feature_collection(&block_doc()).unwrap()).unwrap();
    let layer = target_layer(vec![
        rectangle(-118.4, -118.33, json!({"district": "west", "name": "West"})),
        rectangle(-118.33, -118.2, json!({"district": "east", "name": "East"})),
    ]);
    let targets = targets_from_layer(&layer).unwrap();

    let records = apportion(&blocks, &targets, &columns()).unwrap();
    for (column, expected) in [("pop_total", 200.0), ("housing_total", 100.0)] {
        let total: f64 = records.iter().map(|r| r.counts[column]).sum();
        assert!((total - expected).abs() < 1e-6, "{column}: {total}");
    }

    let report =
        validate(&blocks, &targets, &records, &columns(), DEFAULT_TOLERANCE_PCT, &[]).unwrap();
    assert!(report.passed(), "report: {report:?}");
}

#[test]
fn disjoint_target_still_gets_a_zero_record() {
    let blocks = CensusBlock::from_features(&parse_feature_collection(&block_doc()).unwrap()).unwrap();
    let layer = target_layer(vec![
        rectangle(-118.4, -118.2, json!({"district": "covered", "name": "Covered"})),
        rectangle(-118.1, -118.0, json!({"district": "empty", "name": "Empty"})),
    ]);
    let targets = targets_from_layer(&layer).unwrap();

    let records = apportion(&blocks, &targets, &columns()).unwrap();
    assert_eq!(records.len(), 2);

    let empty = records.iter().find(|r| r.target_id == "empty").unwrap();
    assert_eq!(empty.source_block_count, 0);
    assert!(empty.counts.values().all(|&v| v == 0.0));
}

#[test]
fn all_counts_are_non_negative() {
    let blocks = CensusBlock::from_features(&parse_feature_collection(&block_doc()).unwrap()).unwrap();
    let layer = target_layer(vec![
        rectangle(-118.4, -118.31, json!({"district": "a", "name": "A"})),
        rectangle(-118.31, -118.27, json!({"district": "b", "name": "B"})),
        rectangle(-118.27, -118.2, json!({"district": "c", "name": "C"})),
    ]);
    let targets = targets_from_layer(&layer).unwrap();

    let records = apportion(&blocks, &targets, &columns()).unwrap();
    for record in &records {
        for (column, value) in &record.counts {
            assert!(*value >= 0.0, "{column} negative in {}", record.target_id);
        }
    }
}

#[test]
fn records_survive_the_csv_writer_contract() {
    let blocks = CensusBlock::from_features(&parse_feature_collection(&block_doc()).unwrap()).unwrap();
    let layer = target_layer(vec![rectangle(-118.4, -118.2, json!({"district": "d1", "name": "All"}))]);
    let targets = targets_from_layer(&layer).unwrap();
    let records = apportion(&blocks, &targets, &columns()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("districts_demographics.csv");
    write_records_csv(&path, &records, &columns()).unwrap();
    let back = read_records_csv(&path, &columns()).unwrap();

    assert_eq!(back.len(), records.len());
    assert_eq!(back[0].target_id, records[0].target_id);
    assert_eq!(back[0].source_block_count, records[0].source_block_count);
    for column in columns() {
        assert!(
            (back[0].counts[&column] - records[0].counts[&column]).abs() < 1e-9,
            "{column} drifted through CSV"
        );
    }

    // Validation still passes on the re-read records.
    let report =
        validate(&blocks, &targets, &back, &columns(), DEFAULT_TOLERANCE_PCT, &[]).unwrap();
    assert!(report.passed(), "report: {report:?}");
}
