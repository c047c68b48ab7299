#![doc = "Civicmap public API"]
mod apportion;
mod config;
mod geom;
mod io;
mod layer;
mod lookup;

#[cfg(feature = "download")]
mod download;

#[doc(inline)]
pub use config::{
    default_benchmarks, default_layers, default_value_columns, load_layer_configs,
    validate_layer_configs, Benchmark, LayerConfig, RegionBounds,
};

#[doc(inline)]
pub use layer::{Feature, GeoJsonDirSource, Layer, LayerSource, LayerStore, LoadState};

#[doc(inline)]
pub use lookup::{validate_coordinates, LookupEngine, LookupOutcome, QueryEcho, QueryResult};

#[doc(inline)]
pub use apportion::{
    apportion, targets_from_layer, validate, ApportionmentRecord, BenchmarkCheck, CensusBlock,
    ColumnCheck, TargetPolygon, ValidationReport, BLOCK_ID_FIELD, DEFAULT_TOLERANCE_PCT,
};

pub use io::geojson::{parse_feature_collection, read_geojson_file};
pub use io::table::{
    read_records_csv, records_to_dataframe, report_to_dataframe, write_records_csv,
    write_report_csv,
};

#[cfg(feature = "download")]
#[doc(inline)]
pub use download::HttpSource;
