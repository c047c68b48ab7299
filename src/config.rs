//! Typed layer and region configuration.
//!
//! Deployments may override the built-in catalog with a JSON document; every
//! field is validated once at startup rather than checked at each use site.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// One boundary layer's query configuration: where it comes from and which
/// fields feed the point-lookup response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Unique layer name, also the cache key.
    pub name: String,
    /// GeoJSON file name under the source directory or base URL.
    pub geojson_file: String,
    /// Key under which this layer reports in a query result.
    pub response_key: String,
    /// Attribute holding the display name of a feature.
    pub name_field: String,
    /// Attribute holding a unique feature identifier, when the source has one.
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Rough regional bounding box for soft validation of query points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegionBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl RegionBounds {
    /// Los Angeles County, loosely.
    pub fn los_angeles() -> Self {
        Self { min_lon: -119.0, max_lon: -117.6, min_lat: 33.7, max_lat: 34.8 }
    }

    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.min_lat <= lat && lat <= self.max_lat && self.min_lon <= lon && lon <= self.max_lon
    }
}

/// A known external population total for a well-known layer, checked with its
/// own tolerance because independently-sourced boundaries rarely match census
/// geography exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    /// Layer the benchmark applies to.
    pub layer: String,
    /// Value column being checked.
    pub column: String,
    pub expected: f64,
    pub tolerance_pct: f64,
    pub description: String,
}

/// The shipped boundary-layer catalog.
pub fn default_layers() -> Vec<LayerConfig> {
    [
        ("la_neighborhoods_comprehensive", "neighborhood", "name", Some("slug"), "LA County neighborhood (comprehensive)"),
        ("la_county_cities", "city", "city_name", Some("city_name"), "City or unincorporated area"),
        ("lapd_divisions", "lapd_division", "aprec", Some("prec"), "LAPD division"),
        ("lapd_bureaus", "lapd_bureau", "name", Some("bureau"), "LAPD bureau"),
        ("lafd_station_boundaries", "lafd_station", "name", Some("precinctid"), "LA Fire Department station (city)"),
        ("la_city_council_districts", "council_district", "district_name", Some("district"), "LA City Council district"),
        ("la_county_school_districts", "school_district", "label", Some("abbr"), "School district"),
        ("la_county_election_precincts", "election_precinct", "precinct", Some("precinct"), "Election precinct"),
        ("la_county_boundary", "county", "name", None, "LA County boundary"),
        ("la_city_boundary", "la_city", "name", None, "City of Los Angeles boundary"),
    ]
    .into_iter()
    .map(|(name, response_key, name_field, id_field, description)| LayerConfig {
        name: name.to_string(),
        geojson_file: format!("{name}.geojson"),
        response_key: response_key.to_string(),
        name_field: name_field.to_string(),
        id_field: id_field.map(str::to_string),
        description: description.to_string(),
    })
    .collect()
}

/// Demographic columns apportioned by default (2020 census vintage).
pub fn default_value_columns() -> Vec<String> {
    ["pop_total", "pop_hispanic", "pop_white", "pop_black", "pop_asian", "housing_total", "housing_occupied"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Known population benchmarks (2020 census).
pub fn default_benchmarks() -> Vec<Benchmark> {
    vec![
        Benchmark {
            layer: "la_county_boundary".to_string(),
            column: "pop_total".to_string(),
            expected: 10_014_009.0,
            tolerance_pct: 0.1,
            description: "LA County".to_string(),
        },
        Benchmark {
            layer: "la_city_boundary".to_string(),
            column: "pop_total".to_string(),
            expected: 3_898_747.0,
            // The published city boundary extends slightly beyond the census
            // definition, so the band is wider.
            tolerance_pct: 2.5,
            description: "City of Los Angeles".to_string(),
        },
    ]
}

/// Load a layer catalog from a JSON array of [`LayerConfig`] records.
pub fn load_layer_configs(path: &Path) -> Result<Vec<LayerConfig>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open layer config: {}", path.display()))?;
    let configs: Vec<LayerConfig> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse layer config: {}", path.display()))?;
    validate_layer_configs(&configs)?;
    Ok(configs)
}

/// Startup validation: names and response keys must be unique and non-empty.
pub fn validate_layer_configs(configs: &[LayerConfig]) -> Result<()> {
    let mut names = std::collections::HashSet::new();
    let mut keys = std::collections::HashSet::new();

    for config in configs {
        ensure!(!config.name.is_empty(), "layer with empty name");
        ensure!(!config.geojson_file.is_empty(), "layer {} has empty geojson_file", config.name);
        ensure!(!config.response_key.is_empty(), "layer {} has empty response_key", config.name);
        ensure!(!config.name_field.is_empty(), "layer {} has empty name_field", config.name);
        if let Some(id_field) = &config.id_field {
            ensure!(!id_field.is_empty(), "layer {} has empty id_field", config.name);
        }
        ensure!(names.insert(config.name.as_str()), "duplicate layer name: {}", config.name);
        ensure!(
            keys.insert(config.response_key.as_str()),
            "duplicate response key: {}",
            config.response_key
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let layers = default_layers();
        assert!(!layers.is_empty());
        validate_layer_configs(&layers).unwrap();
    }

    #[test]
    fn duplicate_response_key_is_rejected() {
        let mut layers = default_layers();
        let mut dup = layers[0].clone();
        dup.name = "another_name".to_string();
        layers.push(dup);
        assert!(validate_layer_configs(&layers).is_err());
    }

    #[test]
    fn region_bounds_contain_downtown() {
        let bounds = RegionBounds::los_angeles();
        assert!(bounds.contains(34.05, -118.25));
        assert!(!bounds.contains(40.7, -74.0));
    }

    #[test]
    fn layer_config_round_trips_through_json() {
        let layers = default_layers();
        let json = serde_json::to_string(&layers).unwrap();
        let back: Vec<LayerConfig> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), layers.len());
        assert_eq!(back[0].name, layers[0].name);
        assert_eq!(back[8].id_field, None);
    }
}
