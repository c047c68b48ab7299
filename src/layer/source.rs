use std::path::PathBuf;

use anyhow::Result;

use crate::{config::LayerConfig, io::geojson, layer::Feature};

/// Where layer features come from. The store calls `fetch` at most once per
/// layer name per process lifetime; implementations need no caching of their
/// own.
pub trait LayerSource: Send + Sync {
    fn fetch(&self, config: &LayerConfig) -> Result<Vec<Feature>>;
}

/// Filesystem source: a directory of `<name>.geojson` files.
pub struct GeoJsonDirSource {
    dir: PathBuf,
}

impl GeoJsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LayerSource for GeoJsonDirSource {
    fn fetch(&self, config: &LayerConfig) -> Result<Vec<Feature>> {
        geojson::read_geojson_file(&self.dir.join(&config.geojson_file))
    }
}
