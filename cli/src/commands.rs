pub mod apportion;
pub mod lookup;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;
use civicmap::{
    default_layers, load_layer_configs, GeoJsonDirSource, HttpSource, LayerSource, LayerStore,
};

use crate::cli::Cli;

/// Build the layer store from the global options: catalog override, then
/// HTTP or filesystem source.
pub fn build_store(cli: &Cli) -> Result<Arc<LayerStore>> {
    let configs = match &cli.config {
        Some(path) => load_layer_configs(path)?,
        None => default_layers(),
    };

    let source: Box<dyn LayerSource> = match &cli.base_url {
        Some(base_url) => Box::new(HttpSource::new(base_url.clone())?),
        None => Box::new(GeoJsonDirSource::new(cli.data_dir.clone())),
    };

    Ok(Arc::new(LayerStore::new(configs, source)?))
}
