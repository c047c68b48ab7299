use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use anyhow::{bail, Result};

use crate::{
    config::{validate_layer_configs, LayerConfig},
    layer::{Layer, LayerSource},
};

/// Process-lifetime cache of loaded layers.
///
/// The first `get_or_load` for a name fetches from the injected source and
/// caches the outcome, success or failure, for the rest of the process; later
/// calls return the cached layer without touching the source. The mutex only
/// guards cell creation. The per-layer `OnceLock` gives the load-once
/// guarantee under concurrent first access: one caller runs the fetch, the
/// rest block on the cell and observe the same result. After that transition
/// reads are plain `Arc` clones with no contention.
pub struct LayerStore {
    configs: Vec<LayerConfig>,
    source: Box<dyn LayerSource>,
    cells: Mutex<HashMap<String, Arc<OnceLock<Arc<Layer>>>>>,
}

impl LayerStore {
    /// Build a store over a validated layer catalog. Nothing is fetched until
    /// first access ("cold start").
    pub fn new(configs: Vec<LayerConfig>, source: Box<dyn LayerSource>) -> Result<Self> {
        validate_layer_configs(&configs)?;
        Ok(Self { configs, source, cells: Mutex::new(HashMap::new()) })
    }

    /// The configured layer catalog, in configuration order.
    #[inline] pub fn configs(&self) -> &[LayerConfig] { &self.configs }

    /// Fetch-or-return a layer by name. Errors only for names absent from the
    /// catalog; a failed fetch yields a cached `Failed` layer, not an error.
    pub fn get_or_load(&self, name: &str) -> Result<Arc<Layer>> {
        let Some(config) = self.configs.iter().find(|c| c.name == name) else {
            bail!("unknown layer: {name}");
        };

        let cell = {
            let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
            cells.entry(name.to_string()).or_default().clone()
        };

        let layer = cell.get_or_init(|| {
            log::info!("loading layer {}", config.name);
            match self.source.fetch(config) {
                Ok(features) => {
                    log::info!("loaded {} features for {}", features.len(), config.name);
                    Arc::new(Layer::loaded(config, features))
                }
                Err(e) => {
                    log::warn!("failed to load layer {}: {e:#}", config.name);
                    Arc::new(Layer::failed(config, format!("{e:#}")))
                }
            }
        });
        Ok(layer.clone())
    }

    /// Eagerly load every configured layer ("warm start").
    pub fn load_all(&self) {
        for config in &self.configs {
            // Catalog names always resolve; ignore the per-layer outcome here.
            let _ = self.get_or_load(&config.name);
        }
    }
}
