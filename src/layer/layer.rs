use crate::{config::LayerConfig, geom::repair_geometry, layer::Feature};

/// Terminal load outcome for a layer. A failed load is cached like a
/// successful one so repeated queries don't re-trigger fetch attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loaded,
    Failed(String),
}

/// A named collection of features sharing one administrative meaning, plus
/// the field mapping used to answer point queries against it.
///
/// Feature order is fixed at load time; the multiple-match tie-break depends
/// on it and concurrent readers must never observe a reordering.
#[derive(Debug)]
pub struct Layer {
    name: String,
    response_key: String,
    name_field: String,
    id_field: Option<String>,
    features: Vec<Feature>,
    load_state: LoadState,
}

impl Layer {
    /// Build a loaded layer, running the one-pass validity repair on every
    /// polygonal feature.
    pub fn loaded(config: &LayerConfig, features: Vec<Feature>) -> Self {
        let features = features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| {
                let label = format!("{}[{idx}]", config.name);
                let (geometry, attributes) = feature.into_parts();
                Feature::new(repair_geometry(geometry, &label), attributes)
            })
            .collect();

        Self {
            name: config.name.clone(),
            response_key: config.response_key.clone(),
            name_field: config.name_field.clone(),
            id_field: config.id_field.clone(),
            features,
            load_state: LoadState::Loaded,
        }
    }

    /// Record a load failure for the layer. Queries against it answer `None`.
    pub fn failed(config: &LayerConfig, reason: String) -> Self {
        Self {
            name: config.name.clone(),
            response_key: config.response_key.clone(),
            name_field: config.name_field.clone(),
            id_field: config.id_field.clone(),
            features: Vec::new(),
            load_state: LoadState::Failed(reason),
        }
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn response_key(&self) -> &str { &self.response_key }

    #[inline] pub fn name_field(&self) -> &str { &self.name_field }

    #[inline] pub fn id_field(&self) -> Option<&str> { self.id_field.as_deref() }

    /// Features in their fixed load order.
    #[inline] pub fn features(&self) -> &[Feature] { &self.features }

    #[inline] pub fn load_state(&self) -> &LoadState { &self.load_state }

    #[inline] pub fn is_loaded(&self) -> bool { self.load_state == LoadState::Loaded }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};
    use serde_json::Map;

    fn config() -> LayerConfig {
        LayerConfig {
            name: "test_layer".to_string(),
            geojson_file: "test_layer.geojson".to_string(),
            response_key: "test".to_string(),
            name_field: "name".to_string(),
            id_field: None,
            description: String::new(),
        }
    }

    #[test]
    fn loaded_layer_keeps_feature_order() {
        let features = (0..3)
            .map(|i| {
                let mut attrs = Map::new();
                attrs.insert("name".to_string(), serde_json::json!(format!("f{i}")));
                Feature::new(
                    Geometry::Polygon(polygon![
                        (x: i as f64, y: 0.0),
                        (x: i as f64 + 1.0, y: 0.0),
                        (x: i as f64 + 1.0, y: 1.0),
                        (x: i as f64, y: 1.0),
                    ]),
                    attrs,
                )
            })
            .collect();

        let layer = Layer::loaded(&config(), features);
        assert!(layer.is_loaded());
        assert_eq!(layer.len(), 3);
        let names: Vec<_> = layer
            .features()
            .iter()
            .map(|f| f.attribute_string("name").unwrap())
            .collect();
        assert_eq!(names, vec!["f0", "f1", "f2"]);
    }

    #[test]
    fn failed_layer_has_no_features() {
        let layer = Layer::failed(&config(), "fetch timed out".to_string());
        assert!(!layer.is_loaded());
        assert!(layer.is_empty());
        assert_eq!(layer.load_state(), &LoadState::Failed("fetch timed out".to_string()));
    }
}
