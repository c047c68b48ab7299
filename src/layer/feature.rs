use geo::Geometry;
use serde_json::{Map, Value};

/// One geometry plus its attribute map within a layer. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Feature {
    geometry: Geometry<f64>,
    attributes: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>, attributes: Map<String, Value>) -> Self {
        Self { geometry, attributes }
    }

    #[inline] pub fn geometry(&self) -> &Geometry<f64> { &self.geometry }

    /// Decompose into geometry and attributes (load-time repair needs both).
    #[inline]
    pub fn into_parts(self) -> (Geometry<f64>, Map<String, Value>) {
        (self.geometry, self.attributes)
    }

    #[inline] pub fn attributes(&self) -> &Map<String, Value> { &self.attributes }

    #[inline]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// An attribute as a display string: strings pass through, numbers and
    /// booleans are stringified, null and missing values are `None`.
    pub fn attribute_string(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
