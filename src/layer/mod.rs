mod feature;
mod layer;
mod source;
mod store;

pub use feature::Feature;
pub use layer::{Layer, LoadState};
pub use source::{GeoJsonDirSource, LayerSource};
pub use store::LayerStore;
