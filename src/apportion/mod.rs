mod block;
mod engine;
mod target;
mod validate;

pub use block::{CensusBlock, BLOCK_ID_FIELD};
pub use engine::{apportion, ApportionmentRecord};
pub use target::{targets_from_layer, TargetPolygon};
pub use validate::{
    validate, BenchmarkCheck, ColumnCheck, ValidationReport, DEFAULT_TOLERANCE_PCT,
};
