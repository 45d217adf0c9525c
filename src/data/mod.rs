//! Feature table access and dimension lookups

pub mod dimensions;
pub mod feature_store;

// Re-export commonly used types
pub use dimensions::DimensionTables;
pub use feature_store::{FeatureMatrix, FeatureTable};
