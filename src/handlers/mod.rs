//! HTTP handlers for the prediction API

pub mod health;
pub mod predict;

use std::sync::Mutex;

use crate::data::{DimensionTables, FeatureTable};
use crate::predictor::ModelSet;

/// Application state shared across handlers
///
/// The feature table and dimension lookups are read-only snapshots cached for
/// the process lifetime; refreshing the underlying files requires a restart.
/// The model sessions sit behind a mutex because inference needs mutable
/// access.
pub struct AppState {
    pub table: FeatureTable,
    pub models: Mutex<ModelSet>,
    pub dims: DimensionTables,
}
