//! Racecast - Formula 1 race outcome prediction
//!
//! This library provides:
//! - Temporal train/validation/test splitting of a pre-race feature table
//! - Leakage-safe feature column classification (allow-by-default deny list)
//! - ONNX-backed scoring for the top-10 and DNF binary classifiers
//! - Assembly of the two probability signals into one mutually exclusive
//!   outcome per driver
//!
//! # Example
//!
//! ```no_run
//! use racecast::columns::get_feature_columns;
//! use racecast::data::FeatureTable;
//! use racecast::split::SplitConfig;
//!
//! let table = FeatureTable::load_csv("data/features/fct_features_pre_race.csv").unwrap();
//! let split = SplitConfig::new(2016, vec![2017, 2018], vec![2019, 2020]).unwrap();
//! let splits = split.partition(&table).unwrap();
//!
//! let (feature_cols, target_cols) = get_feature_columns(&splits.train.column_names());
//! println!("{} features, targets {:?}", feature_cols.len(), target_cols);
//! ```

pub mod columns;
pub mod combine;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod report;
pub mod split;

// API-specific modules (only available with api feature)
#[cfg(feature = "api")]
pub mod handlers;

// Re-export commonly used types
pub use combine::{Outcome, ScoreSet};
pub use config::AppConfig;
pub use data::{DimensionTables, FeatureMatrix, FeatureTable};
pub use error::PipelineError;
pub use models::{PredictionRecord, ResultRow};
pub use predictor::{ModelSet, OnnxScorer, Scorer};
pub use split::{SplitConfig, SplitSet};
