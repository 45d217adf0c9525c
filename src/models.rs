use serde::{Deserialize, Serialize};

use crate::combine::Outcome;

/// Per-row metadata carried alongside the numeric feature columns
///
/// Identifiers and ordering keys are never null in the source table; grid and
/// qualifying positions and the ground-truth targets are optional because a
/// future-race export may not have them yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub result_id: i64,
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub circuit_id: i64,
    pub year: i32,
    pub round: i32,
    pub race_date: String,
    pub grid_position: Option<f64>,
    pub qualifying_position: Option<f64>,
    pub target_top_10: Option<bool>,
    pub target_dnf: Option<bool>,
}

/// One scored (race, driver) observation
///
/// Probability columns are `None` for an axis whose model was absent; the
/// boolean prediction columns are derived from `final_prediction`, not from
/// the raw per-model thresholds, so the three-way outcome and the booleans
/// can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub result_id: i64,
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub circuit_id: i64,
    pub year: i32,
    pub round: i32,
    pub race_date: String,
    pub driver_name: String,
    pub race_name: String,
    pub circuit_name: String,
    pub grid_position: Option<f64>,
    pub qualifying_position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top10_probability: Option<f64>,
    pub top10_prediction: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnf_probability: Option<f64>,
    pub dnf_prediction: bool,
    pub final_prediction: Outcome,
    pub target_top_10: Option<bool>,
    pub target_dnf: Option<bool>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub top10_model_loaded: bool,
    pub dnf_model_loaded: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Query parameters for the prediction endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictQuery {
    pub year: Option<i32>,
    pub race_id: Option<i64>,
}
