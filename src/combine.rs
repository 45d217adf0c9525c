//! Outcome assembly from the two classifier signals
//!
//! The top-10 and DNF classifiers are trained independently, so their raw
//! threshold outputs can both fire for the same driver. The combiner resolves
//! that into one mutually exclusive outcome per row: a predicted retirement
//! overrides a positive top-10 signal, because a driver who does not finish
//! cannot also finish in the top ten.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;
use crate::models::{PredictionRecord, ResultRow};

/// Decision threshold shared by both axes; strictly exceeded, never met.
pub const PROBABILITY_THRESHOLD: f64 = 0.5;

/// Mutually exclusive race outcome for one driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "Top-10")]
    Top10,
    #[serde(rename = "DNF")]
    Dnf,
    #[serde(rename = "Outside Top-10")]
    OutsideTop10,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Top10 => "Top-10",
            Outcome::Dnf => "DNF",
            Outcome::OutsideTop10 => "Outside Top-10",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-row probability vectors from the two classifiers
///
/// Either axis may be absent when its model was not available; the decision
/// then treats that axis as probability zero.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    pub top10: Option<Vec<f64>>,
    pub dnf: Option<Vec<f64>>,
}

/// Decide the outcome for one row, DNF precedence first
///
/// Evaluated in order with strict inequality: DNF above threshold wins even
/// against a stronger top-10 signal; a probability of exactly 0.5 on either
/// axis falls through.
pub fn decide(top10_probability: f64, dnf_probability: f64) -> Outcome {
    if dnf_probability > PROBABILITY_THRESHOLD {
        Outcome::Dnf
    } else if top10_probability > PROBABILITY_THRESHOLD {
        Outcome::Top10
    } else {
        Outcome::OutsideTop10
    }
}

/// Combine classifier scores with row metadata into prediction records
///
/// Produces a new record set; the input rows are not mutated. The boolean
/// prediction columns are derived from the final outcome so they always agree
/// with it. Display names start as fallback labels; the orchestrator swaps in
/// dimension names when available.
pub fn combine_scores(
    rows: &[ResultRow],
    scores: &ScoreSet,
) -> Result<Vec<PredictionRecord>, PipelineError> {
    if let Some(top10) = &scores.top10 {
        if top10.len() != rows.len() {
            return Err(PipelineError::Model(format!(
                "top10 score vector has {} entries for {} rows",
                top10.len(),
                rows.len()
            )));
        }
    }
    if let Some(dnf) = &scores.dnf {
        if dnf.len() != rows.len() {
            return Err(PipelineError::Model(format!(
                "dnf score vector has {} entries for {} rows",
                dnf.len(),
                rows.len()
            )));
        }
    }

    let records = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let top10_probability = scores.top10.as_ref().map(|v| v[i]);
            let dnf_probability = scores.dnf.as_ref().map(|v| v[i]);

            let final_prediction = decide(
                top10_probability.unwrap_or(0.0),
                dnf_probability.unwrap_or(0.0),
            );

            PredictionRecord {
                result_id: row.result_id,
                race_id: row.race_id,
                driver_id: row.driver_id,
                constructor_id: row.constructor_id,
                circuit_id: row.circuit_id,
                year: row.year,
                round: row.round,
                race_date: row.race_date.clone(),
                driver_name: row.driver_id.to_string(),
                race_name: format!("Race {}", row.race_id),
                circuit_name: format!("Circuit {}", row.circuit_id),
                grid_position: row.grid_position,
                qualifying_position: row.qualifying_position,
                top10_probability,
                top10_prediction: final_prediction == Outcome::Top10,
                dnf_probability,
                dnf_prediction: final_prediction == Outcome::Dnf,
                final_prediction,
                target_top_10: row.target_top_10,
                target_dnf: row.target_dnf,
            }
        })
        .collect();

    Ok(records)
}
