//! Prediction evaluation against ground truth
//!
//! Accuracy of the derived boolean predictions, overall and per year. Rows
//! without a ground-truth label for an axis are skipped on that axis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::PredictionRecord;

/// Accuracy metrics for a prediction batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub rows: usize,
    pub top10_accuracy: Option<f64>,
    pub dnf_accuracy: Option<f64>,
    pub top10_accuracy_by_year: BTreeMap<i32, f64>,
    pub dnf_accuracy_by_year: BTreeMap<i32, f64>,
}

/// Evaluate prediction accuracy where ground truth is available
pub fn evaluate(records: &[PredictionRecord]) -> EvalMetrics {
    let top10: Vec<(i32, bool)> = records
        .iter()
        .filter_map(|r| {
            r.target_top_10
                .map(|target| (r.year, r.top10_prediction == target))
        })
        .collect();
    let dnf: Vec<(i32, bool)> = records
        .iter()
        .filter_map(|r| r.target_dnf.map(|target| (r.year, r.dnf_prediction == target)))
        .collect();

    EvalMetrics {
        rows: records.len(),
        top10_accuracy: accuracy(&top10),
        dnf_accuracy: accuracy(&dnf),
        top10_accuracy_by_year: accuracy_by_year(&top10),
        dnf_accuracy_by_year: accuracy_by_year(&dnf),
    }
}

fn accuracy(outcomes: &[(i32, bool)]) -> Option<f64> {
    if outcomes.is_empty() {
        return None;
    }
    let correct = outcomes.iter().filter(|(_, hit)| *hit).count();
    Some(correct as f64 / outcomes.len() as f64)
}

fn accuracy_by_year(outcomes: &[(i32, bool)]) -> BTreeMap<i32, f64> {
    let mut counts: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for (year, hit) in outcomes {
        let entry = counts.entry(*year).or_default();
        entry.1 += 1;
        if *hit {
            entry.0 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(year, (correct, total))| (year, correct as f64 / total as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::Outcome;

    fn record(
        year: i32,
        outcome: Outcome,
        target_top_10: Option<bool>,
        target_dnf: Option<bool>,
    ) -> PredictionRecord {
        PredictionRecord {
            result_id: 0,
            race_id: 10,
            driver_id: 44,
            constructor_id: 6,
            circuit_id: 1,
            year,
            round: 1,
            race_date: String::new(),
            driver_name: String::new(),
            race_name: String::new(),
            circuit_name: String::new(),
            grid_position: None,
            qualifying_position: None,
            top10_probability: None,
            top10_prediction: outcome == Outcome::Top10,
            dnf_probability: None,
            dnf_prediction: outcome == Outcome::Dnf,
            final_prediction: outcome,
            target_top_10,
            target_dnf,
        }
    }

    #[test]
    fn test_accuracy_overall() {
        let records = vec![
            record(2019, Outcome::Top10, Some(true), Some(false)),
            record(2019, Outcome::Top10, Some(false), Some(false)),
            record(2020, Outcome::Dnf, Some(false), Some(true)),
            record(2020, Outcome::OutsideTop10, Some(false), Some(false)),
        ];

        let metrics = evaluate(&records);
        assert_eq!(metrics.rows, 4);
        // Top-10: correct for rows 1, 3, 4 -> 3/4
        assert!((metrics.top10_accuracy.unwrap() - 0.75).abs() < 1e-9);
        // DNF: all four rows correct
        assert!((metrics.dnf_accuracy.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_by_year() {
        let records = vec![
            record(2019, Outcome::Top10, Some(true), None),
            record(2019, Outcome::Top10, Some(false), None),
            record(2020, Outcome::Top10, Some(true), None),
        ];

        let metrics = evaluate(&records);
        assert!((metrics.top10_accuracy_by_year[&2019] - 0.5).abs() < 1e-9);
        assert!((metrics.top10_accuracy_by_year[&2020] - 1.0).abs() < 1e-9);
        assert!(metrics.dnf_accuracy.is_none());
        assert!(metrics.dnf_accuracy_by_year.is_empty());
    }

    #[test]
    fn test_no_ground_truth() {
        let records = vec![record(2019, Outcome::Top10, None, None)];
        let metrics = evaluate(&records);
        assert!(metrics.top10_accuracy.is_none());
        assert!(metrics.dnf_accuracy.is_none());
    }
}
