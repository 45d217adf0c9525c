//! End-to-end prediction orchestration
//!
//! Stateless request/response transforms over a fixed snapshot: load the
//! feature table, split it, score the requested rows with whatever models are
//! present, assemble outcomes, and attach display metadata. Fatal errors
//! abort the whole invocation; a single missing model only degrades output.

use std::path::Path;
use tracing::{info, warn};

use crate::columns::get_feature_columns;
use crate::combine::{combine_scores, ScoreSet};
use crate::config::AppConfig;
use crate::data::{DimensionTables, FeatureTable};
use crate::error::PipelineError;
use crate::eval::{evaluate, EvalMetrics};
use crate::models::PredictionRecord;
use crate::predictor::ModelSet;
use crate::report;
use crate::split::SplitSet;

/// Load the feature table and partition it into temporal splits
///
/// Optionally exports the three splits as CSV files. Logs feature column
/// counts and per-split class balance.
pub fn export_features(
    config: &AppConfig,
    output_dir: Option<&Path>,
) -> Result<SplitSet, PipelineError> {
    let table = FeatureTable::load_csv(&config.data_path)?;
    let splits = config.split.partition(&table)?;

    let (feature_cols, target_cols) = get_feature_columns(&table.column_names());
    info!("Features: {} columns", feature_cols.len());
    info!("Targets: {:?}", target_cols);

    for (name, split) in [
        ("train", &splits.train),
        ("val", &splits.val),
        ("test", &splits.test),
    ] {
        if split.is_empty() {
            continue;
        }
        let rows = split.meta_rows()?;
        let top10_pct = positive_rate(rows.iter().map(|r| r.target_top_10));
        let dnf_pct = positive_rate(rows.iter().map(|r| r.target_dnf));
        info!(
            "{}: top-10 positives {:.1}%, DNF positives {:.1}%",
            name,
            top10_pct * 100.0,
            dnf_pct * 100.0
        );
    }

    if let Some(dir) = output_dir {
        splits.export_csv(dir)?;
    }

    Ok(splits)
}

/// Score a feature table with the available models and assemble outcomes
///
/// The returned records carry fallback display labels; callers that have
/// dimension tables at hand follow up with [`attach_labels`].
pub fn predict(
    table: &FeatureTable,
    models: &mut ModelSet,
    feature_cols: &[String],
) -> Result<Vec<PredictionRecord>, PipelineError> {
    let matrix = table.feature_matrix(feature_cols)?;
    let rows = table.meta_rows()?;

    let mut scores = ScoreSet::default();
    if let Some(scorer) = models.top10_mut() {
        scores.top10 = Some(scorer.predict_probability(&matrix)?);
    } else {
        warn!("Top-10 model not available, skipping that axis");
    }
    if let Some(scorer) = models.dnf_mut() {
        scores.dnf = Some(scorer.predict_probability(&matrix)?);
    } else {
        warn!("DNF model not available, skipping that axis");
    }

    combine_scores(&rows, &scores)
}

/// Swap fallback identifier labels for real dimension names where available
pub fn attach_labels(records: &mut [PredictionRecord], dims: &DimensionTables) {
    for record in records {
        record.driver_name = dims.driver_label(record.driver_id);
        record.race_name = dims.race_label(record.race_id);
        record.circuit_name = dims.circuit_label(record.circuit_id);
    }
}

/// Full pipeline for one race, one year, or the whole table
///
/// Filters are applied to the full table (all splits); an empty selection is
/// a data error, never an empty success.
pub fn predict_from_store(
    config: &AppConfig,
    year: Option<i32>,
    race_id: Option<i64>,
) -> Result<Vec<PredictionRecord>, PipelineError> {
    let table = FeatureTable::load_csv(&config.data_path)?;

    let mut selected = table;
    if let Some(year) = year {
        selected = selected.filter_year(year)?;
        info!("Filtered to year {}: {} rows", year, selected.height());
    }
    if let Some(race_id) = race_id {
        selected = selected.filter_race(race_id)?;
        info!("Filtered to race {}: {} rows", race_id, selected.height());
    }
    if selected.is_empty() {
        return Err(PipelineError::Data(
            "no feature rows match the requested filters".to_string(),
        ));
    }

    let mut models = ModelSet::load(&config.models_dir)?;
    let (feature_cols, _) = get_feature_columns(&selected.column_names());

    info!("Making predictions on {} samples", selected.height());
    let mut records = predict(&selected, &mut models, &feature_cols)?;

    let dims = DimensionTables::load(&config.dims_dir);
    attach_labels(&mut records, &dims);
    Ok(records)
}

/// Batch prediction over the test split or an explicit year list
///
/// Writes the combined CSV, per-race CSVs, and the text summary when an
/// output directory is given.
pub fn batch_predict(
    config: &AppConfig,
    years: Option<&[i32]>,
    output_dir: Option<&Path>,
) -> Result<Vec<PredictionRecord>, PipelineError> {
    let splits = export_features(config, None)?;

    let data = match years {
        None => {
            info!("Using test split: {} samples", splits.test.height());
            splits.test
        }
        Some(years) => {
            let all = splits.concat()?;
            let filtered = all.filter_years(years)?;
            info!("Filtered to years {:?}: {} samples", years, filtered.height());
            filtered
        }
    };
    if data.is_empty() {
        return Err(PipelineError::Data(
            "no feature rows in the requested prediction window".to_string(),
        ));
    }

    let mut models = ModelSet::load(&config.models_dir)?;
    let (feature_cols, _) = get_feature_columns(&data.column_names());

    info!("Making predictions on {} samples", data.height());
    let mut records = predict(&data, &mut models, &feature_cols)?;

    let dims = DimensionTables::load(&config.dims_dir);
    attach_labels(&mut records, &dims);

    if let Some(dir) = output_dir {
        report::write_batch_artifacts(&records, dir)?;
    }

    Ok(records)
}

/// Evaluate a prediction batch against its ground-truth labels
pub fn evaluate_predictions(records: &[PredictionRecord]) -> EvalMetrics {
    evaluate(records)
}

fn positive_rate(labels: impl Iterator<Item = Option<bool>>) -> f64 {
    let mut total = 0usize;
    let mut positive = 0usize;
    for label in labels.flatten() {
        total += 1;
        if label {
            positive += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        positive as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::Outcome;
    use crate::predictor::{Scorer, StubScorer};
    use polars::prelude::*;

    fn sample_table() -> FeatureTable {
        let df = df!(
            "result_id" => [1i64, 2, 3],
            "race_id" => [10i64, 10, 10],
            "driver_id" => [44i64, 33, 16],
            "constructor_id" => [6i64, 1, 2],
            "circuit_id" => [1i64, 1, 1],
            "year" => [2019i64, 2019, 2019],
            "round" => [1i64, 1, 1],
            "race_date" => ["2019-03-17", "2019-03-17", "2019-03-17"],
            "grid_position" => [3.0f64, 5.0, 2.0],
            "qualifying_position" => [3.0f64, 5.0, 2.0],
            "driver_top10_rate_recent" => [0.7f64, 0.5, 0.8],
            "target_top_10" => [true, false, true],
            "target_dnf" => [false, true, false],
        )
        .unwrap();
        FeatureTable::from_dataframe(df).unwrap()
    }

    fn stub(name: &str, probabilities: Vec<f64>) -> Box<dyn Scorer> {
        Box::new(StubScorer {
            name: name.to_string(),
            probabilities,
        })
    }

    #[test]
    fn test_predict_with_both_models() {
        let table = sample_table();
        let mut models = ModelSet::from_scorers(
            Some(stub("top10", vec![0.9, 0.3, 0.8])),
            Some(stub("dnf", vec![0.1, 0.7, 0.2])),
        )
        .unwrap();
        let (feature_cols, _) = get_feature_columns(&table.column_names());

        let records = predict(&table, &mut models, &feature_cols).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].final_prediction, Outcome::Top10);
        assert_eq!(records[1].final_prediction, Outcome::Dnf);
        assert_eq!(records[2].final_prediction, Outcome::Top10);
    }

    #[test]
    fn test_predict_degrades_without_dnf_model() {
        let table = sample_table();
        let mut models =
            ModelSet::from_scorers(Some(stub("top10", vec![0.9, 0.3, 0.8])), None).unwrap();
        let (feature_cols, _) = get_feature_columns(&table.column_names());

        let records = predict(&table, &mut models, &feature_cols).unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert!(record.dnf_probability.is_none());
            assert!(record.top10_probability.is_some());
            assert!(!record.dnf_prediction);
        }
        assert_eq!(records[0].final_prediction, Outcome::Top10);
        assert_eq!(records[1].final_prediction, Outcome::OutsideTop10);
    }

    #[test]
    fn test_attach_labels_with_fallback() {
        let table = sample_table();
        let mut models =
            ModelSet::from_scorers(Some(stub("top10", vec![0.9, 0.3, 0.8])), None).unwrap();
        let (feature_cols, _) = get_feature_columns(&table.column_names());
        let mut records = predict(&table, &mut models, &feature_cols).unwrap();

        let mut dims = DimensionTables::empty();
        dims.insert_driver(44, "Lewis Hamilton");
        dims.insert_race(10, "Australian Grand Prix");
        attach_labels(&mut records, &dims);

        let hamilton = records.iter().find(|r| r.driver_id == 44).unwrap();
        assert_eq!(hamilton.driver_name, "Lewis Hamilton");
        assert_eq!(hamilton.race_name, "Australian Grand Prix");

        // Unknown driver falls back to the identifier string
        let unknown = records.iter().find(|r| r.driver_id == 33).unwrap();
        assert_eq!(unknown.driver_name, "33");
        assert_eq!(unknown.circuit_name, "Circuit 1");
    }

    #[test]
    fn test_feature_columns_exclude_identifiers_in_pipeline() {
        let table = sample_table();
        let (feature_cols, _) = get_feature_columns(&table.column_names());
        assert_eq!(
            feature_cols,
            vec![
                "grid_position",
                "qualifying_position",
                "driver_top10_rate_recent"
            ]
        );
    }
}
