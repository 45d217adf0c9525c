//! Prediction output artifacts
//!
//! CSV exports and the plain-text batch summary. Formatting only; these
//! consume finished `PredictionRecord` collections and never touch models or
//! the feature store.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::error::PipelineError;
use crate::models::PredictionRecord;

/// CSV header for prediction exports
const CSV_HEADER: &str = "result_id,race_id,driver_id,constructor_id,circuit_id,year,round,\
race_date,driver_name,race_name,circuit_name,grid_position,qualifying_position,\
top10_probability,top10_prediction,dnf_probability,dnf_prediction,final_prediction,\
target_top_10,target_dnf";

/// Write a prediction batch to a single CSV file
pub fn write_predictions_csv<P: AsRef<Path>>(
    records: &[PredictionRecord],
    path: P,
) -> Result<(), PipelineError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut out = String::with_capacity(records.len() * 128);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        let _ = writeln!(out, "{}", csv_line(record));
    }

    std::fs::write(path, out)?;
    Ok(())
}

/// Write all batch artifacts: combined CSV, per-race CSVs, text summary
pub fn write_batch_artifacts<P: AsRef<Path>>(
    records: &[PredictionRecord],
    output_dir: P,
) -> Result<(), PipelineError> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let all_path = dir.join("all_predictions.csv");
    write_predictions_csv(records, &all_path)?;
    info!("Saved all predictions to {:?}", all_path);

    let race_ids: BTreeSet<i64> = records.iter().map(|r| r.race_id).collect();
    for race_id in &race_ids {
        let race_records: Vec<PredictionRecord> = records
            .iter()
            .filter(|r| r.race_id == *race_id)
            .cloned()
            .collect();
        let first = &race_records[0];
        let race_path = dir.join(format!(
            "{}_round_{}_race_{}.csv",
            first.year, first.round, race_id
        ));
        write_predictions_csv(&race_records, &race_path)?;
    }
    info!("Saved {} race-specific files", race_ids.len());

    let summary_path = dir.join("predictions_summary.txt");
    std::fs::write(&summary_path, format_summary(records))?;
    info!("Saved summary report to {:?}", summary_path);

    Ok(())
}

/// Human-readable per-race summary
///
/// Races in chronological order; within a race, drivers sorted by top-10
/// probability descending, top ten shown.
pub fn format_summary(records: &[PredictionRecord]) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "RACE PREDICTIONS SUMMARY");
    let _ = writeln!(out, "{}\n", rule);

    let mut race_keys: Vec<(i32, i32, i64)> = records
        .iter()
        .map(|r| (r.year, r.round, r.race_id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    race_keys.sort();

    for (year, round, race_id) in race_keys {
        let mut race_records: Vec<&PredictionRecord> =
            records.iter().filter(|r| r.race_id == race_id).collect();
        race_records.sort_by(|a, b| {
            b.top10_probability
                .unwrap_or(0.0)
                .partial_cmp(&a.top10_probability.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let race_name = &race_records[0].race_name;
        let _ = writeln!(out, "\n{} - Round {} ({})", year, round, race_name);
        let _ = writeln!(out, "{}", "-".repeat(80));
        let _ = writeln!(
            out,
            "{:>24} {:>6} {:>12} {:>10} {:>16}",
            "Driver", "Grid", "Top-10 Prob", "DNF Prob", "Prediction"
        );
        let _ = writeln!(out, "{}", "-".repeat(80));

        for record in race_records.iter().take(10) {
            let grid = record
                .grid_position
                .map(|g| format!("{:.0}", g))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:>24} {:>6} {:>11.1}% {:>9.1}% {:>16}",
                truncate(&record.driver_name, 24),
                grid,
                record.top10_probability.unwrap_or(0.0) * 100.0,
                record.dnf_probability.unwrap_or(0.0) * 100.0,
                record.final_prediction.label()
            );
        }

        let predicted_top10 = race_records.iter().filter(|r| r.top10_prediction).count();
        let predicted_dnf = race_records.iter().filter(|r| r.dnf_prediction).count();

        let _ = writeln!(out);
        let _ = writeln!(out, "Total drivers: {}", race_records.len());
        let _ = writeln!(out, "Predicted top-10 finishers: {}", predicted_top10);
        let _ = writeln!(out, "Predicted DNFs: {}", predicted_dnf);

        let with_top10_truth: Vec<_> = race_records
            .iter()
            .filter(|r| r.target_top_10.is_some())
            .collect();
        if !with_top10_truth.is_empty() {
            let hits = with_top10_truth
                .iter()
                .filter(|r| Some(r.top10_prediction) == r.target_top_10)
                .count();
            let _ = writeln!(
                out,
                "Top-10 prediction accuracy: {:.1}%",
                hits as f64 / with_top10_truth.len() as f64 * 100.0
            );
        }

        let with_dnf_truth: Vec<_> = race_records
            .iter()
            .filter(|r| r.target_dnf.is_some())
            .collect();
        if !with_dnf_truth.is_empty() {
            let hits = with_dnf_truth
                .iter()
                .filter(|r| Some(r.dnf_prediction) == r.target_dnf)
                .count();
            let _ = writeln!(
                out,
                "DNF prediction accuracy: {:.1}%",
                hits as f64 / with_dnf_truth.len() as f64 * 100.0
            );
        }
    }

    out
}

fn csv_line(r: &PredictionRecord) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        r.result_id,
        r.race_id,
        r.driver_id,
        r.constructor_id,
        r.circuit_id,
        r.year,
        r.round,
        csv_escape(&r.race_date),
        csv_escape(&r.driver_name),
        csv_escape(&r.race_name),
        csv_escape(&r.circuit_name),
        fmt_opt_f64(r.grid_position),
        fmt_opt_f64(r.qualifying_position),
        fmt_opt_f64(r.top10_probability),
        r.top10_prediction as u8,
        fmt_opt_f64(r.dnf_probability),
        r.dnf_prediction as u8,
        csv_escape(r.final_prediction.label()),
        fmt_opt_bool(r.target_top_10),
        fmt_opt_bool(r.target_dnf),
    )
}

fn fmt_opt_f64(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_opt_bool(v: Option<bool>) -> String {
    v.map(|v| (v as u8).to_string()).unwrap_or_default()
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
