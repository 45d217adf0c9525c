//! Feature store access
//!
//! Loads the single wide pre-race feature table (one row per (race, driver)
//! result) and exposes the filtered views and numeric matrices the rest of
//! the pipeline consumes. The table is always materialized sorted by
//! (year, round, result_id) so downstream processing is deterministic.

use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::columns::EXCLUDED_COLUMNS;
use crate::error::PipelineError;
use crate::models::ResultRow;

/// Row-major numeric matrix fed to the model sessions
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl FeatureMatrix {
    /// Value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }
}

/// The wide pre-race feature table
///
/// Wraps an eager DataFrame; every filter returns a new table, the source is
/// never mutated in place.
pub struct FeatureTable {
    df: DataFrame,
}

impl FeatureTable {
    /// Load the feature table from a CSV export
    ///
    /// Fails if the file is unreadable, the table is empty, or any of the
    /// identifier/label columns is missing. Never returns an empty table
    /// silently.
    pub fn load_csv<P: AsRef<Path>>(csv_path: P) -> Result<Self, PipelineError> {
        let path = csv_path.as_ref();
        let df = CsvReadOptions::default()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| PipelineError::Data(format!("failed to open {:?}: {}", path, e)))?
            .finish()
            .map_err(|e| PipelineError::Data(format!("failed to read {:?}: {}", path, e)))?;

        let table = Self::from_dataframe(df)?;
        info!("Loaded {} feature rows from {:?}", table.height(), path);
        Ok(table)
    }

    /// Validate and sort an in-memory DataFrame into a feature table
    pub fn from_dataframe(df: DataFrame) -> Result<Self, PipelineError> {
        if df.height() == 0 {
            return Err(PipelineError::Data("feature table is empty".to_string()));
        }

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for required in EXCLUDED_COLUMNS {
            if !names.iter().any(|n| n == required) {
                return Err(PipelineError::Data(format!(
                    "feature table is missing required column '{}'",
                    required
                )));
            }
        }

        let df = df.sort(["year", "round", "result_id"], SortMultipleOptions::default())?;
        Ok(Self { df })
    }

    /// Wrap an already-validated filtered view
    fn wrap(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Distinct years present, ascending
    pub fn years(&self) -> Result<Vec<i32>, PipelineError> {
        let years = self.df.column("year")?.i64()?;
        let set: BTreeSet<i32> = years.into_iter().flatten().map(|y| y as i32).collect();
        Ok(set.into_iter().collect())
    }

    /// Rows with year <= max_year
    pub fn filter_year_at_most(&self, max_year: i32) -> Result<Self, PipelineError> {
        let years = self.df.column("year")?.i64()?;
        let mask: BooleanChunked = years
            .into_iter()
            .map(|y| y.map(|y| y <= max_year as i64).unwrap_or(false))
            .collect();
        Ok(Self::wrap(self.df.filter(&mask)?))
    }

    /// Rows whose year is in the given set
    pub fn filter_years(&self, years: &[i32]) -> Result<Self, PipelineError> {
        let col = self.df.column("year")?.i64()?;
        let mask: BooleanChunked = col
            .into_iter()
            .map(|y| y.map(|y| years.contains(&(y as i32))).unwrap_or(false))
            .collect();
        Ok(Self::wrap(self.df.filter(&mask)?))
    }

    /// Rows for a single year
    pub fn filter_year(&self, year: i32) -> Result<Self, PipelineError> {
        self.filter_years(&[year])
    }

    /// Rows for a single race
    pub fn filter_race(&self, race_id: i64) -> Result<Self, PipelineError> {
        let col = self.df.column("race_id")?.i64()?;
        let mask: BooleanChunked = col.into_iter().map(|v| v == Some(race_id)).collect();
        Ok(Self::wrap(self.df.filter(&mask)?))
    }

    /// Stack another table's rows under this one
    pub fn vstack(&self, other: &FeatureTable) -> Result<Self, PipelineError> {
        let df = self.df.vstack(&other.df)?;
        let df = df.sort(["year", "round", "result_id"], SortMultipleOptions::default())?;
        Ok(Self::wrap(df))
    }

    /// Extract the numeric model-input matrix for the given feature columns
    ///
    /// Missing values become 0.0; a column that cannot be represented as f64
    /// is a data error.
    pub fn feature_matrix(&self, feature_cols: &[String]) -> Result<FeatureMatrix, PipelineError> {
        let rows = self.df.height();
        let cols = feature_cols.len();

        let mut column_values: Vec<Vec<f64>> = Vec::with_capacity(cols);
        for name in feature_cols {
            let col = self.df.column(name.as_str()).map_err(|_| {
                PipelineError::Data(format!("feature column '{}' not found in table", name))
            })?;
            let casted = col.cast(&DataType::Float64).map_err(|e| {
                PipelineError::Data(format!("feature column '{}' is not numeric: {}", name, e))
            })?;
            let values: Vec<f64> = casted
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            column_values.push(values);
        }

        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for values in &column_values {
                data.push(values[r]);
            }
        }

        Ok(FeatureMatrix { rows, cols, data })
    }

    /// Extract per-row identifiers, ordering keys, and labels
    pub fn meta_rows(&self) -> Result<Vec<ResultRow>, PipelineError> {
        let result_id = self.df.column("result_id")?.i64()?;
        let race_id = self.df.column("race_id")?.i64()?;
        let driver_id = self.df.column("driver_id")?.i64()?;
        let constructor_id = self.df.column("constructor_id")?.i64()?;
        let circuit_id = self.df.column("circuit_id")?.i64()?;
        let year = self.df.column("year")?.i64()?;
        let round = self.df.column("round")?.i64()?;
        let race_date = self.df.column("race_date")?.str()?;

        let grid = self.opt_f64_values("grid_position")?;
        let quali = self.opt_f64_values("qualifying_position")?;
        let target_top_10 = self.bool_values("target_top_10")?;
        let target_dnf = self.bool_values("target_dnf")?;

        let mut rows = Vec::with_capacity(self.df.height());
        for i in 0..self.df.height() {
            let meta = ResultRow {
                result_id: result_id.get(i).ok_or_else(|| null_key("result_id"))?,
                race_id: race_id.get(i).ok_or_else(|| null_key("race_id"))?,
                driver_id: driver_id.get(i).ok_or_else(|| null_key("driver_id"))?,
                constructor_id: constructor_id
                    .get(i)
                    .ok_or_else(|| null_key("constructor_id"))?,
                circuit_id: circuit_id.get(i).ok_or_else(|| null_key("circuit_id"))?,
                year: year.get(i).ok_or_else(|| null_key("year"))? as i32,
                round: round.get(i).ok_or_else(|| null_key("round"))? as i32,
                race_date: race_date.get(i).unwrap_or("").to_string(),
                grid_position: grid.as_ref().and_then(|v| v[i]),
                qualifying_position: quali.as_ref().and_then(|v| v[i]),
                target_top_10: target_top_10[i],
                target_dnf: target_dnf[i],
            };
            rows.push(meta);
        }

        Ok(rows)
    }

    /// Write the table to CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path.as_ref())?;
        let mut df = self.df.clone();
        CsvWriter::new(file).finish(&mut df)?;
        Ok(())
    }

    /// Optional numeric column as per-row values
    fn opt_f64_values(&self, name: &str) -> Result<Option<Vec<Option<f64>>>, PipelineError> {
        if !self.df.get_column_names().iter().any(|c| c.as_str() == name) {
            return Ok(None);
        }
        let casted = self.df.column(name)?.cast(&DataType::Float64)?;
        Ok(Some(casted.f64()?.into_iter().collect()))
    }

    /// Label column as per-row booleans, tolerating 0/1 integer encodings
    fn bool_values(&self, name: &str) -> Result<Vec<Option<bool>>, PipelineError> {
        let col = self.df.column(name)?;
        match col.dtype() {
            DataType::Boolean => Ok(col.bool()?.into_iter().collect()),
            _ => {
                let casted = col.cast(&DataType::Int64)?;
                Ok(casted
                    .i64()?
                    .into_iter()
                    .map(|v| v.map(|v| v != 0))
                    .collect())
            }
        }
    }
}

fn null_key(column: &str) -> PipelineError {
    PipelineError::Data(format!("null value in key column '{}'", column))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> FeatureTable {
        let df = df!(
            "result_id" => [4i64, 1, 2, 3, 5, 6],
            "race_id" => [12i64, 10, 10, 11, 12, 13],
            "driver_id" => [44i64, 44, 33, 44, 33, 16],
            "constructor_id" => [6i64, 6, 1, 6, 1, 2],
            "circuit_id" => [2i64, 1, 1, 2, 2, 3],
            "year" => [2018i64, 2015, 2015, 2016, 2018, 2019],
            "round" => [1i64, 1, 1, 2, 1, 3],
            "race_date" => ["2018-03-25", "2015-03-15", "2015-03-15", "2016-04-03", "2018-03-25", "2019-04-14"],
            "grid_position" => [4.0f64, 3.0, 5.0, 7.0, 6.0, 2.0],
            "qualifying_position" => [4.0f64, 3.0, 5.0, 7.0, 6.0, 2.0],
            "driver_top10_rate_recent" => [0.6f64, 0.7, 0.5, 0.6, 0.4, 0.8],
            "driver_dnf_rate_recent" => [0.15f64, 0.1, 0.2, 0.15, 0.25, 0.05],
            "target_top_10" => [true, true, false, true, false, true],
            "target_dnf" => [false, false, true, false, true, false],
        )
        .unwrap();
        FeatureTable::from_dataframe(df).unwrap()
    }

    #[test]
    fn test_from_dataframe_sorts_chronologically() {
        let table = sample_table();
        let rows = table.meta_rows().unwrap();

        let keys: Vec<(i32, i32, i64)> = rows
            .iter()
            .map(|r| (r.year, r.round, r.result_id))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(rows[0].year, 2015);
        assert_eq!(rows.last().unwrap().year, 2019);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let df = df!(
            "result_id" => [1i64],
            "race_id" => [10i64],
            "year" => [2015i64],
        )
        .unwrap();

        let err = FeatureTable::from_dataframe(df).unwrap_err();
        assert!(err.to_string().contains("missing required column"));
    }

    #[test]
    fn test_empty_table_is_fatal() {
        let df = df!(
            "result_id" => Vec::<i64>::new(),
            "race_id" => Vec::<i64>::new(),
        )
        .unwrap();

        let err = FeatureTable::from_dataframe(df).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_filter_years() {
        let table = sample_table();
        let filtered = table.filter_years(&[2015, 2019]).unwrap();
        assert_eq!(filtered.height(), 3);
        assert_eq!(filtered.years().unwrap(), vec![2015, 2019]);
    }

    #[test]
    fn test_filter_race() {
        let table = sample_table();
        let filtered = table.filter_race(10).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_feature_matrix_row_major() {
        let table = sample_table();
        let cols = vec![
            "grid_position".to_string(),
            "driver_top10_rate_recent".to_string(),
        ];
        let matrix = table.feature_matrix(&cols).unwrap();

        assert_eq!(matrix.rows, 6);
        assert_eq!(matrix.cols, 2);
        // First row after sorting is result_id 1 (2015 round 1)
        assert!((matrix.get(0, 0) - 3.0).abs() < 1e-9);
        assert!((matrix.get(0, 1) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_feature_matrix_unknown_column() {
        let table = sample_table();
        let cols = vec!["no_such_column".to_string()];
        let err = table.feature_matrix(&cols).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_meta_rows_targets() {
        let table = sample_table();
        let rows = table.meta_rows().unwrap();

        // result_id 2 (2015, driver 33) is a DNF in the fixture
        let row = rows.iter().find(|r| r.result_id == 2).unwrap();
        assert_eq!(row.target_dnf, Some(true));
        assert_eq!(row.target_top_10, Some(false));
        assert_eq!(row.driver_id, 33);
    }

    #[test]
    fn test_integer_encoded_targets() {
        let df = df!(
            "result_id" => [1i64],
            "race_id" => [10i64],
            "driver_id" => [44i64],
            "constructor_id" => [6i64],
            "circuit_id" => [1i64],
            "year" => [2015i64],
            "round" => [1i64],
            "race_date" => ["2015-03-15"],
            "grid_position" => [3.0f64],
            "target_top_10" => [1i64],
            "target_dnf" => [0i64],
        )
        .unwrap();

        let table = FeatureTable::from_dataframe(df).unwrap();
        let rows = table.meta_rows().unwrap();
        assert_eq!(rows[0].target_top_10, Some(true));
        assert_eq!(rows[0].target_dnf, Some(false));
    }
}
