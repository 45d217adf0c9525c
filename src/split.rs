//! Temporal train/validation/test splitting
//!
//! Partitions the feature table by race year into chronologically disjoint
//! subsets so that evaluation never sees information from a year the model
//! could not have trained on.

use std::path::Path;
use tracing::info;

use crate::data::FeatureTable;
use crate::error::PipelineError;

/// Year ranges for the three splits
///
/// Validated once at construction; an invalid configuration is a fatal
/// startup error, never a runtime fallback.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    train_end_year: i32,
    val_years: Vec<i32>,
    test_years: Vec<i32>,
}

impl SplitConfig {
    /// Build a validated split configuration
    ///
    /// Requires train_end_year < min(val_years), max(val_years) <=
    /// min(test_years), and disjoint val/test year sets.
    pub fn new(
        train_end_year: i32,
        val_years: Vec<i32>,
        test_years: Vec<i32>,
    ) -> Result<Self, PipelineError> {
        if val_years.is_empty() {
            return Err(PipelineError::Config("val_years must not be empty".to_string()));
        }
        if test_years.is_empty() {
            return Err(PipelineError::Config("test_years must not be empty".to_string()));
        }

        let min_val = *val_years.iter().min().unwrap();
        let max_val = *val_years.iter().max().unwrap();
        let min_test = *test_years.iter().min().unwrap();

        if train_end_year >= min_val {
            return Err(PipelineError::Config(format!(
                "train_end_year {} must precede first validation year {}",
                train_end_year, min_val
            )));
        }
        if max_val > min_test {
            return Err(PipelineError::Config(format!(
                "last validation year {} must not exceed first test year {}",
                max_val, min_test
            )));
        }
        if val_years.iter().any(|y| test_years.contains(y)) {
            return Err(PipelineError::Config(
                "val_years and test_years must be disjoint".to_string(),
            ));
        }

        Ok(Self {
            train_end_year,
            val_years,
            test_years,
        })
    }

    pub fn train_end_year(&self) -> i32 {
        self.train_end_year
    }

    pub fn val_years(&self) -> &[i32] {
        &self.val_years
    }

    pub fn test_years(&self) -> &[i32] {
        &self.test_years
    }

    /// Partition a feature table into train/val/test by year
    ///
    /// Rows whose year falls outside all three ranges (gap years) land in no
    /// split; this is deliberate, the union is not required to cover the
    /// table. The source table is not mutated.
    pub fn partition(&self, table: &FeatureTable) -> Result<SplitSet, PipelineError> {
        let splits = SplitSet {
            train: table.filter_year_at_most(self.train_end_year)?,
            val: table.filter_years(&self.val_years)?,
            test: table.filter_years(&self.test_years)?,
        };

        for (name, split) in [
            ("TRAIN", &splits.train),
            ("VAL", &splits.val),
            ("TEST", &splits.test),
        ] {
            let years = split.years().unwrap_or_default();
            info!(
                "{}: {} rows (years: {:?}-{:?})",
                name,
                split.height(),
                years.first(),
                years.last()
            );
        }

        Ok(splits)
    }
}

/// The three disjoint row subsets produced by a partition
pub struct SplitSet {
    pub train: FeatureTable,
    pub val: FeatureTable,
    pub test: FeatureTable,
}

impl SplitSet {
    /// All split rows stacked back into one table, chronologically sorted
    pub fn concat(&self) -> Result<FeatureTable, PipelineError> {
        self.train.vstack(&self.val)?.vstack(&self.test)
    }

    /// Write features_train.csv / features_val.csv / features_test.csv
    pub fn export_csv<P: AsRef<Path>>(&self, output_dir: P) -> Result<(), PipelineError> {
        let dir = output_dir.as_ref();
        std::fs::create_dir_all(dir)?;

        for (name, split) in [
            ("train", &self.train),
            ("val", &self.val),
            ("test", &self.test),
        ] {
            let path = dir.join(format!("features_{}.csv", name));
            split.write_csv(&path)?;
            info!("Saved {} split to {:?}", name, path);
        }
        Ok(())
    }
}
