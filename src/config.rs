//! Application configuration
//!
//! All ambient state (paths, split years) is read once from the environment
//! into an explicit struct and validated at construction. The pipeline never
//! re-reads the environment mid-invocation.

use std::path::PathBuf;

use crate::error::PipelineError;
use crate::split::SplitConfig;

/// Defaults matching the standard historical dataset layout
const DEFAULT_DATA_PATH: &str = "data/features/fct_features_pre_race.csv";
const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_DIMS_DIR: &str = "data/dims";
const DEFAULT_TRAIN_END_YEAR: i32 = 2016;
const DEFAULT_VAL_YEARS: &str = "2017,2018";
const DEFAULT_TEST_YEARS: &str = "2019,2020";

/// Validated pipeline configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// CSV export of the wide pre-race feature table
    pub data_path: PathBuf,
    /// Directory holding the ONNX classifier artifacts
    pub models_dir: PathBuf,
    /// Directory holding drivers.csv / races.csv / circuits.csv
    pub dims_dir: PathBuf,
    pub split: SplitConfig,
}

impl AppConfig {
    /// Read configuration from environment variables with defaults
    ///
    /// DATA_PATH, MODELS_DIR, DIMS_DIR, TRAIN_END_YEAR, VAL_YEARS, TEST_YEARS.
    /// Year lists are comma separated. Parse or validation failure is fatal.
    pub fn from_env() -> Result<Self, PipelineError> {
        let data_path = env_or("DATA_PATH", DEFAULT_DATA_PATH);
        let models_dir = env_or("MODELS_DIR", DEFAULT_MODELS_DIR);
        let dims_dir = env_or("DIMS_DIR", DEFAULT_DIMS_DIR);

        let train_end_year = match std::env::var("TRAIN_END_YEAR") {
            Ok(s) => parse_year(&s)?,
            Err(_) => DEFAULT_TRAIN_END_YEAR,
        };
        let val_years = parse_year_list(&env_or("VAL_YEARS", DEFAULT_VAL_YEARS))?;
        let test_years = parse_year_list(&env_or("TEST_YEARS", DEFAULT_TEST_YEARS))?;

        Ok(Self {
            data_path: PathBuf::from(data_path),
            models_dir: PathBuf::from(models_dir),
            dims_dir: PathBuf::from(dims_dir),
            split: SplitConfig::new(train_end_year, val_years, test_years)?,
        })
    }

}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_year(s: &str) -> Result<i32, PipelineError> {
    s.trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("invalid year '{}'", s)))
}

/// Parse a comma-separated year list, e.g. "2017,2018"
pub fn parse_year_list(s: &str) -> Result<Vec<i32>, PipelineError> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_year)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_list() {
        assert_eq!(parse_year_list("2017,2018").unwrap(), vec![2017, 2018]);
        assert_eq!(parse_year_list(" 2019 , 2020 ").unwrap(), vec![2019, 2020]);
        assert_eq!(parse_year_list("2019").unwrap(), vec![2019]);
    }

    #[test]
    fn test_parse_year_list_rejects_garbage() {
        assert!(parse_year_list("2017,soon").is_err());
    }

    #[test]
    fn test_default_split_is_valid() {
        let split = SplitConfig::new(
            DEFAULT_TRAIN_END_YEAR,
            parse_year_list(DEFAULT_VAL_YEARS).unwrap(),
            parse_year_list(DEFAULT_TEST_YEARS).unwrap(),
        );
        assert!(split.is_ok());
    }
}
