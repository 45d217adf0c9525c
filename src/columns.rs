//! Column classification for the wide feature table
//!
//! Splits the table's columns into model-input features and the fixed set of
//! identifier, ordering, and label columns that must never reach a model.

/// Columns that are never model inputs: identifiers, temporal keys, labels.
///
/// Any column not named here is treated as a feature. A newly added upstream
/// column therefore becomes a model input without a code change; if such a
/// column is derived from post-race information it must be added to this
/// list, otherwise it silently leaks the outcome into the feature set.
pub const EXCLUDED_COLUMNS: [&str; 10] = [
    "result_id",
    "race_id",
    "driver_id",
    "constructor_id",
    "circuit_id",
    "year",
    "round",
    "race_date",
    "target_top_10",
    "target_dnf",
];

/// Ground-truth label columns, in fixed order.
pub const TARGET_COLUMNS: [&str; 2] = ["target_top_10", "target_dnf"];

/// Split column names into (feature_columns, target_columns)
///
/// Feature columns preserve the input order. Target columns are the fixed
/// pair regardless of where they appear in the input.
pub fn get_feature_columns<S: AsRef<str>>(columns: &[S]) -> (Vec<String>, Vec<String>) {
    let feature_cols = columns
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| !EXCLUDED_COLUMNS.contains(c))
        .map(|c| c.to_string())
        .collect();

    let target_cols = TARGET_COLUMNS.iter().map(|c| c.to_string()).collect();

    (feature_cols, target_cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_columns() -> Vec<&'static str> {
        vec![
            "result_id",
            "race_id",
            "driver_id",
            "constructor_id",
            "circuit_id",
            "year",
            "round",
            "race_date",
            "target_top_10",
            "target_dnf",
            "grid_position",
            "qualifying_position",
            "driver_top10_rate_recent",
            "driver_dnf_rate_recent",
            "constructor_avg_points_recent",
        ]
    }

    #[test]
    fn test_excluded_columns_never_features() {
        let (feature_cols, _) = get_feature_columns(&sample_columns());

        for excluded in EXCLUDED_COLUMNS {
            assert!(
                !feature_cols.contains(&excluded.to_string()),
                "excluded column leaked into features: {}",
                excluded
            );
        }
    }

    #[test]
    fn test_known_features_included() {
        let (feature_cols, target_cols) = get_feature_columns(&sample_columns());

        assert!(feature_cols.contains(&"grid_position".to_string()));
        assert!(feature_cols.contains(&"qualifying_position".to_string()));
        assert!(feature_cols.contains(&"driver_top10_rate_recent".to_string()));

        assert_eq!(target_cols, vec!["target_top_10", "target_dnf"]);
    }

    #[test]
    fn test_feature_order_preserved() {
        let columns = vec!["b_feature", "year", "a_feature", "target_top_10", "c_feature"];
        let (feature_cols, _) = get_feature_columns(&columns);
        assert_eq!(feature_cols, vec!["b_feature", "a_feature", "c_feature"]);
    }

    #[test]
    fn test_idempotent() {
        let columns = sample_columns();
        let (first, _) = get_feature_columns(&columns);
        let (second, _) = get_feature_columns(&first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_column_defaults_to_feature() {
        let columns = vec!["year", "some_brand_new_rolling_rate", "target_dnf"];
        let (feature_cols, _) = get_feature_columns(&columns);
        assert_eq!(feature_cols, vec!["some_brand_new_rolling_rate"]);
    }

    #[test]
    fn test_targets_never_in_features_and_vice_versa() {
        let (feature_cols, target_cols) = get_feature_columns(&sample_columns());
        for t in &target_cols {
            assert!(!feature_cols.contains(t));
        }
        for f in &feature_cols {
            assert!(!target_cols.contains(f));
        }
    }
}
