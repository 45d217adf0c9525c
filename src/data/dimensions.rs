//! Dimension lookups for display metadata
//!
//! Best-effort name resolution for drivers, races, and circuits. A missing
//! dimension file or an unknown identifier never fails a prediction; the
//! lookup falls back to a stable synthetic label instead.

use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// In-memory name lookups keyed by identifier
#[derive(Debug, Default)]
pub struct DimensionTables {
    drivers: HashMap<i64, String>,
    races: HashMap<i64, String>,
    circuits: HashMap<i64, String>,
}

impl DimensionTables {
    /// Empty lookups; every label falls back
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load drivers.csv, races.csv, circuits.csv from a directory
    ///
    /// Each file is optional; a missing or unreadable file yields an empty
    /// lookup for that dimension.
    pub fn load<P: AsRef<Path>>(dims_dir: P) -> Self {
        let dir = dims_dir.as_ref();
        Self {
            drivers: load_name_map(&dir.join("drivers.csv"), "driver_id", "full_name"),
            races: load_name_map(&dir.join("races.csv"), "race_id", "race_name"),
            circuits: load_name_map(&dir.join("circuits.csv"), "circuit_id", "circuit_name"),
        }
    }

    /// Driver display name, falling back to the raw identifier string
    pub fn driver_label(&self, driver_id: i64) -> String {
        self.drivers
            .get(&driver_id)
            .cloned()
            .unwrap_or_else(|| driver_id.to_string())
    }

    pub fn race_label(&self, race_id: i64) -> String {
        self.races
            .get(&race_id)
            .cloned()
            .unwrap_or_else(|| format!("Race {}", race_id))
    }

    pub fn circuit_label(&self, circuit_id: i64) -> String {
        self.circuits
            .get(&circuit_id)
            .cloned()
            .unwrap_or_else(|| format!("Circuit {}", circuit_id))
    }

    /// Insert a driver name (used by tests and synthetic fixtures)
    pub fn insert_driver(&mut self, driver_id: i64, name: &str) {
        self.drivers.insert(driver_id, name.to_string());
    }

    pub fn insert_race(&mut self, race_id: i64, name: &str) {
        self.races.insert(race_id, name.to_string());
    }

    pub fn insert_circuit(&mut self, circuit_id: i64, name: &str) {
        self.circuits.insert(circuit_id, name.to_string());
    }
}

/// Read an (id, name) CSV into a map; empty on any failure
fn load_name_map(path: &Path, id_col: &str, name_col: &str) -> HashMap<i64, String> {
    let df = match CsvReadOptions::default()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|r| r.finish())
    {
        Ok(df) => df,
        Err(e) => {
            warn!("Dimension file {:?} unavailable: {}", path, e);
            return HashMap::new();
        }
    };

    let ids = match df.column(id_col).and_then(|c| c.i64().cloned()) {
        Ok(ids) => ids,
        Err(e) => {
            warn!("Dimension file {:?} missing '{}': {}", path, id_col, e);
            return HashMap::new();
        }
    };
    let names = match df.column(name_col).and_then(|c| c.str().cloned()) {
        Ok(names) => names,
        Err(e) => {
            warn!("Dimension file {:?} missing '{}': {}", path, name_col, e);
            return HashMap::new();
        }
    };

    let mut map = HashMap::new();
    for (id, name) in ids.into_iter().zip(names.into_iter()) {
        if let (Some(id), Some(name)) = (id, name) {
            map.insert(id, name.to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_labels() {
        let dims = DimensionTables::empty();
        assert_eq!(dims.driver_label(44), "44");
        assert_eq!(dims.race_label(10), "Race 10");
        assert_eq!(dims.circuit_label(3), "Circuit 3");
    }

    #[test]
    fn test_known_labels() {
        let mut dims = DimensionTables::empty();
        dims.insert_driver(44, "Lewis Hamilton");
        dims.insert_race(10, "Bahrain Grand Prix");
        dims.insert_circuit(3, "Bahrain International Circuit");

        assert_eq!(dims.driver_label(44), "Lewis Hamilton");
        assert_eq!(dims.race_label(10), "Bahrain Grand Prix");
        assert_eq!(dims.circuit_label(3), "Bahrain International Circuit");

        // Unknown ids still fall back
        assert_eq!(dims.driver_label(16), "16");
    }

    #[test]
    fn test_load_missing_directory_is_not_fatal() {
        let dims = DimensionTables::load("/nonexistent/dims");
        assert_eq!(dims.driver_label(1), "1");
    }
}
