//! Routines for reading UCP instances from disk and synthesizing experiment instances.
//!
//! An instance directory contains two files: `ucp.toml` with the unit roster as a TOML
//! array of tables, and `loads.csv` with one `load` column giving the demand series.
use crate::ucp::{GeneratingUnit, UcpInstance, validate_units};
use anyhow::{Context, Result, ensure};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// The file describing the unit roster
pub const UNITS_FILE_NAME: &str = "ucp.toml";

/// The file containing the demand series
pub const LOADS_FILE_NAME: &str = "loads.csv";

/// Parse a TOML file into the requested type.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Could not parse TOML file {}", file_path.display()))
}

/// Read a series of type Ts from a CSV file into a Vec<T>.
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    let vec = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| format!("Could not parse CSV file {}", file_path.display()))?;
    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec)
}

/// The contents of the unit roster file
#[derive(Debug, Deserialize, PartialEq)]
struct UnitsFile {
    units: Vec<GeneratingUnit>,
}

/// A row of the demand series file
#[derive(Debug, Deserialize, PartialEq)]
struct LoadRow {
    load: f64,
}

/// Read a UCP instance from the given directory.
pub fn read_instance(dir_path: &Path) -> Result<UcpInstance> {
    let units_path = dir_path.join(UNITS_FILE_NAME);
    let units_file: UnitsFile = read_toml(&units_path)?;
    validate_units(&units_file.units)
        .with_context(|| format!("Invalid unit roster in {}", units_path.display()))?;

    let loads = read_vec_from_csv(&dir_path.join(LOADS_FILE_NAME))?
        .into_iter()
        .map(|row: LoadRow| row.load)
        .collect();

    UcpInstance::new(loads, units_file.units)
}

/// Synthesize an experiment instance of the requested size from source data.
///
/// Takes `num_periods` loads from the source demand series starting at `offset` (clamped
/// to the series length), scales them so the peak equals `num_units` times the smallest
/// unit capacity, and draws `num_units` units from the roster with a seeded generator so
/// that experiment cells are reproducible.
pub fn synthesize(
    source: &UcpInstance,
    num_periods: usize,
    num_units: usize,
    offset: usize,
    seed: u64,
) -> Result<UcpInstance> {
    ensure!(num_periods >= 1, "Must synthesize at least one time step");
    ensure!(num_units >= 1, "Must synthesize at least one unit");
    ensure!(
        offset < source.num_periods(),
        "Load offset {offset} is outside the source demand series of length {}",
        source.num_periods()
    );

    let num_periods = num_periods.min(source.num_periods() - offset);
    let loads = &source.loads[offset..offset + num_periods];

    let load_max = loads.iter().fold(0.0, |max: f64, &load| max.max(load));
    ensure!(
        load_max > 0.0,
        "Selected loads are all zero; cannot scale demand"
    );
    let p_max_min = source
        .units
        .iter()
        .map(|unit| unit.p_max)
        .fold(f64::INFINITY, f64::min);

    // Scale so that the peak load saturates num_units of the smallest plant
    let load_factor = p_max_min / load_max * num_units as f64;
    let loads = loads.iter().map(|load| load * load_factor).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let units = (0..num_units)
        .map(|_| source.units[rng.random_range(0..source.num_units())].clone())
        .collect();

    UcpInstance::new(loads, units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const UNITS_TOML: &str = "
[[units]]
a = 1.0
b = 0.5
c = 1.0
p_min = 10.0
p_max = 30.0
startup_cost = 1.0
shutdown_cost = 2.0

[[units]]
a = 2.0
b = 1.0
c = 2.0
p_min = 10.0
p_max = 40.0
initially_on = true
";

    fn write_instance_dir(dir_path: &Path, units_toml: &str, loads_csv: &str) {
        File::create(dir_path.join(UNITS_FILE_NAME))
            .unwrap()
            .write_all(units_toml.as_bytes())
            .unwrap();
        File::create(dir_path.join(LOADS_FILE_NAME))
            .unwrap()
            .write_all(loads_csv.as_bytes())
            .unwrap();
    }

    #[test]
    fn test_read_instance() {
        let dir = tempdir().unwrap();
        write_instance_dir(dir.path(), UNITS_TOML, "load\n30\n40\n35\n");

        let instance = read_instance(dir.path()).unwrap();
        assert_eq!(instance.num_units(), 2);
        assert_eq!(instance.loads, vec![30.0, 40.0, 35.0]);

        // Optional fields default
        assert_approx_eq!(f64, instance.units[1].startup_cost, 0.0);
        assert!(instance.units[1].initially_on);
        assert!(!instance.units[0].initially_on);
    }

    #[test]
    fn test_read_instance_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_instance(dir.path()).is_err());
    }

    #[test]
    fn test_read_instance_empty_loads() {
        let dir = tempdir().unwrap();
        write_instance_dir(dir.path(), UNITS_TOML, "load\n");
        assert_error!(
            read_instance(dir.path()),
            format!(
                "CSV file {} cannot be empty",
                dir.path().join(LOADS_FILE_NAME).display()
            )
        );
    }

    #[test]
    fn test_read_instance_invalid_range() {
        let dir = tempdir().unwrap();
        let bad = "
[[units]]
a = 1.0
b = 1.0
c = 1.0
p_min = 30.0
p_max = 10.0
";
        write_instance_dir(dir.path(), bad, "load\n30\n");
        assert_error!(
            read_instance(dir.path()),
            format!(
                "Invalid unit roster in {}",
                dir.path().join(UNITS_FILE_NAME).display()
            )
        );
    }

    fn source() -> UcpInstance {
        let dir = tempdir().unwrap();
        write_instance_dir(dir.path(), UNITS_TOML, "load\n10\n20\n40\n30\n");
        read_instance(dir.path()).unwrap()
    }

    #[test]
    fn test_synthesize_scales_loads() {
        let instance = synthesize(&source(), 4, 2, 0, 1).unwrap();

        assert_eq!(instance.num_periods(), 4);
        assert_eq!(instance.num_units(), 2);
        // Peak load 40 scales to 2 units of the smallest plant (p_max 30)
        assert_approx_eq!(f64, instance.loads[2], 60.0);
        assert_approx_eq!(f64, instance.loads[0], 15.0);
    }

    #[test]
    fn test_synthesize_reproducible() {
        let source = source();
        assert_eq!(
            synthesize(&source, 2, 3, 0, 1).unwrap(),
            synthesize(&source, 2, 3, 0, 1).unwrap()
        );
    }

    #[test]
    fn test_synthesize_clamps_to_series() {
        // Requesting more periods than remain after the offset truncates the series
        let instance = synthesize(&source(), 10, 1, 2, 1).unwrap();
        assert_eq!(instance.num_periods(), 2);
    }

    #[test]
    fn test_synthesize_invalid_arguments() {
        let source = source();
        assert_error!(
            synthesize(&source, 0, 1, 0, 1),
            "Must synthesize at least one time step"
        );
        assert_error!(
            synthesize(&source, 1, 1, 4, 1),
            "Load offset 4 is outside the source demand series of length 4"
        );
    }
}
