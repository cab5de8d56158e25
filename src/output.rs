//! The module responsible for writing output data to disk.
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which instance-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "ucdm_results";

/// The output file name for a single solved instance
pub const SOLUTION_FILE_NAME: &str = "solution.json";

/// The output file name for the experiment summary
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// Get the default output folder for the instance at the specified directory path
pub fn get_output_dir(instance_dir: &Path) -> Result<PathBuf> {
    // Get the instance name from the dir path. This ends up being convoluted because we
    // need to check for all possible errors. Ugh.
    let instance_dir = instance_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to instance")?;

    let instance_name = instance_dir
        .file_name()
        .context("Instance cannot be in root folder")?
        .to_str()
        .context("Invalid chars in instance dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, instance_name].iter().collect())
}

/// Create a new output directory, replacing an existing one only when allowed.
///
/// Returns whether an existing directory was removed, so that the caller can warn about
/// the overwrite once the logger is up.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let existed = output_dir.is_dir();
    if existed {
        if !overwrite {
            bail!(
                "Output directory {} already exists. Pass --overwrite to replace it.",
                output_dir.display()
            );
        }

        fs::remove_dir_all(output_dir)?;
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(existed)
}

/// A row of the experiment summary CSV file.
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryRow {
    /// Number of time steps of the experiment cell
    pub num_periods: usize,
    /// Number of units of the experiment cell
    pub num_units: usize,
    /// The encoding the model was built with
    pub encoding: String,
    /// The sampler that produced the solution
    pub sampler: String,
    /// The repaired objective value
    pub objective: f64,
    /// Wall-clock seconds spent in the sampler
    pub time: f64,
    /// Whether the sampler guarantees optimality
    pub optimal: bool,
    /// Whether the repaired solution meets demand within tolerance
    pub feasible: bool,
}

/// An object for writing experiment summary rows to file
pub struct SummaryWriter {
    writer: csv::Writer<File>,
}

impl SummaryWriter {
    /// Open the summary CSV file in the given output folder.
    pub fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(SUMMARY_FILE_NAME);
        let writer = csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create file {}", file_path.display()))?;

        Ok(Self { writer })
    }

    /// Append a row to the summary.
    pub fn write(&mut self, row: &SummaryRow) -> Result<()> {
        self.writer.serialize(row)?;

        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Already exists: refused without the overwrite flag
        assert!(create_output_directory(&output_dir, false).is_err());

        // Overwriting replaces the directory and its contents
        fs::write(output_dir.join("stale.txt"), "old").unwrap();
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("stale.txt").exists());
    }

    #[test]
    fn test_summary_writer() {
        let dir = tempdir().unwrap();
        let mut writer = SummaryWriter::create(dir.path()).unwrap();
        writer
            .write(&SummaryRow {
                num_periods: 2,
                num_units: 3,
                encoding: "multi-valued".into(),
                sampler: "brute-force".into(),
                objective: 123.5,
                time: 0.25,
                optimal: true,
                feasible: true,
            })
            .unwrap();
        writer.flush().unwrap();

        let contents = fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
        assert!(contents.starts_with(
            "num_periods,num_units,encoding,sampler,objective,time,optimal,feasible\n"
        ));
        assert!(contents.contains("2,3,multi-valued,brute-force,123.5,0.25,true,true"));
    }
}
