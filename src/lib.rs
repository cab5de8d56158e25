//! Common functionality for ucdm, a unit commitment research harness.
//!
//! The crate builds discrete quadratic models from unit commitment problem (UCP) instances,
//! hands them to a pluggable sampler and turns the raw samples back into commitment schedules.
#![warn(missing_docs)]
pub mod cli;
pub mod decode;
pub mod discretize;
pub mod experiment;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod repair;
pub mod settings;
pub mod solution;
pub mod solver;
pub mod ucp;

#[cfg(test)]
mod fixture;

use std::path::PathBuf;

/// Get the path to the directory where the program configuration is stored
pub fn get_ucdm_config_dir() -> PathBuf {
    dirs::config_dir()
        .expect("Could not determine user config directory")
        .join("ucdm")
}
