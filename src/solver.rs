//! The sampler seam between the model builder and external solvers.
//!
//! The core never imports a vendor SDK: anything that can turn a [`DiscreteModel`] into an
//! assignment of domain values implements [`Sampler`]. The two in-repo implementations are
//! the exhaustive [`BruteForce`] reference solver and the local [`Annealer`] simulator;
//! remote-service adapters plug in at the same seam.
use crate::model::DiscreteModel;
use anyhow::Result;

pub mod anneal;
pub mod brute_force;

pub use anneal::Annealer;
pub use brute_force::{BruteForce, DEFAULT_STATE_LIMIT};

/// A raw solver result: one domain value per model variable.
///
/// Multi-valued models sample a level index per variable; one-hot models sample 0 or 1 per
/// binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The sampled domain value for each variable, in model variable order
    pub values: Vec<usize>,
    /// The model energy of the assignment
    pub energy: f64,
    /// Whether the sampler guarantees this is the optimal assignment
    pub exact: bool,
}

/// A solver capable of sampling low-energy assignments from a discrete model.
///
/// Sampling is a blocking call with no built-in timeout or cancellation; retry policy, if
/// any, belongs to the implementation. Errors propagate unchanged to the caller.
pub trait Sampler {
    /// A short name identifying the sampler in logs and result summaries
    fn name(&self) -> &str;

    /// Sample an assignment from `model`
    fn sample(&mut self, model: &DiscreteModel) -> Result<Sample>;
}
