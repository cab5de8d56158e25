//! Exhaustive enumeration of a model's search space.
//!
//! Evaluates every assignment of domain values and returns the true optimum. The cost is
//! the product of all domain sizes, so this is only usable as a ground-truth oracle for
//! small instances; the state limit makes that a checked precondition rather than a
//! runtime surprise.
use super::{Sample, Sampler};
use crate::model::DiscreteModel;
use anyhow::{Result, ensure};

/// The default upper bound on the number of states the solver will enumerate
pub const DEFAULT_STATE_LIMIT: f64 = 1e7;

/// The exhaustive reference solver.
#[derive(Debug, Clone, PartialEq)]
pub struct BruteForce {
    state_limit: f64,
}

impl BruteForce {
    /// Create a solver that refuses search spaces larger than `state_limit` states.
    pub fn new(state_limit: f64) -> Self {
        Self { state_limit }
    }
}

impl Default for BruteForce {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_LIMIT)
    }
}

/// Advance `values` to the next assignment, odometer style. Returns false once the space
/// is exhausted.
fn next_assignment(values: &mut [usize], model: &DiscreteModel) -> bool {
    for (var, value) in values.iter_mut().enumerate() {
        if *value + 1 < model.domain_size(var) {
            *value += 1;
            return true;
        }
        *value = 0;
    }

    false
}

impl Sampler for BruteForce {
    fn name(&self) -> &str {
        "brute-force"
    }

    fn sample(&mut self, model: &DiscreteModel) -> Result<Sample> {
        let states = model.state_count();
        ensure!(
            states <= self.state_limit,
            "Search space of {states} states exceeds the enumeration limit of {}",
            self.state_limit
        );

        let mut values = vec![0; model.num_variables()];
        let mut best = values.clone();
        let mut best_energy = model.energy(&values);
        while next_assignment(&mut values, model) {
            let energy = model.energy(&values);
            if energy < best_energy {
                best_energy = energy;
                best.copy_from_slice(&values);
            }
        }

        Ok(Sample {
            values: best,
            energy: best_energy,
            exact: true,
        })
    }
}
