//! A local simulated-annealing sampler.
//!
//! Single-variable moves with Metropolis acceptance under a geometric cooling schedule.
//! The starting temperature is derived from the largest bias magnitude in the model, so
//! the schedule adapts to the scale of the instance. Seeded for reproducibility; the same
//! seed and model always produce the same sample.
use super::{Sample, Sampler};
use crate::model::DiscreteModel;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The default number of sweeps (moves per variable)
pub const DEFAULT_SWEEPS: usize = 1000;

/// Ratio between the final and starting temperature of the cooling schedule
const COOLING_SPAN: f64 = 1e-4;

/// A simulated-annealing sampler over discrete models.
#[derive(Debug, Clone, PartialEq)]
pub struct Annealer {
    seed: u64,
    sweeps: usize,
}

impl Annealer {
    /// Create a sampler with the given seed and the default number of sweeps.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            sweeps: DEFAULT_SWEEPS,
        }
    }

    /// Override the number of sweeps.
    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps;
        self
    }
}

/// The pairwise bias entries touching one variable, for incremental energy evaluation.
struct Adjacency {
    /// (this variable's domain value, other variable, other domain value, bias)
    entries: Vec<Vec<(usize, usize, usize, f64)>>,
}

impl Adjacency {
    fn new(model: &DiscreteModel) -> Self {
        let mut entries = vec![Vec::new(); model.num_variables()];
        for ((a, a_index), (b, b_index), value) in model.quadratic_entries() {
            entries[a].push((a_index, b, b_index, value));
            entries[b].push((b_index, a, a_index, value));
        }

        Self { entries }
    }

    /// The energy contribution of variable `var` taking `value` under `state`.
    fn local_energy(&self, model: &DiscreteModel, state: &[usize], var: usize, value: usize) -> f64 {
        let quadratic: f64 = self.entries[var]
            .iter()
            .filter(|&&(my_index, other, other_index, _)| {
                my_index == value && state[other] == other_index
            })
            .map(|&(_, _, _, bias)| bias)
            .sum();

        model.linear(var)[value] + quadratic
    }
}

/// The starting temperature: the largest bias magnitude in the model, floored at 1.
fn starting_temperature(model: &DiscreteModel) -> f64 {
    let linear_max = (0..model.num_variables())
        .flat_map(|var| model.linear(var).iter().map(|bias| bias.abs()))
        .fold(0.0, f64::max);
    let quadratic_max = model
        .quadratic_entries()
        .map(|(_, _, value)| value.abs())
        .fold(0.0, f64::max);

    linear_max.max(quadratic_max).max(1.0)
}

impl Sampler for Annealer {
    fn name(&self) -> &str {
        "anneal"
    }

    fn sample(&mut self, model: &DiscreteModel) -> Result<Sample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let adjacency = Adjacency::new(model);
        let num_variables = model.num_variables();

        let mut state: Vec<usize> = (0..num_variables)
            .map(|var| rng.random_range(0..model.domain_size(var)))
            .collect();
        let mut energy = model.energy(&state);
        let mut best = state.clone();
        let mut best_energy = energy;

        let t_start = starting_temperature(model);
        let steps = self.sweeps * num_variables;
        let cooling = COOLING_SPAN.powf(1.0 / steps as f64);
        let mut temperature = t_start;

        for _ in 0..steps {
            let var = rng.random_range(0..num_variables);
            let domain = model.domain_size(var);
            if domain < 2 {
                continue;
            }

            // Propose a different domain value for one variable
            let mut proposed = rng.random_range(0..domain - 1);
            if proposed >= state[var] {
                proposed += 1;
            }

            let delta = adjacency.local_energy(model, &state, var, proposed)
                - adjacency.local_energy(model, &state, var, state[var]);
            if delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp() {
                state[var] = proposed;
                energy += delta;
                if energy < best_energy {
                    best_energy = energy;
                    best.copy_from_slice(&state);
                }
            }

            temperature *= cooling;
        }

        // Recompute from scratch to shed accumulated floating point drift
        let best_energy = model.energy(&best);

        Ok(Sample {
            values: best,
            energy: best_energy,
            exact: false,
        })
    }
}
