//! Construction of discrete optimization models from UCP instances.
//!
//! The builder encodes the UCP objective and its operational constraints as linear and
//! pairwise bias terms over discretized power levels. Demand satisfaction is encoded as a
//! penalty on the squared deviation from the load, since unconstrained discrete samplers
//! cannot express hard equality constraints. The resulting model can be emitted in two
//! interchangeable representations, selected by [`Encoding`]:
//!
//! * *multi-valued*: one variable per (unit, time) whose domain is the unit's level set,
//!   with vector linear biases and matrix-shaped pairwise biases;
//! * *one-hot*: one binary variable per (unit, time, level), with an extra penalty biasing
//!   the sampler towards exactly one active level per (unit, time).
use crate::discretize::{DEFAULT_MAX_STEP, PowerLevelTable};
use crate::ucp::UcpInstance;
use anyhow::{Result, bail, ensure};
use clap::ValueEnum;
use indexmap::IndexMap;
use indexmap::map::Entry;
use itertools::Itertools;
use log::warn;
use strum::Display;

/// The representation a model is built in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Encoding {
    /// One variable per (unit, time) whose domain is the discretized level set
    MultiValued,
    /// One binary variable per (unit, time, level)
    OneHot,
}

/// Scalar weights trading off the bias families against each other.
///
/// All weights default to 1. Raising `demand` puts more pressure on meeting the load exactly;
/// raising `cost` favours objective fidelity instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiasWeights {
    /// Weight of the fuel cost terms (`y_c`)
    pub cost: f64,
    /// Weight of the startup and shutdown cost terms (`y_s`)
    pub transition: f64,
    /// Weight of the demand penalty terms (`y_d`)
    pub demand: f64,
    /// Weight of the one-hot exclusivity penalty (`y_p`; unused for multi-valued models)
    pub exclusivity: f64,
}

impl Default for BiasWeights {
    fn default() -> Self {
        Self {
            cost: 1.0,
            transition: 1.0,
            demand: 1.0,
            exclusivity: 1.0,
        }
    }
}

/// Options controlling how a model is built from an instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelOptions {
    /// The representation to build
    pub encoding: Encoding,
    /// The bias weights
    pub weights: BiasWeights,
    /// Maximum spacing between adjacent non-zero power levels
    pub max_step: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::MultiValued,
            weights: BiasWeights::default(),
            max_step: DEFAULT_MAX_STEP,
        }
    }
}

/// The identity of a model variable.
///
/// Multi-valued variables carry no level (`level == None`); one-hot variables are
/// per-level binaries. Variables are registered unit-major, then time, then level, and the
/// registration order defines the flat variable indices used in samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VariableKey {
    unit: usize,
    time: usize,
    level: Option<usize>,
}

/// A pairwise bias entry between domain values of two distinct variables.
///
/// Invariant: `a < b`, so each unordered pair is stored exactly once and reads are
/// symmetric by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct QuadKey {
    a: usize,
    a_index: usize,
    b: usize,
    b_index: usize,
}

/// A discrete optimization model: variables with linear bias vectors plus sparse pairwise
/// biases, keyed by the flat variable indices.
#[derive(Debug, Clone)]
pub struct DiscreteModel {
    encoding: Encoding,
    num_periods: usize,
    levels: PowerLevelTable,
    /// Linear bias vector per variable, indexed by the variable's domain
    variables: IndexMap<VariableKey, Vec<f64>>,
    /// Accumulated pairwise biases; entries are never overwritten, only added to
    quadratic: IndexMap<QuadKey, f64>,
}

impl DiscreteModel {
    /// Build a model from `instance` according to `options`.
    pub fn build(instance: &UcpInstance, options: &ModelOptions) -> Result<Self> {
        let levels = PowerLevelTable::new(instance, options.max_step)?;
        let mut model = Self {
            encoding: options.encoding,
            num_periods: instance.num_periods(),
            levels,
            variables: IndexMap::new(),
            quadratic: IndexMap::new(),
        };

        model.register_variables();
        model.add_linear_biases(instance, &options.weights)?;
        model.add_transition_couplings(instance, options.weights.transition)?;
        model.add_demand_couplings(instance, options.weights.demand)?;
        if options.encoding == Encoding::OneHot {
            model.add_exclusivity_penalties(options.weights.exclusivity)?;
        }

        Ok(model)
    }

    /// Register one variable per (unit, time) or per (unit, time, level), in a fixed order.
    fn register_variables(&mut self) {
        for unit in 0..self.levels.num_units() {
            let num_levels = self.levels.num_levels(unit);
            for time in 0..self.num_periods {
                match self.encoding {
                    Encoding::MultiValued => {
                        let key = VariableKey {
                            unit,
                            time,
                            level: None,
                        };
                        self.variables.insert(key, vec![0.0; num_levels]);
                    }
                    Encoding::OneHot => {
                        for level in 0..num_levels {
                            let key = VariableKey {
                                unit,
                                time,
                                level: Some(level),
                            };
                            self.variables.insert(key, vec![0.0; 2]);
                        }
                    }
                }
            }
        }
    }

    /// Linear biases: fuel cost plus the per-unit part of the squared demand penalty.
    ///
    /// The cross-unit part of the demand penalty is added as pairwise biases and the
    /// load-only constant is dropped, since it does not affect the argmin. The transition
    /// cost implied by the unit's initial state is baked into the first time step: the
    /// startup cost onto every non-zero level of an initially-off unit, the shutdown cost
    /// onto the off level of an initially-on unit.
    fn add_linear_biases(&mut self, instance: &UcpInstance, weights: &BiasWeights) -> Result<()> {
        for (i, unit) in instance.units.iter().enumerate() {
            let levels = self.levels.levels(i).to_vec();
            for (t, &load) in instance.loads.iter().enumerate() {
                for (k, &p) in levels.iter().enumerate().skip(1) {
                    let mut value =
                        weights.cost * unit.fuel_cost(p) + weights.demand * (p * p - load * p);
                    if t == 0 && !unit.initially_on {
                        value += weights.transition * unit.startup_cost;
                    }
                    self.add_level_bias(i, t, k, value)?;
                }
                if t == 0 && unit.initially_on {
                    self.add_level_bias(i, 0, 0, weights.transition * unit.shutdown_cost)?;
                }
            }
        }

        Ok(())
    }

    /// Startup/shutdown couplings between consecutive time steps of the same unit.
    fn add_transition_couplings(&mut self, instance: &UcpInstance, y_s: f64) -> Result<()> {
        for (i, unit) in instance.units.iter().enumerate() {
            let num_levels = self.levels.num_levels(i);
            for t in 1..self.num_periods {
                for k in 1..num_levels {
                    // off at t-1, on at t
                    self.add_level_coupling((i, t - 1, 0), (i, t, k), y_s * unit.startup_cost)?;
                    // on at t-1, off at t
                    self.add_level_coupling((i, t - 1, k), (i, t, 0), y_s * unit.shutdown_cost)?;
                }
            }
        }

        Ok(())
    }

    /// Cross-unit demand couplings: the cross term of the squared demand penalty.
    ///
    /// Applied for every pair of distinct units at the same time step only; variables of
    /// different units at different time steps never interact.
    fn add_demand_couplings(&mut self, instance: &UcpInstance, y_d: f64) -> Result<()> {
        for j in 1..instance.num_units() {
            for i in 0..j {
                let levels_i = self.levels.levels(i).to_vec();
                let levels_j = self.levels.levels(j).to_vec();
                for t in 0..self.num_periods {
                    for (k, l) in (1..levels_i.len()).cartesian_product(1..levels_j.len()) {
                        let value = y_d * levels_i[k] * levels_j[l];
                        self.add_level_coupling((i, t, k), (j, t, l), value)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// One-hot exclusivity: penalize any two active levels of the same (unit, time) and
    /// reward each single active level, so that exactly one active level is favoured.
    fn add_exclusivity_penalties(&mut self, y_p: f64) -> Result<()> {
        for i in 0..self.levels.num_units() {
            let num_levels = self.levels.num_levels(i);
            for t in 0..self.num_periods {
                for k in 0..num_levels {
                    self.add_level_bias(i, t, k, -y_p)?;
                }
                for (k, l) in (0..num_levels).tuple_combinations() {
                    self.add_level_coupling((i, t, k), (i, t, l), y_p)?;
                }
            }
        }

        Ok(())
    }

    /// Resolve a (unit, time, level) triple to a flat variable index and domain value.
    fn resolve(&self, unit: usize, time: usize, level: usize) -> Result<(usize, usize)> {
        let key = match self.encoding {
            Encoding::MultiValued => VariableKey {
                unit,
                time,
                level: None,
            },
            Encoding::OneHot => VariableKey {
                unit,
                time,
                level: Some(level),
            },
        };

        let Some((var, _, linear)) = self.variables.get_full(&key) else {
            bail!("Unknown variable: unit {unit}, time {time}, level {level}");
        };

        match self.encoding {
            Encoding::MultiValued => {
                ensure!(
                    level < linear.len(),
                    "Unknown variable: unit {unit}, time {time}, level {level}"
                );
                Ok((var, level))
            }
            // A one-hot binary contributes its bias when set to 1
            Encoding::OneHot => Ok((var, 1)),
        }
    }

    /// Add `value` to the linear bias of a (unit, time, level) triple.
    fn add_level_bias(&mut self, unit: usize, time: usize, level: usize, value: f64) -> Result<()> {
        let (var, index) = self.resolve(unit, time, level)?;
        self.variables[var][index] += value;

        Ok(())
    }

    /// Add `value` to the pairwise bias between two (unit, time, level) triples.
    ///
    /// Duplicate writes accumulate; an existing entry is never overwritten.
    fn add_level_coupling(
        &mut self,
        a: (usize, usize, usize),
        b: (usize, usize, usize),
        value: f64,
    ) -> Result<()> {
        let (var_a, index_a) = self.resolve(a.0, a.1, a.2)?;
        let (var_b, index_b) = self.resolve(b.0, b.1, b.2)?;
        ensure!(
            var_a != var_b,
            "Cannot couple a variable with itself: unit {}, time {}",
            a.0,
            a.1
        );

        let key = if var_a < var_b {
            QuadKey {
                a: var_a,
                a_index: index_a,
                b: var_b,
                b_index: index_b,
            }
        } else {
            QuadKey {
                a: var_b,
                a_index: index_b,
                b: var_a,
                b_index: index_a,
            }
        };

        match self.quadratic.entry(key) {
            Entry::Occupied(mut entry) => {
                warn!(
                    "Accumulating duplicate quadratic bias between units {} and {} at times {} and {}",
                    a.0, b.0, a.1, b.1
                );
                *entry.get_mut() += value;
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }

        Ok(())
    }

    /// The encoding this model was built with
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The number of variables in the model
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The number of units the model was built from
    pub fn num_units(&self) -> usize {
        self.levels.num_units()
    }

    /// The number of time steps the model was built from
    pub fn num_periods(&self) -> usize {
        self.num_periods
    }

    /// The discretized power levels the model was built from
    pub fn power_levels(&self) -> &PowerLevelTable {
        &self.levels
    }

    /// The domain size of variable `var`
    pub fn domain_size(&self, var: usize) -> usize {
        self.variables[var].len()
    }

    /// The linear bias vector of variable `var`, indexed by domain value
    pub fn linear(&self, var: usize) -> &[f64] {
        &self.variables[var]
    }

    /// The flat index of the variable for (unit, time[, level]).
    ///
    /// Multi-valued models take `level = None`; one-hot models take the level of the
    /// requested binary.
    pub fn variable_index(&self, unit: usize, time: usize, level: Option<usize>) -> Result<usize> {
        let key = VariableKey { unit, time, level };
        let Some(var) = self.variables.get_index_of(&key) else {
            match level {
                Some(level) => bail!("Unknown variable: unit {unit}, time {time}, level {level}"),
                None => bail!("Unknown variable: unit {unit}, time {time}"),
            }
        };

        Ok(var)
    }

    /// The linear bias carried by a (unit, time, level) triple.
    pub fn level_bias(&self, unit: usize, time: usize, level: usize) -> Result<f64> {
        let (var, index) = self.resolve(unit, time, level)?;

        Ok(self.variables[var][index])
    }

    /// The pairwise bias between two (unit, time, level) triples, in either order.
    ///
    /// Returns 0 for pairs without an interaction, e.g. different units at different
    /// time steps.
    pub fn level_coupling(
        &self,
        a: (usize, usize, usize),
        b: (usize, usize, usize),
    ) -> Result<f64> {
        let (var_a, index_a) = self.resolve(a.0, a.1, a.2)?;
        let (var_b, index_b) = self.resolve(b.0, b.1, b.2)?;

        let key = if var_a < var_b {
            QuadKey {
                a: var_a,
                a_index: index_a,
                b: var_b,
                b_index: index_b,
            }
        } else {
            QuadKey {
                a: var_b,
                a_index: index_b,
                b: var_a,
                b_index: index_a,
            }
        };

        Ok(self.quadratic.get(&key).copied().unwrap_or(0.0))
    }

    /// Iterate over all pairwise bias entries as `((var, domain value), (var, domain value),
    /// bias)`.
    pub fn quadratic_entries(
        &self,
    ) -> impl Iterator<Item = ((usize, usize), (usize, usize), f64)> + '_ {
        self.quadratic
            .iter()
            .map(|(key, &value)| ((key.a, key.a_index), (key.b, key.b_index), value))
    }

    /// The linear biases in scalar per-binary form, for QUBO-native solver adapters.
    ///
    /// Only available for one-hot models, where every variable is a binary and its bias is
    /// the single value it contributes when active.
    pub fn binary_linear(&self) -> Result<Vec<(usize, f64)>> {
        ensure!(
            self.encoding == Encoding::OneHot,
            "Scalar bias views are only available for one-hot models"
        );

        Ok(self
            .variables
            .values()
            .enumerate()
            .map(|(var, linear)| (var, linear[1]))
            .collect())
    }

    /// The pairwise biases in scalar per-binary-pair form, for QUBO-native solver adapters.
    pub fn binary_quadratic(&self) -> Result<Vec<((usize, usize), f64)>> {
        ensure!(
            self.encoding == Encoding::OneHot,
            "Scalar bias views are only available for one-hot models"
        );

        Ok(self
            .quadratic
            .iter()
            .map(|(key, &value)| ((key.a, key.b), value))
            .collect())
    }

    /// The total number of assignments in the model's search space.
    ///
    /// Returned as a float since the product overflows integer types quickly.
    pub fn state_count(&self) -> f64 {
        self.variables
            .values()
            .map(|linear| linear.len() as f64)
            .product()
    }

    /// The total bias ("energy") of an assignment of domain values to all variables.
    pub fn energy(&self, values: &[usize]) -> f64 {
        debug_assert_eq!(values.len(), self.variables.len());

        let linear: f64 = self
            .variables
            .values()
            .zip(values)
            .map(|(linear, &value)| linear[value])
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .filter(|(key, _)| values[key.a] == key.a_index && values[key.b] == key.b_index)
            .map(|(_, &value)| value)
            .sum();

        linear + quadratic
    }
}
