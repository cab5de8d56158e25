//! Discretization of continuous power ranges into finite level sets.
//!
//! Each unit's operating range `[p_min, p_max]` is mapped to an ordered set of representative
//! power levels. Level 0 is always the "off" level with zero power; the remaining levels span
//! the range with a spacing no larger than the requested maximum step. The level count is
//! always a power of two, so coarser steps shrink the search space of the discrete model
//! exponentially at the cost of solution granularity.
use crate::ucp::{GeneratingUnit, UcpInstance};
use anyhow::{Result, ensure};

/// The default upper bound on the spacing between adjacent non-zero power levels
pub const DEFAULT_MAX_STEP: f64 = 10.0;

/// The largest exponent a unit's level count may reach (2^20 levels).
///
/// A spacing far below the unit's spectrum would otherwise demand a level vector too large
/// to allocate.
const MAX_LEVEL_BITS: u32 = 20;

/// Compute the representative power levels for a unit.
///
/// The spacing between adjacent non-zero levels is at most `max_step`. The result always
/// starts with the off level (`0.0`), followed by `2^n - 1` strictly increasing levels from
/// `p_min` to `p_max`, for the smallest `n` that respects the spacing bound.
///
/// A degenerate range with `p_min == p_max` yields the two levels `[0, p_max]`, i.e. the
/// unit is either off or producing at its only possible output.
pub fn discretize(unit: &GeneratingUnit, max_step: f64) -> Result<Vec<f64>> {
    ensure!(
        max_step > 0.0,
        "Maximum level spacing must be positive (got {max_step})"
    );
    ensure!(
        unit.p_max >= unit.p_min,
        "Invalid power range: p_max ({}) is less than p_min ({})",
        unit.p_max,
        unit.p_min
    );

    let spectrum = unit.p_max - unit.p_min;
    if spectrum == 0.0 {
        return Ok(vec![0.0, unit.p_max]);
    }

    let n = (spectrum / max_step + 2.0).log2().ceil() as u32;
    ensure!(
        n <= MAX_LEVEL_BITS,
        "Level spacing {max_step} would require 2^{n} levels for the range [{}, {}]; the limit is 2^{MAX_LEVEL_BITS}",
        unit.p_min,
        unit.p_max
    );
    let num_levels = 1usize << n;
    let h = spectrum / (num_levels as f64 - 2.0);

    let mut levels = Vec::with_capacity(num_levels);
    levels.push(0.0);
    for k in 0..num_levels - 1 {
        levels.push(unit.p_min + k as f64 * h);
    }

    Ok(levels)
}

/// The discretized power levels of every unit in an instance.
///
/// Computed once per solve and read by the model builder and the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLevelTable {
    levels: Vec<Vec<f64>>,
}

impl PowerLevelTable {
    /// Discretize every unit of `instance` with the given maximum level spacing.
    pub fn new(instance: &UcpInstance, max_step: f64) -> Result<Self> {
        let levels = instance
            .units
            .iter()
            .map(|unit| discretize(unit, max_step))
            .collect::<Result<_>>()?;

        Ok(Self { levels })
    }

    /// The number of units in the table
    pub fn num_units(&self) -> usize {
        self.levels.len()
    }

    /// The ordered power levels of unit `unit`
    pub fn levels(&self, unit: usize) -> &[f64] {
        &self.levels[unit]
    }

    /// The number of levels of unit `unit`, including the off level
    pub fn num_levels(&self, unit: usize) -> usize {
        self.levels[unit].len()
    }
}
