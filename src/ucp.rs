//! The unit commitment problem (UCP): time-indexed loads and a roster of generating units.
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// A generating unit with a quadratic fuel cost curve.
///
/// When the unit is committed and producing power `p`, its fuel cost is `a + b·p + c·p²`.
/// Switching the unit on or off additionally incurs the startup or shutdown cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratingUnit {
    /// Constant coefficient of the fuel cost curve
    pub a: f64,
    /// Linear coefficient of the fuel cost curve
    pub b: f64,
    /// Quadratic coefficient of the fuel cost curve
    pub c: f64,
    /// Minimum power output when committed
    pub p_min: f64,
    /// Maximum power output
    pub p_max: f64,
    /// Cost incurred on every off-to-on transition
    #[serde(default)]
    pub startup_cost: f64,
    /// Cost incurred on every on-to-off transition
    #[serde(default)]
    pub shutdown_cost: f64,
    /// Whether the unit is committed before the first time step
    #[serde(default)]
    pub initially_on: bool,
}

impl GeneratingUnit {
    /// The fuel cost of this unit when committed and producing power `p`
    pub fn fuel_cost(&self, p: f64) -> f64 {
        self.a + self.b * p + self.c * p * p
    }
}

/// An immutable UCP instance: per-time-step demand plus the unit roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcpInstance {
    /// Power demand per time step
    pub loads: Vec<f64>,
    /// The generating units available to meet demand
    pub units: Vec<GeneratingUnit>,
}

impl UcpInstance {
    /// Create a new instance, checking basic invariants.
    pub fn new(loads: Vec<f64>, units: Vec<GeneratingUnit>) -> Result<Self> {
        ensure!(!loads.is_empty(), "Instance must have at least one load");
        ensure!(
            !units.is_empty(),
            "Instance must have at least one generating unit"
        );
        for (t, load) in loads.iter().enumerate() {
            ensure!(
                load.is_finite() && *load >= 0.0,
                "Load at time step {t} must be finite and non-negative (got {load})"
            );
        }

        Ok(Self { loads, units })
    }

    /// The number of generating units
    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    /// The number of time steps
    pub fn num_periods(&self) -> usize {
        self.loads.len()
    }

    /// The true UCP objective for a commitment schedule `u` and power output `p`.
    ///
    /// Sums the fuel cost of every committed unit plus the startup cost on every off-to-on
    /// transition and the shutdown cost on every on-to-off transition. The transition implied
    /// by `initially_on` at the first time step is included.
    pub fn total_cost(&self, u: &[Vec<bool>], p: &[Vec<f64>]) -> f64 {
        let mut cost = 0.0;
        for (i, unit) in self.units.iter().enumerate() {
            let mut prev_on = unit.initially_on;
            for t in 0..self.num_periods() {
                let on = u[i][t];
                if on {
                    cost += unit.fuel_cost(p[i][t]);
                }
                if on && !prev_on {
                    cost += unit.startup_cost;
                }
                if !on && prev_on {
                    cost += unit.shutdown_cost;
                }
                prev_on = on;
            }
        }

        cost
    }
}

/// Check that every unit's power range is usable.
///
/// This is stricter than [`UcpInstance::new`]: input files must describe units with
/// `0 <= p_min <= p_max` even though the core types permit raw values.
pub fn validate_units(units: &[GeneratingUnit]) -> Result<()> {
    for (i, unit) in units.iter().enumerate() {
        let check = || -> Result<()> {
            ensure!(
                unit.p_min.is_finite() && unit.p_max.is_finite(),
                "Power bounds must be finite"
            );
            ensure!(
                unit.p_min >= 0.0,
                "p_min must be non-negative (got {})",
                unit.p_min
            );
            ensure!(
                unit.p_max >= unit.p_min,
                "p_max ({}) is less than p_min ({})",
                unit.p_max,
                unit.p_min
            );
            Ok(())
        };
        check().with_context(|| format!("Invalid power range for unit {i}"))?;
    }

    Ok(())
}
