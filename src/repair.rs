//! Post-solution repair: redistributing power to meet demand.
//!
//! Discretization plus the penalty-based demand encoding mean decoded power rarely sums
//! exactly to the load. The repair step spreads the shortfall or excess evenly across the
//! committed units of each time step, clamping at capacity bounds. Commitment is never
//! changed: a unit the decoder marked off stays off, and if every committed unit saturates
//! its bounds the residual imbalance is left in place, surfacing only as a lower solution
//! quality.
use crate::ucp::UcpInstance;

/// Adjust `p` in place so that each time step's output approaches its load.
///
/// Only committed units participate. Each round splits the remaining imbalance evenly over
/// the adjustable units; a unit pushed past a capacity bound is clamped there and removed
/// from the adjustable set, with the spill carried into the next round. Every round either
/// finishes or permanently shrinks the adjustable set, so each time step terminates within
/// `num_units` rounds.
pub fn repair_power(instance: &UcpInstance, u: &[Vec<bool>], p: &mut [Vec<f64>]) {
    for t in 0..instance.num_periods() {
        let mut adjustable: Vec<bool> = (0..instance.num_units()).map(|i| u[i][t]).collect();
        let mut delta: f64 =
            instance.loads[t] - (0..instance.num_units()).map(|i| p[i][t]).sum::<f64>();

        loop {
            let count = adjustable.iter().filter(|&&a| a).count();
            if delta == 0.0 || count == 0 {
                break;
            }

            let share = delta / count as f64;
            delta = 0.0;
            for (i, unit) in instance.units.iter().enumerate() {
                if !adjustable[i] {
                    continue;
                }

                p[i][t] += share;
                if p[i][t] > unit.p_max {
                    delta += p[i][t] - unit.p_max;
                    p[i][t] = unit.p_max;
                    adjustable[i] = false;
                } else if p[i][t] < unit.p_min {
                    delta += p[i][t] - unit.p_min;
                    p[i][t] = unit.p_min;
                    adjustable[i] = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ucp::GeneratingUnit;
    use float_cmp::assert_approx_eq;

    fn unit(p_min: f64, p_max: f64) -> GeneratingUnit {
        GeneratingUnit {
            a: 0.0,
            b: 1.0,
            c: 0.0,
            p_min,
            p_max,
            startup_cost: 0.0,
            shutdown_cost: 0.0,
            initially_on: false,
        }
    }

    fn repair(loads: Vec<f64>, units: Vec<GeneratingUnit>, p: &mut [Vec<f64>]) {
        let instance = UcpInstance::new(loads, units).unwrap();
        let u: Vec<Vec<bool>> = p
            .iter()
            .map(|p_i| p_i.iter().map(|&value| value > 0.0).collect())
            .collect();
        repair_power(&instance, &u, p);

        // Committed units always end up within their bounds
        for (i, unit) in instance.units.iter().enumerate() {
            for t in 0..instance.num_periods() {
                if u[i][t] {
                    assert!(p[i][t] >= unit.p_min && p[i][t] <= unit.p_max);
                } else {
                    assert_approx_eq!(f64, p[i][t], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_uniform_split() {
        let mut p = vec![vec![10.0], vec![10.0]];
        repair(
            vec![30.0],
            vec![unit(10.0, 30.0), unit(10.0, 30.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![15.0], vec![15.0]]);
    }

    #[test]
    fn test_off_units_never_adjusted() {
        let mut p = vec![vec![0.0], vec![0.0]];
        repair(
            vec![10.0],
            vec![unit(10.0, 30.0), unit(10.0, 30.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_capped_unit_redistributes_excess() {
        // The first unit saturates at p_max = 30 and the rest of the shortfall flows to
        // the second
        let mut p = vec![vec![30.0], vec![40.0]];
        repair(
            vec![80.0],
            vec![unit(10.0, 30.0), unit(10.0, 70.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![30.0], vec![50.0]]);
    }

    #[test]
    fn test_all_units_capped_leaves_residual() {
        // Demand cannot be met; both units stay at p_max and the residual is accepted
        let mut p = vec![vec![30.0], vec![30.0]];
        repair(
            vec![80.0],
            vec![unit(10.0, 30.0), unit(10.0, 30.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![30.0], vec![30.0]]);
    }

    #[test]
    fn test_floor_respected_on_excess() {
        // Total output exceeds demand; the second unit hits its floor at 50 and the first
        // absorbs the remainder
        let mut p = vec![vec![30.0], vec![50.0]];
        repair(
            vec![70.0],
            vec![unit(10.0, 70.0), unit(50.0, 70.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![20.0], vec![50.0]]);
    }

    #[test]
    fn test_idempotent_on_exact_match() {
        let mut p = vec![vec![15.0, 20.0], vec![15.0, 20.0]];
        repair(
            vec![30.0, 40.0],
            vec![unit(10.0, 30.0), unit(10.0, 30.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![15.0, 20.0], vec![15.0, 20.0]]);
    }

    #[test]
    fn test_time_steps_repaired_independently() {
        let mut p = vec![vec![10.0, 30.0], vec![10.0, 0.0]];
        repair(
            vec![30.0, 20.0],
            vec![unit(10.0, 30.0), unit(10.0, 30.0)],
            &mut p,
        );
        assert_eq!(p, vec![vec![15.0, 20.0], vec![15.0, 0.0]]);
    }
}
