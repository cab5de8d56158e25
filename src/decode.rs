//! Decoding of raw solver samples back into UCP commitment and power variables.
use crate::model::{DiscreteModel, Encoding};
use crate::solver::Sample;
use anyhow::{Result, ensure};
use log::warn;

/// Convert a raw sample into per-(unit, time) commitment `u` and power output `p`.
///
/// For one-hot models, a sample with no active level for a (unit, time) decodes to the off
/// level, and a sample with several active levels resolves to the median active level by
/// position with a diagnostic. Neither is an error: imperfect samplers routinely return
/// one-hot violations and the repair step compensates downstream.
pub fn decode(model: &DiscreteModel, sample: &Sample) -> Result<(Vec<Vec<bool>>, Vec<Vec<f64>>)> {
    ensure!(
        sample.values.len() == model.num_variables(),
        "Sample has {} values but the model has {} variables",
        sample.values.len(),
        model.num_variables()
    );

    let mut u = Vec::with_capacity(model.num_units());
    let mut p = Vec::with_capacity(model.num_units());
    for i in 0..model.num_units() {
        let levels = model.power_levels().levels(i);
        let mut u_i = Vec::with_capacity(model.num_periods());
        let mut p_i = Vec::with_capacity(model.num_periods());
        for t in 0..model.num_periods() {
            let value = match model.encoding() {
                Encoding::MultiValued => {
                    let var = model.variable_index(i, t, None)?;
                    let k = sample.values[var];
                    ensure!(
                        k < levels.len(),
                        "Sample value {k} is outside the domain of unit {i} at time {t}"
                    );
                    levels[k]
                }
                Encoding::OneHot => {
                    let mut active = Vec::new();
                    for k in 0..levels.len() {
                        let var = model.variable_index(i, t, Some(k))?;
                        let value = sample.values[var];
                        ensure!(
                            value <= 1,
                            "Sample value {value} is not binary for unit {i} at time {t}"
                        );
                        if value == 1 {
                            active.push(k);
                        }
                    }

                    if active.is_empty() {
                        0.0
                    } else {
                        if active.len() > 1 {
                            warn!(
                                "{} active power levels for unit {i} at time {t}, using the median",
                                active.len()
                            );
                        }
                        levels[active[active.len() / 2]]
                    }
                }
            };

            u_i.push(value > 0.0);
            p_i.push(value);
        }

        u.push(u_i);
        p.push(p_i);
    }

    Ok((u, p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, bias_instance};
    use crate::model::ModelOptions;
    use crate::ucp::UcpInstance;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn build(instance: &UcpInstance, encoding: Encoding) -> DiscreteModel {
        DiscreteModel::build(
            instance,
            &ModelOptions {
                encoding,
                ..ModelOptions::default()
            },
        )
        .unwrap()
    }

    fn sample(values: Vec<usize>) -> Sample {
        Sample {
            values,
            energy: 0.0,
            exact: false,
        }
    }

    #[rstest]
    fn test_decode_multi_valued(bias_instance: UcpInstance) {
        let model = build(&bias_instance, Encoding::MultiValued);

        // Variables are ordered unit-major, then time
        let values = vec![0, 1, 3, 2, 0, 2, 7, 1, 0];
        let (u, p) = decode(&model, &sample(values)).unwrap();

        assert_eq!(
            u,
            vec![
                vec![false, true, true],
                vec![true, false, true],
                vec![true, true, false],
            ]
        );
        assert_approx_eq!(f64, p[0][1], 10.0);
        assert_approx_eq!(f64, p[0][2], 30.0);
        assert_approx_eq!(f64, p[1][0], 20.0);
        assert_approx_eq!(f64, p[2][0], 80.0);
        assert_approx_eq!(f64, p[2][1], 20.0);
        assert_approx_eq!(f64, p[2][2], 0.0);
    }

    #[rstest]
    fn test_decode_one_hot(bias_instance: UcpInstance) {
        let instance = UcpInstance::new(
            bias_instance.loads[..1].to_vec(),
            bias_instance.units[..1].to_vec(),
        )
        .unwrap();
        let model = build(&instance, Encoding::OneHot);

        // Exactly one active level
        let (u, p) = decode(&model, &sample(vec![0, 0, 1, 0])).unwrap();
        assert_eq!(u, vec![vec![true]]);
        assert_approx_eq!(f64, p[0][0], 20.0);

        // No active level decodes to off
        let (u, p) = decode(&model, &sample(vec![0, 0, 0, 0])).unwrap();
        assert_eq!(u, vec![vec![false]]);
        assert_approx_eq!(f64, p[0][0], 0.0);
    }

    #[rstest]
    fn test_decode_one_hot_median_tie_break(bias_instance: UcpInstance) {
        let instance = UcpInstance::new(
            bias_instance.loads[..1].to_vec(),
            bias_instance.units[..1].to_vec(),
        )
        .unwrap();
        let model = build(&instance, Encoding::OneHot);

        // Two active levels {1, 3}: the median by position is the upper one
        let (u, p) = decode(&model, &sample(vec![0, 1, 0, 1])).unwrap();
        assert_eq!(u, vec![vec![true]]);
        assert_approx_eq!(f64, p[0][0], 30.0);

        // Three active levels {0, 1, 2}: the middle one wins, which is a non-zero level
        let (_, p) = decode(&model, &sample(vec![1, 1, 1, 0])).unwrap();
        assert_approx_eq!(f64, p[0][0], 10.0);
    }

    #[rstest]
    fn test_decode_rejects_malformed_samples(bias_instance: UcpInstance) {
        let model = build(&bias_instance, Encoding::MultiValued);

        assert_error!(
            decode(&model, &sample(vec![0; 4])),
            "Sample has 4 values but the model has 9 variables"
        );
        assert_error!(
            decode(&model, &sample(vec![4, 0, 0, 0, 0, 0, 0, 0, 0])),
            "Sample value 4 is outside the domain of unit 0 at time 0"
        );
    }
}
