//! Fixtures for tests

use crate::ucp::{GeneratingUnit, UcpInstance};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A small instance whose bias values are easy to verify by hand.
///
/// The first two units discretize to the 4-level grid [0, 10, 20, 30], the third to an
/// 8-level grid over [20, 80] in steps of 10.
#[fixture]
pub fn bias_instance() -> UcpInstance {
    let units = vec![
        GeneratingUnit {
            a: 1.0,
            b: 0.5,
            c: 1.0,
            p_min: 10.0,
            p_max: 30.0,
            startup_cost: 1.0,
            shutdown_cost: 2.0,
            initially_on: false,
        },
        GeneratingUnit {
            a: 2.0,
            b: 1.0,
            c: 2.0,
            p_min: 10.0,
            p_max: 30.0,
            startup_cost: 2.0,
            shutdown_cost: 1.0,
            initially_on: false,
        },
        GeneratingUnit {
            a: 3.0,
            b: 2.0,
            c: 3.0,
            p_min: 20.0,
            p_max: 80.0,
            startup_cost: 0.0,
            shutdown_cost: 0.0,
            initially_on: false,
        },
    ];

    UcpInstance::new(vec![1.0, 2.0, 1.0], units).unwrap()
}
