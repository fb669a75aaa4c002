#![doc=include_str!("../README.md")]
mod algo;
pub mod algos;
mod drive;
mod math;
mod options;
pub mod problems;
mod solve;

use std::error::Error;
use std::fmt::{self, Display};
use std::sync::Arc;

pub type BoxedError = Box<dyn Error + Send + Sync>;

/// Why driving an algo, or running [`bracketing`] or [`newton`], failed.
///
/// Running out of iterations in [`bracketing`] or [`newton`] is not an error, but a status of the [`Solution`].
#[derive(Clone, Debug)]
pub enum DriverError {
    /// A [`Driver::fail_if`] predicate held.
    FailIfPredicate,
    /// The budget of [`fail_after_iters`] was spent without convergence.
    MaxIterationsExceeded,
    /// A user supplied function, or [`Driver::try_on_step`] callback, failed.
    AlgoError(Arc<dyn Error + Send + Sync>),
    InvalidInput(InputError),
}

/// Problems with the inputs to an algorithm, detected before any iteration takes place.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("bracket ({a}, {b}, {c}) must be finite with a < b < c")]
    InvalidBracket { a: f64, b: f64, c: f64 },

    #[error("f(a) = {fa}, f(b) = {fb}, f(c) = {fc} do not bracket a minimum")]
    NotBracketingMinimum { fa: f64, fb: f64, fc: f64 },

    #[error("invalid `{name}`: must be >= 0. got {got}")]
    InvalidTolerance { name: &'static str, got: f64 },

    #[error("starting estimate x0 = {x0} must be finite")]
    NonFiniteStart { x0: f64 },
}

pub use crate::{
    algo::Algo,
    algos::{newton_trace, Bracket, NewtonRecord, NewtonTrace},
    drive::{fail_after_iters, fixed_iters},
    drive::{BoxedDriver, Decision, Drive, Driver, Step, Stop},
    math::{central_difference, Tolerance},
    options::{BracketOptions, NewtonOptions},
    solve::{
        bracketing, newton, BracketSolution, BracketStatus, NewtonSolution, NewtonStatus,
        Solution,
    },
};

/// Use `scalarsolve::prelude::*` for a 'no fuss' include everything approach.
///
/// The `problems` and `algos` modules are imported whole, so an algorithm is
/// referred to as [`algos::Newton`]
pub mod prelude {
    pub use crate::{
        algos, assert_approx_eq, bracketing, fail_after_iters, fixed_iters, newton,
        newton_trace, problems, Algo, BoxedDriver, BoxedError, Bracket, BracketOptions,
        BracketStatus, Driver, DriverError, InputError, NewtonOptions, NewtonStatus, Solution,
        Step, Stop,
    };
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DriverError>();
    assert_send_sync::<InputError>();
};

impl Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Error for DriverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            Self::AlgoError(e) => Some(e.as_ref()),
            Self::InvalidInput(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InputError> for DriverError {
    fn from(e: InputError) -> Self {
        Self::InvalidInput(e)
    }
}
