use crate::{
    algos::{Bracket, Bracketing, Newton},
    fixed_iters, BracketOptions, DriverError, NewtonOptions, Stop,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Why [`bracketing`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BracketStatus {
    /// The bracket width fell below the tolerance.
    Converged,
    /// The bracket is as narrow as `f64` allows, but still wider than the tolerance.
    Stalled,
    MaxIterationsReached,
}

/// Why [`newton`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewtonStatus {
    /// The last step was no larger than the tolerance.
    Converged,
    /// `|f'(x)|` fell below the derivative floor, and the estimate was left unchanged.
    DerivativeTooSmall,
    MaxIterationsReached,
}

impl Display for BracketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Converged => "minimum bracketed, width meets the given tolerance",
            Self::Stalled => "bracket cannot be narrowed further in floating point",
            Self::MaxIterationsReached => "max iterations reached before the tolerance was met",
        })
    }
}

impl Display for NewtonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Converged => "root found, difference between iterations meets the given tolerance",
            Self::DerivativeTooSmall => "root not found, derivative value near 0",
            Self::MaxIterationsReached => "max iterations reached before the tolerance was met",
        })
    }
}

/// The final estimate of an iterative procedure, with the reason it stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution<X, S> {
    pub x: X,
    pub status: S,
    /// The number of steps taken.
    pub iterations: usize,
}

pub type BracketSolution = Solution<Bracket, BracketStatus>;
pub type NewtonSolution = Solution<f64, NewtonStatus>;

impl BracketSolution {
    pub fn is_converged(&self) -> bool {
        self.status == BracketStatus::Converged
    }
}

impl NewtonSolution {
    pub fn is_converged(&self) -> bool {
        self.status == NewtonStatus::Converged
    }
}

/// Narrow a bracket around a local minimum of `f`.
///
/// The bracket must satisfy `f(a) >= f(b) <= f(c)`. Steps continue until the width `c - a`
/// is below [`width_tolerance`](BracketOptions::width_tolerance), or the iteration budget is spent.
/// A bracket that is already narrow enough is returned as is, with zero iterations.
///
/// # Errors
/// * [`DriverError::InvalidInput`] for invalid options, or a bracket which does not bracket a minimum.
///
/// # Example
/// ```
/// use scalarsolve::{bracketing, Bracket, BracketOptions, BracketStatus};
///
/// let f = |x: f64| (x - 2.0).powi(2) + 1.0;
/// let opts = BracketOptions::default().with_max_iterations(200);
///
/// let solution = bracketing(f, Bracket::new(0.0, 1.0, 5.0)?, &opts)?;
/// assert_eq!(solution.status, BracketStatus::Converged);
/// assert!((solution.x.b() - 2.0).abs() < 1e-6);
/// # Ok::<(), scalarsolve::DriverError>(())
/// ```
pub fn bracketing<F>(
    f: F,
    bracket: Bracket,
    options: &BracketOptions,
) -> Result<BracketSolution, DriverError>
where
    F: FnMut(f64) -> f64,
{
    options.validate()?;
    let eps = options.width_tolerance;
    let algo = Bracketing::from_fn(f, bracket)?;

    if bracket.width() < eps || options.max_iterations == 0 {
        let status = if bracket.width() < eps {
            BracketStatus::Converged
        } else {
            BracketStatus::MaxIterationsReached
        };
        debug!("bracketing {:?} not stepped: {status}", bracket.to_array());
        return Ok(Solution {
            x: bracket,
            status,
            iterations: 0,
        });
    }

    let (solved, step) = fixed_iters(algo, options.max_iterations)
        .converge_when(|algo, _step| algo.width() < eps)
        .on_step(|algo, step| trace!("{step} bracket {:?}", algo.x().to_array()))
        .solve()?;

    let (status, iterations) = match step.stopped() {
        Some(Stop::Converged) => (BracketStatus::Converged, step.iteration()),
        // the stalled step made no evaluation
        Some(Stop::AlgoBreak) => (BracketStatus::Stalled, step.iteration() - 1),
        _ => (BracketStatus::MaxIterationsReached, step.iteration()),
    };
    debug!(
        "bracketing {:?} after {iterations} iterations: {status}",
        solved.x().to_array()
    );
    Ok(Solution {
        x: solved.x(),
        status,
        iterations,
    })
}

/// Newton's method for a root of `f`, starting from `x0`, given the derivative `fprime`.
///
/// Failure to converge is not an error, but reported by the [`status`](Solution::status)
/// alongside the best estimate found. `iterations` counts evaluations of `f` and `fprime`,
/// so a vanishing derivative at `x0` reports one iteration with `x0` unchanged.
///
/// # Errors
/// * [`DriverError::InvalidInput`] for invalid options, or a non-finite `x0`.
///
/// # Example
/// ```
/// use scalarsolve::{newton, NewtonOptions, NewtonStatus};
///
/// let solution = newton(1.5, |x| x * x - 2.0, |x| 2.0 * x, &NewtonOptions::default())?;
/// assert_eq!(solution.status, NewtonStatus::Converged);
/// assert!((solution.x - 2_f64.sqrt()).abs() < 1e-5);
/// # Ok::<(), scalarsolve::DriverError>(())
/// ```
pub fn newton<F, G>(
    x0: f64,
    f: F,
    fprime: G,
    options: &NewtonOptions,
) -> Result<NewtonSolution, DriverError>
where
    F: FnMut(f64) -> f64,
    G: FnMut(f64) -> f64,
{
    options.validate()?;
    let tol = options.tolerance;
    let algo = Newton::from_fn(f, fprime, x0)?.with_derivative_floor(options.derivative_floor);

    if options.max_iterations == 0 {
        return Ok(Solution {
            x: x0,
            status: NewtonStatus::MaxIterationsReached,
            iterations: 0,
        });
    }

    let (solved, step) = fixed_iters(algo, options.max_iterations)
        .converge_when(|algo, _step| algo.step_size() <= tol)
        .solve()?;

    let status = match step.stopped() {
        Some(Stop::Converged) => NewtonStatus::Converged,
        Some(Stop::AlgoBreak) => NewtonStatus::DerivativeTooSmall,
        _ => NewtonStatus::MaxIterationsReached,
    };
    debug!(
        "newton x = {} after {} iterations: {status}",
        solved.x(),
        step.iteration()
    );
    Ok(Solution {
        x: solved.x(),
        status,
        iterations: step.iteration(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, problems, InputError};
    use test_log::test;

    #[test]
    fn bracketing_defaults() {
        let br = Bracket::new(-1.0, 0.5, 2.0).unwrap();
        let sol = bracketing(problems::bowl, br, &BracketOptions::default()).unwrap();
        assert!(sol.is_converged(), "{sol:?}");
        assert!(sol.x.width() < 1e-10);
        assert!(sol.iterations <= 100);
        assert_approx_eq!(sol.x.b(), problems::BOWL_MINIMUM, 1e-6);
    }

    #[test]
    fn bracketing_budget() {
        let br = Bracket::new(-1.0, 0.5, 2.0).unwrap();
        let opts = BracketOptions::default().with_max_iterations(5);
        let sol = bracketing(problems::bowl, br, &opts).unwrap();
        assert_eq!(sol.status, BracketStatus::MaxIterationsReached);
        assert_eq!(sol.iterations, 5);
        assert!(sol.x.width() < br.width());
        assert!(!sol.is_converged());
    }

    #[test]
    fn bracketing_already_narrow() {
        let br = Bracket::new(0.8, 0.9, 1.0).unwrap();
        let opts = BracketOptions::default().with_width_tolerance(0.5);
        let sol = bracketing(problems::bowl, br, &opts).unwrap();
        assert_eq!(sol, Solution { x: br, status: BracketStatus::Converged, iterations: 0 });
    }

    #[test]
    fn bracketing_stalls_without_tolerance() {
        let br = Bracket::new(-1.0, 0.5, 2.0).unwrap();
        let opts = BracketOptions {
            max_iterations: 100_000,
            width_tolerance: 0.0,
        };
        let sol = bracketing(problems::bowl, br, &opts).unwrap();
        assert_eq!(sol.status, BracketStatus::Stalled);
        assert!(sol.iterations < 100_000);
        let [a, b, c] = sol.x.to_array();
        assert!(a < b && b < c);
    }

    #[test]
    fn bracketing_invalid() {
        let br = Bracket::new(-1.0, 0.5, 2.0).unwrap();
        let opts = BracketOptions::default().with_width_tolerance(f64::NAN);
        let err = bracketing(problems::bowl, br, &opts).unwrap_err();
        assert!(matches!(
            err,
            DriverError::InvalidInput(InputError::InvalidTolerance { .. })
        ));

        let br = Bracket::new(3.0, 4.0, 5.0).unwrap();
        let err = bracketing(problems::bowl, br, &BracketOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DriverError::InvalidInput(InputError::NotBracketingMinimum { .. })
        ));
    }

    #[test]
    fn newton_statuses() {
        let opts = NewtonOptions::default();
        let sol = newton(1.5, problems::sqrt2, problems::sqrt2_deriv, &opts).unwrap();
        assert!(sol.is_converged());
        assert_approx_eq!(sol.x, 2_f64.sqrt(), 1e-5);

        let sol = newton(0.0, |x| x * x, |x| 2.0 * x, &opts).unwrap();
        assert_eq!(sol.status, NewtonStatus::DerivativeTooSmall);
        assert_eq!((sol.x, sol.iterations), (0.0, 1));

        let sol = newton(
            0.0,
            problems::oscillating_cubic,
            problems::oscillating_cubic_deriv,
            &opts,
        )
        .unwrap();
        assert_eq!(sol.status, NewtonStatus::MaxIterationsReached);
        assert_eq!(sol.iterations, 20);
        assert!(!sol.is_converged());

        let opts = opts.with_max_iterations(0);
        let sol = newton(1.5, problems::sqrt2, problems::sqrt2_deriv, &opts).unwrap();
        assert_eq!((sol.x, sol.status, sol.iterations), (1.5, NewtonStatus::MaxIterationsReached, 0));
    }

    #[test]
    fn newton_invalid() {
        let err = newton(f64::NAN, problems::sqrt2, problems::sqrt2_deriv, &NewtonOptions::default())
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidInput(InputError::NonFiniteStart { .. })));
        assert!(std::error::Error::source(&err).is_some());

        let opts = NewtonOptions::default().with_tolerance(-1.0);
        let err = newton(1.5, problems::sqrt2, problems::sqrt2_deriv, &opts).unwrap_err();
        assert!(err.to_string().contains("InvalidTolerance"), "{err}");
    }

    #[test]
    fn status_display() {
        assert_eq!(
            NewtonStatus::DerivativeTooSmall.to_string(),
            "root not found, derivative value near 0"
        );
        assert!(BracketStatus::Stalled.to_string().contains("floating point"));
    }
}
