use std::{error::Error, ops::ControlFlow};

/// A single-step iterative method, advanced one step at a time by a [`Driver`](crate::Driver).
///
/// The algo owns the problem (the function and any derivative), its starting point, and whatever
/// state carries over between steps. Results are read back through accessors, by convention
/// `x()` for the current best estimate, which before the first step is the starting point.
///
/// # Example
/// Fixed point iteration, `x ← cos(x)`, which converges on the solution of `x = cos(x)`.
///
/// ```
/// use std::{convert::Infallible, ops::ControlFlow};
/// use scalarsolve::{assert_approx_eq, fixed_iters, Algo};
///
/// pub struct FixedPoint<G> {
///     pub g: G,
///     pub x: f64,
/// }
///
/// impl<G> Algo for FixedPoint<G>
/// where
///     G: FnMut(f64) -> f64,
/// {
///     type Error = Infallible;
///
///     fn step(&mut self) -> (ControlFlow<()>, Result<(), Infallible>) {
///         self.x = (self.g)(self.x);
///         // the driver decides when we are close enough
///         (ControlFlow::Continue(()), Ok(()))
///     }
/// }
///
/// let algo = FixedPoint { g: f64::cos, x: 1.0 };
/// let (solved, _step) = fixed_iters(algo, 100).solve().expect("solving failed");
/// assert_approx_eq!(solved.x, 0.739085133, 1e-8);
/// ```
///
/// # Contract
///
/// * `step` mutates the algo in place and returns nothing but the control signal. Unlike
///   [`Iterator::next`] it can fail.
///
/// * `ControlFlow::Continue` leaves the stopping decision to the driver: an iteration budget,
///   or a tolerance test in [`converge_when`](crate::Driver::converge_when).
///
/// * `ControlFlow::Break` means no useful step is possible, such as a vanishing derivative
///   or a bracket that can no longer be narrowed. The driver then stops with
///   [`Stop::AlgoBreak`](crate::Stop::AlgoBreak).
///
/// * An error from a user supplied function is returned as `(ControlFlow::Break(()), Err(e))`,
///   leaving the algo in its state from before the failing step.
pub trait Algo {
    /// The error raised by a failing step. [`std::convert::Infallible`] for algos that cannot fail.
    type Error: Error + Send + Sync + 'static;

    fn step(&mut self) -> (ControlFlow<()>, Result<(), Self::Error>);
}

impl<S: Algo + ?Sized> Algo for Box<S> {
    type Error = S::Error;

    fn step(&mut self) -> (ControlFlow<()>, Result<(), Self::Error>) {
        (**self).step()
    }
}
