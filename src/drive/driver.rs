use super::step::Stop;
use crate::{Algo, DriverError, Step};
use log::trace;
use std::{
    any::type_name,
    error::Error,
    fmt::{self, Debug},
    ops::ControlFlow,
    sync::Arc,
};

/// The verdict after each step: `None` to keep going, or the reason to stop.
pub type Decision = Result<Option<Stop>, DriverError>;

/// Constructs a [`Driver`] with a fixed number of iterations
///
/// After this number of iterations the algo is deemed to have converged on a solution.
/// If [`Driver::converge_when`] is used, then iteration may terminate early.
///
/// Logically it applies [`set_fixed_iters`](Driver::set_fixed_iters) to a new Driver
///
pub fn fixed_iters<A: Algo>(
    algo: A,
    fixed_iters: usize,
) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A> {
    unbounded(algo).set_fixed_iters(fixed_iters)
}

/// Constructs a [`Driver`] that will fail once a certain number of iterations is reached.
///
/// Logically it applies [`set_fail_after_iters`](Driver::set_fail_after_iters) to a new Driver
///
pub fn fail_after_iters<A: Algo>(
    algo: A,
    max_iters: usize,
) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A> {
    unbounded(algo).set_fail_after_iters(max_iters)
}

fn unbounded<A: Algo>(algo: A) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A> {
    Drive::new(algo, State::default(), |_: &mut A, _: &Step| -> Decision {
        Ok(None)
    })
}

#[derive(Default)]
struct State {
    step: Step,
    last_error: Option<DriverError>,
}

/// The [`Driver`] returned by [`fixed_iters`] and [`fail_after_iters`].
///
/// `F` is the composition of every predicate and callback attached so far.
pub struct Drive<F, A> {
    algo: A,
    state: State,
    decide: F,
}

pub type BoxedDriver<A> = Drive<Box<dyn FnMut(&mut A, &Step) -> Decision>, A>;

impl<F, A> Drive<F, A> {
    fn new(algo: A, state: State, decide: F) -> Self {
        if state.step.iteration == 0 {
            trace!("{} driving {}", state.step, type_name::<A>());
        }
        Drive {
            algo,
            state,
            decide,
        }
    }
}

impl<F, A> Debug for Drive<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drive")
            .field("algo", &type_name::<A>())
            .field("step", &self.state.step)
            .field("last_error", &self.state.last_error)
            .finish()
    }
}

impl<F, A> Drive<F, A>
where
    F: FnMut(&mut A, &Step) -> Decision,
    A: Algo,
{
    fn advance(&mut self) -> Decision {
        self.state.step.iteration += 1;
        match self.algo.step() {
            (_, Err(e)) => Err(DriverError::AlgoError(Arc::new(e))),
            (ControlFlow::Break(()), Ok(())) => Ok(Some(Stop::AlgoBreak)),
            (ControlFlow::Continue(()), Ok(())) => (self.decide)(&mut self.algo, &self.state.step),
        }
    }

    pub fn iter_step(&mut self) -> Result<Option<(&mut A, &Step)>, DriverError> {
        if let Some(e) = &self.state.last_error {
            return Err(e.clone());
        }
        if self.state.step.stop.is_some() {
            return Ok(None);
        }
        match self.advance() {
            Ok(None) => Ok(Some((&mut self.algo, &self.state.step))),
            Ok(Some(stop)) => {
                trace!("{} stopped: {stop:?}", self.state.step);
                self.state.step.stop = Some(stop);
                Ok(None)
            }
            Err(e) => {
                trace!("{} failed: {e}", self.state.step);
                self.state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn solve(mut self) -> Result<(A, Step), DriverError> {
        while self.iter_step()?.is_some() {}
        Ok((self.algo, self.state.step))
    }

    pub fn on_step<G>(self, mut g: G) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A>
    where
        G: FnMut(&mut A, &Step),
    {
        let Drive {
            algo,
            state,
            mut decide,
        } = self;
        Drive::new(algo, state, move |a: &mut A, s: &Step| -> Decision {
            let decision = decide(a, s);
            g(a, s);
            decision
        })
    }

    pub fn try_on_step<G, E>(self, mut g: G) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A>
    where
        G: FnMut(&mut A, &Step) -> Result<(), E>,
        E: Error + Sync + Send + 'static,
    {
        let Drive {
            algo,
            state,
            mut decide,
        } = self;
        Drive::new(algo, state, move |a: &mut A, s: &Step| -> Decision {
            let decision = decide(a, s)?;
            g(a, s).map_err(|e| DriverError::AlgoError(Arc::new(e)))?;
            Ok(decision)
        })
    }

    pub fn converge_when<G>(self, mut pred: G) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A>
    where
        G: FnMut(&mut A, &Step) -> bool,
    {
        let Drive {
            algo,
            state,
            mut decide,
        } = self;
        Drive::new(algo, state, move |a: &mut A, s: &Step| -> Decision {
            let decision = decide(a, s);
            // converging on the final permitted iteration is not a failure
            let converged = matches!(decision, Ok(_) | Err(DriverError::MaxIterationsExceeded))
                && pred(a, s);
            if converged {
                Ok(Some(Stop::Converged))
            } else {
                decision
            }
        })
    }

    pub fn fail_if<G>(self, mut pred: G) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A>
    where
        G: FnMut(&mut A, &Step) -> bool,
    {
        let Drive {
            algo,
            state,
            mut decide,
        } = self;
        Drive::new(algo, state, move |a: &mut A, s: &Step| -> Decision {
            let decision = decide(a, s)?;
            if decision.is_none() && pred(a, s) {
                return Err(DriverError::FailIfPredicate);
            }
            Ok(decision)
        })
    }

    pub fn set_fixed_iters(
        self,
        fixed_iters: usize,
    ) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A> {
        let Drive {
            algo,
            mut state,
            mut decide,
        } = self;
        state.step.iter_limit = Some(fixed_iters);
        Drive::new(algo, state, move |a: &mut A, s: &Step| -> Decision {
            let decision = decide(a, s)?;
            Ok(decision.or((s.iteration() >= fixed_iters).then_some(Stop::IterationLimit)))
        })
    }

    pub fn set_fail_after_iters(
        self,
        max_iters: usize,
    ) -> Drive<impl FnMut(&mut A, &Step) -> Decision, A> {
        let Drive {
            algo,
            mut state,
            mut decide,
        } = self;
        state.step.iter_limit = Some(max_iters);
        Drive::new(algo, state, move |a: &mut A, s: &Step| -> Decision {
            let decision = decide(a, s)?;
            if decision.is_none() && s.iteration() >= max_iters {
                return Err(DriverError::MaxIterationsExceeded);
            }
            Ok(decision)
        })
    }

    pub fn into_boxed(self) -> BoxedDriver<A>
    where
        Self: 'static,
    {
        let Drive {
            algo,
            state,
            decide,
        } = self;
        Drive::new(algo, state, Box::new(decide))
    }
}

/// Steps an [`Algo`], applying the iteration budget, convergence and failure predicates,
/// and callbacks attached to it.
///
/// Predicates and callbacks run after each step, in the order they were attached.
pub trait Driver {
    /// The underlying algorithm being driven.
    type Algo;

    /// Runs the algorithm until failure, iteration exhaustion, or convergence.
    ///
    /// On success the algo is returned in its final state, by convention named `solved`, with accessors
    /// for the solution. The final [`Step`] records the iteration count and
    /// [why](Step::stopped) iteration ended.
    ///
    /// # Example
    /// ```
    /// # use scalarsolve::{algos::Newton, assert_approx_eq, fixed_iters, Driver, Stop};
    /// let algo = Newton::from_fn(|x| x * x - 2.0, |x| 2.0 * x, 1.5).unwrap();
    /// let (solved, step) = fixed_iters(algo, 6).solve()?;
    ///
    /// assert_approx_eq!(solved.x(), 2_f64.sqrt());
    /// assert_eq!(step.iteration(), 6);
    /// assert_eq!(step.stopped(), Some(Stop::IterationLimit));
    /// # Ok::<(), scalarsolve::DriverError>(())
    /// ```
    fn solve(self) -> Result<(Self::Algo, Step), DriverError>;

    /// Executes a single step, returning `None` once the algo or driver has decided to stop.
    ///
    /// Handy for a manual `while let` loop. Once finished, further calls return `None`,
    /// or the same error.
    fn iter_step(&mut self) -> Result<Option<(&mut Self::Algo, &Step)>, DriverError>;

    /// Invoked after each step, for logging, plotting, or adjusting the algorithm between steps.
    fn on_step<G>(self, g: G) -> impl Driver<Algo = Self::Algo>
    where
        Self: Sized,
        G: FnMut(&mut Self::Algo, &Step);

    /// As [`Self::on_step`], but a failing callback terminates solving with [`DriverError::AlgoError`].
    fn try_on_step<F, E>(self, f: F) -> impl Driver<Algo = Self::Algo>
    where
        Self: Sized,
        F: FnMut(&mut Self::Algo, &Step) -> Result<(), E>,
        E: Error + Sync + Send + 'static;

    /// Stop early, with [`Stop::Converged`], once `pred` holds.
    ///
    /// Typically a step size or bracket width below a tolerance. Convergence on the last iteration
    /// permitted by [`Driver::set_fail_after_iters`] counts as success.
    fn converge_when<F>(self, pred: F) -> impl Driver<Algo = Self::Algo>
    where
        Self: Sized,
        F: FnMut(&mut Self::Algo, &Step) -> bool;

    /// Abandon iteration with [`DriverError::FailIfPredicate`] once `pred` holds.
    ///
    /// Not consulted on a step where an earlier attached predicate has already stopped iteration.
    fn fail_if<F>(self, pred: F) -> impl Driver<Algo = Self::Algo>
    where
        Self: Sized,
        F: FnMut(&mut Self::Algo, &Step) -> bool;

    /// After this number of iterations the algo is deemed to have finished, with [`Stop::IterationLimit`].
    ///
    /// Contrast with [`Driver::set_fail_after_iters`]
    fn set_fixed_iters(self, fixed_iters: usize) -> impl Driver<Algo = Self::Algo>
    where
        Self: Sized;

    /// Unless convergence has occurred, the driver will error after the designated iteration count.
    ///
    /// Contrast with [`Driver::set_fixed_iters`]
    fn set_fail_after_iters(self, max_iters: usize) -> impl Driver<Algo = Self::Algo>
    where
        Self: Sized;

    /// Erases the type of the attached closures, giving a [`BoxedDriver<A>`].
    ///
    /// Useful when if/else arms would otherwise construct drivers of different types.
    fn into_boxed(self) -> BoxedDriver<Self::Algo>
    where
        Self: Sized + 'static;
}

impl<G, A> Driver for Drive<G, A>
where
    G: FnMut(&mut A, &Step) -> Decision,
    A: Algo,
{
    type Algo = A;

    fn solve(self) -> Result<(A, Step), DriverError> {
        Drive::solve(self)
    }

    fn iter_step(&mut self) -> Result<Option<(&mut A, &Step)>, DriverError> {
        Drive::iter_step(self)
    }

    fn on_step<F>(self, f: F) -> impl Driver<Algo = A>
    where
        F: FnMut(&mut A, &Step),
    {
        Drive::on_step(self, f)
    }

    fn try_on_step<F, E>(self, f: F) -> impl Driver<Algo = A>
    where
        F: FnMut(&mut A, &Step) -> Result<(), E>,
        E: Error + Sync + Send + 'static,
    {
        Drive::try_on_step(self, f)
    }

    fn converge_when<F>(self, pred: F) -> impl Driver<Algo = A>
    where
        F: FnMut(&mut A, &Step) -> bool,
    {
        Drive::converge_when(self, pred)
    }

    fn fail_if<F>(self, pred: F) -> impl Driver<Algo = A>
    where
        F: FnMut(&mut A, &Step) -> bool,
    {
        Drive::fail_if(self, pred)
    }

    fn set_fixed_iters(self, fixed_iters: usize) -> impl Driver<Algo = A> {
        Drive::set_fixed_iters(self, fixed_iters)
    }

    fn set_fail_after_iters(self, max_iters: usize) -> impl Driver<Algo = A> {
        Drive::set_fail_after_iters(self, max_iters)
    }

    fn into_boxed(self) -> BoxedDriver<A>
    where
        Self: 'static,
    {
        Drive::into_boxed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algos::Newton, problems};
    use test_log::test;

    #[test]
    fn stop_reasons() {
        let newton = || Newton::from_fn(problems::sqrt2, problems::sqrt2_deriv, 1.5).unwrap();

        let (_, step) = fixed_iters(newton(), 3).solve().unwrap();
        assert_eq!(step.stopped(), Some(Stop::IterationLimit));

        let (_, step) = fixed_iters(newton(), 30)
            .converge_when(|algo, _| algo.step_size() < 1e-9)
            .solve()
            .unwrap();
        assert_eq!(step.stopped(), Some(Stop::Converged));
        assert!(step.iteration() < 30);

        // derivative vanishes at the start
        let flat = Newton::from_fn(|x| x * x, |x| 2.0 * x, 0.0).unwrap();
        let (_, step) = fixed_iters(flat, 30).solve().unwrap();
        assert_eq!((step.stopped(), step.iteration()), (Some(Stop::AlgoBreak), 1));
    }

    #[test]
    fn converge_on_last_permitted_iteration() {
        let algo = Newton::from_fn(problems::sqrt2, problems::sqrt2_deriv, 1.5).unwrap();
        let (_, step) = fail_after_iters(algo, 2)
            .converge_when(|_, step| step.iteration() == 2)
            .solve()
            .unwrap();
        assert_eq!(step.stopped(), Some(Stop::Converged));
    }

    #[test]
    fn finished_driver_stays_finished() {
        let algo = Newton::from_fn(problems::sqrt2, problems::sqrt2_deriv, 1.5).unwrap();
        let mut driver = fixed_iters(algo, 2);
        while driver.iter_step().unwrap().is_some() {}
        assert!(driver.iter_step().unwrap().is_none());
        assert!(format!("{driver:?}").contains("IterationLimit"), "{driver:?}");

        let (_, step) = driver.solve().unwrap();
        assert_eq!(step.iteration(), 2);
    }
}
