use crate::{Algo, DriverError, InputError};
use log::trace;
use std::{convert::Infallible, error::Error, fmt::Debug, ops::ControlFlow};

/// The default floor on `|f'(x)|` below which a Newton step is not attempted.
pub const DEFAULT_DERIVATIVE_FLOOR: f64 = 1e-14;

/// One Newton update, `x_next = x - fx / dfx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonRecord {
    /// Starts at 1 for the update from the initial estimate.
    pub iteration: usize,
    pub x: f64,
    pub fx: f64,
    pub dfx: f64,
    pub x_next: f64,
}

impl NewtonRecord {
    /// The tangent line to `f` at `x`, as `(slope, intercept)`.
    ///
    /// The tangent crosses zero at `x_next`.
    pub fn tangent(&self) -> (f64, f64) {
        (self.dfx, self.fx - self.dfx * self.x)
    }

    /// The absolute size of the step, `|x_next - x|`.
    pub fn step_size(&self) -> f64 {
        (self.x_next - self.x).abs()
    }
}

///
/// Newton's method for finding a root of `f`, given its derivative `f'`.
///
/// See <https://en.wikipedia.org/wiki/Newton%27s_method> for details on the algorithm.
///
/// Each step linearizes `f` at the current estimate and moves to where the tangent crosses zero.
/// The [`x`](Self::x) returned is the current estimate of the root.
///
/// # Hyper-parameters
///
/// The [`derivative_floor`](Self::derivative_floor) (default `1e-14`). If `|f'(x)|` falls below it
/// the step is not taken, as the linearization is unreliable near a stationary point. The algo
/// then breaks, leaving `x` unchanged and [`is_derivative_too_small`](Self::is_derivative_too_small) set.
///
/// Convergence is left to the caller, typically on the size of the last step.
///
/// # Example
///
/// ```rust
/// use scalarsolve::{algos::Newton, assert_approx_eq, fail_after_iters};
///
/// let f = |x: f64| x.powi(3) - x - 2.0;
/// let df = |x: f64| 3.0 * x.powi(2) - 1.0;
///
/// let algo = Newton::from_fn(f, df, 1.0).expect("x0 not finite");
/// let (solved, step) = fail_after_iters(algo, 20)
///     .converge_when(|algo, _step| algo.step_size() < 1e-12)
///     .solve()
///     .expect("solving failed");
///
/// assert_approx_eq!(solved.x(), 1.5213797068, 1e-10);
/// assert!(step.iteration() < 20);
/// ```
#[derive(Clone, PartialEq)]
pub struct Newton<F, G> {
    f: F,
    df: G,
    x: f64,
    pub derivative_floor: f64,
    last: Option<NewtonRecord>,
    derivative_too_small: bool,
}

impl<F, G> Debug for Newton<F, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Newton")
            .field("x", &self.x)
            .field("derivative_floor", &self.derivative_floor)
            .field("last", &self.last)
            .field("derivative_too_small", &self.derivative_too_small)
            .finish()
    }
}

impl Newton<(), ()> {
    /// Create a new Newton algo from infalliable functions `f, df: f64 -> f64` and the starting estimate `x0`.
    #[allow(clippy::type_complexity)]
    pub fn from_fn<F1, G1>(
        mut f: F1,
        mut df: G1,
        x0: f64,
    ) -> Result<
        Newton<
            impl FnMut(f64) -> Result<f64, Infallible>,
            impl FnMut(f64) -> Result<f64, Infallible>,
        >,
        DriverError,
    >
    where
        F1: FnMut(f64) -> f64,
        G1: FnMut(f64) -> f64,
    {
        Newton::from_falliable_fns::<_, _, Infallible>(move |x| Ok(f(x)), move |x| Ok(df(x)), x0)
    }

    /// Create a new Newton algo from falliable functions `f, df: f64 -> Result<f64,E>`
    /// # Errors
    /// * [`DriverError::InvalidInput`] if `x0` is not finite.
    pub fn from_falliable_fns<F, G, E>(f: F, df: G, x0: f64) -> Result<Newton<F, G>, DriverError>
    where
        F: FnMut(f64) -> Result<f64, E>,
        G: FnMut(f64) -> Result<f64, E>,
        E: 'static + Send + Sync + Error,
    {
        if !x0.is_finite() {
            return Err(InputError::NonFiniteStart { x0 }.into());
        }
        Ok(Newton::new(f, df, x0))
    }
}

impl<F, G> Newton<F, G> {
    fn new(f: F, df: G, x0: f64) -> Self {
        Newton {
            f,
            df,
            x: x0,
            derivative_floor: DEFAULT_DERIVATIVE_FLOOR,
            last: None,
            derivative_too_small: false,
        }
    }

    pub fn with_derivative_floor(mut self, derivative_floor: f64) -> Self {
        self.derivative_floor = derivative_floor;
        self
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    /// The most recent update, `None` before the first successful step.
    pub fn last_record(&self) -> Option<NewtonRecord> {
        self.last
    }

    /// `|x_n - x_{n-1}|` for the most recent update, or infinity before the first one.
    pub fn step_size(&self) -> f64 {
        self.last.map_or(f64::INFINITY, |r| r.step_size())
    }

    pub fn is_derivative_too_small(&self) -> bool {
        self.derivative_too_small
    }
}

impl<E, F, G> Algo for Newton<F, G>
where
    F: FnMut(f64) -> Result<f64, E>,
    G: FnMut(f64) -> Result<f64, E>,
    E: 'static + Send + Sync + Error,
{
    type Error = E;

    fn step(&mut self) -> (ControlFlow<()>, Result<(), E>) {
        let x = self.x;
        let (fx, dfx) = match ((self.f)(x), (self.df)(x)) {
            (Ok(fx), Ok(dfx)) => (fx, dfx),
            (Err(e), _) | (_, Err(e)) => return (ControlFlow::Break(()), Err(e)),
        };

        if dfx.abs() < self.derivative_floor {
            trace!("x = {x:+.12} f'(x) = {dfx:+.3e} is below {:.1e}", self.derivative_floor);
            self.derivative_too_small = true;
            return (ControlFlow::Break(()), Ok(()));
        }

        let x_next = x - fx / dfx;
        let iteration = self.last.map_or(1, |r| r.iteration + 1);
        trace!("#{iteration:>3} x = {x:+.12} f(x) = {fx:+.6e} f'(x) = {dfx:+.6e} x_next = {x_next:+.12}");
        self.last = Some(NewtonRecord {
            iteration,
            x,
            fx,
            dfx,
            x_next,
        });
        self.x = x_next;
        (ControlFlow::Continue(()), Ok(()))
    }
}

/// A lazy, finite and restartable sequence of [`NewtonRecord`]s.
///
/// Each call to [`iter`](Self::iter) starts afresh from `x0`, running up to `steps` Newton updates.
/// The sequence ends early only if the derivative falls below the floor, no step tolerance is
/// applied, so a plot of the iterations always receives the frames it asked for.
///
/// ```
/// use scalarsolve::newton_trace;
///
/// let trace = newton_trace(1.5, |x| x * x - 2.0, |x| 2.0 * x, 4);
///
/// for rec in trace.iter() {
///     let (slope, intercept) = rec.tangent();
///     println!("{:>2} x = {:.9} tangent y = {slope:.4} x + {intercept:.4}", rec.iteration, rec.x);
/// }
/// let xs: Vec<f64> = trace.iter().map(|rec| rec.x_next).collect();
/// assert_eq!(xs.len(), 4);
/// assert!((xs[3] - 2_f64.sqrt()).abs() < 1e-15);
/// ```
#[derive(Clone)]
pub struct NewtonTrace<F, G> {
    f: F,
    df: G,
    x0: f64,
    steps: usize,
    derivative_floor: f64,
}

/// Trace up to `steps` iterations of Newton's method from `x0`. See [`NewtonTrace`].
pub fn newton_trace<F, G>(x0: f64, f: F, df: G, steps: usize) -> NewtonTrace<F, G>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    NewtonTrace {
        f,
        df,
        x0,
        steps,
        derivative_floor: DEFAULT_DERIVATIVE_FLOOR,
    }
}

impl<F, G> Debug for NewtonTrace<F, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewtonTrace")
            .field("x0", &self.x0)
            .field("steps", &self.steps)
            .field("derivative_floor", &self.derivative_floor)
            .finish()
    }
}

impl<F, G> NewtonTrace<F, G>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    pub fn with_derivative_floor(mut self, derivative_floor: f64) -> Self {
        self.derivative_floor = derivative_floor;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = NewtonRecord> + '_ {
        let f = |x| Ok::<_, Infallible>((self.f)(x));
        let df = |x| Ok::<_, Infallible>((self.df)(x));
        let mut algo = Newton::new(f, df, self.x0).with_derivative_floor(self.derivative_floor);
        (0..self.steps).map_while(move |_| match algo.step() {
            (ControlFlow::Continue(()), Ok(())) => algo.last_record(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, fail_after_iters, fixed_iters, problems, Driver};
    use std::fmt;
    use test_log::test;

    #[test]
    fn newton_sqrt2() {
        let algo = Newton::from_fn(problems::sqrt2, problems::sqrt2_deriv, 1.5).unwrap();
        assert!(format!("{algo:?}").contains("x: 1.5"));
        assert_eq!(algo.last_record(), None);
        assert_eq!(algo.step_size(), f64::INFINITY);

        let (solved, step) = fixed_iters(algo, 20)
            .on_step(|v, s| log::trace!("{s} {:?}", v.last_record()))
            .converge_when(|v, _s| v.step_size() <= 1e-12)
            .solve()
            .unwrap();
        assert_approx_eq!(solved.x(), 2_f64.sqrt(), 1e-15);
        assert!(step.iteration() < 8, "{step:?}");
        assert_eq!(solved.last_record().map(|r| r.iteration), Some(step.iteration()));
    }

    #[test]
    fn newton_records() {
        let mut algo = Newton::from_fn(problems::sqrt2, problems::sqrt2_deriv, 1.5).unwrap();
        let (cf, res) = algo.step();
        assert!(cf.is_continue() && res.is_ok());

        let rec = algo.last_record().unwrap();
        assert_eq!(rec.iteration, 1);
        assert_eq!((rec.x, rec.fx, rec.dfx), (1.5, 0.25, 3.0));
        assert_approx_eq!(rec.x_next, 1.5 - 0.25 / 3.0, 1e-15);
        assert_eq!(algo.x(), rec.x_next);

        // tangent passes through (x, f(x)) and crosses zero at x_next
        let (slope, intercept) = rec.tangent();
        assert_approx_eq!(slope * rec.x + intercept, rec.fx, 1e-15);
        assert_approx_eq!(slope * rec.x_next + intercept, 0.0, 1e-14);
        assert_approx_eq!(rec.step_size(), 0.25 / 3.0, 1e-15);
    }

    #[test]
    fn newton_derivative_too_small() {
        let algo = Newton::from_fn(|x| x * x, |x| 2.0 * x, 0.0).unwrap();
        let (solved, step) = fixed_iters(algo, 20).solve().unwrap();
        assert!(solved.is_derivative_too_small());
        assert_eq!(solved.x(), 0.0);
        assert_eq!(solved.last_record(), None);
        assert_eq!(step.iteration(), 1);

        // a zero floor lets even a tiny derivative through
        let mut algo = Newton::from_fn(|x| x * x, |x| 2.0 * x, 1e-20)
            .unwrap()
            .with_derivative_floor(0.0);
        assert!(algo.step().0.is_continue());
        assert_approx_eq!(algo.x(), 0.5e-20, 1e-30);
    }

    #[test]
    fn newton_oscillates() {
        let algo =
            Newton::from_fn(problems::oscillating_cubic, problems::oscillating_cubic_deriv, 0.0)
                .unwrap();
        let result = fail_after_iters(algo, 20)
            .converge_when(|v, _s| v.step_size() <= 1e-5)
            .solve();
        assert!(matches!(result, Err(DriverError::MaxIterationsExceeded)));
    }

    #[test]
    fn newton_non_finite_start() {
        for x0 in [f64::NAN, f64::INFINITY] {
            let err = Newton::from_fn(|x| x, |_| 1.0, x0).unwrap_err();
            assert!(
                matches!(err, DriverError::InvalidInput(InputError::NonFiniteStart { .. })),
                "{err}"
            );
        }
    }

    #[test]
    fn newton_falliable() {
        #[derive(Debug)]
        struct Negative;
        impl fmt::Display for Negative {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "negative argument")
            }
        }
        impl Error for Negative {}

        // f(x) = ln(x) - 1 overshoots into x < 0 from x0 = 10
        let f = |x: f64| if x > 0.0 { Ok(x.ln() - 1.0) } else { Err(Negative) };
        let df = |x: f64| if x > 0.0 { Ok(1.0 / x) } else { Err(Negative) };

        let algo = Newton::from_falliable_fns(f, df, 2.0).unwrap();
        let (solved, _step) = fixed_iters(algo, 10).solve().unwrap();
        assert_approx_eq!(solved.x(), std::f64::consts::E, 1e-12);

        let algo = Newton::from_falliable_fns(f, df, 10.0).unwrap();
        let err = fixed_iters(algo, 10).solve().unwrap_err();
        assert!(matches!(err, DriverError::AlgoError(_)), "{err}");
    }

    #[test]
    fn trace_is_restartable() {
        let trace = newton_trace(1.5, problems::sqrt2, problems::sqrt2_deriv, 5);
        assert!(format!("{trace:?}").contains("steps: 5"));

        let first: Vec<_> = trace.iter().collect();
        let second: Vec<_> = trace.iter().collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);

        for (i, pair) in first.windows(2).enumerate() {
            assert_eq!(pair[0].iteration, i + 1);
            assert_eq!(pair[0].x_next, pair[1].x);
        }
        assert_eq!(first[0].x, 1.5);
    }

    #[test]
    fn trace_stops_at_flat_derivative() {
        let trace = newton_trace(0.0, |x| x * x + 1.0, |x| 2.0 * x, 10);
        assert_eq!(trace.iter().count(), 0);

        // |cos(1)| is below the raised floor
        let trace = newton_trace(1.0, |x: f64| x.sin(), |x: f64| x.cos(), 10)
            .with_derivative_floor(0.99);
        let records: Vec<_> = trace.iter().collect();
        assert!(records.is_empty(), "{records:?}");

        let lazy = newton_trace(1.5, problems::sqrt2, problems::sqrt2_deriv, usize::MAX);
        assert_eq!(lazy.iter().take(3).count(), 3);
    }
}
