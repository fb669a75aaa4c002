use crate::{Algo, DriverError, InputError};
use log::trace;
use std::{convert::Infallible, error::Error, fmt::Debug, ops::ControlFlow, sync::Arc};

/// An ordered triple `a < b < c`, with `b` a candidate minimum interior to `[a, c]`.
///
/// Brackets are values. Narrowing a bracket produces a new one, the old one is left untouched.
///
/// ```
/// use scalarsolve::Bracket;
///
/// let f = |x: f64| (x - 1.0).powi(2);
/// let bracket = Bracket::new(0.0, 0.5, 3.0)?;
/// let narrower = bracket.step(f);
///
/// assert_eq!(narrower.to_array(), [0.0, 0.5, 1.75]);
/// assert!(narrower.width() < bracket.width());
/// # Ok::<(), scalarsolve::InputError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    a: f64,
    b: f64,
    c: f64,
}

impl Bracket {
    /// # Errors
    /// [`InputError::InvalidBracket`] unless all points are finite and `a < b < c`.
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self, InputError> {
        let finite = a.is_finite() && b.is_finite() && c.is_finite();
        if !finite || !(a < b && b < c) {
            return Err(InputError::InvalidBracket { a, b, c });
        }
        Ok(Self { a, b, c })
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    /// The centre point, the best estimate of the minimum.
    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    /// The full span `c - a`.
    pub fn width(&self) -> f64 {
        self.c - self.a
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    /// The midpoint of the wider of `[a, b]` and `[b, c]`.
    ///
    /// Returns `None` once floating point precision is exhausted, and the midpoint
    /// would coincide with one of the three existing points.
    pub fn trial_point(&self) -> Option<f64> {
        let d = if self.b - self.a < self.c - self.b {
            (self.b + self.c) / 2.0
        } else {
            (self.a + self.b) / 2.0
        };
        (self.a < d && d < self.c && d != self.b).then_some(d)
    }

    /// The bracket that results from evaluating `f_d = f(d)` at the trial point `d`.
    ///
    /// Whichever of `b` and `d` has the lower function value becomes the centre (`d` on a tie),
    /// and the outer point on the far side of the other one is discarded.
    pub fn select(self, d: f64, f_b: f64, f_d: f64) -> Bracket {
        let Bracket { a, b, c } = self;
        match (d < b, f_b < f_d) {
            (true, true) => Bracket { a: d, b, c },
            (true, false) => Bracket { a, b: d, c: b },
            (false, true) => Bracket { a, b, c: d },
            (false, false) => Bracket { a: b, b: d, c },
        }
    }

    /// A single bracketing step, evaluating `f` at the centre and the trial point.
    ///
    /// The bracket is returned unchanged if it cannot be narrowed any further.
    pub fn step<F>(self, mut f: F) -> Bracket
    where
        F: FnMut(f64) -> f64,
    {
        match self.trial_point() {
            Some(d) => self.select(d, f(self.b), f(d)),
            None => self,
        }
    }
}

///
/// Three point bracketing search for a local minimum.
///
/// See section 4.1 of Judd, *Numerical Methods in Economics* for details on the algorithm.
///
/// Starting with `f(a) >= f(b) <= f(c)`, each step evaluates `f` at the midpoint of the wider half of
/// the bracket, and keeps the three points that still bracket the minimum. The width of the bracket
/// shrinks by at least a quarter every two steps.
///
/// The [`x`](Self::x) returned is the current [`Bracket`], whose centre is the best estimate of the minimum.
/// The algo never decides convergence itself, but will break once the bracket can no
/// longer be narrowed in `f64` arithmetic (see [`is_stalled`](Self::is_stalled)).
///
/// # Examples
///
/// ```rust
/// use scalarsolve::{algos::Bracketing, assert_approx_eq, fixed_iters, Bracket};
///
/// let f = |x: f64| x.cosh() - 2.0 * x;
/// let bracket = Bracket::new(0.0, 1.0, 4.0).unwrap();
///
/// let algo = Bracketing::from_fn(f, bracket).expect("not a minimum bracket");
/// let (solved, step) = fixed_iters(algo, 500)
///     .converge_when(|algo, _step| algo.width() < 1e-10)
///     .solve()
///     .expect("solving failed");
///
/// // f'(x) = sinh(x) - 2 = 0
/// assert_approx_eq!(solved.x().b(), 2_f64.asinh(), 1e-6);
/// assert!(step.iteration() < 200);
/// ```
///
#[derive(Clone, PartialEq)]
pub struct Bracketing<F> {
    f: F,
    bracket: Bracket,
    f_b: f64,
    stalled: bool,
}

impl<F> Debug for Bracketing<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bracketing")
            .field("bracket", &self.bracket)
            .field("f_b", &self.f_b)
            .field("stalled", &self.stalled)
            .finish()
    }
}

impl Bracketing<()> {
    /// Create a new bracketing algo from an infalliable function `f: f64 -> f64`
    pub fn from_fn<G>(
        mut g: G,
        bracket: Bracket,
    ) -> Result<Bracketing<impl FnMut(f64) -> Result<f64, Infallible>>, DriverError>
    where
        G: FnMut(f64) -> f64,
    {
        Bracketing::from_falliable_fn::<_, Infallible>(move |x| Ok(g(x)), bracket)
    }

    /// Create a new bracketing algo from a falliable function `f: f64 -> Result<f64,E>`
    /// # Errors
    /// * [`DriverError::AlgoError`] if the calls to the function f fail.
    /// * [`DriverError::InvalidInput`] if `f(a) >= f(b) <= f(c)` does not hold.
    pub fn from_falliable_fn<F, E>(mut f: F, bracket: Bracket) -> Result<Bracketing<F>, DriverError>
    where
        F: FnMut(f64) -> Result<f64, E>,
        E: 'static + Send + Sync + Error,
    {
        let [a, b, c] = bracket.to_array();
        let mut eval = |x| f(x).map_err(|e| DriverError::AlgoError(Arc::new(e)));
        let (fa, fb, fc) = (eval(a)?, eval(b)?, eval(c)?);
        if !(fa >= fb && fc >= fb) {
            return Err(InputError::NotBracketingMinimum { fa, fb, fc }.into());
        }
        Ok(Bracketing::<F> {
            f,
            bracket,
            f_b: fb,
            stalled: false,
        })
    }
}

impl<F> Bracketing<F> {
    pub fn x(&self) -> Bracket {
        self.bracket
    }

    pub fn width(&self) -> f64 {
        self.bracket.width()
    }

    /// The function, `f`, evaluated at the centre of the bracket.
    pub fn f_b(&self) -> f64 {
        self.f_b
    }

    /// True once the trial point can no longer be distinguished from the existing points.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }
}

impl<E, F> Algo for Bracketing<F>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: 'static + Send + Sync + Error,
{
    type Error = E;

    fn step(&mut self) -> (ControlFlow<()>, Result<(), E>) {
        let Some(d) = self.bracket.trial_point() else {
            trace!("bracket {:?} cannot be narrowed further", self.bracket);
            self.stalled = true;
            return (ControlFlow::Break(()), Ok(()));
        };
        let f_d = match (self.f)(d) {
            Ok(y) => y,
            Err(e) => return (ControlFlow::Break(()), Err(e)),
        };

        let next = self.bracket.select(d, self.f_b, f_d);
        if next.b == d {
            self.f_b = f_d;
        }
        trace!(
            "d = {d:+.12} f(d) = {f_d:+.6e} bracket {:?} width {:.3e}",
            next.to_array(),
            next.width()
        );
        self.bracket = next;
        (ControlFlow::Continue(()), Ok(()))
    }
}
