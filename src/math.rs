/// Largest absolute difference between two values, used by [`assert_approx_eq!`](crate::assert_approx_eq).
///
/// Slices and arrays of differing lengths are infinitely far apart.
pub trait Tolerance {
    fn max_abs_diff(&self, other: &Self) -> f64;
}

impl Tolerance for f64 {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        if self == other {
            // equal infinities
            return 0.0;
        }
        (self - other).abs()
    }
}

impl Tolerance for [f64] {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        self.iter()
            .zip(other)
            .map(|(a, b)| a.max_abs_diff(b))
            .fold(0.0, |max, d| if d.is_nan() || d > max { d } else { max })
    }
}

impl<const N: usize> Tolerance for [f64; N] {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        self.as_slice().max_abs_diff(other.as_slice())
    }
}

impl<T: Tolerance + ?Sized> Tolerance for &T {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        (**self).max_abs_diff(*other)
    }
}

/// Asserts two floats (or arrays/slices of floats) are equal to within a tolerance.
///
/// The tolerance defaults to `1e-6`. NaN is never approximately equal to anything.
///
/// ```
/// use scalarsolve::assert_approx_eq;
///
/// assert_approx_eq!(2_f64.sqrt(), 1.414213);
/// assert_approx_eq!([0.1 + 0.2, 1.0], [0.3, 1.0], 1e-12);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr $(,)?) => {
        $crate::assert_approx_eq!($a, $b, 1e-6)
    };
    ($a:expr, $b:expr, $tol:expr $(,)?) => {{
        let (a, b, tol) = (&$a, &$b, $tol);
        let diff = $crate::Tolerance::max_abs_diff(a, b);
        assert!(
            diff <= tol,
            "assertion failed: {a:?} ≈ {b:?} (difference {diff:e} exceeds tolerance {tol:e})"
        );
    }};
}

/// Estimate the derivative `f'(x)` by the central difference `[f(x+h) - f(x-h)] / 2h`.
///
/// The step is scaled with `|x|` so that `x ± h` remains distinguishable from `x`.
/// Useful for checking a hand-written derivative, or as the derivative passed to
/// [`newton`](crate::newton) when none is available.
pub fn central_difference<F>(mut f: F, x: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    let h = f64::EPSILON.cbrt() * x.abs().max(1.0);
    (f(x + h) - f(x - h)) / (2.0 * h)
}
