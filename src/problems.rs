//! Sample one dimensional problems for testing minimization and root finding, along with their derivatives
//!
//!
//! See <https://en.wikipedia.org/wiki/Test_functions_for_optimization>
//!

/// The minimizer of [`bowl`], `asinh(1) = ln(1 + √2)`.
pub const BOWL_MINIMUM: f64 = 0.881_373_587_019_543;

/// A smooth, strictly convex, asymmetric bowl: f(x) = cosh(x) - x
///
/// Unimodal on the whole real line, with minimum at [`BOWL_MINIMUM`], where f = √2 - asinh(1)
pub fn bowl(x: f64) -> f64 {
    x.cosh() - x
}

/// Bowl derivative: f'(x) = sinh(x) - 1
pub fn bowl_deriv(x: f64) -> f64 {
    x.sinh() - 1.0
}

/// f(x) = x² - 2, with roots ±√2
pub fn sqrt2(x: f64) -> f64 {
    x * x - 2.0
}

/// f'(x) = 2x
pub fn sqrt2_deriv(x: f64) -> f64 {
    2.0 * x
}

/// f(x) = x³ - 2x + 2
///
/// Newton's method started at `x = 0` cycles `0 → 1 → 0 → ...` for ever,
/// never approaching the real root near `-1.7693`.
///
/// <https://en.wikipedia.org/wiki/Newton%27s_method#Starting_point_enters_a_cycle>
pub fn oscillating_cubic(x: f64) -> f64 {
    x.powi(3) - 2.0 * x + 2.0
}

/// f'(x) = 3x² - 2
pub fn oscillating_cubic_deriv(x: f64) -> f64 {
    3.0 * x * x - 2.0
}
