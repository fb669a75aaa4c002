use rand::Rng;
use scalarsolve::Bracket;

#[allow(dead_code)]
#[derive(Debug, thiserror::Error)]
#[error("x = {0} is outside the domain")]
pub struct OutOfDomain(pub f64);

/// `f(x) = x² - 2`, failing for `|x| > 100`
#[allow(dead_code)]
pub fn bounded_sqrt2(x: f64) -> Result<f64, OutOfDomain> {
    if x.abs() > 100.0 {
        return Err(OutOfDomain(x));
    }
    Ok(x * x - 2.0)
}

/// A random quadratic, `(x - m)²`, together with a bracket around its minimum `m`.
///
/// The centre of the bracket is within 0.5 of `m`, the outer points at least 1 away.
#[allow(dead_code)]
pub fn random_quadratic(rng: &mut impl Rng) -> (f64, Bracket) {
    let m = rng.random_range(-10.0..10.0);
    let a = m - rng.random_range(1.0..5.0);
    let b = m + rng.random_range(-0.5..0.5);
    let c = m + rng.random_range(1.0..5.0);
    let bracket = Bracket::new(a, b, c).expect("a < b < c by construction");
    (m, bracket)
}
