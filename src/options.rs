use crate::InputError;
use serde::{Deserialize, Serialize};

/// Configuration for [`bracketing`](crate::bracketing).
///
/// Deserializable from a partial config, missing fields taking their defaults.
///
/// ```
/// use scalarsolve::BracketOptions;
///
/// let opts = BracketOptions::default().with_max_iterations(500);
/// assert_eq!(opts.max_iterations, 500);
/// assert_eq!(opts.width_tolerance, 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BracketOptions {
    /// Maximum number of narrowing steps. Zero returns the initial bracket untouched. Default 100.
    pub max_iterations: usize,

    /// Stop once the full bracket width `c - a` is strictly below this. Zero disables the test,
    /// leaving only the iteration budget. Default `1e-10`.
    pub width_tolerance: f64,
}

impl Default for BracketOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            width_tolerance: 1e-10,
        }
    }
}

impl BracketOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_width_tolerance(mut self, width_tolerance: f64) -> Self {
        self.width_tolerance = width_tolerance;
        self
    }

    /// # Errors
    /// [`InputError::InvalidTolerance`] if the tolerance is negative or NaN.
    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("width_tolerance", self.width_tolerance)
    }
}

/// Configuration for [`newton`](crate::newton).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewtonOptions {
    /// Converged once `|x_n - x_{n-1}| <= tolerance`. Default `1e-5`.
    pub tolerance: f64,

    /// Maximum number of Newton steps. Default 20.
    pub max_iterations: usize,

    /// Stop with [`NewtonStatus::DerivativeTooSmall`](crate::NewtonStatus::DerivativeTooSmall)
    /// if `|f'(x)|` is below this. Default `1e-14`.
    pub derivative_floor: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: 20,
            derivative_floor: crate::algos::DEFAULT_DERIVATIVE_FLOOR,
        }
    }
}

impl NewtonOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_derivative_floor(mut self, derivative_floor: f64) -> Self {
        self.derivative_floor = derivative_floor;
        self
    }

    /// # Errors
    /// [`InputError::InvalidTolerance`] if either tolerance is negative or NaN.
    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("tolerance", self.tolerance)?;
        non_negative("derivative_floor", self.derivative_floor)
    }
}

fn non_negative(name: &'static str, got: f64) -> Result<(), InputError> {
    if got >= 0.0 {
        Ok(())
    } else {
        Err(InputError::InvalidTolerance { name, got })
    }
}
