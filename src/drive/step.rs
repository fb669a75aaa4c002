use std::fmt::{self, Display};

/// Why a [`Driver`](crate::Driver) finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stop {
    /// A [`converge_when`](crate::Driver::converge_when) predicate held.
    Converged,
    /// The count given to [`fixed_iters`](crate::fixed_iters) was reached.
    IterationLimit,
    /// The algo returned `ControlFlow::Break`, no further progress being possible.
    AlgoBreak,
}

/// The iteration count and budget, passed to each driver callback.
///
/// Once solving finishes, the final `Step` also records why it [stopped](Self::stopped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub(crate) iteration: usize,
    pub(crate) iter_limit: Option<usize>,
    pub(crate) stop: Option<Stop>,
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>6}]", self.iteration)
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Step {
    pub(crate) fn new(iteration: usize) -> Self {
        Step {
            iteration,
            iter_limit: None,
            stop: None,
        }
    }

    /// How many times the algo's `step` has been invoked, so 1 during the first callback.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The iteration budget set by [`crate::fixed_iters`] or [`crate::fail_after_iters`], if any.
    #[inline]
    pub fn iter_limit(&self) -> Option<usize> {
        self.iter_limit
    }

    /// `None` while iteration continues.
    #[inline]
    pub fn stopped(&self) -> Option<Stop> {
        self.stop
    }

    /// Iterations as a percentage of the budget, between `0` and `100`.
    ///
    /// Returns `None` if no budget has been set, or the budget is zero.
    pub fn progress_percentage(&self) -> Option<f64> {
        let limit = self.iter_limit.filter(|&n| n > 0)?;
        let p = self.iteration as f64 / limit as f64;
        Some(100.0 * p.min(1.0))
    }
}
