//! The algorithms
//!
//! Each can be stepped by a [`Driver`](crate::Driver), or run to completion with the
//! functions [`bracketing`](crate::bracketing) and [`newton`](crate::newton).
mod bracketing;
mod newton;

pub use bracketing::{Bracket, Bracketing};
pub use newton::{newton_trace, Newton, NewtonRecord, NewtonTrace, DEFAULT_DERIVATIVE_FLOOR};
