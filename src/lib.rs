//! Minimax polynomial approximation via the Remez exchange algorithm.
//!
//! Given a function f and an interval [a, b], the solver finds the
//! polynomial of a requested degree minimising the maximum of
//! |(p(x) - f(x)) / g(x)| over the interval, where g is an optional
//! weight function. All arithmetic is performed with arbitrary-precision
//! reals so that the coefficients are useful for machine floats up to
//! long-double precision.

pub mod error;
pub mod expr;
pub mod math;
pub mod opts;
pub mod output;
pub mod solver;
