//! Arbitrary-precision numeric services.

mod matrix;
mod poly;
mod real;

pub use matrix::Matrix;
pub use poly::Polynomial;
pub use real::Precision;
