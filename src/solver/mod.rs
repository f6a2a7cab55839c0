//! Remez exchange engine and its worker pool.

pub mod bracket;
pub mod pool;
mod remez;

pub use bracket::RootFinder;
pub use remez::Remez;
