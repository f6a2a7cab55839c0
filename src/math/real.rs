//! Working-precision plumbing for `rug::Float`.

use rug::float::Constant;
use rug::ops::Pow;
use rug::{Assign, Float};

/// Significand width, in bits, used for every real in a solver run.
///
/// The precision is fixed before any arithmetic happens and threaded
/// through construction; rug then keeps results at the precision of the
/// value being assigned, so all intermediates stay at this width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Precision(u32);

impl Precision {
    pub const MIN: u32 = 32;
    pub const MAX: u32 = 65535;

    /// Validates the bit count; `None` if outside 32..=65535.
    pub fn new(bits: u32) -> Option<Precision> {
        (Self::MIN..=Self::MAX)
            .contains(&bits)
            .then_some(Precision(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// A real at this precision, from anything rug can assign.
    pub fn float<T>(self, val: T) -> Float
    where
        Float: Assign<T>,
    {
        Float::with_val(self.0, val)
    }

    pub fn pi(self) -> Float {
        self.float(Constant::Pi)
    }

    pub fn tau(self) -> Float {
        self.float(Constant::Pi) * 2
    }

    pub fn e(self) -> Float {
        self.float(1).exp()
    }

    /// Convergence tolerance for a decimal-digit target: 10^-(digits + 2).
    pub fn epsilon(self, digits: u32) -> Float {
        self.float(10).pow(-(digits as i32 + 2))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(Precision::new(31).is_none());
        assert!(Precision::new(65536).is_none());
        assert_eq!(Precision::new(512).map(Precision::bits), Some(512));
    }

    #[test]
    fn constants() {
        let prec = Precision::new(128).unwrap();

        assert!((prec.pi() - 3.14159265358979f64).abs() < 1e-14);
        assert!((prec.tau() - prec.pi() * 2).abs() < 1e-30);
        assert!((prec.e() - 2.71828182845904f64).abs() < 1e-14);
    }

    #[test]
    fn epsilon_scale() {
        let prec = Precision::new(128).unwrap();
        let eps = prec.epsilon(17);

        assert!(eps < 1.1e-19);
        assert!(eps > 0.9e-19);
    }
}
