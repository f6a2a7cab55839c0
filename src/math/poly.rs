//! Dense univariate polynomials over arbitrary-precision reals.

use std::ops::{Add, AddAssign, Mul, Sub};

use rug::Float;

use super::Precision;

/// Coefficients in ascending order of degree; always non-empty.
#[derive(Clone, Debug)]
pub struct Polynomial {
    coeffs: Vec<Float>,
}

impl Polynomial {
    pub fn zero(prec: Precision) -> Polynomial {
        Polynomial {
            coeffs: vec![prec.float(0)],
        }
    }

    /// Builds a polynomial from ascending coefficients.
    ///
    /// The coefficient list must be non-empty; trailing zeros are kept, so
    /// the degree is determined by the caller.
    pub fn from_coeffs(coeffs: Vec<Float>) -> Polynomial {
        assert!(!coeffs.is_empty(), "a polynomial has at least one coefficient");
        Polynomial { coeffs }
    }

    /// The n-th Chebyshev polynomial of the first kind.
    pub fn chebyshev(n: usize, prec: Precision) -> Polynomial {
        let mut prev = Polynomial {
            coeffs: vec![prec.float(1)],
        };
        if n == 0 {
            return prev;
        }

        let mut cur = Polynomial {
            coeffs: vec![prec.float(0), prec.float(1)],
        };
        let two_x = Polynomial {
            coeffs: vec![prec.float(0), prec.float(2)],
        };

        // T_{k+1} = 2x T_k - T_{k-1}
        for _ in 1..n {
            let next = &two_x * &cur - prev;
            prev = cur;
            cur = next;
        }

        cur
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeff(&self, i: usize) -> &Float {
        &self.coeffs[i]
    }

    pub fn coeffs(&self) -> &[Float] {
        &self.coeffs
    }

    fn prec(&self) -> u32 {
        self.coeffs[0].prec()
    }

    /// Horner evaluation.
    pub fn eval(&self, x: &Float) -> Float {
        let mut acc = self.coeffs[self.degree()].clone();
        for c in self.coeffs.iter().rev().skip(1) {
            acc = acc * x + c;
        }
        acc
    }

    /// The composition self(inner), by Horner evaluation over polynomials.
    pub fn compose(&self, inner: &Polynomial) -> Polynomial {
        let mut acc = Polynomial {
            coeffs: vec![self.coeffs[self.degree()].clone()],
        };
        for c in self.coeffs.iter().rev().skip(1) {
            acc = &acc * inner;
            acc.coeffs[0] += c;
        }
        acc
    }
}

impl Add<&Polynomial> for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: &Polynomial) -> Polynomial {
        self += rhs;
        self
    }
}

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        let prec = self.prec();
        while self.coeffs.len() < rhs.coeffs.len() {
            self.coeffs.push(Float::with_val(prec, 0));
        }
        for (c, r) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *c += r;
        }
    }
}

impl Sub<Polynomial> for Polynomial {
    type Output = Polynomial;

    fn sub(mut self, rhs: Polynomial) -> Polynomial {
        let prec = self.prec();
        while self.coeffs.len() < rhs.coeffs.len() {
            self.coeffs.push(Float::with_val(prec, 0));
        }
        for (c, r) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *c -= r;
        }
        self
    }
}

impl Mul<&Float> for Polynomial {
    type Output = Polynomial;

    fn mul(mut self, rhs: &Float) -> Polynomial {
        for c in &mut self.coeffs {
            *c *= rhs;
        }
        self
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let prec = self.prec();
        let mut coeffs =
            vec![Float::with_val(prec, 0); self.coeffs.len() + rhs.coeffs.len() - 1];

        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += Float::with_val(prec, a * b);
            }
        }

        Polynomial { coeffs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prec() -> Precision {
        Precision::new(128).unwrap()
    }

    #[test]
    fn chebyshev_base_cases() {
        let t0 = Polynomial::chebyshev(0, prec());
        let t1 = Polynomial::chebyshev(1, prec());

        assert_eq!(t0.degree(), 0);
        assert_eq!(*t0.coeff(0), 1);
        assert_eq!(t1.degree(), 1);
        assert_eq!(*t1.coeff(0), 0);
        assert_eq!(*t1.coeff(1), 1);
    }

    #[test]
    fn chebyshev_recurrence() {
        // T_3 = 4x^3 - 3x
        let t3 = Polynomial::chebyshev(3, prec());

        assert_eq!(t3.degree(), 3);
        assert_eq!(*t3.coeff(0), 0);
        assert_eq!(*t3.coeff(1), -3);
        assert_eq!(*t3.coeff(2), 0);
        assert_eq!(*t3.coeff(3), 4);
    }

    #[test]
    fn horner_eval() {
        // 1 + 2x + 3x^2 at x = 2
        let p = Polynomial::from_coeffs(vec![
            prec().float(1),
            prec().float(2),
            prec().float(3),
        ]);

        assert_eq!(p.eval(&prec().float(2)), 17);
    }

    #[test]
    fn compose_shift() {
        // (x + 1)^2 = x^2 + 2x + 1
        let square =
            Polynomial::from_coeffs(vec![prec().float(0), prec().float(0), prec().float(1)]);
        let shift = Polynomial::from_coeffs(vec![prec().float(1), prec().float(1)]);

        let composed = square.compose(&shift);

        assert_eq!(composed.degree(), 2);
        assert_eq!(*composed.coeff(0), 1);
        assert_eq!(*composed.coeff(1), 2);
        assert_eq!(*composed.coeff(2), 1);
    }

    #[test]
    fn product_degrees() {
        let t2 = Polynomial::chebyshev(2, prec());
        let t3 = Polynomial::chebyshev(3, prec());
        let product = &t2 * &t3;

        assert_eq!(product.degree(), 5);
        // 2 T_2 T_3 = T_5 + T_1
        let expect = Polynomial::chebyshev(5, prec()) + &Polynomial::chebyshev(1, prec());
        for i in 0..=5 {
            let double = Float::with_val(128, product.coeff(i) * 2u32);
            assert_eq!(double, *expect.coeff(i));
        }
    }
}
