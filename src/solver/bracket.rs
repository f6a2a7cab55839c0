//! Bracket state for the zero and extremum searches.
//!
//! Each bracket is refined one step at a time so that the searches can be
//! interleaved across a worker pool; the engine decides termination when it
//! consumes a completed step.

use rug::Float;
use strum_macros::Display;

use crate::expr::Program;
use crate::math::Polynomial;

/// Root-finding iteration used by the zero search.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum RootFinder {
    Bisect,
    RegulaFalsi,
    Illinois,
    #[default]
    Pegasus,
    Ford,
}

/// Read-only evaluation state for one search phase.
///
/// The estimate and the programs are fixed for the whole phase, so workers
/// share one context without synchronisation.
pub struct EvalContext {
    pub estimate: Polynomial,
    pub func: Program,
    pub weight: Option<Program>,
    pub k1: Float,
    pub k2: Float,
    pub finder: RootFinder,
}

impl EvalContext {
    /// Maps the internal variable t in [-1, 1] to the user's x.
    fn argument(&self, t: &Float) -> Float {
        t.clone() * &self.k2 + &self.k1
    }

    pub fn eval_estimate(&self, t: &Float) -> Float {
        self.estimate.eval(t)
    }

    pub fn eval_func(&self, t: &Float) -> Float {
        self.func.eval(&self.argument(t))
    }

    pub fn eval_weight(&self, t: &Float) -> Float {
        match &self.weight {
            Some(weight) => weight.eval(&self.argument(t)),
            None => Float::with_val(t.prec(), 1),
        }
    }

    /// Signed residual estimate(t) - f(k1 + k2 t). Its zeros are the ones
    /// the zero search brackets; no weight is applied because weighting
    /// does not move them.
    pub fn residual(&self, t: &Float) -> Float {
        self.eval_estimate(t) - self.eval_func(t)
    }

    /// Weighted absolute error |(estimate(t) - f) / g|.
    pub fn eval_error(&self, t: &Float) -> Float {
        let residual = self.residual(t) / self.eval_weight(t);
        residual.abs()
    }
}

#[derive(Clone, Debug)]
pub struct Point {
    pub x: Float,
    pub err: Float,
}

fn negative(value: &Float) -> bool {
    *value < 0
}

fn midpoint(a: &Float, b: &Float) -> Float {
    Float::with_val(a.prec(), a + b) / 2
}

/// Bracket around one zero of the residual.
///
/// `a` and `b` hold residuals of opposite sign; `c` is the latest
/// candidate, with `c.err` zero until the first step runs.
#[derive(Clone, Debug)]
pub struct ZeroBracket {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl ZeroBracket {
    pub fn new(a: Point, b: Point) -> ZeroBracket {
        let prec = a.x.prec();
        ZeroBracket {
            a,
            b,
            c: Point {
                x: Float::new(prec),
                err: Float::new(prec),
            },
        }
    }

    /// One step of the selected root finder.
    pub fn step(&mut self, ctx: &EvalContext) {
        let degenerate = negative(&self.a.err) == negative(&self.b.err);

        let x = if degenerate || ctx.finder == RootFinder::Bisect {
            midpoint(&self.a.x, &self.b.x)
        } else {
            let denom = self.b.err.clone() - &self.a.err;
            let secant = if denom.is_zero() {
                self.c.x.clone()
            } else {
                let slope = (self.b.x.clone() - &self.a.x) / denom;
                self.a.x.clone() - self.a.err.clone() * slope
            };
            // A secant stuck on the previous candidate (an inflection, or
            // the float grid near the root) makes no progress; halve the
            // bracket instead.
            if secant == self.c.x {
                midpoint(&self.a.x, &self.b.x)
            } else {
                secant
            }
        };

        let err = ctx.residual(&x);
        let next = Point { x, err };

        if degenerate {
            // The bracket has lost its sign change, which can happen when
            // the estimate moved between dispatches. Keep halving toward
            // the candidate's side so the width still contracts.
            if negative(&self.a.err) == negative(&next.err) {
                self.a = next.clone();
            } else {
                self.b = next.clone();
            }
            self.c = next;
            return;
        }

        // A candidate landing on the same side twice in a row stalls plain
        // regula falsi; the variants dampen the stuck endpoint's residual.
        let same_side =
            !self.c.err.is_zero() && negative(&self.c.err) == negative(&next.err);

        let (same, stuck) = if negative(&self.a.err) == negative(&next.err) {
            (&mut self.a, &mut self.b)
        } else {
            (&mut self.b, &mut self.a)
        };

        if same_side {
            match ctx.finder {
                RootFinder::Bisect | RootFinder::RegulaFalsi => {}
                RootFinder::Illinois => stuck.err /= 2,
                RootFinder::Pegasus => {
                    let scale =
                        self.c.err.clone() / (self.c.err.clone() + &next.err);
                    stuck.err *= scale;
                }
                RootFinder::Ford => {
                    let scale = Float::with_val(next.err.prec(), 1)
                        - next.err.clone() / &same.err
                        - next.err.clone() / &stuck.err;
                    stuck.err *= scale;
                }
            }
        }

        *same = next.clone();
        self.c = next;
    }

    pub fn done(&self, epsilon: &Float) -> bool {
        if self.c.err.is_zero() {
            return true;
        }
        let width = Float::with_val(epsilon.prec(), &self.a.x - &self.b.x).abs();
        width <= *epsilon
    }
}

/// Bracket around one extremum of the weighted error, refined by
/// successive parabolic interpolation. `c` is the best point seen.
#[derive(Clone, Debug)]
pub struct ExtremumBracket {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl ExtremumBracket {
    /// One parabolic interpolation step.
    pub fn step(&mut self, ctx: &EvalContext) {
        let d1 = self.c.x.clone() - &self.a.x;
        let d2 = self.c.x.clone() - &self.b.x;
        let k1 = d1.clone() * (self.c.err.clone() - &self.b.err);
        let k2 = d2.clone() * (self.c.err.clone() - &self.a.err);

        let denom = k1.clone() - &k2;
        let x = self.c.x.clone() - (d1 * k1 - d2 * k2) / denom / 2;

        // A degenerate parabola lands outside the bracket (or nowhere at
        // all); fall back to the midpoint.
        let x = if x > self.a.x && x < self.b.x {
            x
        } else {
            midpoint(&self.a.x, &self.b.x)
        };

        let err = ctx.eval_error(&x);
        let next = Point { x, err };

        if next.err < self.c.err {
            // Worse than the best so far: the candidate becomes the new
            // endpoint on its own side.
            if next.x > self.c.x {
                self.b = next;
            } else {
                self.a = next;
            }
        } else {
            // Better: the old best becomes an endpoint, the candidate the
            // new best.
            if next.x > self.c.x {
                self.a = self.c.clone();
            } else {
                self.b = self.c.clone();
            }
            self.c = next;
        }
    }

    pub fn done(&self, epsilon: &Float) -> bool {
        let width = Float::with_val(epsilon.prec(), &self.b.x - &self.a.x);
        width <= *epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Program;
    use crate::math::Precision;

    fn prec() -> Precision {
        Precision::new(128).unwrap()
    }

    fn context(estimate: Polynomial, func: &str, finder: RootFinder) -> EvalContext {
        EvalContext {
            estimate,
            func: Program::parse(func, prec()).unwrap(),
            weight: None,
            k1: prec().float(0),
            k2: prec().float(1),
            finder,
        }
    }

    fn line() -> Polynomial {
        Polynomial::from_coeffs(vec![prec().float(0), prec().float(1)])
    }

    #[test]
    fn zero_bracket_converges_for_every_finder() {
        let finders = [
            RootFinder::Bisect,
            RootFinder::RegulaFalsi,
            RootFinder::Illinois,
            RootFinder::Pegasus,
            RootFinder::Ford,
        ];

        for finder in finders {
            // residual(t) = t^2 - 0.09, root at 0.3. The curvature keeps
            // secant candidates one-sided, so the dampened variants
            // actually dampen.
            let square = Polynomial::from_coeffs(vec![
                prec().float(-0.09),
                prec().float(0),
                prec().float(1),
            ]);
            let ctx = context(square, "0", finder);
            let epsilon = prec().float(1e-20);

            let a = Point {
                x: prec().float(0),
                err: ctx.residual(&prec().float(0)),
            };
            let b = Point {
                x: prec().float(1),
                err: ctx.residual(&prec().float(1)),
            };
            let mut bracket = ZeroBracket::new(a, b);

            let mut steps = 0;
            loop {
                bracket.step(&ctx);
                steps += 1;
                if bracket.done(&epsilon) {
                    break;
                }
                assert!(steps < 20_000, "{finder} failed to converge");
            }

            let delta = Float::with_val(128, &bracket.c.x - 0.3).abs();
            assert!(delta < 1e-15, "{finder} landed at {}", bracket.c.x);
        }
    }

    #[test]
    fn lost_sign_change_falls_back_to_midpoint() {
        let ctx = context(line(), "0.3", RootFinder::Pegasus);

        // Both residuals positive: no sign change to exploit.
        let a = Point {
            x: prec().float(0.4),
            err: prec().float(0.1),
        };
        let b = Point {
            x: prec().float(0.6),
            err: prec().float(0.3),
        };
        let mut bracket = ZeroBracket::new(a, b);

        bracket.step(&ctx);

        assert_eq!(bracket.c.x, 0.5);
        assert!(bracket.a.x < bracket.b.x);
    }

    #[test]
    fn parabolic_search_finds_the_extremum() {
        // estimate(t) = t^2, f(x) = x: error |t^2 - t| peaks at t = 1/2.
        let square = Polynomial::from_coeffs(vec![
            prec().float(0),
            prec().float(0),
            prec().float(1),
        ]);
        let ctx = context(square, "x", RootFinder::Pegasus);
        let epsilon = prec().float(1e-25);

        let ax = prec().float(0);
        let bx = prec().float(1);
        let cx = prec().float(0.45);
        let mut bracket = ExtremumBracket {
            a: Point {
                err: ctx.eval_error(&ax),
                x: ax,
            },
            b: Point {
                err: ctx.eval_error(&bx),
                x: bx,
            },
            c: Point {
                err: ctx.eval_error(&cx),
                x: cx,
            },
        };

        let mut steps = 0;
        while !bracket.done(&epsilon) {
            bracket.step(&ctx);
            steps += 1;
            assert!(steps < 500, "no convergence after {steps} steps");
        }

        let delta = Float::with_val(128, &bracket.c.x - 0.5).abs();
        assert!(delta < 1e-15, "extremum found at {}", bracket.c.x);
        let peak = Float::with_val(128, &bracket.c.err - 0.25).abs();
        assert!(peak < 1e-15, "peak error is {}", bracket.c.err);
    }
}
