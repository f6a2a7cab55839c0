//! The Remez exchange engine.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rug::Float;

use crate::error::{DomainError, Error};
use crate::expr::Program;
use crate::math::{Matrix, Polynomial, Precision};

use super::bracket::{EvalContext, ExtremumBracket, Point, RootFinder, ZeroBracket};
use super::pool::{Job, Pool};

/// Hard bound on exchange iterations; reaching it means divergence.
const MAX_ITERATIONS: u32 = 200;

/// Seed for the extremum tie-breaker. Fixed, so identical inputs give
/// identical coefficients.
const SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Minimax solver state. The estimate lives on the internal variable
/// t in [-1, 1]; t maps to the user's x through x = k1 + k2 t.
pub struct Remez {
    order: usize,
    prec: Precision,
    finder: RootFinder,
    func: Program,
    weight: Option<Program>,
    k1: Float,
    k2: Float,
    epsilon: Float,
    estimate: Polynomial,
    zeros: Vec<Float>,
    control: Vec<Float>,
    error: Float,
    iterations: u32,
    rng: StdRng,
    pool: Pool,
}

impl Remez {
    /// Builds a solver for f (and optionally the weight g) over
    /// [xmin, xmax], with convergence targeted at `digits` decimal digits.
    ///
    /// A constant weight changes nothing about the minimax problem, so it
    /// is discarded up front.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        func: Program,
        weight: Option<Program>,
        xmin: Float,
        xmax: Float,
        order: usize,
        digits: u32,
        prec: Precision,
        finder: RootFinder,
    ) -> Result<Remez, Error> {
        if order < 1 {
            return Err(DomainError::Degree.into());
        }
        if xmin >= xmax {
            return Err(DomainError::EmptyRange.into());
        }

        let k1 = prec.float(&xmax + &xmin) / 2;
        let k2 = prec.float(&xmax - &xmin) / 2;
        let epsilon = prec.epsilon(digits);
        let weight = weight.filter(|g| !g.is_constant());

        Ok(Remez {
            order,
            prec,
            finder,
            func,
            weight,
            k1,
            k2,
            epsilon,
            estimate: Polynomial::zero(prec),
            zeros: vec![prec.float(0); order + 1],
            control: vec![prec.float(0); order + 2],
            error: prec.float(0),
            iterations: 0,
            rng: StdRng::seed_from_u64(SEED),
            // Never more workers than brackets in flight.
            pool: Pool::with_size(
                thread::available_parallelism()
                    .map_or(4, usize::from)
                    .min(order + 2),
            ),
        })
    }

    /// The observed sup of the weighted error at the located extrema.
    pub fn error(&self) -> &Float {
        &self.error
    }

    /// The current estimate over the internal variable t.
    pub fn estimate(&self) -> &Polynomial {
        &self.estimate
    }

    /// The current estimate over the user's variable x, obtained by
    /// composing with q(x) = x/k2 - k1/k2.
    pub fn solution(&self) -> Polynomial {
        let c0 = -Float::with_val(self.prec.bits(), &self.k1 / &self.k2);
        let c1 = self.k2.clone().recip();
        let q = Polynomial::from_coeffs(vec![c0, c1]);
        self.estimate.compose(&q)
    }

    /// First Remez step: interpolate f at N+1 spread-out abscissae for a
    /// good initial estimate. The abscissae double as the first zero set.
    pub fn init(&mut self) -> Result<(), Error> {
        let n = self.order;

        for (i, zero) in self.zeros.iter_mut().enumerate() {
            *zero = Float::with_val(self.prec.bits(), 2 * i as i32 - n as i32)
                / (n as i32 + 1);
        }

        let ctx = self.context();
        let fxn: Vec<Float> = self.zeros.iter().map(|t| ctx.eval_func(t)).collect();

        // Row i holds the Chebyshev evaluations T_k(t_i).
        let mut system = Matrix::zero(n + 1, self.prec);
        for k in 0..=n {
            let cheb = Polynomial::chebyshev(k, self.prec);
            for i in 0..=n {
                system[i][k] = cheb.eval(&self.zeros[i]);
            }
        }

        let inverse = system.inverse()?;
        self.estimate = self.expand(&inverse, &fxn);

        Ok(())
    }

    /// One exchange iteration. Returns false once converged.
    pub fn step(&mut self) -> Result<bool, Error> {
        let old_error = self.error.clone();

        self.find_extrema();
        self.remez_step()?;

        self.iterations += 1;
        debug!("iteration {}: error {:.6e}", self.iterations, self.error);

        let bits = self.prec.bits();
        let delta = Float::with_val(bits, &self.error - &old_error).abs();
        let settled = delta < Float::with_val(bits, &self.error * &self.epsilon);
        // An error already below the decimal-digit target cannot be
        // leveled any further at that target; this also covers functions
        // the polynomial reproduces up to rounding, where the relative
        // test never sees two matching noise floors.
        let vanished = self.error <= self.epsilon;

        if self.error >= 0 && (settled || vanished) {
            return Ok(false);
        }

        if self.iterations >= MAX_ITERATIONS {
            return Err(Error::Divergence {
                iterations: self.iterations,
            });
        }

        self.find_zeros();
        Ok(true)
    }

    /// Exchange step proper: solve the augmented (N+2)-square system for
    /// Chebyshev coefficients plus the leveled oscillating error.
    fn remez_step(&mut self) -> Result<(), Error> {
        let start = Instant::now();
        let n = self.order;
        let ctx = self.context();

        let fxn: Vec<Float> = self.control.iter().map(|t| ctx.eval_func(t)).collect();

        let mut system = Matrix::zero(n + 2, self.prec);
        for k in 0..=n {
            let cheb = Polynomial::chebyshev(k, self.prec);
            for i in 0..=n + 1 {
                system[i][k] = cheb.eval(&self.control[i]);
            }
        }

        // The last column carries the oscillating weighted error.
        for i in 0..=n + 1 {
            let e = ctx.eval_weight(&self.control[i]).abs();
            system[i][n + 1] = if i % 2 == 1 { e } else { -e };
        }

        let inverse = system.inverse()?;
        self.estimate = self.expand(&inverse, &fxn);

        // The leveled error comes out of the same solve; it is reported
        // but convergence follows the observed error instead.
        let mut leveled = self.prec.float(0);
        for (i, f) in fxn.iter().enumerate() {
            leveled += Float::with_val(self.prec.bits(), &inverse[n + 1][i] * f);
        }
        info!(
            "exchange step took {:.2?}, leveled error {:.6e}",
            start.elapsed(),
            leveled
        );

        Ok(())
    }

    /// Rebuilds the estimate from an inverted system: coefficient k is
    /// sum_i inverse[k][i] f(t_i), applied to the Chebyshev basis.
    fn expand(&self, inverse: &Matrix, fxn: &[Float]) -> Polynomial {
        let mut estimate = Polynomial::zero(self.prec);

        for k in 0..=self.order {
            let mut weight = self.prec.float(0);
            for (i, f) in fxn.iter().enumerate() {
                weight += Float::with_val(self.prec.bits(), &inverse[k][i] * f);
            }
            estimate += &(Polynomial::chebyshev(k, self.prec) * &weight);
        }

        estimate
    }

    /// Locates the N+1 zeros of the residual, one per control interval,
    /// refining all brackets in parallel.
    fn find_zeros(&mut self) {
        let start = Instant::now();
        let ctx = self.context();

        for i in 0..=self.order {
            let a = Point {
                err: ctx.residual(&self.control[i]),
                x: self.control[i].clone(),
            };
            let b = Point {
                err: ctx.residual(&self.control[i + 1]),
                x: self.control[i + 1].clone(),
            };
            self.pool.post(Job::Zero {
                index: i,
                bracket: ZeroBracket::new(a, b),
                ctx: Arc::clone(&ctx),
            });
        }

        let mut finished = 0;
        while finished < self.order + 1 {
            match self.pool.take() {
                Job::Zero {
                    index,
                    bracket,
                    ctx,
                } => {
                    if bracket.done(&self.epsilon) {
                        self.zeros[index] = bracket.c.x.clone();
                        finished += 1;
                    } else {
                        self.pool.post(Job::Zero {
                            index,
                            bracket,
                            ctx,
                        });
                    }
                }
                _ => unreachable!("only zero jobs are in flight"),
            }
        }

        info!("zero search took {:.2?}", start.elapsed());
    }

    /// Locates the N+2 extrema of the weighted error, one per interval
    /// between consecutive zeros (the interval ends included), and
    /// records the new control points and the observed error.
    fn find_extrema(&mut self) {
        let start = Instant::now();
        let n = self.order;

        self.control[0] = self.prec.float(-1);
        self.control[n + 1] = self.prec.float(1);
        self.error = self.prec.float(0);

        let ctx = self.context();

        for i in 0..=n + 1 {
            let ax = if i == 0 {
                self.prec.float(-1)
            } else {
                self.zeros[i - 1].clone()
            };
            let bx = if i == n + 1 {
                self.prec.float(1)
            } else {
                self.zeros[i].clone()
            };

            // The seed point is randomised to break ties between equal
            // errors; any interior point works.
            let u = self.rng.gen_range(0.4..0.6);
            let cx = ax.clone() + Float::with_val(self.prec.bits(), &bx - &ax) * u;

            let bracket = ExtremumBracket {
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
            self.pool.post(Job::Extremum {
                index: i,
                bracket,
                ctx: Arc::clone(&ctx),
            });
        }

        let mut finished = 0;
        while finished < n + 2 {
            match self.pool.take() {
                Job::Extremum {
                    index,
                    bracket,
                    ctx,
                } => {
                    if bracket.done(&self.epsilon) {
                        self.control[index] = bracket.c.x.clone();
                        if bracket.c.err > self.error {
                            self.error = bracket.c.err.clone();
                        }
                        finished += 1;
                    } else {
                        self.pool.post(Job::Extremum {
                            index,
                            bracket,
                            ctx,
                        });
                    }
                }
                _ => unreachable!("only extremum jobs are in flight"),
            }
        }

        info!(
            "extremum search took {:.2?}, error {:.6e}",
            start.elapsed(),
            self.error
        );
    }

    fn context(&self) -> Arc<EvalContext> {
        Arc::new(EvalContext {
            estimate: self.estimate.clone(),
            func: self.func.clone(),
            weight: self.weight.clone(),
            k1: self.k1.clone(),
            k2: self.k2.clone(),
            finder: self.finder,
        })
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn prec() -> Precision {
        Precision::new(256).unwrap()
    }

    fn solver(
        func: &str,
        weight: Option<&str>,
        range: (f64, f64),
        order: usize,
        finder: RootFinder,
    ) -> Remez {
        let p = prec();
        let func = Program::parse(func, p).unwrap();
        let weight = weight.map(|w| Program::parse(w, p).unwrap());
        Remez::new(
            func,
            weight,
            p.float(range.0),
            p.float(range.1),
            order,
            17,
            p,
            finder,
        )
        .unwrap()
    }

    fn solve(solver: &mut Remez) {
        solver.init().unwrap();
        while solver.step().unwrap() {}
    }

    fn assert_alternating(solver: &Remez) {
        // Converged state interleaves control points and zeros strictly.
        for (i, zero) in solver.zeros.iter().enumerate() {
            assert!(solver.control[i] < *zero, "control[{i}] < zeros[{i}]");
            assert!(*zero < solver.control[i + 1], "zeros[{i}] < control[{}]", i + 1);
        }
        assert!(solver.control.iter().tuple_windows().all(|(a, b)| a < b));
    }

    #[test]
    fn init_interpolates_the_function() {
        let mut solver = solver("exp(x)", None, (0.0, 1.0), 4, RootFinder::Pegasus);
        solver.init().unwrap();

        assert_eq!(solver.estimate().degree(), 4);

        let ctx = solver.context();
        for i in 0..=4 {
            let t = prec().float(2 * i - 4) / 5;
            let delta =
                Float::with_val(256, ctx.eval_estimate(&t) - ctx.eval_func(&t)).abs();
            assert!(delta < 1e-50, "interpolation residual {delta} at node {i}");
        }
    }

    #[test]
    fn linear_functions_are_reproduced_exactly() {
        let mut remez = solver("x", None, (-1.0, 1.0), 3, RootFinder::Pegasus);
        solve(&mut remez);

        let solution = remez.solution();
        assert!(Float::with_val(256, solution.coeff(1) - 1).abs() < 1e-30);
        for i in [0, 2, 3] {
            assert!(solution.coeff(i).clone().abs() < 1e-30);
        }
        assert!(*remez.error() < 1e-30);
    }

    #[test]
    fn exp_to_degree_four() {
        let mut remez = solver("exp(x)", None, (0.0, 1.0), 4, RootFinder::Pegasus);
        solve(&mut remez);

        // The known minimax error for exp on [0, 1] at degree 4 is about
        // 5.5e-5; anything close means the exchange leveled properly.
        assert!(*remez.error() < 1e-4);
        assert!(*remez.error() > 1e-6);
        assert_alternating(&remez);

        // Coefficients stay near the Taylor series.
        let solution = remez.solution();
        assert!(Float::with_val(256, solution.coeff(0) - 1).abs() < 0.01);
        assert!(Float::with_val(256, solution.coeff(1) - 1).abs() < 0.05);
    }

    #[test]
    fn atan_of_exp_to_degree_five() {
        let mut remez =
            solver("atan(exp(1+x))", None, (-1.0, 1.0), 5, RootFinder::Pegasus);
        solve(&mut remez);

        assert!(*remez.error() < 2e-3);
        assert_alternating(&remez);
    }

    #[test]
    fn degree_sixteen_works() {
        let mut remez = solver("exp(x)", None, (0.0, 1.0), 16, RootFinder::Pegasus);
        solve(&mut remez);

        assert_eq!(remez.solution().degree(), 16);
        assert!(*remez.error() < 1e-10);
    }

    #[test]
    fn reference_scenario_over_a_shifted_range() {
        // Degree-5 fit of atan(sqrt(3+x^3)-exp(1+x)) over [sqrt(2), pi^2];
        // the documented leading coefficient is near -3.96e-5.
        let p = prec();
        let func = Program::parse("atan(sqrt(3+x³)-exp(1+x))", p).unwrap();
        let xmin = Program::parse("sqrt(2)", p).unwrap().eval(&p.float(0));
        let xmax = Program::parse("pi²", p).unwrap().eval(&p.float(0));

        let mut remez = Remez::new(
            func,
            None,
            xmin,
            xmax,
            5,
            17,
            p,
            RootFinder::Pegasus,
        )
        .unwrap();
        solve(&mut remez);

        let leading = remez.solution().coeff(5).clone();
        assert!(leading < -3.7e-5, "leading coefficient {leading}");
        assert!(leading > -4.2e-5, "leading coefficient {leading}");
    }

    #[test]
    fn degree_one_works() {
        let mut remez = solver("sin(x)", None, (-1.0, 1.0), 1, RootFinder::Pegasus);
        solve(&mut remez);

        assert_eq!(remez.solution().degree(), 1);
        assert!(*remez.error() < 0.1);
    }

    #[test]
    fn weight_equal_to_f_minimises_relative_error() {
        let mut remez =
            solver("exp(x)", Some("exp(x)"), (0.0, 1.0), 4, RootFinder::Pegasus);
        solve(&mut remez);

        assert!(*remez.error() > 0);
        assert!(*remez.error() < 1e-4);
        assert_alternating(&remez);
    }

    #[test]
    fn constant_weight_is_no_weight() {
        let mut weighted = solver("exp(x)", Some("2"), (0.0, 1.0), 3, RootFinder::Pegasus);
        let mut plain = solver("exp(x)", None, (0.0, 1.0), 3, RootFinder::Pegasus);
        solve(&mut weighted);
        solve(&mut plain);

        let delta = Float::with_val(256, weighted.error() - plain.error()).abs();
        assert!(delta < 1e-20);
    }

    #[test]
    fn finders_agree_on_the_polynomial() {
        let mut bisect =
            solver("atan(exp(1+x))", None, (-1.0, 1.0), 3, RootFinder::Bisect);
        let mut pegasus =
            solver("atan(exp(1+x))", None, (-1.0, 1.0), 3, RootFinder::Pegasus);
        solve(&mut bisect);
        solve(&mut pegasus);

        let lhs = bisect.solution();
        let rhs = pegasus.solution();
        for i in 0..=3 {
            let delta = Float::with_val(256, lhs.coeff(i) - rhs.coeff(i)).abs();
            assert!(delta < 1e-12, "coefficient {i} differs by {delta}");
        }

        let spread = Float::with_val(256, bisect.error() - pegasus.error()).abs();
        assert!(spread < Float::with_val(256, pegasus.error() * &prec().epsilon(16)));
    }

    #[test]
    fn runs_are_idempotent() {
        let mut first = solver("atan(exp(1+x))", None, (-1.0, 1.0), 3, RootFinder::Pegasus);
        let mut second = solver("atan(exp(1+x))", None, (-1.0, 1.0), 3, RootFinder::Pegasus);
        solve(&mut first);
        solve(&mut second);

        let lhs = first.solution();
        let rhs = second.solution();
        for i in 0..=3 {
            assert_eq!(lhs.coeff(i), rhs.coeff(i));
        }
    }

    #[test]
    fn empty_range_is_rejected() {
        let p = prec();
        let func = Program::parse("x", p).unwrap();
        let result = Remez::new(
            func,
            None,
            p.float(1),
            p.float(0),
            3,
            17,
            p,
            RootFinder::Pegasus,
        );

        assert!(matches!(
            result,
            Err(Error::Domain(DomainError::EmptyRange))
        ));
    }

    #[test]
    fn zero_degree_is_rejected() {
        let p = prec();
        let func = Program::parse("x", p).unwrap();
        let result = Remez::new(
            func,
            None,
            p.float(0),
            p.float(1),
            0,
            17,
            p,
            RootFinder::Pegasus,
        );

        assert!(matches!(result, Err(Error::Domain(DomainError::Degree))));
    }
}
