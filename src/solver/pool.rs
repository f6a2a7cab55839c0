//! Worker pool for bracket refinement.
//!
//! The engine posts jobs on `questions` and consumes them from `answers`;
//! a worker performs exactly one refinement step per job. Because the job
//! owns its bracket, an index can only ever be touched by one thread at a
//! time: the engine reposts a bracket only after consuming its answer.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::bracket::{EvalContext, ExtremumBracket, ZeroBracket};

/// One unit of work, owning the bracket it refines.
pub enum Job {
    Zero {
        index: usize,
        bracket: ZeroBracket,
        ctx: Arc<EvalContext>,
    },
    Extremum {
        index: usize,
        bracket: ExtremumBracket,
        ctx: Arc<EvalContext>,
    },
    /// Echoed by a worker as it exits.
    Shutdown,
}

pub struct Pool {
    questions: Sender<Job>,
    answers: Receiver<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl Pool {
    /// A pool sized from hardware concurrency.
    pub fn new() -> Pool {
        Pool::with_size(thread::available_parallelism().map_or(4, usize::from))
    }

    pub fn with_size(size: usize) -> Pool {
        assert!(size > 0, "a pool has at least one worker");

        let (questions, jobs) = unbounded::<Job>();
        let (results, answers) = unbounded::<Job>();

        let workers = (0..size)
            .map(|_| {
                let jobs = jobs.clone();
                let results = results.clone();
                thread::spawn(move || serve(jobs, results))
            })
            .collect();

        Pool {
            questions,
            answers,
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn post(&self, job: Job) {
        self.questions.send(job).expect("workers outlive the pool");
    }

    pub fn take(&self) -> Job {
        self.answers.recv().expect("workers outlive the pool")
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool::new()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.questions.send(Job::Shutdown);
        }

        let mut running = self.workers.len();
        while running > 0 {
            match self.answers.recv() {
                Ok(Job::Shutdown) => running -= 1,
                Ok(_) => {}
                Err(_) => break,
            }
        }

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn serve(jobs: Receiver<Job>, results: Sender<Job>) {
    for mut job in jobs {
        let quit = matches!(job, Job::Shutdown);

        match &mut job {
            Job::Zero { bracket, ctx, .. } => bracket.step(ctx),
            Job::Extremum { bracket, ctx, .. } => bracket.step(ctx),
            Job::Shutdown => {}
        }

        if results.send(job).is_err() || quit {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Program;
    use crate::math::{Polynomial, Precision};
    use crate::solver::bracket::{Point, RootFinder};

    fn context() -> Arc<EvalContext> {
        let prec = Precision::new(128).unwrap();
        Arc::new(EvalContext {
            estimate: Polynomial::from_coeffs(vec![prec.float(0), prec.float(1)]),
            func: Program::parse("0.5", prec).unwrap(),
            weight: None,
            k1: prec.float(0),
            k2: prec.float(1),
            finder: RootFinder::Bisect,
        })
    }

    #[test]
    fn jobs_come_back_stepped() {
        let prec = Precision::new(128).unwrap();
        let pool = Pool::with_size(2);
        let ctx = context();

        let a = Point {
            x: prec.float(0),
            err: ctx.residual(&prec.float(0)),
        };
        let b = Point {
            x: prec.float(1),
            err: ctx.residual(&prec.float(1)),
        };
        pool.post(Job::Zero {
            index: 7,
            bracket: ZeroBracket::new(a, b),
            ctx,
        });

        match pool.take() {
            Job::Zero { index, bracket, .. } => {
                assert_eq!(index, 7);
                // One bisection step: the candidate is the midpoint.
                assert_eq!(bracket.c.x, 0.5);
            }
            _ => panic!("expected the zero job back"),
        }
    }

    #[test]
    fn shutdown_is_clean() {
        let pool = Pool::with_size(3);
        assert_eq!(pool.size(), 3);
        drop(pool);
    }
}
