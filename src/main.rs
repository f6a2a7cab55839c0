use std::process::ExitCode;

use log::LevelFilter;
use rug::Float;

use minimax::error::{DomainError, Error};
use minimax::expr::Program;
use minimax::math::Precision;
use minimax::opts::Opts;
use minimax::output;
use minimax::solver::Remez;

fn main() -> ExitCode {
    let opts = Opts::parse();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(level(&opts))
        .target(env_logger::Target::Stderr)
        .init();

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("Error: {err}");
            println!("Try 'minimax --help' for more information.");
            ExitCode::FAILURE
        }
    }
}

fn level(opts: &Opts) -> LevelFilter {
    if opts.debug {
        LevelFilter::Debug
    } else if opts.stats {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}

fn run(opts: &Opts) -> Result<(), Error> {
    let prec = Precision::new(opts.precision).ok_or(DomainError::Precision)?;

    if let Some(expr) = &opts.calc {
        let value = constant(expr, prec, "--calc expression")?;
        println!("{value:.39e}");
        return Ok(());
    }

    let (xmin, xmax) = range(&opts.range, prec)?;

    let function = opts.function.as_deref().ok_or(DomainError::MissingFunction)?;
    let func = Program::parse(function, prec)?;
    let weight = opts
        .weight
        .as_deref()
        .map(|w| Program::parse(w, prec))
        .transpose()?;

    let rounding = opts.rounding()?;

    let mut solver = Remez::new(
        func,
        weight,
        xmin.clone(),
        xmax.clone(),
        opts.degree,
        rounding.digits(),
        prec,
        opts.root_finder()?,
    )?;

    solver.init()?;
    while solver.step()? {
        if opts.progress {
            println!("{}", output::gnuplot(&solver.solution(), rounding.digits()));
        }
    }

    print!(
        "{}",
        output::c_source(
            &solver.solution(),
            rounding,
            function,
            opts.weight.as_deref(),
            &xmin,
            &xmax,
        )
    );

    Ok(())
}

/// Evaluates a constant expression, rejecting anything that mentions x.
fn constant(src: &str, prec: Precision, what: &'static str) -> Result<Float, Error> {
    let program = Program::parse(src, prec)?;
    if !program.is_constant() {
        return Err(DomainError::NonConstant(what).into());
    }
    Ok(program.eval(&prec.float(0)))
}

/// Parses 'xmin:xmax', both sides constant expressions.
fn range(range: &str, prec: Precision) -> Result<(Float, Float), Error> {
    let (lhs, rhs) = range.split_once(':').ok_or(DomainError::Range)?;
    let xmin = constant(lhs, prec, "range")?;
    let xmax = constant(rhs, prec, "range")?;
    Ok((xmin, xmax))
}
