//! Command-line interface.

use argh::FromArgs;
use itertools::Itertools;

use crate::error::DomainError;
use crate::output::Rounding;
use crate::solver::RootFinder;

/// Find a minimax polynomial approximation of a function over an interval.
#[derive(FromArgs)]
pub struct Opts {
    /// degree of the final polynomial
    #[argh(option, short = 'd', default = "4")]
    pub degree: usize,

    /// approximation range, written as 'xmin:xmax'
    #[argh(option, short = 'r', default = "String::from(\"-1:1\")")]
    pub range: String,

    /// working precision, in bits (32 to 65535)
    #[argh(option, short = 'p', default = "512")]
    pub precision: u32,

    /// round printed coefficients for IEEE single precision
    #[argh(switch)]
    pub float: bool,

    /// round printed coefficients for IEEE double precision (default)
    #[argh(switch)]
    pub double: bool,

    /// round printed coefficients for x87 extended precision
    #[argh(switch)]
    pub long_double: bool,

    /// find zeros by bisection
    #[argh(switch)]
    pub bisect: bool,

    /// find zeros by regula falsi
    #[argh(switch)]
    pub regula_falsi: bool,

    /// find zeros by the Illinois variant of regula falsi
    #[argh(switch)]
    pub illinois: bool,

    /// find zeros by the Pegasus variant of regula falsi (default)
    #[argh(switch)]
    pub pegasus: bool,

    /// find zeros by the Ford variant of regula falsi
    #[argh(switch)]
    pub ford: bool,

    /// print the intermediate polynomial after every iteration
    #[argh(switch)]
    pub progress: bool,

    /// log phase timings and the leveled error
    #[argh(switch)]
    pub stats: bool,

    /// log per-iteration diagnostics
    #[argh(switch)]
    pub debug: bool,

    /// evaluate a constant expression at 40 digits and exit
    #[argh(option)]
    pub calc: Option<String>,

    /// function to approximate
    #[argh(positional)]
    pub function: Option<String>,

    /// weight function for relative error
    #[argh(positional)]
    pub weight: Option<String>,
}

impl Opts {
    /// Parse options from `env::args`.
    pub fn parse() -> Opts {
        argh::from_env()
    }

    /// The selected coefficient rounding; at most one flag may be set.
    pub fn rounding(&self) -> Result<Rounding, DomainError> {
        let chosen = [
            (self.float, Rounding::Float),
            (self.double, Rounding::Double),
            (self.long_double, Rounding::LongDouble),
        ]
        .into_iter()
        .filter_map(|(set, rounding)| set.then_some(rounding))
        .at_most_one()
        .map_err(|_| DomainError::RoundingChoice)?;

        Ok(chosen.unwrap_or_default())
    }

    /// The selected root finder; at most one flag may be set.
    pub fn root_finder(&self) -> Result<RootFinder, DomainError> {
        let chosen = [
            (self.bisect, RootFinder::Bisect),
            (self.regula_falsi, RootFinder::RegulaFalsi),
            (self.illinois, RootFinder::Illinois),
            (self.pegasus, RootFinder::Pegasus),
            (self.ford, RootFinder::Ford),
        ]
        .into_iter()
        .filter_map(|(set, finder)| set.then_some(finder))
        .at_most_one()
        .map_err(|_| DomainError::RootFinderChoice)?;

        Ok(chosen.unwrap_or_default())
    }
}
