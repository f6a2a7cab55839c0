//! Error reporting.

use std::fmt;

use crate::expr::ParseError;

/// Any failure the driver reports to the user.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An expression or range failed to parse.
    Parse(Box<ParseError>),
    /// The request itself is unsatisfiable.
    Domain(DomainError),
    /// The exchange system became singular, which in practice means the
    /// control points have collapsed onto each other.
    SingularMatrix,
    /// The exchange iteration stopped making progress.
    Divergence { iterations: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "invalid expression:\n{err}"),
            Error::Domain(err) => err.fmt(f),
            Error::SingularMatrix => {
                write!(f, "singular exchange system: control points collapsed")
            }
            Error::Divergence { iterations } => {
                write!(f, "no convergence after {iterations} iterations")
            }
        }
    }
}

impl From<DomainError> for Error {
    fn from(err: DomainError) -> Self {
        Error::Domain(err)
    }
}

impl From<Box<ParseError>> for Error {
    fn from(err: Box<ParseError>) -> Self {
        Error::Parse(err)
    }
}

/// A structurally valid request with out-of-domain contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainError {
    Degree,
    Precision,
    Range,
    EmptyRange,
    NonConstant(&'static str),
    RootFinderChoice,
    RoundingChoice,
    MissingFunction,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DomainError::Degree => {
                write!(f, "invalid degree: must be at least 1")
            }
            DomainError::Precision => {
                write!(f, "invalid precision: must be 32 to 65535 bits")
            }
            DomainError::Range => {
                write!(f, "invalid range: expected 'xmin:xmax'")
            }
            DomainError::EmptyRange => {
                write!(f, "invalid range: xmin must be less than xmax")
            }
            DomainError::NonConstant(what) => {
                write!(f, "invalid {what}: expression must be constant")
            }
            DomainError::RootFinderChoice => {
                write!(f, "at most one root finder may be selected")
            }
            DomainError::RoundingChoice => {
                write!(f, "at most one of --float, --double and --long-double may be selected")
            }
            DomainError::MissingFunction => {
                write!(f, "too few arguments: no function specified")
            }
        }
    }
}
