//! Arithmetic expression front end.
//!
//! Expressions are parsed into a small tree, then compiled to a postfix
//! opcode program evaluated by a stack machine over arbitrary-precision
//! reals.

pub mod ast;
mod literals;
mod parser;
mod program;

pub use parser::{ExprParser, ParseError, Rule};
pub use program::{BinaryOp, Op, Program, UnaryOp};
