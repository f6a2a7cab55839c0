//! Postfix programs over arbitrary-precision reals.

use std::str::FromStr;

use rug::ops::Pow;
use rug::Float;

use super::ast::Expr;
use super::parser::{ExprParser, ParseError};
use crate::math::Precision;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[rustfmt::skip]
pub enum UnaryOp {
    Plus,  Minus, Abs,   Sqrt,  Cbrt,
    Exp,   Exp2,  Erf,   Log,   Log2,
    Log10, Sin,   Cos,   Tan,   Asin,
    Acos,  Atan,  Sinh,  Cosh,  Tanh,
    ToFloat, ToDouble, ToLongDouble,
}

impl FromStr for UnaryOp {
    type Err = ();

    /// Resolves a function name; `+` and `-` are not callable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abs" => Ok(UnaryOp::Abs),
            "sqrt" => Ok(UnaryOp::Sqrt),
            "cbrt" => Ok(UnaryOp::Cbrt),
            "exp" => Ok(UnaryOp::Exp),
            "exp2" => Ok(UnaryOp::Exp2),
            "erf" => Ok(UnaryOp::Erf),
            "log" => Ok(UnaryOp::Log),
            "log2" => Ok(UnaryOp::Log2),
            "log10" => Ok(UnaryOp::Log10),
            "sin" => Ok(UnaryOp::Sin),
            "cos" => Ok(UnaryOp::Cos),
            "tan" => Ok(UnaryOp::Tan),
            "asin" => Ok(UnaryOp::Asin),
            "acos" => Ok(UnaryOp::Acos),
            "atan" => Ok(UnaryOp::Atan),
            "sinh" => Ok(UnaryOp::Sinh),
            "cosh" => Ok(UnaryOp::Cosh),
            "tanh" => Ok(UnaryOp::Tanh),
            "float" => Ok(UnaryOp::ToFloat),
            "double" => Ok(UnaryOp::ToDouble),
            "ldouble" => Ok(UnaryOp::ToLongDouble),
            _ => Err(()),
        }
    }
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Cbrt => "cbrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Exp2 => "exp2",
            UnaryOp::Erf => "erf",
            UnaryOp::Log => "log",
            UnaryOp::Log2 => "log2",
            UnaryOp::Log10 => "log10",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "asin",
            UnaryOp::Acos => "acos",
            UnaryOp::Atan => "atan",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
            UnaryOp::ToFloat => "float",
            UnaryOp::ToDouble => "double",
            UnaryOp::ToLongDouble => "ldouble",
        }
    }

    fn apply(self, x: Float) -> Float {
        match self {
            UnaryOp::Plus => x,
            UnaryOp::Minus => -x,
            UnaryOp::Abs => x.abs(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Cbrt => x.cbrt(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Exp2 => x.exp2(),
            UnaryOp::Erf => x.erf(),
            UnaryOp::Log => x.ln(),
            UnaryOp::Log2 => x.log2(),
            UnaryOp::Log10 => x.log10(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Asin => x.asin(),
            UnaryOp::Acos => x.acos(),
            UnaryOp::Atan => x.atan(),
            UnaryOp::Sinh => x.sinh(),
            UnaryOp::Cosh => x.cosh(),
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::ToFloat => round_through(x, 24),
            UnaryOp::ToDouble => round_through(x, 53),
            UnaryOp::ToLongDouble => round_through(x, 64),
        }
    }
}

/// Rounds through a narrower significand and back to working precision.
fn round_through(x: Float, bits: u32) -> Float {
    let prec = x.prec();
    Float::with_val(prec, Float::with_val(bits, x))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[rustfmt::skip]
pub enum BinaryOp {
    Add,   Sub, Mul, Div, Rem,
    Atan2, Pow, Min, Max, Fmod,
}

impl FromStr for BinaryOp {
    type Err = ();

    /// Resolves a function name; the operator forms are not callable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atan2" => Ok(BinaryOp::Atan2),
            "pow" => Ok(BinaryOp::Pow),
            "min" => Ok(BinaryOp::Min),
            "max" => Ok(BinaryOp::Max),
            "fmod" => Ok(BinaryOp::Fmod),
            _ => Err(()),
        }
    }
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Atan2 => "atan2",
            BinaryOp::Pow => "pow",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Fmod => "fmod",
        }
    }

    fn apply(self, lhs: Float, rhs: Float) -> Float {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Rem | BinaryOp::Fmod => lhs % rhs,
            BinaryOp::Atan2 => lhs.atan2(&rhs),
            BinaryOp::Pow => lhs.pow(&rhs),
            BinaryOp::Min => lhs.min(&rhs),
            BinaryOp::Max => lhs.max(&rhs),
        }
    }
}

/// One postfix opcode. Only constant references carry a payload: an index
/// into the program's constants table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Var,
    Const(usize),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

/// A compiled expression: opcodes in postfix order plus the constants they
/// reference. Evaluation is reentrant; each call owns its stack.
#[derive(Clone, Debug)]
pub struct Program {
    ops: Vec<Op>,
    constants: Vec<Float>,
}

impl Program {
    /// Compiles an expression text at the given working precision.
    pub fn parse(src: &str, prec: Precision) -> Result<Program, Box<ParseError>> {
        let expr = ExprParser::parse_expr(src, prec)?;

        let mut program = Program {
            ops: Vec::new(),
            constants: Vec::new(),
        };
        program.emit(&expr);
        Ok(program)
    }

    fn emit(&mut self, expr: &Expr) {
        match expr {
            Expr::Var => self.ops.push(Op::Var),
            Expr::Const(val) => {
                self.ops.push(Op::Const(self.constants.len()));
                self.constants.push(val.clone());
            }
            Expr::Unary(op, inner) => {
                self.emit(inner);
                self.ops.push(Op::Unary(*op));
            }
            Expr::Binary(op, lhs, rhs) => {
                self.emit(lhs);
                self.emit(rhs);
                self.ops.push(Op::Binary(*op));
            }
        }
    }

    /// Whether the program is independent of x.
    pub fn is_constant(&self) -> bool {
        !self.ops.contains(&Op::Var)
    }

    /// Runs the program with x bound to the argument.
    ///
    /// Compilation guarantees the stack discipline, so underflow or a
    /// residual here is a compiler bug, not an input error.
    pub fn eval(&self, x: &Float) -> Float {
        let mut stack: Vec<Float> = Vec::new();

        for op in &self.ops {
            match op {
                Op::Var => stack.push(x.clone()),
                Op::Const(ix) => stack.push(self.constants[*ix].clone()),
                Op::Unary(op) => {
                    let head = stack.pop().expect("unary opcode finds its operand");
                    stack.push(op.apply(head));
                }
                Op::Binary(op) => {
                    let rhs = stack.pop().expect("binary opcode finds its operands");
                    let lhs = stack.pop().expect("binary opcode finds its operands");
                    stack.push(op.apply(lhs, rhs));
                }
            }
        }

        let result = stack.pop().expect("program leaves a result");
        assert!(stack.is_empty(), "program leaves exactly one result");
        result
    }
}
