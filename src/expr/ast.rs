//! Expression trees.

use rug::Float;

use super::program::{BinaryOp, UnaryOp};

#[derive(Clone, Debug)]
pub enum Expr {
    /// The free variable x.
    Var,
    /// A literal or named constant, already at working precision.
    Const(Float),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn unary(op: UnaryOp, inner: Expr) -> Expr {
        Expr::Unary(op, Box::new(inner))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// A leading `-` or `+` applied to a subexpression.
    pub fn signed(negative: bool, inner: Expr) -> Expr {
        let op = if negative { UnaryOp::Minus } else { UnaryOp::Plus };
        Expr::unary(op, inner)
    }
}
