//! Parser for arithmetic expressions.

use pest_consume::{match_nodes, Error, Parser};
use rug::Float;

use super::ast::Expr;
use super::literals;
use super::program::{BinaryOp, UnaryOp};
use crate::math::Precision;

#[derive(Parser)]
#[grammar = "expr/syntax.pest"]
pub struct ExprParser;

pub type ParseError = Error<Rule>;
type ParseResult<T> = Result<T, ParseError>;
type Node<'i> = pest_consume::Node<'i, Rule, Precision>;

/// A resolved function keyword.
enum Func {
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl ExprParser {
    /// Parses an expression at the given working precision.
    ///
    /// Failure leaves nothing behind; the caller's previously compiled
    /// programs are unaffected.
    pub fn parse_expr(src: &str, prec: Precision) -> Result<Expr, Box<ParseError>> {
        let nodes = ExprParser::parse_with_userdata(Rule::program, src, prec)
            .map_err(Box::new)?;
        ExprParser::program(nodes.single().map_err(Box::new)?).map_err(Box::new)
    }
}

fn pow_int(base: Expr, exponent: u32, prec: Precision) -> Expr {
    Expr::binary(BinaryOp::Pow, base, Expr::Const(prec.float(exponent)))
}

#[pest_consume::parser]
impl ExprParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn program(input: Node) -> ParseResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [expr(e), EOI(_)] => e,
        ))
    }

    fn expr(input: Node) -> ParseResult<Expr> {
        let mut children = input.into_children();
        let first = children.next().expect("an expression begins with a term");
        let mut acc = Self::term(first)?;

        while let Some(op) = children.next() {
            let rhs = Self::term(children.next().expect("operators are infix"))?;
            let op = match op.as_str() {
                "+" => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            acc = Expr::binary(op, acc, rhs);
        }

        Ok(acc)
    }

    fn term(input: Node) -> ParseResult<Expr> {
        let mut children = input.into_children();
        let first = children.next().expect("a term begins with a factor");
        let mut acc = Self::signed2(first)?;

        while let Some(op) = children.next() {
            let rhs = Self::signed2(children.next().expect("operators are infix"))?;
            let op = match op.as_str() {
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            acc = Expr::binary(op, acc, rhs);
        }

        Ok(acc)
    }

    fn signed2(input: Node) -> ParseResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [sign(negative), signed2(inner)] => Expr::signed(negative, inner),
            [factor(f)] => f,
        ))
    }

    fn factor(input: Node) -> ParseResult<Expr> {
        let mut children = input.into_children();
        let first = children.next().expect("a factor begins with a terminal");
        let mut acc = Self::terminal(first)?;

        // Exponents fold left-to-right: a^b^c is (a^b)^c.
        for exponent in children {
            let rhs = Self::signed(exponent)?;
            acc = Expr::binary(BinaryOp::Pow, acc, rhs);
        }

        Ok(acc)
    }

    fn signed(input: Node) -> ParseResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [sign(negative), signed(inner)] => Expr::signed(negative, inner),
            [terminal(t)] => t,
        ))
    }

    fn sign(input: Node) -> ParseResult<bool> {
        Ok(input.as_str() == "-")
    }

    fn terminal(input: Node) -> ParseResult<Expr> {
        let prec = *input.user_data();
        Ok(match_nodes!(input.into_children();
            [call(e)] => e,
            [call(e), sup_float(k)] => pow_int(e, k, prec),
            [parens(e)] => e,
            [parens(e), sup_float(k)] => pow_int(e, k, prec),
            [name(e)] => e,
            [name(e), sup_float(k)] => pow_int(e, k, prec),
        ))
    }

    fn parens(input: Node) -> ParseResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [expr(e)] => e,
        ))
    }

    fn call(input: Node) -> ParseResult<Expr> {
        let site = input.clone();
        Ok(match_nodes!(input.into_children();
            [func(f), expr(arg)] => match f {
                Func::Unary(op) => Expr::unary(op, arg),
                Func::Binary(op) => {
                    return Err(site
                        .error(format!("function `{}` expects two arguments", op.name())))
                }
            },
            [func(f), expr(lhs), expr(rhs)] => match f {
                Func::Binary(op) => Expr::binary(op, lhs, rhs),
                Func::Unary(op) => {
                    return Err(site
                        .error(format!("function `{}` expects one argument", op.name())))
                }
            },
        ))
    }

    fn func(input: Node) -> ParseResult<Func> {
        let name = input.as_str();

        if let Ok(op) = name.parse::<UnaryOp>() {
            return Ok(Func::Unary(op));
        }
        if let Ok(op) = name.parse::<BinaryOp>() {
            return Ok(Func::Binary(op));
        }

        Err(input.error(format!("unknown function `{name}`")))
    }

    fn name(input: Node) -> ParseResult<Expr> {
        let prec = *input.user_data();
        Ok(match_nodes!(input.into_children();
            [hex_float(v)] => Expr::Const(v),
            [dec_float(v)] => Expr::Const(v),
            [var(_)] => Expr::Var,
            [reserved(_)] => Expr::Const(prec.float(0)),
            [euler(_)] => Expr::Const(prec.e()),
            [pi(_)] => Expr::Const(prec.pi()),
            [tau(_)] => Expr::Const(prec.tau()),
        ))
    }

    fn var(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn reserved(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn euler(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn pi(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn tau(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn dec_float(input: Node) -> ParseResult<Float> {
        let prec = *input.user_data();
        literals::decimal(input.as_str(), prec)
            .ok_or_else(|| input.error("invalid decimal literal"))
    }

    fn hex_float(input: Node) -> ParseResult<Float> {
        let prec = *input.user_data();
        literals::hexadecimal(input.as_str(), prec)
            .ok_or_else(|| input.error("invalid hexadecimal literal"))
    }

    fn sup_float(input: Node) -> ParseResult<u32> {
        literals::superscript(input.as_str())
            .ok_or_else(|| input.error("superscript exponent is too large"))
    }
}
