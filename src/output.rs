//! Source-form printers for solved polynomials.

use std::fmt::Write;

use rug::Float;

use crate::math::Polynomial;

/// Target floating-point type for printed coefficients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rounding {
    Float,
    #[default]
    Double,
    LongDouble,
}

impl Rounding {
    /// Decimal digits kept when printing: two more than the type's
    /// round-trip digit count (FLT_DIG, DBL_DIG, LDBL_DIG).
    pub fn digits(self) -> u32 {
        match self {
            Rounding::Float => 8,
            Rounding::Double => 17,
            Rounding::LongDouble => 20,
        }
    }

    fn c_type(self) -> &'static str {
        match self {
            Rounding::Float => "float",
            Rounding::Double => "double",
            Rounding::LongDouble => "long double",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Rounding::Float => "f",
            Rounding::Double => "",
            Rounding::LongDouble => "l",
        }
    }
}

fn coefficient(value: &Float, digits: u32) -> String {
    format!("{:.*e}", digits as usize - 1, value)
}

/// The polynomial in gnuplot form, `c0+c1*x+c2*x**2...`; used for the
/// per-iteration progress output.
pub fn gnuplot(poly: &Polynomial, digits: u32) -> String {
    let mut out = String::new();

    for (j, c) in poly.coeffs().iter().enumerate() {
        if j > 0 && *c >= 0 {
            out.push('+');
        }
        out.push_str(&coefficient(c, digits));
        match j {
            0 => {}
            1 => out.push_str("*x"),
            _ => write!(out, "*x**{j}").unwrap(),
        }
    }

    out
}

/// The final program output: a Horner-form C function, preceded by a
/// comment recording the approximation request.
pub fn c_source(
    poly: &Polynomial,
    rounding: Rounding,
    func: &str,
    weight: Option<&str>,
    xmin: &Float,
    xmax: &Float,
) -> String {
    let digits = rounding.digits();
    let ty = rounding.c_type();
    let suffix = rounding.suffix();
    let mut out = String::new();

    writeln!(out, "/* Approximation of f(x) = {func}").unwrap();
    if let Some(weight) = weight {
        writeln!(out, " * with weight function g(x) = {weight}").unwrap();
    }
    writeln!(
        out,
        " * on interval [ {}, {} ]",
        coefficient(xmin, digits),
        coefficient(xmax, digits)
    )
    .unwrap();
    writeln!(out, " * with a polynomial of degree {}. */", poly.degree()).unwrap();

    writeln!(out, "{ty} f({ty} x)").unwrap();
    writeln!(out, "{{").unwrap();
    for j in (0..=poly.degree()).rev() {
        let value = coefficient(poly.coeff(j), digits);
        if j == poly.degree() {
            writeln!(out, "    {ty} u = {value}{suffix};").unwrap();
        } else if j > 0 {
            writeln!(out, "    u = u * x + {value}{suffix};").unwrap();
        } else {
            writeln!(out, "    return u * x + {value}{suffix};").unwrap();
        }
    }
    writeln!(out, "}}").unwrap();

    out
}
