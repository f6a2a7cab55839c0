//! Numeric literals.

use rug::{Float, Integer};

use crate::math::Precision;

/// Constructs a real from a decimal literal such as `12.5e-3`.
pub fn decimal(s: &str, prec: Precision) -> Option<Float> {
    Float::parse(s).ok().map(|parsed| prec.float(parsed))
}

/// Constructs a real from a hexadecimal literal such as `0x1.8p+3`.
///
/// The mantissa is in hexadecimal; the exponent, if present, is a decimal
/// power of two applied to the mantissa.
pub fn hexadecimal(s: &str, prec: Precision) -> Option<Float> {
    let body = s.get(2..)?;

    let (mantissa, exponent) = match body.split_once(['p', 'P']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().ok()?),
        None => (body, 0),
    };

    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = Integer::from_str_radix(&format!("{integer}{fraction}"), 16).ok()?;
    let shift = exponent.checked_sub(4 * i32::try_from(fraction.len()).ok()?)?;

    Some(prec.float(digits) << shift)
}

/// The value of a run of Unicode superscript digits.
pub fn superscript(s: &str) -> Option<u32> {
    s.chars().try_fold(0u32, |acc, c| {
        let digit = match c {
            '⁰' => 0,
            '¹' => 1,
            '²' => 2,
            '³' => 3,
            '⁴' => 4,
            '⁵' => 5,
            '⁶' => 6,
            '⁷' => 7,
            '⁸' => 8,
            '⁹' => 9,
            _ => return None,
        };
        acc.checked_mul(10)?.checked_add(digit)
    })
}
