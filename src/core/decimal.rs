//! Exact decimal arithmetic over string-encoded numbers.
//!
//! CFDI amounts travel as strings and must match to the cent, so every
//! operation goes through [`rust_decimal::Decimal`], never floating point.
//! Products and quotients keep at most [`INTERNAL_SCALE`] fractional digits;
//! sums and differences are exact.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::CfdiError;

/// Fractional digits kept by multiplication and division.
pub const INTERNAL_SCALE: u32 = 6;

/// Fractional digits for monetary amounts written back by the aggregator.
pub const MONEY_SCALE: u32 = 2;

/// Fractional digits for tax rates and fees (`TasaOCuota`).
pub const RATE_SCALE: u32 = 6;

/// Parse a decimal string. Accepts an optional sign, digits and an optional
/// fractional part; anything else is an error.
pub fn parse(value: &str) -> Result<Decimal, CfdiError> {
    let s = value.trim();
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let well_formed = !(int_part.is_empty() && frac_part.is_none_or(str::is_empty))
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.is_none_or(|f| f.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(CfdiError::Decimal(format!("malformed number '{value}'")));
    }
    Decimal::from_str(s.strip_prefix('+').unwrap_or(s))
        .map_err(|e| CfdiError::Decimal(format!("'{value}': {e}")))
}

/// `a + b`, exact.
pub fn add(a: &str, b: &str) -> Result<String, CfdiError> {
    checked_add(parse(a)?, parse(b)?).map(|d| d.to_string())
}

/// `a - b`, exact.
pub fn sub(a: &str, b: &str) -> Result<String, CfdiError> {
    checked_sub(parse(a)?, parse(b)?).map(|d| d.to_string())
}

/// `a * b`, kept to [`INTERNAL_SCALE`] fractional digits.
pub fn mul(a: &str, b: &str) -> Result<String, CfdiError> {
    checked_mul(parse(a)?, parse(b)?).map(|d| limit_scale(d).to_string())
}

/// `a / b`, kept to [`INTERNAL_SCALE`] fractional digits.
pub fn div(a: &str, b: &str) -> Result<String, CfdiError> {
    checked_div(parse(a)?, parse(b)?).map(|d| limit_scale(d).normalize().to_string())
}

/// Round half-up to exactly `precision` fractional digits.
///
/// ```
/// assert_eq!(cfdi::decimal::round("100.005", 2).unwrap(), "100.01");
/// assert_eq!(cfdi::decimal::round("16", 2).unwrap(), "16.00");
/// ```
pub fn round(a: &str, precision: u32) -> Result<String, CfdiError> {
    Ok(round_half_up(parse(a)?, precision).to_string())
}

/// Numeric equality, ignoring scale (`"1.0"` equals `"1.000"`).
pub fn equal(a: &str, b: &str) -> Result<bool, CfdiError> {
    Ok(parse(a)? == parse(b)?)
}

pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, CfdiError> {
    a.checked_add(b)
        .ok_or_else(|| CfdiError::Decimal(format!("overflow in {a} + {b}")))
}

pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, CfdiError> {
    a.checked_sub(b)
        .ok_or_else(|| CfdiError::Decimal(format!("overflow in {a} - {b}")))
}

pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, CfdiError> {
    a.checked_mul(b)
        .ok_or_else(|| CfdiError::Decimal(format!("overflow in {a} * {b}")))
}

pub fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal, CfdiError> {
    if b.is_zero() {
        return Err(CfdiError::DivisionByZero);
    }
    a.checked_div(b)
        .ok_or_else(|| CfdiError::Decimal(format!("overflow in {a} / {b}")))
}

/// Round a Decimal to exactly `dp` decimal places using half-up
/// (commercial rounding), padding with zeros when the scale is smaller.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

fn limit_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(INTERNAL_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
