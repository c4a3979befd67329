//! Conversions between on-chain integers and display values.
//!
//! Token amounts are `i128` minor units with [`TOKEN_DECIMALS`] places.
//! Interest rates travel as basis points, durations as seconds and
//! timestamps as seconds since the Unix epoch.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::UnitError;

pub const TOKEN_DECIMALS: u32 = 18;
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Parses a decimal string such as `"1.5"` into minor units.
pub fn parse_units(input: &str, decimals: u32) -> Result<i128, UnitError> {
    let value = parse_decimal(input)?.normalize();

    if value.scale() > decimals {
        return Err(UnitError::TooPrecise(decimals));
    }
    let factor = 10i128
        .checked_pow(decimals - value.scale())
        .ok_or(UnitError::Overflow)?;
    value.mantissa().checked_mul(factor).ok_or(UnitError::Overflow)
}

/// Formats minor units as a decimal string with at least one fractional
/// digit: `100.0`, `1.5`, `0.000000000000000001`.
pub fn format_units(raw: i128, decimals: u32) -> String {
    let factor = 10u128.pow(decimals);
    let magnitude = raw.unsigned_abs();
    let whole = magnitude / factor;
    let frac = magnitude % factor;

    let mut digits = format!("{:0width$}", frac, width = decimals as usize);
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    if digits.is_empty() {
        digits.push('0');
    }

    let sign = if raw < 0 { "-" } else { "" };
    format!("{}{}.{}", sign, whole, digits)
}

/// `1000` bps → `10` percent.
pub fn bps_to_percent(bps: u32) -> Decimal {
    Decimal::new(i64::from(bps), 2).normalize()
}

/// `"10"` percent → `1000` bps. Fractions of a basis point are truncated.
pub fn percent_to_bps(input: &str) -> Result<u32, UnitError> {
    let value = parse_decimal(input)?;
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(UnitError::Overflow)?
        .trunc()
        .to_u32()
        .ok_or(UnitError::Overflow)
}

/// Seconds → days, rounded to two places.
pub fn seconds_to_days(secs: u64) -> Decimal {
    (Decimal::from(secs) / Decimal::from(SECONDS_PER_DAY))
        .round_dp(2)
        .normalize()
}

/// `"30"` days → seconds. Fractional seconds are truncated.
pub fn days_to_seconds(input: &str) -> Result<u64, UnitError> {
    let value = parse_decimal(input)?;
    value
        .checked_mul(Decimal::from(SECONDS_PER_DAY))
        .ok_or(UnitError::Overflow)?
        .trunc()
        .to_u64()
        .ok_or(UnitError::Overflow)
}

/// Seconds since the epoch → UTC. `None` for out-of-range values.
pub fn timestamp_to_utc(secs: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)
}

fn parse_decimal(input: &str) -> Result<Decimal, UnitError> {
    let trimmed = input.trim();
    let value =
        Decimal::from_str(trimmed).map_err(|_| UnitError::NotANumber(trimmed.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitError::Negative);
    }
    Ok(value)
}
