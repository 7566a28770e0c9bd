//! Conversions between minimal-unit integers and human-readable amounts
//!
//! Every token handled by the exchange uses 18 decimals. On-chain values are
//! `U256` in minimal units; anything shown to or typed by a user is a decimal
//! string. Conversions are explicit and never cached.

use alloy::primitives::U256;
use alloy::primitives::utils::{ParseUnits, parse_units};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::ServiceResult;
use super::error::ServiceError;

/// Decimals of every token and LP share on the exchange.
pub const TOKEN_DECIMALS: u8 = 18;

/// Convert U256 to Decimal with proper decimal scaling
///
/// # Arguments
/// * `value` - The U256 value to convert
/// * `decimals` - Number of decimal places (18 for every exchange token)
///
/// # Returns
/// A Decimal representing the actual value (e.g., 1.5 instead of 1500000000000000000)
pub fn u256_to_decimal(value: U256, decimals: u8) -> ServiceResult<Decimal> {
    let mut decimal = Decimal::from_str(&value.to_string()).map_err(|e| {
        ServiceError::InvalidAmount(format!("Failed to parse U256 to Decimal: {}", e))
    })?;

    if decimals > 0 {
        let divisor = Decimal::from(10u64.pow(decimals as u32));
        decimal /= divisor;
    }

    Ok(decimal.normalize())
}

/// Parse a human-readable amount (e.g., "1.5") into minimal units.
///
/// Fraction digits beyond 18 are dropped. Negative and malformed amounts are
/// rejected.
///
/// # Examples
/// - "1" -> 1000000000000000000
/// - "0.001" -> 1000000000000000
pub fn to_minimal_unit(amount: &str) -> ServiceResult<U256> {
    match parse_units(amount.trim(), TOKEN_DECIMALS) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(ServiceError::InvalidAmount(format!(
            "Amount must not be negative: {amount}"
        ))),
        Err(e) => Err(ServiceError::InvalidAmount(format!(
            "Invalid amount format '{amount}': {e}"
        ))),
    }
}

/// Format a minimal-unit value as a plain decimal string.
///
/// Trailing zeros are trimmed, so whole amounts have no fraction part.
pub fn from_minimal_unit(value: U256) -> String {
    format_balance(value, TOKEN_DECIMALS)
}

/// Format balance from smallest unit to human-readable format
///
/// # Arguments
/// * `balance` - Balance in smallest unit
/// * `decimals` - Number of decimal places for the token
///
/// # Returns
/// Formatted balance as string with trailing zeros removed
pub fn format_balance(balance: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_part = remainder.to_string();
        let padded = format!("{:0>width$}", decimal_part, width = decimals as usize);
        let trimmed = padded.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{trimmed}")
        }
    }
}

/// Format a token balance for display.
///
/// Always two fraction digits, rounded half up; the integer part is grouped
/// with `,` every three digits. Rounding happens in `U256`, so any balance
/// formats, however large.
///
/// # Examples
/// - 42.1 -> "42.10"
/// - 1234.5 -> "1,234.50"
pub fn format_token_amount(value: U256) -> String {
    let cent = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS - 2));
    let cents = value.saturating_add(cent / U256::from(2)) / cent;

    let hundred = U256::from(100u64);
    let whole = (cents / hundred).to_string();
    let fraction = (cents % hundred).to::<u64>();

    group_thousands(&format!("{whole}.{fraction:02}"))
}

fn group_thousands(text: &str) -> String {
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));

    let digits = int_part.len();
    let mut grouped = String::with_capacity(digits + digits / 3 + frac_part.len() + 1);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

/// Human-unit value as a float, for the off-chain estimator only.
pub fn to_human_f64(value: U256) -> f64 {
    from_minimal_unit(value).parse().unwrap_or(f64::NAN)
}

/// Convert a minimal-unit fraction (1e18 = 1.0) to a percentage.
pub fn fraction_to_percent(value: U256) -> ServiceResult<Decimal> {
    let fraction = u256_to_decimal(value, TOKEN_DECIMALS)?;
    Ok((fraction * Decimal::ONE_HUNDRED).normalize())
}
