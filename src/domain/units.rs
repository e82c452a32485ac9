//! Unit Conversions
//!
//! Fixed-rate math between SOL lamports and USDC base units, plus the
//! parse/format helpers used by the trade form and views.
//!
//! All parsing goes through `rust_decimal` so "0.1 SOL" becomes exactly
//! 100_000_000 lamports. Fractions below one base unit are floored.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Lamports in one SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// SOL has 9 decimals
pub const SOL_DECIMALS: u32 = 9;

/// USDC has 6 decimals
pub const USDC_DECIMALS: u32 = 6;

/// Maximum SOL a single buy may spend (2 SOL)
pub const MAX_SOL_AMOUNT_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

/// Price: 0.01 SOL per 1 USDC, i.e. 10 lamports per USDC base unit
pub const LAMPORTS_PER_USDC_UNIT: u64 = 10;

/// Parse a user-entered amount. Returns None for anything that is not a
/// plain decimal number.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Convert a decimal token amount into base units, flooring any remainder.
/// Returns None for negative amounts or values that overflow u64.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Option<u64> {
    if amount.is_sign_negative() {
        return None;
    }
    let scale = Decimal::from(10u64.pow(decimals));
    amount.checked_mul(scale)?.floor().to_u64()
}

/// Convert base units back into a decimal token amount
pub fn from_base_units(units: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(units as i128, decimals)
}

/// Parse a SOL amount string into lamports
pub fn parse_sol(input: &str) -> Option<u64> {
    parse_decimal(input).and_then(|d| to_base_units(d, SOL_DECIMALS))
}

/// Parse a USDC amount string into base units
pub fn parse_usdc(input: &str) -> Option<u64> {
    parse_decimal(input).and_then(|d| to_base_units(d, USDC_DECIMALS))
}

/// USDC base units purchasable with the given lamports (floored)
pub fn lamports_to_usdc_units(lamports: u64) -> u64 {
    lamports / LAMPORTS_PER_USDC_UNIT
}

/// Lamports exchanged for the given USDC base units
pub fn usdc_units_to_lamports(units: u64) -> u64 {
    units.saturating_mul(LAMPORTS_PER_USDC_UNIT)
}

fn format_fixed(units: u64, decimals: u32, places: u32) -> String {
    let mut value = from_base_units(units, decimals)
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(places);
    value.to_string()
}

/// Format lamports as SOL with 4 decimal places
pub fn format_sol(lamports: u64) -> String {
    format_fixed(lamports, SOL_DECIMALS, 4)
}

/// Format USDC base units with 2 decimal places
pub fn format_usdc(units: u64) -> String {
    format_fixed(units, USDC_DECIMALS, 2)
}

/// Format an integer with thousands separators (1234567 -> "1,234,567")
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
