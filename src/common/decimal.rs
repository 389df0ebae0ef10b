// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

//! Conversions between on-chain integer amounts and `Decimal` token units.
//!
//! `Decimal` carries at most 28 fractional digits and ~7.9e28 of magnitude, so
//! wei strings are sliced rather than multiplied to stay clear of overflow.

use crate::domain::error::AppError;
use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

const MAX_DIGITS: usize = 28;

pub fn units_to_decimal(raw: U256, decimals: u8) -> Result<Decimal, AppError> {
    let digits = raw.to_string();
    let dec = decimals as usize;
    let padded = if digits.len() <= dec {
        format!("{}{}", "0".repeat(dec - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - dec);
    let int_significant = if int_part.trim_start_matches('0').is_empty() {
        0
    } else {
        int_part.trim_start_matches('0').len()
    };
    if int_significant > MAX_DIGITS + 1 {
        return Err(AppError::validation(
            "amount",
            format!("{raw} with {decimals} decimals overflows Decimal"),
        ));
    }
    let keep = frac_part.len().min(MAX_DIGITS.saturating_sub(int_significant));
    let literal = if keep == 0 {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, &frac_part[..keep])
    };
    Decimal::from_str(&literal).map_err(|e| AppError::validation("amount", e.to_string()))
}

/// Truncates toward zero at `decimals` places.
pub fn decimal_to_units(amount: Decimal, decimals: u8) -> Result<U256, AppError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::validation(
            "amount",
            format!("cannot convert negative amount {amount} to units"),
        ));
    }
    let truncated = amount.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
    let text = truncated.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.push_str(&"0".repeat((decimals as usize).saturating_sub(frac_part.len())));
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|e| AppError::validation("amount", e.to_string()))
}

/// `value / 2^bits`, keeping 18 fractional digits.
pub fn fixed_point_to_decimal(value: U256, bits: usize) -> Result<Decimal, AppError> {
    let int_part = value >> bits;
    let mask = (U256::from(1u8) << bits) - U256::from(1u8);
    let frac = ((value & mask) * U256::from(10u64.pow(18))) >> bits;
    let frac: u128 = frac
        .try_into()
        .map_err(|_| AppError::validation("fixed_point", "fraction out of range"))?;
    let frac = Decimal::from_i128_with_scale(frac as i128, 18);
    units_to_decimal(int_part, 0)?
        .checked_add(frac)
        .ok_or_else(|| AppError::validation("fixed_point", "value overflows Decimal"))
}

pub fn q96_to_decimal(q: U256) -> Result<Decimal, AppError> {
    fixed_point_to_decimal(q, 96)
}

/// `10^exp` for `|exp| <= 28`, the range `Decimal` can hold exactly.
pub fn pow10(exp: i32) -> Result<Decimal, AppError> {
    let out_of_range =
        || AppError::validation("exponent", format!("10^{exp} is outside Decimal range"));
    if exp.unsigned_abs() > MAX_DIGITS as u32 {
        return Err(out_of_range());
    }
    if exp >= 0 {
        Decimal::try_from_i128_with_scale(10i128.pow(exp as u32), 0).map_err(|_| out_of_range())
    } else {
        Decimal::try_new(1, exp.unsigned_abs()).map_err(|_| out_of_range())
    }
}
