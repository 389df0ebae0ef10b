// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Single-pool output math. Amounts are token units unless a name says raw.

use crate::common::decimal::{pow10, units_to_decimal};
use crate::domain::error::AppError;
use crate::domain::pool::{CarbonOrder, CurveVariant, PoolSnapshot, PoolState};
use alloy::primitives::{Address, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

fn overflow(what: &str) -> AppError {
    AppError::validation("curve", format!("{what} overflows Decimal"))
}

/// `x·(1−f)·R_out / (R_in + x·(1−f))`
pub fn constant_product_out(
    amount_in: Decimal,
    reserve_in: Decimal,
    reserve_out: Decimal,
    fee: Decimal,
) -> Result<Decimal, AppError> {
    if amount_in <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let effective = amount_in
        .checked_mul(Decimal::ONE - fee)
        .ok_or_else(|| overflow("effective input"))?;
    let denominator = reserve_in
        .checked_add(effective)
        .ok_or_else(|| overflow("reserve"))?;
    if denominator.is_zero() {
        return Err(AppError::validation("reserve", "empty pool"));
    }
    effective
        .checked_mul(reserve_out)
        .and_then(|n| n.checked_div(denominator))
        .ok_or_else(|| overflow("constant product output"))
}

/// Virtual reserves `(L/√P, L·√P)` of the active tick, in token units.
pub fn virtual_reserves(
    liquidity: U256,
    sqrt_price_q96: U256,
    decimals0: u8,
    decimals1: u8,
) -> Result<(Decimal, Decimal), AppError> {
    if sqrt_price_q96.is_zero() {
        return Err(AppError::validation("sqrt_price_q96", "zero price"));
    }
    // L·2^96/√P, split as quotient and remainder when L·2^96 leaves 256 bits
    let x_raw = match liquidity.checked_shl(96usize) {
        Some(shifted) => shifted / sqrt_price_q96,
        None => {
            let (q, r) = liquidity.div_rem(sqrt_price_q96);
            let whole = q
                .checked_shl(96usize)
                .ok_or_else(|| overflow("virtual reserve x"))?;
            whole + (r << 96usize) / sqrt_price_q96
        }
    };
    let y_raw = match liquidity.checked_mul(sqrt_price_q96) {
        Some(product) => product >> 96usize,
        None => (liquidity >> 32usize).saturating_mul(sqrt_price_q96) >> 64usize,
    };
    Ok((
        units_to_decimal(x_raw, decimals0)?,
        units_to_decimal(y_raw, decimals1)?,
    ))
}

fn tick_of(reserve0: Decimal, reserve1: Decimal, decimals0: u8, decimals1: u8) -> Option<f64> {
    let shift = pow10(decimals1 as i32 - decimals0 as i32).ok()?;
    let price = reserve1.checked_div(reserve0)?.checked_mul(shift)?.to_f64()?;
    (price > 0.0).then(|| price.ln() / 1.0001f64.ln())
}

fn concentrated_out(
    snapshot: &PoolSnapshot,
    token_in: Address,
    amount_in: Decimal,
) -> Result<Decimal, AppError> {
    let PoolState::Concentrated {
        liquidity,
        sqrt_price_q96,
        tick,
        tick_spacing,
    } = &snapshot.state
    else {
        return Err(AppError::validation("state", "not a concentrated pool"));
    };
    let (d0, d1) = (snapshot.token0.decimals, snapshot.token1.decimals);
    let (x, y) = virtual_reserves(*liquidity, *sqrt_price_q96, d0, d1)?;
    let zero_for_one = token_in == snapshot.token0.address;
    let (rin, rout) = if zero_for_one { (x, y) } else { (y, x) };
    let out = constant_product_out(amount_in, rin, rout, snapshot.fee)?;

    let spacing = (*tick_spacing).max(1);
    let lower = tick.div_euclid(spacing) * spacing;
    let upper = lower + spacing;
    let effective = amount_in * (Decimal::ONE - snapshot.fee);
    let (x_after, y_after) = if zero_for_one {
        (x + effective, y - out)
    } else {
        (x - out, y + effective)
    };
    let tick_after = tick_of(x_after, y_after, d0, d1)
        .ok_or_else(|| AppError::validation("tick", "swap drains the active range"))?;
    if tick_after < lower as f64 || tick_after > upper as f64 {
        return Err(AppError::validation(
            "tick",
            format!(
                "swap on {} moves tick to {tick_after:.1}, outside [{lower}, {upper}]",
                snapshot.cid
            ),
        ));
    }
    Ok(out)
}

/// Balancer weighted-math output.
pub fn weighted_out(
    amount_in: Decimal,
    balance_in: Decimal,
    balance_out: Decimal,
    weight_in: Decimal,
    weight_out: Decimal,
    fee: Decimal,
) -> Result<Decimal, AppError> {
    if amount_in <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let effective = amount_in * (Decimal::ONE - fee);
    let ratio = balance_in
        .checked_div(balance_in + effective)
        .ok_or_else(|| overflow("weighted ratio"))?;
    let exponent = weight_in
        .checked_div(weight_out)
        .ok_or_else(|| AppError::validation("weights", "zero output weight"))?;
    let factor = ratio
        .checked_powd(exponent)
        .ok_or_else(|| overflow("weighted power"))?;
    balance_out
        .checked_mul(Decimal::ONE - factor)
        .ok_or_else(|| overflow("weighted output"))
}

/// Carbon trade-by-source on one order, raw units.
///
/// `r = A·y/z + B`, `out = x·r² / (1 + A·x·r/z)`, capped at `y`.
pub fn carbon_out_raw(order: &CarbonOrder, amount_in_raw: Decimal) -> Result<Decimal, AppError> {
    if amount_in_raw <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let (a, _) = order.rates()?;
    let r = order.sqrt_rate()?;
    let y = units_to_decimal(order.y, 0)?;
    let xr = amount_in_raw
        .checked_mul(r)
        .ok_or_else(|| overflow("carbon input"))?;
    let denominator = if order.z.is_zero() {
        Decimal::ONE
    } else {
        let z = units_to_decimal(order.z, 0)?;
        a.checked_mul(xr)
            .and_then(|v| v.checked_div(z))
            .map(|v| Decimal::ONE + v)
            .ok_or_else(|| overflow("carbon denominator"))?
    };
    let out = xr
        .checked_div(denominator)
        .and_then(|v| v.checked_mul(r))
        .ok_or_else(|| overflow("carbon output"))?;
    Ok(out.min(y))
}

fn segmented_out(
    snapshot: &PoolSnapshot,
    token_in: Address,
    amount_in: Decimal,
    segment: Option<usize>,
) -> Result<Decimal, AppError> {
    let PoolState::Segmented { orders } = &snapshot.state else {
        return Err(AppError::validation("state", "not a segmented pool"));
    };
    let idx = segment.ok_or_else(|| {
        AppError::validation("cid", format!("{} needs an order suffix", snapshot.cid))
    })?;
    let (pays, takes) = if idx == 0 {
        (&snapshot.token0, &snapshot.token1)
    } else {
        (&snapshot.token1, &snapshot.token0)
    };
    if token_in != takes.address {
        return Err(AppError::validation(
            "tknin",
            format!("order {idx} of {} does not accept {token_in:#x}", snapshot.cid),
        ));
    }
    let raw_in = amount_in
        .checked_mul(pow10(takes.decimals as i32)?)
        .ok_or_else(|| overflow("carbon input"))?;
    let raw_out = carbon_out_raw(&orders[idx.min(1)], raw_in.trunc())?;
    // the trading fee comes off the target amount
    raw_out
        .checked_mul(Decimal::ONE - snapshot.fee)
        .and_then(|v| v.checked_mul(pow10(-(pays.decimals as i32)).ok()?))
        .ok_or_else(|| overflow("carbon output"))
}

/// Output of swapping `amount_in` of `token_in` into `token_out` on one pool.
pub fn leg_output(
    snapshot: &PoolSnapshot,
    token_in: Address,
    token_out: Address,
    amount_in: Decimal,
    segment: Option<usize>,
) -> Result<Decimal, AppError> {
    match &snapshot.state {
        PoolState::ConstantProduct { variant, .. } => {
            if *variant == CurveVariant::Stable {
                return Err(AppError::UnsupportedCurve(format!(
                    "{} ({}) is a stable-swap pool",
                    snapshot.cid, snapshot.exchange_name
                )));
            }
            let (rin, rout) = snapshot.reserves_for(token_in)?;
            constant_product_out(amount_in, rin, rout, snapshot.fee)
        }
        PoolState::Concentrated { .. } => concentrated_out(snapshot, token_in, amount_in),
        PoolState::Weighted {
            tokens,
            balances,
            weights,
            ..
        } => {
            let find = |t: Address| {
                tokens.iter().position(|x| *x == t).ok_or_else(|| {
                    AppError::validation(
                        "token",
                        format!("{t:#x} is not in weighted pool {}", snapshot.cid),
                    )
                })
            };
            let (i, o) = (find(token_in)?, find(token_out)?);
            let dec = |t: Address| snapshot.decimals_of(t).unwrap_or(18);
            let bal = |k: usize| balances.get(k).copied().unwrap_or_default();
            let weight = |k: usize| weights.get(k).copied().unwrap_or(Decimal::ONE);
            weighted_out(
                amount_in,
                units_to_decimal(bal(i), dec(token_in))?,
                units_to_decimal(bal(o), dec(token_out))?,
                weight(i),
                weight(o),
                snapshot.fee,
            )
        }
        PoolState::Segmented { .. } => segmented_out(snapshot, token_in, amount_in, segment),
    }
}
