// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Closed-form optimum for short constant-product cycles.
//!
//! Each fee-aware constant-product hop is the Möbius map
//! `x ↦ γ·R_out·x / (R_in + γ·x)`, and composing them keeps the shape
//! `x ↦ a·x / (b + c·x)`. Profit `a·x/(b+c·x) − x` peaks at
//! `x* = (√(a·b) − b) / c`.

use crate::data::pools::PoolStore;
use crate::domain::error::AppError;
use crate::domain::pool::{CurveVariant, PoolSnapshot, PoolState};
use crate::domain::trade::Opportunity;
use crate::services::strategy::planning::curves::virtual_reserves;
use crate::services::strategy::planning::ordering::order_by_source_token;
use crate::services::strategy::search::ArbMode;
use alloy::primitives::Address;
use rust_decimal::{Decimal, MathematicalOps};

const MAX_LEGS: usize = 3;

/// Composition of hops, kept normalized so `b == 1`.
#[derive(Debug, Clone, Copy)]
struct Mobius {
    a: Decimal,
    c: Decimal,
}

impl Mobius {
    fn identity() -> Self {
        Self {
            a: Decimal::ONE,
            c: Decimal::ZERO,
        }
    }

    /// Appends one hop with effective fee multiplier `gamma`.
    fn then(self, reserve_in: Decimal, reserve_out: Decimal, gamma: Decimal) -> Option<Self> {
        let ga = gamma.checked_mul(self.a)?;
        Some(Self {
            a: ga.checked_mul(reserve_out)?.checked_div(reserve_in)?,
            c: self.c.checked_add(ga.checked_div(reserve_in)?)?,
        })
    }

    fn optimum(&self) -> Option<Decimal> {
        if self.c.is_zero() {
            return None;
        }
        (self.a.sqrt()? - Decimal::ONE).checked_div(self.c)
    }
}

enum Hop {
    Reserves(Decimal, Decimal),
    /// Pool class without a closed form here.
    Skip,
}

fn hop_reserves(snapshot: &PoolSnapshot, token_in: Address) -> Result<Hop, AppError> {
    match &snapshot.state {
        PoolState::ConstantProduct { variant, .. } => {
            if *variant == CurveVariant::Stable {
                return Err(AppError::UnsupportedCurve(format!(
                    "{} ({}) is a stable-swap pool",
                    snapshot.cid, snapshot.exchange_name
                )));
            }
            let (rin, rout) = snapshot.reserves_for(token_in)?;
            Ok(Hop::Reserves(rin, rout))
        }
        PoolState::Concentrated {
            liquidity,
            sqrt_price_q96,
            ..
        } => {
            let (x, y) = virtual_reserves(
                *liquidity,
                *sqrt_price_q96,
                snapshot.token0.decimals,
                snapshot.token1.decimals,
            )?;
            if token_in == snapshot.token0.address {
                Ok(Hop::Reserves(x, y))
            } else {
                Ok(Hop::Reserves(y, x))
            }
        }
        PoolState::Weighted { .. } | PoolState::Segmented { .. } => Ok(Hop::Skip),
    }
}

/// Recomputes the first leg's input for math-validated modes.
///
/// `Ok(Some(opp))` carries the (possibly unchanged) opportunity, `Ok(None)`
/// means the closed form produced no valid input and the route must be
/// dropped. Shapes without a closed form pass through untouched.
pub fn validate(
    opportunity: &Opportunity,
    mode: ArbMode,
    store: &dyn PoolStore,
) -> Result<Option<Opportunity>, AppError> {
    if !mode.is_math_validated() {
        return Ok(Some(opportunity.clone()));
    }
    if opportunity.has_segmented_leg() || opportunity.legs.len() > MAX_LEGS {
        tracing::debug!(target: "validation", legs = opportunity.legs.len(), "Shape not covered by closed form");
        return Ok(Some(opportunity.clone()));
    }

    let flt = opportunity.flashloan_token;
    let (legs, _) = order_by_source_token(&opportunity.legs, flt);
    let chained = legs.first().is_some_and(|l| l.tknin == flt)
        && legs.last().is_some_and(|l| l.tknout == flt)
        && legs.windows(2).all(|w| w[0].tknout == w[1].tknin);
    if !chained {
        return Ok(Some(opportunity.clone()));
    }

    let mut map = Mobius::identity();
    for leg in &legs {
        let Some(snapshot) = opportunity_pool(store, &leg.cid) else {
            return Ok(Some(opportunity.clone()));
        };
        let Hop::Reserves(rin, rout) = hop_reserves(&snapshot, leg.tknin)? else {
            return Ok(Some(opportunity.clone()));
        };
        let gamma = Decimal::ONE - snapshot.fee;
        match map.then(rin, rout, gamma) {
            Some(next) => map = next,
            None => return Ok(None),
        }
    }

    let Some(optimum) = map.optimum().filter(|x| !x.is_sign_negative()) else {
        tracing::info!(target: "validation", "Closed-form optimum invalid; dropping route");
        return Ok(None);
    };

    tracing::debug!(
        target: "validation",
        finder_input = %legs[0].amtin,
        optimal_input = %optimum,
        "Closed-form input applied"
    );
    let mut validated = opportunity.clone();
    validated.legs = legs;
    validated.legs[0].amtin = optimum;
    Ok(Some(validated))
}

fn opportunity_pool(store: &dyn PoolStore, cid: &str) -> Option<PoolSnapshot> {
    let snapshot = store.get_pool(cid);
    if snapshot.is_none() {
        tracing::debug!(target: "validation", cid, "Pool missing; skipping closed form");
    }
    snapshot
}
