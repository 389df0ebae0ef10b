// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::data::pools::PoolStore;
use crate::domain::error::AppError;
use crate::domain::pool::ExchangeCatalog;
use crate::domain::trade::{Opportunity, split_segment};
use crate::services::strategy::planning::aggregation::{
    PlannedLeg, merge_bancor_v3_legs, merge_segmented_legs,
};
use crate::services::strategy::planning::curves::leg_output;
use crate::services::strategy::planning::ordering::{order_by_source_token, scale_source_legs};
use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A route ready for encoding, with outputs and profit recomputed from pool
/// state.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRoute {
    pub flashloan_token: Address,
    pub flashloan_decimals: u8,
    /// Total borrowed, token units.
    pub flashloan_amount: Decimal,
    /// Lender fee, token units.
    pub flashloan_fee: Decimal,
    pub tx_in_count: usize,
    pub legs: Vec<PlannedLeg>,
    /// Flashloan-token balance after the last leg minus the borrowed amount.
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
}

pub struct RouteAssembler {
    catalog: ExchangeCatalog,
    flashloan_fee: Decimal,
}

impl RouteAssembler {
    pub fn new(catalog: ExchangeCatalog, flashloan_fee: Decimal) -> Self {
        Self {
            catalog,
            flashloan_fee,
        }
    }

    /// order → scale → merge order-book legs → outputs → merge Bancor V3 hops.
    pub fn assemble(
        &self,
        opportunity: &Opportunity,
        store: &dyn PoolStore,
    ) -> Result<AssembledRoute, AppError> {
        let flt = opportunity.flashloan_token;
        let (mut ordered, tx_in_count) = order_by_source_token(&opportunity.legs, flt);
        scale_source_legs(&mut ordered, flt);

        let mut source_legs = ordered.iter().filter(|l| l.tknin == flt).peekable();
        let flashloan_decimals = source_legs
            .peek()
            .map(|l| l.tknin_decimals)
            .ok_or_else(|| {
                AppError::validation("legs", "route never spends the flashloan token")
            })?;
        let flashloan_amount: Decimal = source_legs.map(|l| l.amtin).sum();

        let mut legs = merge_segmented_legs(&ordered, &self.catalog);
        let final_balance = compute_outputs(&mut legs, flt, flashloan_amount, store)?;
        let legs = merge_bancor_v3_legs(legs);

        let gross_profit = final_balance - flashloan_amount;
        let flashloan_fee = self.flashloan_fee * flashloan_amount;
        let net_profit = gross_profit - flashloan_fee;

        tracing::debug!(
            target: "planning",
            legs = legs.len(),
            tx_in_count,
            flashloan_amount = %flashloan_amount,
            gross_profit = %gross_profit,
            net_profit = %net_profit,
            "Route assembled"
        );

        Ok(AssembledRoute {
            flashloan_token: flt,
            flashloan_decimals,
            flashloan_amount,
            flashloan_fee,
            tx_in_count,
            legs,
            gross_profit,
            net_profit,
        })
    }
}

/// Walks the legs with a running token ledger, pricing each against its
/// pools. The last leg spending a token takes the whole balance; earlier ones
/// take `min(planned, available)`. Returns the final flashloan-token balance.
pub fn compute_outputs(
    legs: &mut [PlannedLeg],
    flashloan_token: Address,
    flashloan_amount: Decimal,
    store: &dyn PoolStore,
) -> Result<Decimal, AppError> {
    let mut balances: HashMap<Address, Decimal> = HashMap::new();
    balances.insert(flashloan_token, flashloan_amount);

    for i in 0..legs.len() {
        let tknin = legs[i].tknin;
        let available = balances.get(&tknin).copied().unwrap_or_default();
        let last_spender = !legs[i + 1..].iter().any(|l| l.tknin == tknin);
        let planned = legs[i].amtin;
        let input = if tknin == flashloan_token {
            planned
        } else if last_spender {
            available
        } else {
            planned.min(available)
        };

        let leg = &mut legs[i];
        let output = price_leg(leg, input, store)?;
        if output.is_sign_negative() {
            return Err(AppError::validation(
                "amtout",
                format!("leg {} computed negative output {output}", leg.primary_cid()),
            ));
        }
        leg.amtin = input;
        leg.amtout = output;

        *balances.entry(tknin).or_default() -= input;
        *balances.entry(leg.tknout).or_default() += output;
    }

    Ok(balances.get(&flashloan_token).copied().unwrap_or_default())
}

/// Splits `input` over the leg's pools pro rata to their planned inputs and
/// sums the outputs.
fn price_leg(leg: &mut PlannedLeg, input: Decimal, store: &dyn PoolStore) -> Result<Decimal, AppError> {
    let planned_total = leg.amtin;
    let count = leg.parts.len();
    let mut allotted = Decimal::ZERO;
    let mut output = Decimal::ZERO;

    for (k, part) in leg.parts.iter_mut().enumerate() {
        let share = if k + 1 == count {
            input - allotted
        } else if planned_total.is_zero() {
            input / Decimal::from(count)
        } else {
            input * part.amtin / planned_total
        };
        allotted += share;

        let snapshot = store.get_pool(&part.cid).ok_or_else(|| {
            AppError::validation("cid", format!("pool {} is not in the store", part.cid))
        })?;
        let segment = split_segment(&part.cid).map(|(_, idx)| idx);
        let out = leg_output(&snapshot, leg.tknin, leg.tknout, share, segment)?;
        part.amtin = share;
        part.amtout = out;
        output += out;
    }
    Ok(output)
}
