// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Native versus wrapped gas token. Route search treats the two as one
//! token; the executor needs each call to name the form its pool holds and an
//! explicit step wherever the route switches form.

use crate::common::decimal::decimal_to_units;
use crate::data::pools::PoolStore;
use crate::domain::constants::{GAS_TOKEN_DECIMALS, NATIVE_GAS_TOKEN, WRAP_UNWRAP_PLATFORM_ID};
use crate::domain::error::AppError;
use crate::domain::route::RouteStruct;
use crate::services::strategy::planning::aggregation::PlannedLeg;
use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The two gas-token forms for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasTokenPair {
    pub wrapped: Address,
}

impl GasTokenPair {
    pub fn new(wrapped: Address) -> Self {
        Self { wrapped }
    }

    pub fn contains(&self, token: Address) -> bool {
        token == self.wrapped || token == NATIVE_GAS_TOKEN
    }

    /// The other form of a gas token, `None` for any other token.
    pub fn counterpart(&self, token: Address) -> Option<Address> {
        if token == self.wrapped {
            Some(NATIVE_GAS_TOKEN)
        } else if token == NATIVE_GAS_TOKEN {
            Some(self.wrapped)
        } else {
            None
        }
    }

    /// Rewrites each leg's gas-token side to the form its pool holds.
    /// Order-book legs whose orders sit on both forms split into one leg per
    /// form, in order of first appearance.
    pub fn split_legs(
        &self,
        legs: &[PlannedLeg],
        store: &dyn PoolStore,
    ) -> Result<Vec<PlannedLeg>, AppError> {
        let mut out = Vec::with_capacity(legs.len());
        for leg in legs {
            if !self.contains(leg.tknin) && !self.contains(leg.tknout) {
                out.push(leg.clone());
                continue;
            }

            let mut groups: Vec<(Option<Address>, PlannedLeg)> = Vec::new();
            for part in &leg.parts {
                let held = self.held_by(&part.cid, store)?;
                match groups.iter_mut().find(|(form, _)| *form == held) {
                    Some((_, group)) => {
                        group.amtin += part.amtin;
                        group.amtout += part.amtout;
                        group.parts.push(part.clone());
                    }
                    None => {
                        let mut group = leg.clone();
                        group.amtin = part.amtin;
                        group.amtout = part.amtout;
                        group.parts = vec![part.clone()];
                        if let Some(form) = held {
                            if self.contains(group.tknin) {
                                group.tknin = form;
                            }
                            if self.contains(group.tknout) {
                                group.tknout = form;
                            }
                        }
                        groups.push((held, group));
                    }
                }
            }
            if groups.len() > 1 {
                tracing::debug!(
                    target: "planning",
                    cid = leg.primary_cid(),
                    legs = groups.len(),
                    "Split order-book leg by gas-token form"
                );
            }
            out.extend(groups.into_iter().map(|(_, g)| g));
        }
        Ok(out)
    }

    fn held_by(&self, cid: &str, store: &dyn PoolStore) -> Result<Option<Address>, AppError> {
        let snapshot = store.get_pool(cid).ok_or_else(|| {
            AppError::validation("cid", format!("pool {cid} is not in the store"))
        })?;
        Ok([snapshot.token0.address, snapshot.token1.address]
            .into_iter()
            .find(|t| self.contains(*t)))
    }

    /// Interleaves wrap/unwrap steps with the encoded `routes` (one per leg)
    /// so every leg finds its input form, then converts leftovers back into
    /// the flashloan token.
    pub fn insert_conversions(
        &self,
        legs: &[PlannedLeg],
        routes: Vec<RouteStruct>,
        flashloan_token: Address,
        flashloan_amount: Decimal,
        deadline: U256,
    ) -> Result<Vec<RouteStruct>, AppError> {
        let mut held: HashMap<Address, Decimal> =
            HashMap::from([(flashloan_token, flashloan_amount)]);
        let mut out = Vec::with_capacity(routes.len() + 1);

        for (leg, route) in legs.iter().zip(routes) {
            if let Some(other) = self.counterpart(leg.tknin) {
                let have = held.get(&leg.tknin).copied().unwrap_or_default();
                let spare = held.get(&other).copied().unwrap_or_default();
                let amount = (leg.amtin - have).min(spare);
                if amount > Decimal::ZERO {
                    out.push(self.conversion(other, leg.tknin, amount, deadline)?);
                    *held.entry(other).or_default() -= amount;
                    *held.entry(leg.tknin).or_default() += amount;
                }
            }
            out.push(route);
            *held.entry(leg.tknin).or_default() -= leg.amtin;
            *held.entry(leg.tknout).or_default() += leg.amtout;
        }

        if let Some(other) = self.counterpart(flashloan_token) {
            let leftover = held.get(&other).copied().unwrap_or_default();
            if leftover > Decimal::ZERO {
                out.push(self.conversion(other, flashloan_token, leftover, deadline)?);
            }
        }
        Ok(out)
    }

    fn conversion(
        &self,
        from: Address,
        to: Address,
        amount: Decimal,
        deadline: U256,
    ) -> Result<RouteStruct, AppError> {
        let wei = decimal_to_units(amount, GAS_TOKEN_DECIMALS)?;
        Ok(RouteStruct {
            platform_id: WRAP_UNWRAP_PLATFORM_ID,
            source_token: from,
            target_token: to,
            source_amount: wei,
            min_target_amount: wei,
            deadline,
            custom_address: self.wrapped,
            custom_int: U256::ZERO,
            custom_data: Bytes::new(),
        })
    }
}
