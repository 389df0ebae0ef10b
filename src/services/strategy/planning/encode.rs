// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::decimal::decimal_to_units;
use crate::data::executor::trade_action;
use crate::data::pools::PoolStore;
use crate::domain::error::AppError;
use crate::domain::pool::{ExchangeCatalog, ExchangeFamily, PoolSnapshot, PoolState};
use crate::domain::route::{FlashloanStruct, RouteStruct, maximize_last_route_per_token};
use crate::domain::trade::split_segment;
use crate::services::strategy::planning::aggregation::PlannedLeg;
use crate::services::strategy::planning::assembler::AssembledRoute;
use crate::services::strategy::planning::native::GasTokenPair;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

const BPS_DENOMINATOR: u64 = 10_000;
const PPM: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Turns assembled routes into executor-contract structs.
#[derive(Debug, Clone)]
pub struct RouteEncoder {
    catalog: ExchangeCatalog,
    slippage_bps: u64,
    flashloan_platform_id: u16,
    gas_tokens: GasTokenPair,
}

impl RouteEncoder {
    pub fn new(
        catalog: ExchangeCatalog,
        slippage_bps: u64,
        flashloan_platform_id: u16,
        wrapped_gas_token: Address,
    ) -> Self {
        Self {
            catalog,
            slippage_bps,
            flashloan_platform_id,
            gas_tokens: GasTokenPair::new(wrapped_gas_token),
        }
    }

    /// split by gas-token form → encode → wrap/unwrap steps → full-balance
    /// amounts on each token's last spender.
    pub fn encode_routes(
        &self,
        route: &AssembledRoute,
        deadline: u64,
        store: &dyn PoolStore,
    ) -> Result<Vec<RouteStruct>, AppError> {
        let deadline = U256::from(deadline);
        let legs = self.gas_tokens.split_legs(&route.legs, store)?;
        let encoded = legs
            .iter()
            .map(|leg| self.encode_leg(leg, deadline, store))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = self.gas_tokens.insert_conversions(
            &legs,
            encoded,
            route.flashloan_token,
            route.flashloan_amount,
            deadline,
        )?;
        maximize_last_route_per_token(&mut out);
        Ok(out)
    }

    /// One loan per flashloan token; the whole route borrows a single token.
    pub fn flashloans(&self, route: &AssembledRoute) -> Result<Vec<FlashloanStruct>, AppError> {
        Ok(vec![FlashloanStruct {
            platform_id: self.flashloan_platform_id,
            token: route.flashloan_token,
            amount: decimal_to_units(route.flashloan_amount, route.flashloan_decimals)?,
            fee: route.flashloan_fee,
        }])
    }

    fn encode_leg(
        &self,
        leg: &PlannedLeg,
        deadline: U256,
        store: &dyn PoolStore,
    ) -> Result<RouteStruct, AppError> {
        let family = self.catalog.family(&leg.exchange_name);
        let platform_id = family.platform_id().ok_or_else(|| {
            AppError::validation(
                "exchange_name",
                format!("no executor platform for exchange {}", leg.exchange_name),
            )
        })?;
        let snapshot = store.get_pool(leg.primary_cid()).ok_or_else(|| {
            AppError::validation("cid", format!("pool {} is not in the store", leg.primary_cid()))
        })?;

        let min_out = leg.amtout * Decimal::from(BPS_DENOMINATOR - self.slippage_bps)
            / Decimal::from(BPS_DENOMINATOR);

        Ok(RouteStruct {
            platform_id,
            source_token: leg.tknin,
            target_token: leg.tknout,
            source_amount: decimal_to_units(leg.amtin, leg.tknin_decimals)?,
            min_target_amount: decimal_to_units(min_out, leg.tknout_decimals)?,
            deadline,
            custom_address: snapshot.address,
            custom_int: custom_int(family, &snapshot)?,
            custom_data: custom_data(family, leg, &snapshot)?,
        })
    }
}

fn custom_int(family: ExchangeFamily, snapshot: &PoolSnapshot) -> Result<U256, AppError> {
    if family != ExchangeFamily::UniswapV3 {
        return Ok(U256::ZERO);
    }
    (snapshot.fee * PPM)
        .trunc()
        .to_u64()
        .map(U256::from)
        .ok_or_else(|| AppError::validation("fee", format!("bad fee on pool {}", snapshot.cid)))
}

fn custom_data(
    family: ExchangeFamily,
    leg: &PlannedLeg,
    snapshot: &PoolSnapshot,
) -> Result<Bytes, AppError> {
    match family {
        ExchangeFamily::CarbonV1 => {
            let actions = leg
                .parts
                .iter()
                .map(|part| {
                    let id = part
                        .strategy_id
                        .as_deref()
                        .or_else(|| split_segment(&part.cid).map(|(base, _)| base))
                        .unwrap_or(part.cid.as_str());
                    let strategy_id = U256::from_str(id).map_err(|e| {
                        AppError::validation("strategy_id", format!("{id}: {e}"))
                    })?;
                    let amount = decimal_to_units(part.amtin, leg.tknin_decimals)?;
                    let amount = u128::try_from(amount).map_err(|_| {
                        AppError::validation("amtin", format!("trade amount too large on {id}"))
                    })?;
                    Ok(trade_action(strategy_id, amount))
                })
                .collect::<Result<Vec<_>, AppError>>()?;
            Ok(Bytes::from(actions.abi_encode()))
        }
        ExchangeFamily::Balancer => match &snapshot.state {
            PoolState::Weighted { pool_id, .. } => Ok(Bytes::copy_from_slice(pool_id.as_slice())),
            _ => Ok(Bytes::new()),
        },
        _ => Ok(Bytes::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::pools::JsonPoolStore;
    use crate::domain::pool::{CurveVariant, TokenMeta};
    use crate::services::strategy::planning::aggregation::LegPart;
    use crate::domain::constants::{NATIVE_GAS_TOKEN, WRAP_UNWRAP_PLATFORM_ID};
    use rust_decimal_macros::dec;

    const WETH: Address = Address::repeat_byte(0xee);

    fn snapshot(cid: &str, exchange: &str, fee: Decimal) -> PoolSnapshot {
        PoolSnapshot {
            cid: cid.to_string(),
            exchange_name: exchange.to_string(),
            address: Address::repeat_byte(0x77),
            pair_name: String::new(),
            strategy_id: None,
            fee,
            token0: TokenMeta {
                address: Address::repeat_byte(1),
                symbol: "A".into(),
                decimals: 18,
            },
            token1: TokenMeta {
                address: Address::repeat_byte(2),
                symbol: "B".into(),
                decimals: 6,
            },
            state: PoolState::ConstantProduct {
                reserve0: U256::from(1u8),
                reserve1: U256::from(1u8),
                variant: CurveVariant::Standard,
            },
        }
    }

    fn planned(exchange: &str, parts: Vec<(&str, Decimal)>) -> PlannedLeg {
        let amtin = parts.iter().map(|p| p.1).sum();
        PlannedLeg {
            exchange_name: exchange.to_string(),
            tknin: Address::repeat_byte(1),
            tknout: Address::repeat_byte(2),
            tknin_decimals: 18,
            tknout_decimals: 6,
            amtin,
            amtout: dec!(200),
            parts: parts
                .into_iter()
                .map(|(cid, amt)| LegPart {
                    cid: cid.to_string(),
                    strategy_id: None,
                    amtin: amt,
                    amtout: Decimal::ZERO,
                })
                .collect(),
        }
    }

    fn route(legs: Vec<PlannedLeg>) -> AssembledRoute {
        AssembledRoute {
            flashloan_token: Address::repeat_byte(1),
            flashloan_decimals: 18,
            flashloan_amount: dec!(1.5),
            flashloan_fee: Decimal::ZERO,
            tx_in_count: 1,
            legs,
            gross_profit: Decimal::ZERO,
            net_profit: Decimal::ZERO,
        }
    }

    #[test]
    fn v3_leg_carries_fee_in_ppm_and_slippage_floor() {
        let store = JsonPoolStore::from_snapshots(vec![snapshot("0xv3", "uniswap_v3", dec!(0.003))]);
        let encoder = RouteEncoder::new(ExchangeCatalog::default(), 50, 7, WETH);
        let routes = encoder
            .encode_routes(&route(vec![planned("uniswap_v3", vec![("0xv3", dec!(1))])]), 99, &store)
            .unwrap();
        assert_eq!(routes[0].platform_id, 4);
        assert_eq!(routes[0].custom_int, U256::from(3_000u64));
        assert_eq!(routes[0].custom_address, Address::repeat_byte(0x77));
        // 200 * 0.995 at 6 decimals
        assert_eq!(routes[0].min_target_amount, U256::from(199_000_000u64));
        assert_eq!(routes[0].deadline, U256::from(99u8));
        // sole spender of its token
        assert_eq!(routes[0].source_amount, U256::ZERO);
    }

    #[test]
    fn carbon_parts_become_trade_actions() {
        let store = JsonPoolStore::from_snapshots(vec![snapshot("11", "carbon_v1", Decimal::ZERO)]);
        let encoder = RouteEncoder::new(ExchangeCatalog::default(), 0, 7, WETH);
        let leg = planned("carbon_v1", vec![("11-0", dec!(1)), ("12-0", dec!(2))]);
        let routes = encoder.encode_routes(&route(vec![leg]), 1, &store).unwrap();
        assert_eq!(routes[0].platform_id, 6);
        let decoded = <Vec<crate::data::executor::TradeAction>>::abi_decode(&routes[0].custom_data)
            .unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].strategyId, U256::from(11u8));
        assert_eq!(decoded[1].amount, 2_000_000_000_000_000_000u128);
    }

    #[test]
    fn unknown_exchange_cannot_be_encoded() {
        let store = JsonPoolStore::from_snapshots(vec![snapshot("0xq", "mystery_dex", Decimal::ZERO)]);
        let encoder = RouteEncoder::new(ExchangeCatalog::default(), 0, 7, WETH);
        let res = encoder.encode_routes(&route(vec![planned("mystery_dex", vec![("0xq", dec!(1))])]), 1, &store);
        assert!(matches!(res, Err(AppError::Validation { .. })));
    }

    #[test]
    fn native_carbon_leg_is_preceded_by_an_unwrap() {
        let mut pool = snapshot("11", "carbon_v1", Decimal::ZERO);
        pool.token0.address = NATIVE_GAS_TOKEN;
        let store = JsonPoolStore::from_snapshots(vec![pool]);
        let encoder = RouteEncoder::new(ExchangeCatalog::default(), 0, 7, WETH);
        let mut leg = planned("carbon_v1", vec![("11-0", dec!(1.5))]);
        leg.tknin = WETH;
        let mut r = route(vec![leg]);
        r.flashloan_token = WETH;

        let routes = encoder.encode_routes(&r, 1, &store).unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].platform_id, WRAP_UNWRAP_PLATFORM_ID);
        assert_eq!(routes[0].target_token, NATIVE_GAS_TOKEN);
        assert_eq!(routes[1].platform_id, 6);
        assert_eq!(routes[1].source_token, NATIVE_GAS_TOKEN);
    }

    #[test]
    fn flashloan_amount_is_in_wei() {
        let encoder = RouteEncoder::new(ExchangeCatalog::default(), 0, 7, WETH);
        let loans = encoder.flashloans(&route(vec![])).unwrap();
        assert_eq!(loans[0].platform_id, 7);
        assert_eq!(loans[0].amount, U256::from(1_500_000_000_000_000_000u128));
    }
}
