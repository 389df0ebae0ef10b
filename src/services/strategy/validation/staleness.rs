// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::data::pools::PoolStore;
use crate::domain::trade::{Opportunity, split_segment};

/// True when every pool the route touches still matches its snapshot.
///
/// A pool that cannot be found or re-read counts as stale.
pub async fn validate(opportunity: &Opportunity, store: &dyn PoolStore) -> bool {
    let mut seen: Vec<&str> = Vec::with_capacity(opportunity.legs.len());
    for leg in &opportunity.legs {
        let base = split_segment(&leg.cid).map_or(leg.cid.as_str(), |(base, _)| base);
        if seen.contains(&base) {
            continue;
        }
        seen.push(base);

        let Some(snapshot) = store.get_pool(base) else {
            tracing::warn!(target: "staleness", cid = base, "Pool missing from store");
            return false;
        };
        let live = match store.fetch_live(&snapshot).await {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(target: "staleness", cid = base, error = %e, "Live pool read failed");
                return false;
            }
        };
        if !snapshot.state.same_core_state(&live.state) {
            tracing::info!(
                target: "staleness",
                cid = base,
                class = snapshot.state.class_name(),
                "Pool moved since discovery"
            );
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::pools::JsonPoolStore;
    use crate::domain::constants::BNT_MAINNET;
    use crate::domain::error::AppError;
    use crate::domain::pool::{CarbonOrder, CurveVariant, PoolSnapshot, PoolState, TokenMeta};
    use crate::domain::trade::TradeLeg;
    use crate::services::strategy::pricing::CurveContainer;
    use alloy::primitives::{Address, B256, Bytes, U256};
    use alloy::providers::RootProvider;
    use alloy::rpc::client::RpcClient;
    use alloy::sol_types::SolValue;
    use alloy::transports::mock::Asserter;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    struct MovedStore {
        cached: HashMap<String, PoolSnapshot>,
        live: HashMap<String, PoolState>,
    }

    #[async_trait]
    impl PoolStore for MovedStore {
        fn get_pool(&self, cid: &str) -> Option<PoolSnapshot> {
            self.cached.get(cid).cloned()
        }

        async fn fetch_live(&self, snapshot: &PoolSnapshot) -> Result<PoolSnapshot, AppError> {
            let state = self
                .live
                .get(&snapshot.cid)
                .cloned()
                .ok_or_else(|| AppError::Connection("rpc down".into()))?;
            Ok(PoolSnapshot {
                state,
                ..snapshot.clone()
            })
        }

        async fn refresh(&self) -> Result<(), AppError> {
            Ok(())
        }

        fn get_tokens(&self) -> Vec<TokenMeta> {
            Vec::new()
        }

        fn snapshots(&self) -> Vec<PoolSnapshot> {
            self.cached.values().cloned().collect()
        }

        fn curves(&self) -> CurveContainer {
            CurveContainer::new(Vec::new())
        }
    }

    fn snapshot(cid: &str, state: PoolState) -> PoolSnapshot {
        let meta = |b: u8| TokenMeta {
            address: Address::repeat_byte(b),
            symbol: String::new(),
            decimals: 18,
        };
        PoolSnapshot {
            cid: cid.to_string(),
            exchange_name: "uniswap_v2".into(),
            address: Address::ZERO,
            pair_name: String::new(),
            strategy_id: None,
            fee: Decimal::ZERO,
            token0: meta(1),
            token1: meta(2),
            state,
        }
    }

    fn opp(cid: &str) -> Opportunity {
        Opportunity {
            profit: Decimal::ONE,
            flashloan_token: Address::repeat_byte(1),
            legs: vec![TradeLeg {
                cid: cid.to_string(),
                tknin: Address::repeat_byte(1),
                tknout: Address::repeat_byte(2),
                amtin: Decimal::ONE,
                amtout: None,
                tknin_decimals: 18,
                tknout_decimals: 18,
                exchange_name: "uniswap_v2".into(),
                strategy_id: None,
            }],
        }
    }

    async fn check(cid: &str, cached: PoolState, live: PoolState) -> bool {
        let store = MovedStore {
            cached: HashMap::from([(cid.to_string(), snapshot(cid, cached))]),
            live: HashMap::from([(cid.to_string(), live)]),
        };
        validate(&opp(cid), &store).await
    }

    fn cp(r0: u64, r1: u64) -> PoolState {
        PoolState::ConstantProduct {
            reserve0: U256::from(r0),
            reserve1: U256::from(r1),
            variant: CurveVariant::Standard,
        }
    }

    fn cl(liquidity: u64, tick: i32) -> PoolState {
        PoolState::Concentrated {
            liquidity: U256::from(liquidity),
            sqrt_price_q96: U256::from(1u64 << 40),
            tick,
            tick_spacing: 60,
        }
    }

    fn weighted(b0: u64) -> PoolState {
        PoolState::Weighted {
            pool_id: B256::ZERO,
            tokens: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            balances: vec![U256::from(b0), U256::from(10u8)],
            weights: vec![Decimal::new(5, 1), Decimal::new(5, 1)],
        }
    }

    fn seg(y1: u64) -> PoolState {
        let order = |y: u64| CarbonOrder {
            y: U256::from(y),
            z: U256::from(100u8),
            a: 0,
            b: 1,
        };
        PoolState::Segmented {
            orders: [order(50), order(y1)],
        }
    }

    #[tokio::test]
    async fn reserve_pair_changes_are_detected() {
        assert!(check("p", cp(1, 2), cp(1, 2)).await);
        assert!(!check("p", cp(1, 2), cp(1, 3)).await);
    }

    #[tokio::test]
    async fn concentrated_triple_changes_are_detected() {
        assert!(check("p", cl(10, 5), cl(10, 5)).await);
        assert!(!check("p", cl(10, 5), cl(11, 5)).await);
        assert!(!check("p", cl(10, 5), cl(10, 6)).await);
    }

    #[tokio::test]
    async fn weighted_balance_changes_are_detected() {
        assert!(check("p", weighted(7), weighted(7)).await);
        assert!(!check("p", weighted(7), weighted(8)).await);
    }

    #[tokio::test]
    async fn order_curve_changes_are_detected_through_segment_ids() {
        assert!(check("77", seg(40), seg(40)).await);
        let store = MovedStore {
            cached: HashMap::from([("77".to_string(), snapshot("77", seg(40)))]),
            live: HashMap::from([("77".to_string(), seg(39))]),
        };
        assert!(!validate(&opp("77-1"), &store).await);
    }

    #[tokio::test]
    async fn unmoved_bancor_v3_pool_is_fresh() {
        let mut pool = snapshot("b3", cp(800, 30));
        pool.exchange_name = "bancor_v3".into();
        pool.token0.address = BNT_MAINNET;
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::from((U256::from(800u64), U256::from(30u64)).abi_encode_params()));
        let store = JsonPoolStore::from_snapshots(vec![pool])
            .with_provider(RootProvider::new(RpcClient::mocked(asserter)));

        assert!(validate(&opp("b3"), &store).await);
    }

    #[tokio::test]
    async fn unreadable_pool_is_stale() {
        let store = MovedStore {
            cached: HashMap::from([("p".to_string(), snapshot("p", cp(1, 1)))]),
            live: HashMap::new(),
        };
        assert!(!validate(&opp("p"), &store).await);
        assert!(!validate(&opp("missing"), &store).await);
    }
}
