// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{BNT_MAINNET, SEGMENT_SEPARATOR};
use crate::domain::error::AppError;
use crate::domain::pool::{
    CarbonOrder, ExchangeCatalog, ExchangeFamily, PoolSnapshot, PoolState, TokenMeta,
};
use crate::network::provider::HttpProvider;
use crate::services::strategy::pricing::CurveContainer;
use alloy::primitives::{Address, U256};
use alloy::sol;
use async_trait::async_trait;
use dashmap::DashMap;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

sol! {
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    #[sol(rpc)]
    interface IBancorConverter {
        function getReserveBalance(address reserveToken) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IBancorPoolCollection {
        function tradingLiquidity(address pool) external view returns (uint128 bntTradingLiquidity, uint128 baseTokenTradingLiquidity);
    }

    #[sol(rpc)]
    interface IUniswapV3Pool {
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
        function liquidity() external view returns (uint128);
    }

    #[sol(rpc)]
    interface IBalancerVault {
        function getPoolTokens(bytes32 poolId) external view returns (address[] memory tokens, uint256[] memory balances, uint256 lastChangeBlock);
    }

    struct CarbonOrderData {
        uint128 y;
        uint128 z;
        uint64 A;
        uint64 B;
    }

    struct CarbonStrategy {
        uint256 id;
        address owner;
        address[2] tokens;
        CarbonOrderData[2] orders;
    }

    #[sol(rpc)]
    interface ICarbonController {
        function strategy(uint256 id) external view returns (CarbonStrategy memory);
    }
}

/// Read access to the externally maintained pool-state store.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Cached snapshot. Segmented ids (`123-0`) resolve to their strategy.
    fn get_pool(&self, cid: &str) -> Option<PoolSnapshot>;

    /// Current on-chain state for the pool behind `snapshot`.
    async fn fetch_live(&self, snapshot: &PoolSnapshot) -> Result<PoolSnapshot, AppError>;

    async fn refresh(&self) -> Result<(), AppError>;

    fn get_tokens(&self) -> Vec<TokenMeta>;

    fn snapshots(&self) -> Vec<PoolSnapshot>;

    /// Spot-price curves over every cached pool.
    fn curves(&self) -> CurveContainer {
        CurveContainer::from_snapshots(&self.snapshots())
    }
}

/// Snapshot cache fed from a JSON dump, re-validated against chain reads.
///
/// Live reads go through the contract each family exposes: the pair for
/// Uniswap V2 style pools, the converter for Bancor V2, and the pool
/// collection for Bancor V3 (its `address` field names the collection).
pub struct JsonPoolStore {
    path: Option<PathBuf>,
    provider: Option<HttpProvider>,
    catalog: ExchangeCatalog,
    pools: DashMap<String, PoolSnapshot>,
}

impl JsonPoolStore {
    pub fn new(path: impl Into<PathBuf>, provider: HttpProvider) -> Self {
        Self {
            path: Some(path.into()),
            provider: Some(provider),
            catalog: ExchangeCatalog::default(),
            pools: DashMap::new(),
        }
    }

    /// In-memory store without a backing file or live provider.
    pub fn from_snapshots(snapshots: Vec<PoolSnapshot>) -> Self {
        let pools = DashMap::new();
        for snap in snapshots {
            pools.insert(snap.cid.clone(), snap);
        }
        Self {
            path: None,
            provider: None,
            catalog: ExchangeCatalog::default(),
            pools,
        }
    }

    pub fn with_provider(mut self, provider: HttpProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_catalog(mut self, catalog: ExchangeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Replaces the cache with the file contents. Returns the pool count.
    pub fn load_file(&self) -> Result<usize, AppError> {
        let Some(path) = &self.path else {
            return Ok(self.pools.len());
        };
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("pool file {} read failed: {}", path.display(), e))
        })?;
        let snapshots: Vec<PoolSnapshot> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("pool file {} parse failed: {}", path.display(), e))
        })?;
        self.pools.clear();
        for snap in snapshots {
            self.pools.insert(snap.cid.clone(), snap);
        }
        Ok(self.pools.len())
    }

    fn provider(&self) -> Result<&HttpProvider, AppError> {
        self.provider
            .as_ref()
            .ok_or_else(|| AppError::Connection("pool store has no live provider".into()))
    }

    async fn fetch_state(&self, snapshot: &PoolSnapshot) -> Result<PoolState, AppError> {
        let provider = self.provider()?.clone();
        let rpc_err = |what: &str, e: alloy::contract::Error| {
            AppError::Connection(format!("{what} for {} failed: {e}", snapshot.cid))
        };

        match &snapshot.state {
            PoolState::ConstantProduct { variant, .. } => {
                let (reserve0, reserve1) = match self.catalog.family(&snapshot.exchange_name) {
                    ExchangeFamily::BancorV2 => {
                        let converter = IBancorConverter::new(snapshot.address, provider);
                        let r0 = converter
                            .getReserveBalance(snapshot.token0.address)
                            .call()
                            .await
                            .map_err(|e| rpc_err("getReserveBalance", e))?;
                        let r1 = converter
                            .getReserveBalance(snapshot.token1.address)
                            .call()
                            .await
                            .map_err(|e| rpc_err("getReserveBalance", e))?;
                        (r0, r1)
                    }
                    ExchangeFamily::BancorV3 => {
                        let base = bancor_v3_base_token(snapshot)?;
                        let collection = IBancorPoolCollection::new(snapshot.address, provider);
                        let liq = collection
                            .tradingLiquidity(base)
                            .call()
                            .await
                            .map_err(|e| rpc_err("tradingLiquidity", e))?;
                        bancor_v3_reserves(
                            snapshot,
                            U256::from(liq.bntTradingLiquidity),
                            U256::from(liq.baseTokenTradingLiquidity),
                        )
                    }
                    _ => {
                        let pair = IUniswapV2Pair::new(snapshot.address, provider);
                        let r = pair
                            .getReserves()
                            .call()
                            .await
                            .map_err(|e| rpc_err("getReserves", e))?;
                        (U256::from(r.reserve0), U256::from(r.reserve1))
                    }
                };
                Ok(PoolState::ConstantProduct {
                    reserve0,
                    reserve1,
                    variant: *variant,
                })
            }
            PoolState::Concentrated { tick_spacing, .. } => {
                let pool = IUniswapV3Pool::new(snapshot.address, provider);
                let slot0 = pool
                    .slot0()
                    .call()
                    .await
                    .map_err(|e| rpc_err("slot0", e))?;
                let liquidity = pool
                    .liquidity()
                    .call()
                    .await
                    .map_err(|e| rpc_err("liquidity", e))?;
                Ok(PoolState::Concentrated {
                    liquidity: U256::from(liquidity),
                    sqrt_price_q96: U256::from(slot0.sqrtPriceX96),
                    tick: slot0.tick.as_i32(),
                    tick_spacing: *tick_spacing,
                })
            }
            PoolState::Weighted {
                pool_id, weights, ..
            } => {
                let vault = IBalancerVault::new(snapshot.address, provider);
                let res = vault
                    .getPoolTokens(*pool_id)
                    .call()
                    .await
                    .map_err(|e| rpc_err("getPoolTokens", e))?;
                Ok(PoolState::Weighted {
                    pool_id: *pool_id,
                    tokens: res.tokens,
                    balances: res.balances,
                    weights: weights.clone(),
                })
            }
            PoolState::Segmented { .. } => {
                let raw_id = snapshot.strategy_id.as_deref().ok_or_else(|| {
                    AppError::validation("strategy_id", format!("{} has none", snapshot.cid))
                })?;
                let id = U256::from_str(raw_id)
                    .map_err(|e| AppError::validation("strategy_id", e.to_string()))?;
                let controller = ICarbonController::new(snapshot.address, provider);
                let strategy = controller
                    .strategy(id)
                    .call()
                    .await
                    .map_err(|e| rpc_err("strategy", e))?;
                let order = |o: &CarbonOrderData| CarbonOrder {
                    y: U256::from(o.y),
                    z: U256::from(o.z),
                    a: o.A,
                    b: o.B,
                };
                Ok(PoolState::Segmented {
                    orders: [order(&strategy.orders[0]), order(&strategy.orders[1])],
                })
            }
        }
    }
}

/// Bancor V3 pools are keyed by their non-BNT token.
fn bancor_v3_base_token(snapshot: &PoolSnapshot) -> Result<Address, AppError> {
    if snapshot.token0.address == BNT_MAINNET {
        Ok(snapshot.token1.address)
    } else if snapshot.token1.address == BNT_MAINNET {
        Ok(snapshot.token0.address)
    } else {
        Err(AppError::validation(
            "token",
            format!("bancor_v3 pool {} has no BNT side", snapshot.cid),
        ))
    }
}

/// Trading liquidities laid out in the snapshot's token order.
fn bancor_v3_reserves(snapshot: &PoolSnapshot, bnt: U256, base: U256) -> (U256, U256) {
    if snapshot.token0.address == BNT_MAINNET {
        (bnt, base)
    } else {
        (base, bnt)
    }
}

#[async_trait]
impl PoolStore for JsonPoolStore {
    fn get_pool(&self, cid: &str) -> Option<PoolSnapshot> {
        if let Some(entry) = self.pools.get(cid) {
            return Some(entry.value().clone());
        }
        let (base, _) = cid.rsplit_once(SEGMENT_SEPARATOR)?;
        self.pools.get(base).map(|e| e.value().clone())
    }

    async fn fetch_live(&self, snapshot: &PoolSnapshot) -> Result<PoolSnapshot, AppError> {
        let state = self.fetch_state(snapshot).await?;
        let mut live = snapshot.clone();
        live.state = state;
        Ok(live)
    }

    async fn refresh(&self) -> Result<(), AppError> {
        let count = self.load_file()?;
        tracing::debug!(target: "pools", pools = count, "pool snapshots reloaded");
        Ok(())
    }

    fn get_tokens(&self) -> Vec<TokenMeta> {
        let mut tokens: Vec<TokenMeta> = Vec::new();
        for entry in self.pools.iter() {
            for token in [&entry.token0, &entry.token1] {
                if !tokens.iter().any(|t| t.address == token.address) {
                    tokens.push(token.clone());
                }
            }
        }
        tokens
    }

    fn snapshots(&self) -> Vec<PoolSnapshot> {
        self.pools.iter().map(|e| e.value().clone()).collect()
    }
}
