// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::decimal::{fixed_point_to_decimal, pow10, q96_to_decimal, units_to_decimal};
use crate::domain::constants::{
    BALANCER_NAME, BANCOR_V2_NAME, BANCOR_V3_NAME, DEFAULT_CARBON_V1_FORKS,
    DEFAULT_SOLIDLY_V2_FORKS, DEFAULT_UNI_V2_FORKS, DEFAULT_UNI_V3_FORKS,
};
use crate::domain::error::AppError;
use alloy::primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub address: Address,
    #[serde(default)]
    pub symbol: String,
    pub decimals: u8,
}

/// Constant-product flavours that share the reserve-pair layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveVariant {
    #[default]
    Standard,
    Volatile,
    Stable,
}

/// One side of a Carbon strategy. `a`/`b` are the compressed sqrt-rate words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarbonOrder {
    pub y: U256,
    pub z: U256,
    pub a: u64,
    pub b: u64,
}

impl CarbonOrder {
    const ONE_BITS: usize = 48;

    /// Expands a compressed rate word (48-bit mantissa, exponent above it).
    pub fn decode_rate(word: u64) -> Result<Decimal, AppError> {
        let mantissa = U256::from(word & ((1u64 << Self::ONE_BITS) - 1));
        let exponent = (word >> Self::ONE_BITS) as usize;
        fixed_point_to_decimal(mantissa << exponent, Self::ONE_BITS)
    }

    /// (A, B) as sqrt-rates in raw units.
    pub fn rates(&self) -> Result<(Decimal, Decimal), AppError> {
        Ok((Self::decode_rate(self.a)?, Self::decode_rate(self.b)?))
    }

    /// `A·y/z + B`, the sqrt of the marginal rate at the current fill level.
    pub fn sqrt_rate(&self) -> Result<Decimal, AppError> {
        let (a, b) = self.rates()?;
        if self.z.is_zero() {
            return Ok(b);
        }
        let y = units_to_decimal(self.y, 0)?;
        let z = units_to_decimal(self.z, 0)?;
        let fill = y
            .checked_div(z)
            .and_then(|r| r.checked_mul(a))
            .ok_or_else(|| AppError::validation("carbon_order", "rate overflow"))?;
        Ok(fill + b)
    }

    /// Output per unit of input at the margin (raw units).
    pub fn marginal_rate(&self) -> Result<Decimal, AppError> {
        let r = self.sqrt_rate()?;
        r.checked_mul(r)
            .ok_or_else(|| AppError::validation("carbon_order", "rate overflow"))
    }
}

/// Pool state, one variant per pool class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum PoolState {
    ConstantProduct {
        reserve0: U256,
        reserve1: U256,
        #[serde(default)]
        variant: CurveVariant,
    },
    Concentrated {
        liquidity: U256,
        sqrt_price_q96: U256,
        tick: i32,
        tick_spacing: i32,
    },
    Weighted {
        pool_id: B256,
        tokens: Vec<Address>,
        balances: Vec<U256>,
        weights: Vec<Decimal>,
    },
    Segmented {
        orders: [CarbonOrder; 2],
    },
}

impl PoolState {
    pub fn class_name(&self) -> &'static str {
        match self {
            PoolState::ConstantProduct { .. } => "constant_product",
            PoolState::Concentrated { .. } => "concentrated",
            PoolState::Weighted { .. } => "weighted",
            PoolState::Segmented { .. } => "segmented",
        }
    }

    /// Compares only the fields that move with trading for this class.
    pub fn same_core_state(&self, live: &PoolState) -> bool {
        match (self, live) {
            (
                PoolState::ConstantProduct {
                    reserve0: a0,
                    reserve1: a1,
                    ..
                },
                PoolState::ConstantProduct {
                    reserve0: b0,
                    reserve1: b1,
                    ..
                },
            ) => a0 == b0 && a1 == b1,
            (
                PoolState::Concentrated {
                    liquidity: l0,
                    sqrt_price_q96: p0,
                    tick: t0,
                    ..
                },
                PoolState::Concentrated {
                    liquidity: l1,
                    sqrt_price_q96: p1,
                    tick: t1,
                    ..
                },
            ) => l0 == l1 && p0 == p1 && t0 == t1,
            (PoolState::Weighted { balances: a, .. }, PoolState::Weighted { balances: b, .. }) => {
                a == b
            }
            (PoolState::Segmented { orders: a }, PoolState::Segmented { orders: b }) => {
                a[0].y == b[0].y && a[1].y == b[1].y
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub cid: String,
    pub exchange_name: String,
    pub address: Address,
    #[serde(default)]
    pub pair_name: String,
    #[serde(default)]
    pub strategy_id: Option<String>,
    /// Fee as a fraction, e.g. `0.003`.
    pub fee: Decimal,
    pub token0: TokenMeta,
    pub token1: TokenMeta,
    pub state: PoolState,
}

impl PoolSnapshot {
    pub fn decimals_of(&self, token: Address) -> Option<u8> {
        if token == self.token0.address {
            Some(self.token0.decimals)
        } else if token == self.token1.address {
            Some(self.token1.decimals)
        } else {
            None
        }
    }

    /// Reserve pair in token units, ordered as (token_in side, token_out side).
    pub fn reserves_for(&self, token_in: Address) -> Result<(Decimal, Decimal), AppError> {
        let PoolState::ConstantProduct {
            reserve0, reserve1, ..
        } = &self.state
        else {
            return Err(AppError::validation(
                "state",
                format!("pool {} is not a constant-product pool", self.cid),
            ));
        };
        let r0 = units_to_decimal(*reserve0, self.token0.decimals)?;
        let r1 = units_to_decimal(*reserve1, self.token1.decimals)?;
        if token_in == self.token0.address {
            Ok((r0, r1))
        } else if token_in == self.token1.address {
            Ok((r1, r0))
        } else {
            Err(AppError::validation(
                "tknin",
                format!("token {token_in:#x} is not in pool {}", self.cid),
            ))
        }
    }

    /// Marginal price of token0 in token1 units. `None` when the pool is empty.
    pub fn spot_price(&self) -> Result<Option<Decimal>, AppError> {
        let price = match &self.state {
            PoolState::ConstantProduct {
                reserve0, reserve1, ..
            } => {
                let r0 = units_to_decimal(*reserve0, self.token0.decimals)?;
                let r1 = units_to_decimal(*reserve1, self.token1.decimals)?;
                r1.checked_div(r0)
            }
            PoolState::Concentrated { sqrt_price_q96, .. } => {
                let sqrt = q96_to_decimal(*sqrt_price_q96)?;
                let shift = pow10(self.token0.decimals as i32 - self.token1.decimals as i32)?;
                sqrt.checked_mul(sqrt).and_then(|p| p.checked_mul(shift))
            }
            PoolState::Weighted {
                tokens,
                balances,
                weights,
                ..
            } => {
                let idx0 = tokens.iter().position(|t| *t == self.token0.address);
                let idx1 = tokens.iter().position(|t| *t == self.token1.address);
                match (idx0, idx1) {
                    (Some(i0), Some(i1)) if i0 < balances.len() && i1 < balances.len() => {
                        let b0 = units_to_decimal(balances[i0], self.token0.decimals)?;
                        let b1 = units_to_decimal(balances[i1], self.token1.decimals)?;
                        let w0 = weights.get(i0).copied().unwrap_or(Decimal::ONE);
                        let w1 = weights.get(i1).copied().unwrap_or(Decimal::ONE);
                        b1.checked_div(w1)
                            .zip(b0.checked_div(w0))
                            .and_then(|(num, den)| num.checked_div(den))
                    }
                    _ => None,
                }
            }
            PoolState::Segmented { orders } => {
                // order 0 pays out token0; its rate is token0 per token1
                let rate = orders[0].marginal_rate()?;
                let shift = pow10(self.token1.decimals as i32 - self.token0.decimals as i32)?;
                rate.checked_mul(shift)
                    .and_then(|r| Decimal::ONE.checked_div(r))
            }
        };
        Ok(price.filter(|p| !p.is_zero()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeFamily {
    BancorV2,
    BancorV3,
    UniswapV2,
    UniswapV3,
    SolidlyV2,
    CarbonV1,
    Balancer,
    Unknown,
}

impl ExchangeFamily {
    /// Platform selector understood by the arbitrage executor contract.
    pub fn platform_id(self) -> Option<u16> {
        match self {
            ExchangeFamily::BancorV2 => Some(1),
            ExchangeFamily::BancorV3 => Some(2),
            ExchangeFamily::UniswapV2 => Some(3),
            ExchangeFamily::UniswapV3 => Some(4),
            ExchangeFamily::CarbonV1 => Some(6),
            ExchangeFamily::Balancer => Some(7),
            ExchangeFamily::SolidlyV2 => Some(11),
            ExchangeFamily::Unknown => None,
        }
    }
}

/// Maps exchange names onto families and the pricing preference order.
#[derive(Debug, Clone)]
pub struct ExchangeCatalog {
    pub uni_v2_forks: Vec<String>,
    pub uni_v3_forks: Vec<String>,
    pub solidly_v2_forks: Vec<String>,
    pub carbon_v1_forks: Vec<String>,
}

impl Default for ExchangeCatalog {
    fn default() -> Self {
        let own = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            uni_v2_forks: own(&DEFAULT_UNI_V2_FORKS),
            uni_v3_forks: own(&DEFAULT_UNI_V3_FORKS),
            solidly_v2_forks: own(&DEFAULT_SOLIDLY_V2_FORKS),
            carbon_v1_forks: own(&DEFAULT_CARBON_V1_FORKS),
        }
    }
}

impl ExchangeCatalog {
    pub fn family(&self, exchange: &str) -> ExchangeFamily {
        let has = |list: &[String]| list.iter().any(|e| e == exchange);
        match exchange {
            BANCOR_V2_NAME => ExchangeFamily::BancorV2,
            BANCOR_V3_NAME => ExchangeFamily::BancorV3,
            BALANCER_NAME => ExchangeFamily::Balancer,
            _ if has(&self.carbon_v1_forks) => ExchangeFamily::CarbonV1,
            _ if has(&self.uni_v3_forks) => ExchangeFamily::UniswapV3,
            _ if has(&self.solidly_v2_forks) => ExchangeFamily::SolidlyV2,
            _ if has(&self.uni_v2_forks) => ExchangeFamily::UniswapV2,
            _ => ExchangeFamily::Unknown,
        }
    }

    pub fn is_carbon(&self, exchange: &str) -> bool {
        self.family(exchange) == ExchangeFamily::CarbonV1
    }

    /// Sort key for pricing quotes: bancor_v2, bancor_v3, then the v2 and v3
    /// fork lists in order. Unknown exchanges sort just before Carbon forks,
    /// which always sort last.
    pub fn pricing_rank(&self, exchange: &str) -> usize {
        if self.is_carbon(exchange) {
            return usize::MAX;
        }
        [BANCOR_V2_NAME, BANCOR_V3_NAME]
            .into_iter()
            .chain(self.uni_v2_forks.iter().map(String::as_str))
            .chain(self.uni_v3_forks.iter().map(String::as_str))
            .position(|e| e == exchange)
            .unwrap_or(usize::MAX - 1)
    }
}
