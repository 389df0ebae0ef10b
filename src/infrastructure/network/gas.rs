// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::network::chain::ChainClient;
use alloy::rpc::types::eth::TransactionRequest;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Fee parameters for one transaction build, all in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub base_fee: u128,
    pub priority_fee: u128,
    /// Type-2 fields when true, legacy `gasPrice` otherwise.
    pub fee_market: bool,
}

impl GasQuote {
    /// `maxFeePerGas` on fee-market networks, `gasPrice` elsewhere.
    pub fn max_fee(&self) -> u128 {
        self.base_fee.saturating_add(self.priority_fee)
    }

    pub fn with_base_fee(self, base_fee: u128) -> Self {
        Self { base_fee, ..self }
    }

    pub fn apply(&self, tx: &mut TransactionRequest) {
        if self.fee_market {
            tx.gas_price = None;
            tx.max_fee_per_gas = Some(self.max_fee());
            tx.max_priority_fee_per_gas = Some(self.priority_fee);
        } else {
            tx.max_fee_per_gas = None;
            tx.max_priority_fee_per_gas = None;
            tx.gas_price = Some(self.max_fee());
        }
    }
}

/// Fresh fee quote per pass. A failed lookup fails the pass.
#[derive(Debug, Clone)]
pub struct GasOracle {
    fee_market: bool,
    priority_offset: Decimal,
}

impl GasOracle {
    pub fn new(fee_market: bool, priority_offset: Decimal) -> Self {
        Self {
            fee_market,
            priority_offset,
        }
    }

    /// Base fee from the pending block (`eth_gasPrice` when absent), plus the
    /// scaled node tip on fee-market networks.
    pub async fn quote(&self, chain: &dyn ChainClient) -> Result<GasQuote, AppError> {
        self.fetch(chain).await.inspect_err(|e| {
            tracing::warn!(target: "gas", error = %e, "Fee lookup failed");
        })
    }

    async fn fetch(&self, chain: &dyn ChainClient) -> Result<GasQuote, AppError> {
        let base_fee = if self.fee_market {
            match chain.pending_base_fee().await? {
                Some(base) => base,
                None => chain.gas_price().await?,
            }
        } else {
            chain.gas_price().await?
        };

        let priority_fee = if self.fee_market {
            Self::scale(chain.max_priority_fee().await?, self.priority_offset)?
        } else {
            0
        };

        Ok(GasQuote {
            base_fee,
            priority_fee,
            fee_market: self.fee_market,
        })
    }

    fn scale(value: u128, factor: Decimal) -> Result<u128, AppError> {
        let value = i128::try_from(value)
            .map_err(|_| AppError::validation("priority_fee", format!("tip {value} out of range")))?;
        let value = Decimal::try_from_i128_with_scale(value, 0)
            .map_err(|e| AppError::validation("priority_fee", e.to_string()))?;
        value
            .checked_mul(factor)
            .and_then(|v| v.trunc().to_u128())
            .ok_or_else(|| AppError::validation("priority_fee", "scaled tip out of range"))
    }
}
