// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::GlobalSettings;
use crate::common::decimal::units_to_decimal;
use crate::domain::constants::PRIVATE_TX_MAX_BLOCKS;
use crate::domain::error::AppError;
use crate::network::chain::ChainClient;
use crate::services::strategy::execution::builder::BuiltTx;
use crate::services::strategy::pricing::ProfitReport;
use alloy::primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use std::time::Duration;

/// Economic limits for submission.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    /// Floor on gas-token profit.
    pub min_profit: Decimal,
    pub expected_gas_modifier: Decimal,
    pub reward_share: Decimal,
    /// Rollup L1-fee oracle.
    pub gas_oracle: Option<Address>,
    pub private_relay: bool,
    pub receipt_timeout: Duration,
}

impl GuardPolicy {
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        Self {
            min_profit: settings.min_profit_gas_token,
            expected_gas_modifier: settings.expected_gas_modifier,
            reward_share: settings.reward_share,
            gas_oracle: settings.gas_oracle_value(),
            private_relay: settings.private_relay_value().is_some(),
            receipt_timeout: settings.receipt_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Confirmed { hash: B256, success: bool },
    Rejected(String),
    /// Sent but not mined within the receipt timeout.
    Abandoned(B256),
}

/// Expected execution cost in gas-token units.
pub fn gas_cost(fee_per_gas: u128, gas: u64, modifier: Decimal) -> Result<Decimal, AppError> {
    let wei = U256::from(fee_per_gas).saturating_mul(U256::from(gas));
    Ok(units_to_decimal(wei, 18)? * modifier)
}

pub struct SubmissionGuard {
    policy: GuardPolicy,
}

impl SubmissionGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    pub fn meets_floor(&self, profit_gas_token: Decimal) -> bool {
        profit_gas_token >= self.policy.min_profit
    }

    /// Sends `tx` when the rewarded share of profit covers its gas cost.
    pub async fn submit_if_profitable(
        &self,
        chain: &dyn ChainClient,
        tx: &BuiltTx,
        profit: &ProfitReport,
        block_number: u64,
        replay: bool,
        safety_override: bool,
    ) -> Result<Submission, AppError> {
        if !self.meets_floor(profit.gas_token) && !safety_override {
            let reason = format!(
                "profit {} below floor {}",
                profit.gas_token, self.policy.min_profit
            );
            tracing::info!(target: "guard", %reason, "Submission rejected");
            return Ok(Submission::Rejected(reason));
        }

        let mut cost = gas_cost(tx.quote.max_fee(), tx.gas_limit, self.policy.expected_gas_modifier)?;
        if let Some(oracle) = self.policy.gas_oracle {
            let l1 = chain.l1_fee(oracle, &tx.signed.raw).await?;
            cost += units_to_decimal(l1, 18)?;
        }
        let cost_usd = match profit.usd {
            Some(usd) if !profit.gas_token.is_zero() => Some(cost * usd / profit.gas_token),
            _ => None,
        };
        let adjusted = profit.gas_token * self.policy.reward_share;

        tracing::info!(
            target: "guard",
            gas_cost = %cost,
            gas_cost_usd = ?cost_usd,
            adjusted_reward = %adjusted,
            profit_usd = ?profit.usd,
            "Gas cost versus reward"
        );

        if adjusted <= cost && !safety_override {
            let reason = format!("adjusted reward {adjusted} does not cover gas cost {cost}");
            tracing::info!(target: "guard", %reason, "Submission rejected");
            return Ok(Submission::Rejected(reason));
        }

        let hash = if self.policy.private_relay && !replay {
            let max_block = block_number + PRIVATE_TX_MAX_BLOCKS;
            tracing::info!(target: "guard", max_block, "Sending through private relay");
            chain.send_private(&tx.signed.raw, max_block).await?
        } else {
            chain.send_raw(&tx.signed.raw).await?
        };
        tracing::info!(target: "guard", hash = %format!("{hash:#x}"), "Transaction sent; waiting for receipt");

        match chain.wait_for_receipt(hash, self.policy.receipt_timeout).await? {
            Some(receipt) => {
                tracing::info!(
                    target: "guard",
                    hash = %format!("{hash:#x}"),
                    success = receipt.success,
                    block = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Transaction mined"
                );
                Ok(Submission::Confirmed {
                    hash,
                    success: receipt.success,
                })
            }
            None => {
                tracing::warn!(target: "guard", hash = %format!("{hash:#x}"), "No receipt before timeout; abandoning");
                Ok(Submission::Abandoned(hash))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gas_cost_is_fee_times_gas_in_gas_token() {
        assert_eq!(gas_cost(100, 21_000, Decimal::ONE).unwrap(), dec!(0.0000000000021));
        assert_eq!(
            gas_cost(30_000_000_000, 200_000, dec!(0.85)).unwrap(),
            dec!(0.0051)
        );
    }
}
