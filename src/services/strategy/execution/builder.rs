// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::FlashloanMechanism;
use crate::common::parsing::parse_base_fee_from_error;
use crate::data::executor::{ArbitrageExecutor, flashloans_for, routes_for};
use crate::domain::constants::{BASE_FEE_TOO_LOW_MARKER, NATIVE_GAS_TOKEN};
use crate::domain::error::AppError;
use crate::domain::route::{FlashloanStruct, RouteStruct};
use crate::network::chain::{ChainClient, SignedTx};
use crate::network::gas::GasQuote;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;

/// Everything the executor contract needs for one route.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub routes: Vec<RouteStruct>,
    pub flashloan_token: Address,
    /// Wei.
    pub flashloan_amount: U256,
    pub flashloans: Vec<FlashloanStruct>,
}

#[derive(Debug, Clone)]
pub struct BuiltTx {
    pub request: TransactionRequest,
    pub signed: SignedTx,
    /// Final limit, safety offset included.
    pub gas_limit: u64,
    /// Fees the transaction was signed with.
    pub quote: GasQuote,
}

pub struct TransactionBuilder {
    contract: Address,
    mechanism: FlashloanMechanism,
    access_list: bool,
    gas_safety_offset: u64,
}

impl TransactionBuilder {
    pub fn new(
        contract: Address,
        mechanism: FlashloanMechanism,
        access_list: bool,
        gas_safety_offset: u64,
    ) -> Self {
        Self {
            contract,
            mechanism,
            access_list,
            gas_safety_offset,
        }
    }

    pub fn calldata(&self, plan: &ExecutionPlan) -> Bytes {
        let routes = routes_for(&plan.routes);
        let encoded = match self.mechanism {
            FlashloanMechanism::SelfFund => ArbitrageExecutor::fundAndArbCall {
                routes,
                token: plan.flashloan_token,
                sourceAmount: plan.flashloan_amount,
            }
            .abi_encode(),
            FlashloanMechanism::Legacy => ArbitrageExecutor::flashloanAndArbCall {
                routes,
                token: plan.flashloan_token,
                sourceAmount: plan.flashloan_amount,
            }
            .abi_encode(),
            FlashloanMechanism::Multi => ArbitrageExecutor::flashloanAndArbV2Call {
                flashloans: flashloans_for(&plan.flashloans),
                routes,
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }

    fn value(&self, plan: &ExecutionPlan) -> U256 {
        if self.mechanism == FlashloanMechanism::SelfFund && plan.flashloan_token == NATIVE_GAS_TOKEN
        {
            plan.flashloan_amount
        } else {
            U256::ZERO
        }
    }

    /// Preflight, estimate and sign. `Ok(None)` means the route would not
    /// execute right now and should be dropped for this pass.
    pub async fn build(
        &self,
        chain: &dyn ChainClient,
        plan: &ExecutionPlan,
        quote: GasQuote,
        nonce: u64,
    ) -> Result<Option<BuiltTx>, AppError> {
        let mut request = TransactionRequest {
            from: Some(chain.wallet()),
            to: Some(TxKind::Call(self.contract)),
            input: TransactionInput::new(self.calldata(plan)),
            value: Some(self.value(plan)),
            nonce: Some(nonce),
            chain_id: Some(chain.chain_id()),
            ..Default::default()
        };
        quote.apply(&mut request);

        let Some(quote) = self.preflight(chain, &mut request, quote).await else {
            return Ok(None);
        };

        let mut gas = match chain.estimate_gas(&request).await {
            Ok(gas) => gas,
            Err(e) => {
                tracing::warn!(target: "builder", error = %e, "Gas estimation failed; route dropped");
                return Ok(None);
            }
        };

        if self.access_list {
            match chain.create_access_list(&request).await {
                Ok(list) => {
                    let mut with_list = request.clone();
                    with_list.access_list = Some(list);
                    match chain.estimate_gas(&with_list).await {
                        Ok(list_gas) if list_gas < gas => {
                            tracing::debug!(target: "builder", baseline = gas, with_list = list_gas, "Access list adopted");
                            gas = list_gas;
                            request = with_list;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(target: "builder", error = %e, "Access list estimate failed");
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(target: "builder", error = %e, "Access list unavailable");
                }
            }
        }

        let gas_limit = gas.saturating_add(self.gas_safety_offset);
        request.gas = Some(gas_limit);
        let signed = chain.sign(&request)?;

        tracing::info!(
            target: "builder",
            hash = %format!("{:#x}", signed.hash),
            nonce,
            gas_limit,
            max_fee = quote.max_fee(),
            priority_fee = quote.priority_fee,
            "Transaction built"
        );

        Ok(Some(BuiltTx {
            request,
            signed,
            gas_limit,
            quote,
        }))
    }

    /// `eth_call` with one retry at the node-reported base fee.
    async fn preflight(
        &self,
        chain: &dyn ChainClient,
        request: &mut TransactionRequest,
        quote: GasQuote,
    ) -> Option<GasQuote> {
        let err = match chain.simulate(request).await {
            Ok(()) => return Some(quote),
            Err(e) => e.to_string(),
        };
        let retry_base = err
            .contains(BASE_FEE_TOO_LOW_MARKER)
            .then(|| parse_base_fee_from_error(&err))
            .flatten();
        let Some(base_fee) = retry_base else {
            tracing::warn!(target: "builder", error = %err, "Preflight failed; route dropped");
            return None;
        };

        let retried = quote.with_base_fee(base_fee);
        retried.apply(request);
        tracing::info!(target: "builder", base_fee, "Retrying with node base fee");
        match chain.simulate(request).await {
            Ok(()) => Some(retried),
            Err(e) => {
                tracing::warn!(target: "builder", error = %e, "Preflight retry failed; route dropped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(token: Address) -> ExecutionPlan {
        ExecutionPlan {
            routes: Vec::new(),
            flashloan_token: token,
            flashloan_amount: U256::from(5u8),
            flashloans: Vec::new(),
        }
    }

    #[test]
    fn self_fund_sends_value_only_for_native_token() {
        let builder = TransactionBuilder::new(Address::ZERO, FlashloanMechanism::SelfFund, false, 0);
        assert_eq!(builder.value(&plan(NATIVE_GAS_TOKEN)), U256::from(5u8));
        assert_eq!(builder.value(&plan(Address::repeat_byte(1))), U256::ZERO);

        let flash = TransactionBuilder::new(Address::ZERO, FlashloanMechanism::Legacy, false, 0);
        assert_eq!(flash.value(&plan(NATIVE_GAS_TOKEN)), U256::ZERO);
    }

    #[test]
    fn calldata_selector_follows_mechanism() {
        let p = plan(Address::repeat_byte(1));
        let selector = |m| {
            TransactionBuilder::new(Address::ZERO, m, false, 0).calldata(&p)[..4].to_vec()
        };
        assert_eq!(selector(FlashloanMechanism::SelfFund), ArbitrageExecutor::fundAndArbCall::SELECTOR);
        assert_eq!(selector(FlashloanMechanism::Legacy), ArbitrageExecutor::flashloanAndArbCall::SELECTOR);
        assert_eq!(selector(FlashloanMechanism::Multi), ArbitrageExecutor::flashloanAndArbV2Call::SELECTOR);
    }
}
