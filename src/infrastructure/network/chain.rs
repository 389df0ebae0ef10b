// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::retry_async;
use crate::data::executor::GasPriceOracle;
use crate::domain::error::AppError;
use crate::network::provider::HttpProvider;
use crate::network::relay::PrivateRelay;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::time::{Duration, Instant};

const READ_ATTEMPTS: usize = 3;
const READ_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub raw: Vec<u8>,
    pub hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Every chain interaction the pipeline performs.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn wallet(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Pending nonce of the wallet, read fresh on every call.
    async fn nonce(&self) -> Result<u64, AppError>;

    async fn block_number(&self) -> Result<u64, AppError>;

    /// Timestamp of `block`, or of the latest block when `None`.
    async fn block_timestamp(&self, block: Option<u64>) -> Result<u64, AppError>;

    /// `baseFeePerGas` of the pending block, if the chain reports one.
    async fn pending_base_fee(&self) -> Result<Option<u128>, AppError>;

    async fn gas_price(&self) -> Result<u128, AppError>;

    async fn max_priority_fee(&self) -> Result<u128, AppError>;

    /// `eth_call` preflight; surfaces node-side fee and revert errors.
    async fn simulate(&self, tx: &TransactionRequest) -> Result<(), AppError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, AppError>;

    async fn create_access_list(&self, tx: &TransactionRequest) -> Result<AccessList, AppError>;

    async fn l1_fee(&self, oracle: Address, raw_tx: &[u8]) -> Result<U256, AppError>;

    fn sign(&self, tx: &TransactionRequest) -> Result<SignedTx, AppError>;

    async fn send_raw(&self, raw_tx: &[u8]) -> Result<B256, AppError>;

    async fn send_private(&self, raw_tx: &[u8], max_block: u64) -> Result<B256, AppError>;

    /// `Ok(None)` when no receipt shows up within `timeout`.
    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<Option<ReceiptInfo>, AppError>;
}

/// Signs a filled request as EIP-1559 when fee-market fields are set,
/// otherwise as a legacy transaction.
pub fn sign_request(
    signer: &PrivateKeySigner,
    chain_id: u64,
    request: &TransactionRequest,
) -> Result<SignedTx, AppError> {
    let to = request
        .to
        .ok_or_else(|| AppError::Strategy("Missing `to` in tx request".into()))?;
    let gas_limit = request
        .gas
        .ok_or_else(|| AppError::Strategy("Missing `gas` in tx request".into()))?;
    let nonce = request
        .nonce
        .ok_or_else(|| AppError::Strategy("Missing nonce in tx request".into()))?;
    let value = request.value.unwrap_or_default();
    let input: Bytes = request.input.clone().into_input().unwrap_or_default();
    let chain_id = request.chain_id.unwrap_or(chain_id);

    let signed: TxEnvelope = match (request.max_fee_per_gas, request.max_priority_fee_per_gas) {
        (Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) => {
            let mut tx = TxEip1559 {
                chain_id,
                nonce,
                max_priority_fee_per_gas,
                max_fee_per_gas,
                gas_limit,
                to,
                value,
                access_list: request.access_list.clone().unwrap_or_default(),
                input,
            };
            let sig = TxSignerSync::sign_transaction_sync(signer, &mut tx)
                .map_err(|e| AppError::Strategy(format!("Sign tx failed: {}", e)))?;
            tx.into_signed(sig).into()
        }
        _ => {
            let gas_price = request.gas_price.ok_or_else(|| {
                AppError::Strategy("Missing gas price fields in tx request".into())
            })?;
            let mut tx = TxLegacy {
                chain_id: Some(chain_id),
                nonce,
                gas_price,
                gas_limit,
                to,
                value,
                input,
            };
            let sig = TxSignerSync::sign_transaction_sync(signer, &mut tx)
                .map_err(|e| AppError::Strategy(format!("Sign tx failed: {}", e)))?;
            tx.into_signed(sig).into()
        }
    };

    Ok(SignedTx {
        raw: signed.encoded_2718(),
        hash: *signed.tx_hash(),
    })
}

/// `ChainClient` over a JSON-RPC HTTP provider.
pub struct RpcChainClient {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    chain_id: u64,
    relay: Option<PrivateRelay>,
    receipt_poll: Duration,
}

impl RpcChainClient {
    pub fn new(
        provider: HttpProvider,
        signer: PrivateKeySigner,
        chain_id: u64,
        relay: Option<PrivateRelay>,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            provider,
            signer,
            chain_id,
            relay,
            receipt_poll,
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn wallet(&self) -> Address {
        self.signer.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn nonce(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.signer.address();
        retry_async(
            "nonce",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).pending().await }
            },
            READ_ATTEMPTS,
            READ_BACKOFF,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        retry_async(
            "block_number",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_block_number().await }
            },
            READ_ATTEMPTS,
            READ_BACKOFF,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch block number: {}", e)))
    }

    async fn block_timestamp(&self, block: Option<u64>) -> Result<u64, AppError> {
        let tag = block
            .map(BlockNumberOrTag::Number)
            .unwrap_or(BlockNumberOrTag::Latest);
        let block = self
            .provider
            .get_block_by_number(tag)
            .await
            .map_err(|e| AppError::Connection(format!("Block {tag} fetch failed: {}", e)))?
            .ok_or_else(|| AppError::Connection(format!("Block {tag} not found")))?;
        Ok(block.header.timestamp)
    }

    async fn pending_base_fee(&self) -> Result<Option<u128>, AppError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Pending)
            .await
            .map_err(|e| AppError::Connection(format!("Pending block fetch failed: {}", e)))?;
        Ok(block
            .and_then(|b| b.header.base_fee_per_gas)
            .map(|v| v as u128))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| AppError::Connection(format!("eth_gasPrice failed: {}", e)))
    }

    async fn max_priority_fee(&self) -> Result<u128, AppError> {
        self.provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| AppError::Connection(format!("eth_maxPriorityFeePerGas failed: {}", e)))
    }

    async fn simulate(&self, tx: &TransactionRequest) -> Result<(), AppError> {
        self.provider
            .call(tx.clone())
            .await
            .map(|_| ())
            .map_err(|e| AppError::Strategy(format!("eth_call failed: {}", e)))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, AppError> {
        self.provider
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| AppError::Strategy(format!("eth_estimateGas failed: {}", e)))
    }

    async fn create_access_list(&self, tx: &TransactionRequest) -> Result<AccessList, AppError> {
        // Access list derivation is fee-agnostic; strip fee fields from the request.
        let mut stripped = tx.clone();
        stripped.gas_price = None;
        stripped.max_fee_per_gas = None;
        stripped.max_priority_fee_per_gas = None;
        let res = self
            .provider
            .create_access_list(&stripped)
            .await
            .map_err(|e| AppError::Strategy(format!("eth_createAccessList failed: {}", e)))?;
        res.ensure_ok()
            .map(|r| r.access_list)
            .map_err(|e| AppError::Strategy(format!("eth_createAccessList reverted: {}", e)))
    }

    async fn l1_fee(&self, oracle: Address, raw_tx: &[u8]) -> Result<U256, AppError> {
        GasPriceOracle::new(oracle, self.provider.clone())
            .getL1Fee(Bytes::copy_from_slice(raw_tx))
            .call()
            .await
            .map_err(|e| AppError::Connection(format!("getL1Fee failed: {}", e)))
    }

    fn sign(&self, tx: &TransactionRequest) -> Result<SignedTx, AppError> {
        sign_request(&self.signer, self.chain_id, tx)
    }

    async fn send_raw(&self, raw_tx: &[u8]) -> Result<B256, AppError> {
        let pending = self
            .provider
            .send_raw_transaction(raw_tx)
            .await
            .map_err(|e| AppError::Connection(format!("Public tx send failed: {}", e)))?;
        Ok(*pending.tx_hash())
    }

    async fn send_private(&self, raw_tx: &[u8], max_block: u64) -> Result<B256, AppError> {
        let relay = self
            .relay
            .as_ref()
            .ok_or_else(|| AppError::Config("private relay is not configured".into()))?;
        relay.send_private_transaction(raw_tx, max_block).await
    }

    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<Option<ReceiptInfo>, AppError> {
        let started = Instant::now();
        while started.elapsed() < timeout {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    return Ok(Some(ReceiptInfo {
                        hash,
                        success: rcpt.status(),
                        block_number: rcpt.block_number,
                        gas_used: rcpt.gas_used,
                    }));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "guard",
                        error = %e,
                        hash = %format!("{:#x}", hash),
                        "Receipt lookup error; retrying"
                    );
                }
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
        Ok(None)
    }
}
