// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>
#![allow(dead_code)]

use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use flashroute::app::config::GlobalSettings;
use flashroute::data::pools::{JsonPoolStore, PoolStore};
use flashroute::domain::error::AppError;
use flashroute::domain::pool::{CurveVariant, PoolSnapshot, PoolState, TokenMeta};
use flashroute::domain::trade::{Opportunity, TradeLeg};
use flashroute::network::chain::{ChainClient, ReceiptInfo, SignedTx, sign_request};
use flashroute::services::strategy::pricing::CurveContainer;
use flashroute::services::strategy::search::{ArbMode, FinderOutput, ResultKind, RouteFinder};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const E18: u128 = 1_000_000_000_000_000_000;

pub fn token(b: u8) -> Address {
    Address::repeat_byte(b)
}

pub fn settings(extra: &str) -> GlobalSettings {
    let text = format!(
        r#"
wallet_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
http_provider = "http://127.0.0.1:8545"
arb_contract_address = "0x41Eeba3355d7D6FF628B7982F3F9D055c39488cB"
network = "arbitrum_one"
wrapped_gas_token = "0x0101010101010101010101010101010101010101"
{extra}
"#
    );
    GlobalSettings::from_toml_str(&text).expect("test settings")
}

pub fn cp_pool(cid: &str, t0: u8, t1: u8, r0: u128, r1: u128) -> PoolSnapshot {
    let meta = |b: u8| TokenMeta {
        address: token(b),
        symbol: format!("T{b}"),
        decimals: 18,
    };
    PoolSnapshot {
        cid: cid.to_string(),
        exchange_name: "uniswap_v2".to_string(),
        address: Address::repeat_byte(0x50),
        pair_name: String::new(),
        strategy_id: None,
        fee: Decimal::ZERO,
        token0: meta(t0),
        token1: meta(t1),
        state: PoolState::ConstantProduct {
            reserve0: U256::from(r0 * E18),
            reserve1: U256::from(r1 * E18),
            variant: CurveVariant::Standard,
        },
    }
}

pub fn leg(cid: &str, tin: u8, tout: u8, amtin: Decimal) -> TradeLeg {
    TradeLeg {
        cid: cid.to_string(),
        tknin: token(tin),
        tknout: token(tout),
        amtin,
        amtout: None,
        tknin_decimals: 18,
        tknout_decimals: 18,
        exchange_name: "uniswap_v2".to_string(),
        strategy_id: None,
    }
}

/// Pool store whose live reads echo the cache, except for pools marked moved.
pub struct FakeStore {
    inner: JsonPoolStore,
    moved: Mutex<HashSet<String>>,
    pub refreshes: AtomicUsize,
}

impl FakeStore {
    pub fn new(pools: Vec<PoolSnapshot>) -> Self {
        Self {
            inner: JsonPoolStore::from_snapshots(pools),
            moved: Mutex::new(HashSet::new()),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn mark_moved(&self, cid: &str) {
        self.moved.lock().unwrap().insert(cid.to_string());
    }
}

#[async_trait]
impl PoolStore for FakeStore {
    fn get_pool(&self, cid: &str) -> Option<PoolSnapshot> {
        self.inner.get_pool(cid)
    }

    async fn fetch_live(&self, snapshot: &PoolSnapshot) -> Result<PoolSnapshot, AppError> {
        let mut live = snapshot.clone();
        if self.moved.lock().unwrap().contains(&snapshot.cid) {
            if let PoolState::ConstantProduct { reserve0, .. } = &mut live.state {
                *reserve0 += U256::from(1u8);
            }
        }
        Ok(live)
    }

    async fn refresh(&self) -> Result<(), AppError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_tokens(&self) -> Vec<TokenMeta> {
        self.inner.get_tokens()
    }

    fn snapshots(&self) -> Vec<PoolSnapshot> {
        self.inner.snapshots()
    }
}

pub struct FakeFinder {
    pub candidates: Vec<Opportunity>,
    pub calls: AtomicUsize,
}

impl FakeFinder {
    pub fn new(candidates: Vec<Opportunity>) -> Self {
        Self {
            candidates,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RouteFinder for FakeFinder {
    async fn find(
        &self,
        _flashloan_tokens: &[Address],
        _curves: &CurveContainer,
        _mode: ArbMode,
        _kind: ResultKind,
    ) -> Result<FinderOutput, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FinderOutput::Candidates(self.candidates.clone()))
    }
}

/// In-memory chain that records every call the pipeline makes.
pub struct FakeChain {
    signer: PrivateKeySigner,
    pub chain_id: u64,
    pub gas_price: u128,
    pub gas_estimate: u64,
    pub l1_fee: U256,
    pub mined: bool,
    pub estimate_fails: bool,
    pub gas_price_fails: AtomicBool,
    /// Error text returned by the first `simulate` call, if any.
    pub first_simulate_error: Mutex<Option<String>>,
    pub nonce_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
    pub public_sends: AtomicUsize,
    pub private_sends: AtomicUsize,
    pub last_max_block: Mutex<Option<u64>>,
    pub simulated: Mutex<Vec<TransactionRequest>>,
}

impl FakeChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            signer: PrivateKeySigner::random(),
            chain_id,
            gas_price: 100,
            gas_estimate: 21_000,
            l1_fee: U256::ZERO,
            mined: true,
            estimate_fails: false,
            gas_price_fails: AtomicBool::new(false),
            first_simulate_error: Mutex::new(None),
            nonce_calls: AtomicUsize::new(0),
            simulate_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            public_sends: AtomicUsize::new(0),
            private_sends: AtomicUsize::new(0),
            last_max_block: Mutex::new(None),
            simulated: Mutex::new(Vec::new()),
        }
    }

    pub fn sends(&self) -> usize {
        self.public_sends.load(Ordering::SeqCst) + self.private_sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn wallet(&self) -> Address {
        self.signer.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn nonce(&self) -> Result<u64, AppError> {
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        Ok(7)
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        Ok(1_000)
    }

    async fn block_timestamp(&self, block: Option<u64>) -> Result<u64, AppError> {
        Ok(1_700_000_000 + block.unwrap_or(0))
    }

    async fn pending_base_fee(&self) -> Result<Option<u128>, AppError> {
        Ok(Some(self.gas_price))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        if self.gas_price_fails.load(Ordering::SeqCst) {
            return Err(AppError::Connection("eth_gasPrice timed out".into()));
        }
        Ok(self.gas_price)
    }

    async fn max_priority_fee(&self) -> Result<u128, AppError> {
        Ok(2)
    }

    async fn simulate(&self, tx: &TransactionRequest) -> Result<(), AppError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.simulated.lock().unwrap().push(tx.clone());
        match self.first_simulate_error.lock().unwrap().take() {
            Some(msg) => Err(AppError::Strategy(format!("eth_call failed: {msg}"))),
            None => Ok(()),
        }
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64, AppError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if self.estimate_fails {
            return Err(AppError::Strategy("eth_estimateGas failed: execution reverted".into()));
        }
        Ok(self.gas_estimate)
    }

    async fn create_access_list(&self, _tx: &TransactionRequest) -> Result<AccessList, AppError> {
        Err(AppError::Strategy("eth_createAccessList unsupported".into()))
    }

    async fn l1_fee(&self, _oracle: Address, _raw_tx: &[u8]) -> Result<U256, AppError> {
        Ok(self.l1_fee)
    }

    fn sign(&self, tx: &TransactionRequest) -> Result<SignedTx, AppError> {
        sign_request(&self.signer, self.chain_id, tx)
    }

    async fn send_raw(&self, _raw_tx: &[u8]) -> Result<B256, AppError> {
        self.public_sends.fetch_add(1, Ordering::SeqCst);
        Ok(B256::repeat_byte(0xaa))
    }

    async fn send_private(&self, _raw_tx: &[u8], max_block: u64) -> Result<B256, AppError> {
        self.private_sends.fetch_add(1, Ordering::SeqCst);
        *self.last_max_block.lock().unwrap() = Some(max_block);
        Ok(B256::repeat_byte(0xbb))
    }

    async fn wait_for_receipt(
        &self,
        hash: B256,
        _timeout: Duration,
    ) -> Result<Option<ReceiptInfo>, AppError> {
        Ok(self.mined.then_some(ReceiptInfo {
            hash,
            success: true,
            block_number: Some(1_001),
            gas_used: self.gas_estimate,
        }))
    }
}
