// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

mod common;

use alloy::primitives::{Address, U256};
use common::FakeChain;
use flashroute::app::config::FlashloanMechanism;
use flashroute::network::gas::GasQuote;
use flashroute::services::strategy::execution::{ExecutionPlan, TransactionBuilder};
use std::sync::atomic::Ordering;

fn plan() -> ExecutionPlan {
    ExecutionPlan {
        routes: Vec::new(),
        flashloan_token: Address::repeat_byte(1),
        flashloan_amount: U256::from(10u64),
        flashloans: Vec::new(),
    }
}

fn builder() -> TransactionBuilder {
    TransactionBuilder::new(Address::repeat_byte(0x41), FlashloanMechanism::Legacy, true, 25_000)
}

const QUOTE: GasQuote = GasQuote {
    base_fee: 30,
    priority_fee: 2,
    fee_market: true,
};

#[tokio::test]
async fn built_tx_carries_safety_offset_and_signature() {
    let chain = FakeChain::new(1);

    let built = builder().build(&chain, &plan(), QUOTE, 7).await.unwrap().unwrap();

    assert_eq!(built.gas_limit, 21_000 + 25_000);
    assert_eq!(built.request.gas, Some(46_000));
    assert_eq!(built.request.nonce, Some(7));
    assert_eq!(built.request.max_fee_per_gas, Some(32));
    assert!(!built.signed.raw.is_empty());
    // access list lookup failed on this node; the baseline request is kept
    assert!(built.request.access_list.is_none());
}

#[tokio::test]
async fn base_fee_error_is_retried_once() {
    let chain = FakeChain::new(1);
    *chain.first_simulate_error.lock().unwrap() = Some(
        "max fee per gas less than block base fee: address 0x1, maxFeePerGas: 32 baseFee: 40"
            .to_string(),
    );

    let built = builder().build(&chain, &plan(), QUOTE, 7).await.unwrap().unwrap();

    assert_eq!(chain.simulate_calls.load(Ordering::SeqCst), 2);
    assert_eq!(built.quote.base_fee, 40);
    assert_eq!(built.request.max_fee_per_gas, Some(42));
}

#[tokio::test]
async fn other_preflight_failures_drop_the_route() {
    let chain = FakeChain::new(1);
    *chain.first_simulate_error.lock().unwrap() = Some("execution reverted: InsufficientProfit".into());

    let built = builder().build(&chain, &plan(), QUOTE, 7).await.unwrap();

    assert!(built.is_none());
    assert_eq!(chain.simulate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_estimate_drops_the_route() {
    let mut chain = FakeChain::new(1);
    chain.estimate_fails = true;

    let built = builder().build(&chain, &plan(), QUOTE, 7).await.unwrap();

    assert!(built.is_none());
}
