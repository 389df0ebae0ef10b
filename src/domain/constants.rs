// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use std::collections::HashMap;

// Common assets
pub const NATIVE_GAS_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");
pub const WETH_MAINNET: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const WETH_OP_STACK: Address = address!("4200000000000000000000000000000000000006");
pub const WETH_ARBITRUM: Address = address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1");
pub const BNT_MAINNET: Address = address!("1F573D6Fb3F13d689FF844B4cE37794d79a7FF1C");
pub const USDC_MAINNET: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
pub const USDC_OPTIMISM: Address = address!("0b2C639c533813f4Aa9D7837CAf62653d097Ff85");
pub const USDC_ARBITRUM: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

// OP-stack predeploy exposing getL1Fee(bytes)
pub const OP_STACK_GAS_PRICE_ORACLE: Address = address!("420000000000000000000000000000000000000F");

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const NETWORK_ETHEREUM: &str = "ethereum";
pub const NETWORK_BASE: &str = "coinbase_base";
pub const NETWORK_OPTIMISM: &str = "optimism";
pub const NETWORK_ARBITRUM: &str = "arbitrum_one";

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_BASE: u64 = 8453;
pub const CHAIN_ARBITRUM: u64 = 42161;

/// Networks that take type-2 fee fields and a non-zero priority fee.
pub const FEE_MARKET_NETWORKS: [&str; 2] = [NETWORK_ETHEREUM, NETWORK_BASE];

/// Rollups whose gas cost includes an L1 data fee from the predeploy oracle.
pub const OP_STACK_NETWORKS: [&str; 2] = [NETWORK_BASE, NETWORK_OPTIMISM];

/// The only network where private-relay submission is attempted.
pub const PRIVATE_RELAY_NETWORK: &str = NETWORK_ETHEREUM;

pub const TENDERLY_FORK_RPC_PREFIX: &str = "https://rpc.tenderly.co/fork/";

pub fn chain_id_for_network(network: &str) -> Option<u64> {
    match network {
        NETWORK_ETHEREUM => Some(CHAIN_ETHEREUM),
        NETWORK_BASE => Some(CHAIN_BASE),
        NETWORK_OPTIMISM => Some(CHAIN_OPTIMISM),
        NETWORK_ARBITRUM => Some(CHAIN_ARBITRUM),
        _ => None,
    }
}

pub fn is_fee_market_network(network: &str) -> bool {
    FEE_MARKET_NETWORKS.contains(&network)
}

// =============================================================================
// ROUTE & GAS CONSTANTS
// =============================================================================

/// Scale-down applied once to every leg spending the flashloaned token.
pub const SOURCE_LEG_SCALING_FACTOR: Decimal = Decimal::from_parts(999, 0, 0, false, 3);

/// Separator marking a segmented (order-book style) pool id, e.g. `1234-0`.
pub const SEGMENT_SEPARATOR: char = '-';

/// Executor platform that wraps or unwraps the gas token.
pub const WRAP_UNWRAP_PLATFORM_ID: u16 = 10;

/// Decimals of the native gas token and its wrapped form.
pub const GAS_TOKEN_DECIMALS: u8 = 18;

/// Blocks a private transaction stays eligible for inclusion.
pub const PRIVATE_TX_MAX_BLOCKS: u64 = 10;

pub const BASE_FEE_TOO_LOW_MARKER: &str = "max fee per gas less than block base fee";
pub const BASE_FEE_FIELD_MARKER: &str = "baseFee:";

// =============================================================================
// EXCHANGE FAMILIES
// =============================================================================

pub const BANCOR_V2_NAME: &str = "bancor_v2";
pub const BANCOR_V3_NAME: &str = "bancor_v3";
pub const BALANCER_NAME: &str = "balancer";

lazy_static! {
    pub static ref DEFAULT_UNI_V2_FORKS: Vec<&'static str> = vec![
        "uniswap_v2",
        "sushiswap_v2",
        "pancakeswap_v2",
        "baseswap_v2",
        "alienbase_v2",
    ];

    pub static ref DEFAULT_UNI_V3_FORKS: Vec<&'static str> = vec![
        "uniswap_v3",
        "pancakeswap_v3",
        "sushiswap_v3",
        "baseswap_v3",
    ];

    pub static ref DEFAULT_SOLIDLY_V2_FORKS: Vec<&'static str> = vec![
        "velodrome_v2",
        "aerodrome_v2",
        "solidly_v2",
    ];

    pub static ref DEFAULT_CARBON_V1_FORKS: Vec<&'static str> = vec!["carbon_v1", "bancor_pol"];

    pub static ref WRAPPED_GAS_TOKEN_BY_NETWORK: HashMap<&'static str, Address> = {
        let mut m = HashMap::new();
        m.insert(NETWORK_ETHEREUM, WETH_MAINNET);
        m.insert(NETWORK_BASE, WETH_OP_STACK);
        m.insert(NETWORK_OPTIMISM, WETH_OP_STACK);
        m.insert(NETWORK_ARBITRUM, WETH_ARBITRUM);
        m
    };

    pub static ref STABLECOIN_BY_NETWORK: HashMap<&'static str, Address> = {
        let mut m = HashMap::new();
        m.insert(NETWORK_ETHEREUM, USDC_MAINNET);
        m.insert(NETWORK_BASE, USDC_BASE);
        m.insert(NETWORK_OPTIMISM, USDC_OPTIMISM);
        m.insert(NETWORK_ARBITRUM, USDC_ARBITRUM);
        m
    };
}
