// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::parse_address_list;
use crate::domain::constants::{
    OP_STACK_GAS_PRICE_ORACLE, OP_STACK_NETWORKS, PRIVATE_RELAY_NETWORK, STABLECOIN_BY_NETWORK,
    WRAPPED_GAS_TOKEN_BY_NETWORK, chain_id_for_network, is_fee_market_network,
};
use crate::domain::error::AppError;
use crate::domain::pool::ExchangeCatalog;
use alloy::primitives::Address;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// How the executor contract gets its working capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashloanMechanism {
    /// `fundAndArb`: the wallet funds the route itself.
    SelfFund,
    /// `flashloanAndArb(routes, token, amount)`.
    Legacy,
    /// `flashloanAndArbV2(flashloans, routes)`.
    Multi,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_network")]
    pub network: String,
    pub chain_id: Option<u64>,

    // Identity & endpoints
    pub wallet_key: String,
    #[serde(default)]
    pub http_provider: String,
    pub arb_contract_address: Address,
    pub private_relay_url: Option<String>,
    pub relay_signer_key: Option<String>,
    /// L1 fee oracle on rollups; unset means no L1 settlement fee.
    pub gas_oracle_address: Option<Address>,

    // Tokens
    pub wrapped_gas_token: Option<Address>,
    pub stablecoin: Option<Address>,
    #[serde(default, deserialize_with = "deserialize_address_list")]
    pub flashloan_tokens: Vec<Address>,

    // Flashloan
    #[serde(default = "default_flashloan_mechanism")]
    pub flashloan_mechanism: FlashloanMechanism,
    #[serde(default = "default_flashloan_platform_id")]
    pub flashloan_platform_id: u16,
    /// Lender fee as a fraction of the borrowed amount.
    #[serde(default)]
    pub flashloan_fee: Decimal,

    // Economics
    #[serde(default = "default_min_profit_gas_token")]
    pub min_profit_gas_token: Decimal,
    #[serde(default = "default_gas_price_offset")]
    pub gas_price_offset: Decimal,
    #[serde(default = "default_gas_safety_offset")]
    pub gas_safety_offset: u64,
    /// Expected fraction of the gas estimate actually burned.
    #[serde(default = "default_expected_gas_modifier")]
    pub expected_gas_modifier: Decimal,
    /// Share of arbitrage profit that may be spent on gas.
    #[serde(default = "default_reward_share")]
    pub reward_share: Decimal,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    #[serde(default = "default_true")]
    pub access_list_enabled: bool,

    // Timing
    #[serde(default = "default_blocktime_deviation_secs")]
    pub blocktime_deviation_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,

    // Data
    #[serde(default = "default_pools_path")]
    pub pools_path: String,
    #[serde(default = "default_candidates_path")]
    pub candidates_path: String,
    pub logging_path: Option<String>,

    // Exchange families (empty = built-in lists)
    #[serde(default, deserialize_with = "deserialize_name_list")]
    pub uni_v2_forks: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_name_list")]
    pub uni_v3_forks: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_name_list")]
    pub solidly_v2_forks: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_name_list")]
    pub carbon_v1_forks: Vec<String>,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_false() -> bool {
    false
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_network() -> String {
    "ethereum".to_string()
}
fn default_flashloan_mechanism() -> FlashloanMechanism {
    FlashloanMechanism::Multi
}
fn default_flashloan_platform_id() -> u16 {
    7
}
fn default_min_profit_gas_token() -> Decimal {
    Decimal::new(1, 2)
}
fn default_gas_price_offset() -> Decimal {
    Decimal::new(109, 2)
}
fn default_gas_safety_offset() -> u64 {
    25_000
}
fn default_expected_gas_modifier() -> Decimal {
    Decimal::new(85, 2)
}
fn default_reward_share() -> Decimal {
    Decimal::new(5, 1)
}
fn default_slippage_bps() -> u64 {
    0
}
fn default_blocktime_deviation_secs() -> u64 {
    13 * 500
}
fn default_receipt_poll_ms() -> u64 {
    1_000
}
fn default_receipt_timeout_ms() -> u64 {
    120_000
}
fn default_polling_interval_secs() -> u64 {
    60
}
fn default_pools_path() -> String {
    "data/pools.json".to_string()
}
fn default_candidates_path() -> String {
    "data/candidates.json".to_string()
}

fn deserialize_address_list<'de, D>(deserializer: D) -> Result<Vec<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Visitor};
    use std::fmt;

    struct AddressListVisitor;

    impl<'de> Visitor<'de> for AddressListVisitor {
        type Value = Vec<Address>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of addresses or a comma-separated string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            parse_address_list(v).map_err(E::custom)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                out.extend(parse_address_list(&item).map_err(A::Error::custom)?);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(AddressListVisitor)
}

fn deserialize_name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{SeqAccess, Visitor};
    use std::fmt;

    struct NameListVisitor;

    fn split(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    impl<'de> Visitor<'de> for NameListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of exchange names or a comma-separated string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(split(v))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                out.extend(split(&item));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(NameListVisitor)
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Environment wins over the file.
        builder = builder.add_source(Environment::default());

        Self::from_builder(builder)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    /// Parses settings from an inline TOML document; environment is ignored.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        Self::from_builder(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    pub(crate) fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }
        if self.http_provider.trim().is_empty() {
            return Err(AppError::Config("HTTP_PROVIDER is missing".to_string()));
        }
        if self.reward_share <= Decimal::ZERO || self.reward_share > Decimal::ONE {
            return Err(AppError::Config(format!(
                "reward_share must be in (0, 1], got {}",
                self.reward_share
            )));
        }
        if self.expected_gas_modifier <= Decimal::ZERO {
            return Err(AppError::Config(
                "expected_gas_modifier must be positive".to_string(),
            ));
        }
        if self.flashloan_fee.is_sign_negative() {
            return Err(AppError::Config("flashloan_fee must not be negative".to_string()));
        }
        if self.slippage_bps >= 10_000 {
            return Err(AppError::Config("slippage_bps must be below 10000".to_string()));
        }
        self.chain_id_value()?;
        self.wrapped_gas_token_value()?;
        Ok(())
    }

    pub fn chain_id_value(&self) -> Result<u64, AppError> {
        self.chain_id
            .or_else(|| chain_id_for_network(&self.network))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "unknown network {}; set CHAIN_ID explicitly",
                    self.network
                ))
            })
    }

    pub fn wrapped_gas_token_value(&self) -> Result<Address, AppError> {
        self.wrapped_gas_token
            .or_else(|| WRAPPED_GAS_TOKEN_BY_NETWORK.get(self.network.as_str()).copied())
            .ok_or_else(|| {
                AppError::Config(format!("no wrapped gas token known for {}", self.network))
            })
    }

    pub fn stablecoin_value(&self) -> Option<Address> {
        self.stablecoin
            .or_else(|| STABLECOIN_BY_NETWORK.get(self.network.as_str()).copied())
    }

    /// Configured L1-fee oracle, or the OP-stack predeploy on those networks.
    pub fn gas_oracle_value(&self) -> Option<Address> {
        self.gas_oracle_address.or_else(|| {
            OP_STACK_NETWORKS
                .contains(&self.network.as_str())
                .then_some(OP_STACK_GAS_PRICE_ORACLE)
        })
    }

    pub fn is_fee_market(&self) -> bool {
        is_fee_market_network(&self.network)
    }

    pub fn private_relay_value(&self) -> Option<&str> {
        if self.network != PRIVATE_RELAY_NETWORK {
            return None;
        }
        self.private_relay_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms.max(1))
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(1))
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs.max(1))
    }

    pub fn catalog(&self) -> ExchangeCatalog {
        let mut catalog = ExchangeCatalog::default();
        if !self.uni_v2_forks.is_empty() {
            catalog.uni_v2_forks = self.uni_v2_forks.clone();
        }
        if !self.uni_v3_forks.is_empty() {
            catalog.uni_v3_forks = self.uni_v3_forks.clone();
        }
        if !self.solidly_v2_forks.is_empty() {
            catalog.solidly_v2_forks = self.solidly_v2_forks.clone();
        }
        if !self.carbon_v1_forks.is_empty() {
            catalog.carbon_v1_forks = self.carbon_v1_forks.clone();
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::{CHAIN_BASE, WETH_MAINNET};
    use rust_decimal_macros::dec;

    const BASE_TOML: &str = r#"
wallet_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
http_provider = "http://127.0.0.1:8545"
arb_contract_address = "0x41Eeba3355d7D6FF628B7982F3F9D055c39488cB"
"#;

    fn from_toml(extra: &str) -> Result<GlobalSettings, AppError> {
        GlobalSettings::from_toml_str(&format!("{BASE_TOML}\n{extra}"))
    }

    #[test]
    fn defaults_match_mainnet_profile() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.chain_id_value().unwrap(), 1);
        assert_eq!(settings.wrapped_gas_token_value().unwrap(), WETH_MAINNET);
        assert_eq!(settings.flashloan_mechanism, FlashloanMechanism::Multi);
        assert_eq!(settings.gas_safety_offset, 25_000);
        assert_eq!(settings.reward_share, dec!(0.5));
        assert_eq!(settings.blocktime_deviation_secs, 6_500);
        assert!(settings.is_fee_market());
        assert_eq!(settings.polling_interval(), Duration::from_secs(60));
    }

    #[test]
    fn address_list_accepts_comma_string() {
        let settings = from_toml(
            r#"flashloan_tokens = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2,0x6B175474E89094C44Da98b954EedeAC495271d0F""#,
        )
        .unwrap();
        assert_eq!(settings.flashloan_tokens.len(), 2);
        assert_eq!(settings.flashloan_tokens[0], WETH_MAINNET);
    }

    #[test]
    fn base_network_resolves_chain_and_disables_private_relay() {
        let settings = from_toml(
            r#"
network = "coinbase_base"
private_relay_url = "https://relay.example"
flashloan_mechanism = "self_fund"
"#,
        )
        .unwrap();
        assert_eq!(settings.chain_id_value().unwrap(), CHAIN_BASE);
        assert!(settings.private_relay_value().is_none());
        assert_eq!(settings.flashloan_mechanism, FlashloanMechanism::SelfFund);
        assert_eq!(settings.gas_oracle_value(), Some(OP_STACK_GAS_PRICE_ORACLE));
        assert_eq!(from_toml("").unwrap().gas_oracle_value(), None);
    }

    #[test]
    fn fork_lists_override_catalog() {
        let settings = from_toml(r#"uni_v2_forks = "quickswap_v2, dfyn_v2""#).unwrap();
        let catalog = settings.catalog();
        assert_eq!(catalog.uni_v2_forks, vec!["quickswap_v2", "dfyn_v2"]);
        assert_eq!(catalog.pricing_rank("quickswap_v2"), 2);
    }

    #[test]
    fn invalid_reward_share_is_rejected() {
        let err = from_toml("reward_share = \"1.5\"").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn unknown_network_requires_chain_id() {
        assert!(from_toml("network = \"somechain\"").is_err());
        assert!(
            from_toml("network = \"somechain\"\nchain_id = 999\nwrapped_gas_token = \"0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2\"")
                .is_ok()
        );
    }
}
