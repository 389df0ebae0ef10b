// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use flashroute::app::config::GlobalSettings;
use flashroute::app::logging::setup_logging;
use flashroute::domain::error::AppError;
use flashroute::infrastructure::data::candidates::FileRouteFinder;
use flashroute::infrastructure::data::pools::JsonPoolStore;
use flashroute::infrastructure::network::chain::RpcChainClient;
use flashroute::infrastructure::network::provider::ConnectionFactory;
use flashroute::infrastructure::network::relay::PrivateRelay;
use flashroute::services::strategy::engine::{Engine, RunMode, RunOptions};
use flashroute::services::strategy::search::ArbMode;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "flashloan arbitrage executor")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// `single` or `continuous`
    #[arg(long, default_value = "continuous")]
    mode: String,

    /// Route-search family, e.g. `multi`, `triangle`, `b3_two_hop`
    #[arg(long, default_value = "single")]
    arb_mode: String,

    /// Pick randomly among the top N routes (0 = always the best)
    #[arg(long, default_value_t = 0)]
    randomizer: usize,

    /// Seconds between passes (overrides config/env)
    #[arg(long)]
    polling_interval: Option<u64>,

    /// Directory for successful-transaction records
    #[arg(long)]
    logging_path: Option<PathBuf>,

    /// Run the math and pool-staleness validators
    #[arg(long, default_value_t = false)]
    run_data_validator: bool,

    /// Replay against a fork: RPC URL or bare Tenderly fork id
    #[arg(long)]
    fork: Option<String>,

    /// Block whose timestamp anchors the route deadline
    #[arg(long)]
    replay_from_block: Option<u64>,

    /// Log the finder's token universe instead of trading
    #[arg(long, default_value_t = false)]
    list_tokens: bool,

    /// Submit even when gas cost exceeds the rewarded profit
    #[arg(long, default_value_t = false)]
    safety_override: bool,

    /// JSON log output
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(&settings.log_level, settings.debug, cli.log_json || settings.log_json);

    let replay = cli.fork.is_some();
    if let (Some(block), false) = (cli.replay_from_block, replay) {
        tracing::warn!(
            target: "config",
            block,
            "--replay-from-block has no effect without --fork; deadlines use the latest block"
        );
    }
    let rpc_url = match &cli.fork {
        Some(fork) => ConnectionFactory::fork_url(fork),
        None => settings.http_provider.clone(),
    };
    let provider = ConnectionFactory::http(&rpc_url)?;
    let chain_id = settings.chain_id_value()?;

    let wallet_signer = PrivateKeySigner::from_str(&settings.wallet_key)
        .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
    let relay = match settings.private_relay_value() {
        Some(url) => {
            let relay_signer = settings
                .relay_signer_key
                .as_deref()
                .map(PrivateKeySigner::from_str)
                .transpose()
                .map_err(|e| AppError::Config(format!("Invalid relay signer key: {}", e)))?;
            Some(PrivateRelay::new(url.to_string(), relay_signer))
        }
        None => None,
    };

    tracing::info!(
        target: "config",
        network = %settings.network,
        chain_id,
        wallet = %format!("{:#x}", wallet_signer.address()),
        contract = %format!("{:#x}", settings.arb_contract_address),
        replay,
        private_relay = relay.is_some(),
        "Starting flashroute"
    );

    let chain = Arc::new(RpcChainClient::new(
        provider.clone(),
        wallet_signer,
        chain_id,
        relay,
        settings.receipt_poll(),
    ));
    let store = Arc::new(JsonPoolStore::new(&settings.pools_path, provider).with_catalog(settings.catalog()));
    let finder = Arc::new(FileRouteFinder::new(&settings.candidates_path));
    let engine = Engine::new(&settings, chain, store, finder)?;

    let mut opts = RunOptions::from_settings(&settings);
    opts.mode = RunMode::from_str(&cli.mode)?;
    opts.arb_mode = ArbMode::from_str(&cli.arb_mode)?;
    opts.randomizer = cli.randomizer;
    opts.run_data_validator = cli.run_data_validator;
    opts.list_tokens = cli.list_tokens;
    opts.replay = replay;
    opts.replay_from_block = cli.replay_from_block;
    opts.safety_override = cli.safety_override;
    if let Some(secs) = cli.polling_interval {
        opts.polling_interval = Duration::from_secs(secs.max(1));
    }
    if cli.logging_path.is_some() {
        opts.logging_path = cli.logging_path;
    }

    engine.run(&opts).await
}
