// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::app::config::GlobalSettings;
use crate::common::decimal::decimal_to_units;
use crate::data::pools::PoolStore;
use crate::domain::constants::NETWORK_ETHEREUM;
use crate::domain::error::AppError;
use crate::network::chain::ChainClient;
use crate::network::gas::{GasOracle, GasQuote};
use crate::services::strategy::execution::records::{ArbLog, write_success_record};
use crate::services::strategy::execution::{
    ExecutionPlan, GuardPolicy, Submission, SubmissionGuard, TransactionBuilder,
};
use crate::services::strategy::planning::{RouteAssembler, RouteEncoder};
use crate::services::strategy::pricing::{CurveContainer, ProfitConverter};
use crate::services::strategy::search::{ArbMode, FinderOutput, ResultKind, RouteFinder};
use crate::services::strategy::selector::select;
use crate::services::strategy::validation::{math, staleness};
use alloy::primitives::{Address, B256};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single,
    Continuous,
}

impl FromStr for RunMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(RunMode::Single),
            "continuous" => Ok(RunMode::Continuous),
            other => Err(AppError::Config(format!("unknown run mode `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub flashloan_tokens: Vec<Address>,
    /// Prebuilt pricing curves; the pool store's curves when `None`.
    pub curves: Option<CurveContainer>,
    pub polling_interval: Duration,
    pub mode: RunMode,
    pub arb_mode: ArbMode,
    pub run_data_validator: bool,
    /// Breadth of the random top-N pick. 0 takes the single best route.
    pub randomizer: usize,
    /// Ask the finder for its token universe instead of routes.
    pub list_tokens: bool,
    pub logging_path: Option<PathBuf>,
    pub replay: bool,
    /// Reference block for the deadline. Ignored unless `replay` is set.
    pub replay_from_block: Option<u64>,
    /// Submit even when the guard's economics say no.
    pub safety_override: bool,
}

impl RunOptions {
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        Self {
            flashloan_tokens: settings.flashloan_tokens.clone(),
            curves: None,
            polling_interval: settings.polling_interval(),
            mode: RunMode::Continuous,
            arb_mode: ArbMode::SinglePairwise,
            run_data_validator: false,
            randomizer: 0,
            list_tokens: false,
            logging_path: settings.logging_path.as_ref().map(PathBuf::from),
            replay: false,
            replay_from_block: None,
            safety_override: false,
        }
    }

    /// Math-validated modes always run the data validators.
    pub fn data_validation_enabled(&self) -> bool {
        self.run_data_validator || self.arb_mode.is_math_validated()
    }

    fn result_kind(&self) -> ResultKind {
        if self.list_tokens {
            ResultKind::Tokens
        } else if self.randomizer > 0 {
            ResultKind::Candidates
        } else {
            ResultKind::Best
        }
    }
}

/// Facts that change between passes.
#[derive(Debug, Clone, Copy)]
pub struct PassContext {
    pub nonce: u64,
    pub block_number: u64,
    pub deadline: u64,
    pub gas: GasQuote,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Submitted {
        hash: B256,
        success: bool,
        record: ArbLog,
    },
    NoOpportunity,
    Rejected(String),
    Abandoned(B256),
}

pub struct Engine {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn PoolStore>,
    finder: Arc<dyn RouteFinder>,
    gas: GasOracle,
    converter: ProfitConverter,
    assembler: RouteAssembler,
    encoder: RouteEncoder,
    builder: TransactionBuilder,
    guard: SubmissionGuard,
    blocktime_deviation_secs: u64,
}

impl Engine {
    pub fn new(
        settings: &GlobalSettings,
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn PoolStore>,
        finder: Arc<dyn RouteFinder>,
    ) -> Result<Self, AppError> {
        let catalog = settings.catalog();
        Ok(Self {
            chain,
            store,
            finder,
            gas: GasOracle::new(settings.is_fee_market(), settings.gas_price_offset),
            converter: ProfitConverter::new(
                catalog.clone(),
                settings.wrapped_gas_token_value()?,
                settings.stablecoin_value(),
            ),
            assembler: RouteAssembler::new(catalog.clone(), settings.flashloan_fee),
            encoder: RouteEncoder::new(
                catalog,
                settings.slippage_bps,
                settings.flashloan_platform_id,
                settings.wrapped_gas_token_value()?,
            ),
            builder: TransactionBuilder::new(
                settings.arb_contract_address,
                settings.flashloan_mechanism,
                settings.access_list_enabled && settings.network == NETWORK_ETHEREUM,
                settings.gas_safety_offset,
            ),
            guard: SubmissionGuard::new(GuardPolicy::from_settings(settings)),
            blocktime_deviation_secs: settings.blocktime_deviation_secs,
        })
    }

    /// Single mode returns after one pass and surfaces its error. Continuous
    /// mode never returns.
    pub async fn run(&self, opts: &RunOptions) -> Result<(), AppError> {
        if opts.data_validation_enabled() && !opts.run_data_validator {
            tracing::debug!(
                target: "engine",
                arb_mode = %opts.arb_mode,
                "Transactions will be required to pass data validation"
            );
        }
        match opts.mode {
            RunMode::Single => self.run_single(opts).await,
            RunMode::Continuous => self.run_continuous(opts).await,
        }
    }

    async fn run_single(&self, opts: &RunOptions) -> Result<(), AppError> {
        self.store.refresh().await?;
        let outcome = self.run_pass(opts).await.inspect_err(|e| {
            tracing::error!(target: "engine", error = %e, "Single pass failed");
        })?;
        Self::log_outcome(&outcome);
        if let (PassOutcome::Submitted { hash, record, .. }, Some(dir)) = (&outcome, &opts.logging_path)
        {
            let path = write_success_record(dir, record, *hash)?;
            tracing::info!(target: "engine", path = %path.display(), "Transaction record written");
        }
        Ok(())
    }

    async fn run_continuous(&self, opts: &RunOptions) -> Result<(), AppError> {
        loop {
            if let Err(e) = self.store.refresh().await {
                tracing::error!(target: "engine", error = %e, "Pool refresh failed");
            }
            match self.run_pass(opts).await {
                Ok(outcome) => Self::log_outcome(&outcome),
                Err(e) => tracing::error!(target: "engine", error = %e, "Pass failed"),
            }
            tokio::time::sleep(opts.polling_interval).await;
        }
    }

    fn log_outcome(outcome: &PassOutcome) {
        match outcome {
            PassOutcome::Submitted { hash, success, .. } => {
                tracing::info!(target: "engine", hash = %format!("{hash:#x}"), success, "Arbitrage executed");
            }
            PassOutcome::NoOpportunity => {
                tracing::info!(target: "engine", "No eligible arbitrage opportunities");
            }
            PassOutcome::Rejected(reason) => {
                tracing::info!(target: "engine", %reason, "Opportunity dropped");
            }
            PassOutcome::Abandoned(hash) => {
                tracing::warn!(target: "engine", hash = %format!("{hash:#x}"), "Transaction abandoned");
            }
        }
    }

    /// find → select → validate → assemble → build → submit.
    pub async fn run_pass(&self, opts: &RunOptions) -> Result<PassOutcome, AppError> {
        let store = self.store.as_ref();
        let curves = match &opts.curves {
            Some(curves) => curves.clone(),
            None => store.curves(),
        };

        let found = self
            .finder
            .find(&opts.flashloan_tokens, &curves, opts.arb_mode, opts.result_kind())
            .await?;
        let candidates = match found {
            FinderOutput::Candidates(c) => c,
            FinderOutput::Tokens { tokens, combos } => {
                tracing::info!(
                    target: "engine",
                    tokens = tokens.len(),
                    combos = combos.len(),
                    "Route search token universe"
                );
                return Ok(PassOutcome::NoOpportunity);
            }
        };
        tracing::info!(target: "engine", count = candidates.len(), "Eligible arbitrage opportunities");
        let Some(mut opportunity) = select(candidates, opts.randomizer) else {
            return Ok(PassOutcome::NoOpportunity);
        };
        if let Err(e) = opportunity.validate() {
            return Ok(PassOutcome::Rejected(e.to_string()));
        }
        tracing::debug!(target: "engine", profit = %opportunity.profit, "Selected route\n{}", opportunity.table());

        if opts.data_validation_enabled() {
            match math::validate(&opportunity, opts.arb_mode, store)? {
                Some(validated) => opportunity = validated,
                None => {
                    tracing::warn!(target: "engine", "Math validation eliminated the opportunity");
                    return Ok(PassOutcome::Rejected("closed-form validation failed".into()));
                }
            }
            if !opts.replay && !staleness::validate(&opportunity, store).await {
                tracing::warn!(target: "engine", "Pool state changed since discovery");
                return Ok(PassOutcome::Rejected("stale pool state".into()));
            }
        }

        let route = self.assembler.assemble(&opportunity, store)?;
        let profit = self.converter.convert_profit(
            &curves,
            route.gross_profit,
            route.flashloan_token,
            route.flashloan_fee,
        )?;
        let record = ArbLog::from_route(opts.arb_mode.as_str(), &route, &profit);
        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(target: "engine", arb = %json, "Route assembled"),
            Err(e) => tracing::debug!(target: "engine", error = %e, "Route log encode failed"),
        }

        if !self.guard.meets_floor(profit.gas_token) && !opts.safety_override {
            return Ok(PassOutcome::Rejected(format!(
                "profit {} below floor {}",
                profit.gas_token,
                self.guard.policy().min_profit
            )));
        }

        let ctx = self.pass_context(opts).await?;
        let plan = ExecutionPlan {
            routes: self.encoder.encode_routes(&route, ctx.deadline, store)?,
            flashloan_token: route.flashloan_token,
            flashloan_amount: decimal_to_units(route.flashloan_amount, route.flashloan_decimals)?,
            flashloans: self.encoder.flashloans(&route)?,
        };

        let chain = self.chain.as_ref();
        let Some(built) = self.builder.build(chain, &plan, ctx.gas, ctx.nonce).await? else {
            return Ok(PassOutcome::Rejected("transaction build failed".into()));
        };

        let submission = self
            .guard
            .submit_if_profitable(
                chain,
                &built,
                &profit,
                ctx.block_number,
                opts.replay,
                opts.safety_override,
            )
            .await?;
        Ok(match submission {
            Submission::Confirmed { hash, success } => PassOutcome::Submitted {
                hash,
                success,
                record,
            },
            Submission::Rejected(reason) => PassOutcome::Rejected(reason),
            Submission::Abandoned(hash) => PassOutcome::Abandoned(hash),
        })
    }

    /// Fresh nonce, block, deadline and fees for this pass.
    pub async fn pass_context(&self, opts: &RunOptions) -> Result<PassContext, AppError> {
        let chain = self.chain.as_ref();
        let nonce = chain.nonce().await?;
        let block_number = chain.block_number().await?;
        // a historical anchor only makes sense on a fork pinned to that block
        let anchor = opts.replay_from_block.filter(|_| opts.replay);
        let timestamp = chain.block_timestamp(anchor).await?;
        let gas = self.gas.quote(chain).await?;
        Ok(PassContext {
            nonce,
            block_number,
            deadline: timestamp + self.blocktime_deviation_secs,
            gas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_parses() {
        assert_eq!("single".parse::<RunMode>().unwrap(), RunMode::Single);
        assert_eq!(" continuous ".parse::<RunMode>().unwrap(), RunMode::Continuous);
        assert!("once".parse::<RunMode>().is_err());
    }

    #[test]
    fn two_hop_mode_forces_data_validation() {
        let settings = GlobalSettings::from_toml_str(
            r#"
wallet_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
http_provider = "http://127.0.0.1:8545"
arb_contract_address = "0x41Eeba3355d7D6FF628B7982F3F9D055c39488cB"
"#,
        )
        .unwrap();
        let mut opts = RunOptions::from_settings(&settings);
        assert!(!opts.data_validation_enabled());
        assert_eq!(opts.result_kind(), ResultKind::Best);
        opts.arb_mode = ArbMode::BancorV3TwoHop;
        opts.randomizer = 3;
        assert!(opts.data_validation_enabled());
        assert_eq!(opts.result_kind(), ResultKind::Candidates);
    }
}
