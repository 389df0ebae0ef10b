// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::services::strategy::planning::assembler::AssembledRoute;
use crate::services::strategy::pricing::ProfitReport;
use alloy::primitives::B256;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const CID_TAIL: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlashloanLog {
    pub token: String,
    pub amount: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeLog {
    pub trade_index: usize,
    pub exchange: String,
    pub tkn_in: String,
    pub amount_in: Decimal,
    pub tkn_out: String,
    pub amt_out: Decimal,
    pub cid0: String,
}

/// Structured summary of one assembled route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbLog {
    #[serde(rename = "type")]
    pub kind: String,
    pub profit_gas_token: Decimal,
    pub profit_usd: Option<Decimal>,
    pub flashloan: Vec<FlashloanLog>,
    pub trades: Vec<TradeLog>,
}

fn cid_tail(cid: &str) -> String {
    let skip = cid.chars().count().saturating_sub(CID_TAIL);
    cid.chars().skip(skip).collect()
}

impl ArbLog {
    pub fn from_route(kind: &str, route: &AssembledRoute, profit: &ProfitReport) -> Self {
        let trades = route
            .legs
            .iter()
            .enumerate()
            .map(|(i, leg)| TradeLog {
                trade_index: i,
                exchange: leg.exchange_name.clone(),
                tkn_in: format!("{:#x}", leg.tknin),
                amount_in: leg.amtin,
                tkn_out: format!("{:#x}", leg.tknout),
                amt_out: leg.amtout,
                cid0: cid_tail(leg.primary_cid()),
            })
            .collect();
        Self {
            kind: kind.to_string(),
            profit_gas_token: profit.gas_token,
            profit_usd: profit.usd,
            flashloan: vec![FlashloanLog {
                token: format!("{:#x}", route.flashloan_token),
                amount: route.flashloan_amount,
                profit: route.net_profit,
            }],
            trades,
        }
    }
}

#[derive(Serialize)]
struct SuccessRecord<'a> {
    tx_hash: String,
    arb: &'a ArbLog,
}

/// Writes `successful_tx_hash_<local time>.txt` under `dir`.
pub fn write_success_record(dir: &Path, log: &ArbLog, hash: B256) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::Config(format!("logging path {} unusable: {}", dir.display(), e)))?;
    let name = chrono::Local::now()
        .format("successful_tx_hash_%Y-%m-%d_%H-%M-%S.txt")
        .to_string();
    let path = dir.join(name);
    let record = SuccessRecord {
        tx_hash: format!("{hash:#x}"),
        arb: log,
    };
    let body = serde_json::to_string_pretty(&record)
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("record encode failed: {e}")))?;
    fs::write(&path, body)
        .map_err(|e| AppError::Config(format!("record {} write failed: {}", path.display(), e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::strategy::planning::aggregation::{LegPart, PlannedLeg};
    use alloy::primitives::Address;
    use rust_decimal_macros::dec;

    fn route() -> AssembledRoute {
        AssembledRoute {
            flashloan_token: Address::repeat_byte(1),
            flashloan_decimals: 18,
            flashloan_amount: dec!(10),
            flashloan_fee: Decimal::ZERO,
            tx_in_count: 1,
            legs: vec![PlannedLeg {
                exchange_name: "uniswap_v2".into(),
                tknin: Address::repeat_byte(1),
                tknout: Address::repeat_byte(2),
                tknin_decimals: 18,
                tknout_decimals: 18,
                amtin: dec!(10),
                amtout: dec!(20),
                parts: vec![LegPart {
                    cid: "0x1234567890abcdef".into(),
                    strategy_id: None,
                    amtin: dec!(10),
                    amtout: dec!(20),
                }],
            }],
            gross_profit: dec!(1),
            net_profit: dec!(1),
        }
    }

    #[test]
    fn log_uses_short_pool_ids_and_type_key() {
        let profit = ProfitReport {
            flashloan_token: dec!(1),
            gas_token: dec!(0.5),
            usd: None,
        };
        let log = ArbLog::from_route("b3_two_hop", &route(), &profit);
        assert_eq!(log.trades[0].cid0, "7890abcdef");
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["type"], "b3_two_hop");
        assert!(json["profit_usd"].is_null());
    }

    #[test]
    fn success_record_lands_in_logging_dir() {
        let dir = std::env::temp_dir().join(format!("flashroute-records-{}", std::process::id()));
        let profit = ProfitReport {
            flashloan_token: dec!(1),
            gas_token: dec!(1),
            usd: Some(dec!(2500)),
        };
        let log = ArbLog::from_route("multi", &route(), &profit);
        let path = write_success_record(&dir, &log, B256::repeat_byte(0xab)).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("successful_tx_hash_") && name.ends_with(".txt"));
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("0xabab"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
