// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::SEGMENT_SEPARATOR;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Splits `1234-1` into (`1234`, 1). Returns `None` for plain pool ids.
pub fn split_segment(cid: &str) -> Option<(&str, usize)> {
    let (base, suffix) = cid.rsplit_once(SEGMENT_SEPARATOR)?;
    let idx = suffix.parse::<usize>().ok()?;
    (idx < 2).then_some((base, idx))
}

/// One swap against one pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLeg {
    /// Pool id. A `-0`/`-1` suffix selects one order of a segmented pool.
    pub cid: String,
    pub tknin: Address,
    pub tknout: Address,
    pub amtin: Decimal,
    #[serde(default)]
    pub amtout: Option<Decimal>,
    #[serde(default = "default_decimals")]
    pub tknin_decimals: u8,
    #[serde(default = "default_decimals")]
    pub tknout_decimals: u8,
    pub exchange_name: String,
    #[serde(default)]
    pub strategy_id: Option<String>,
}

fn default_decimals() -> u8 {
    18
}

impl TradeLeg {
    pub fn is_segmented(&self) -> bool {
        self.cid.contains(SEGMENT_SEPARATOR)
    }

    pub fn segment(&self) -> Option<(&str, usize)> {
        split_segment(&self.cid)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.tknin == self.tknout {
            return Err(AppError::validation(
                "tknin",
                format!("leg {} swaps {} into itself", self.cid, self.tknin),
            ));
        }
        if self.amtin.is_sign_negative() {
            return Err(AppError::validation(
                "amtin",
                format!("leg {} has negative input {}", self.cid, self.amtin),
            ));
        }
        if let Some(out) = self.amtout {
            if out.is_sign_negative() {
                return Err(AppError::validation(
                    "amtout",
                    format!("leg {} has negative output {}", self.cid, out),
                ));
            }
        }
        Ok(())
    }
}

/// A candidate route as handed over by the route search.
///
/// `profit` is in flashloan-token units and only advisory until the route is
/// reassembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub profit: Decimal,
    pub flashloan_token: Address,
    pub legs: Vec<TradeLeg>,
}

impl Opportunity {
    pub fn new(
        profit: Decimal,
        flashloan_token: Address,
        legs: Vec<TradeLeg>,
    ) -> Result<Self, AppError> {
        let opp = Self {
            profit,
            flashloan_token,
            legs,
        };
        opp.validate()?;
        Ok(opp)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.legs.is_empty() {
            return Err(AppError::validation("legs", "opportunity has no legs"));
        }
        self.legs.iter().try_for_each(TradeLeg::validate)
    }

    pub fn cids(&self) -> Vec<&str> {
        self.legs.iter().map(|l| l.cid.as_str()).collect()
    }

    pub fn has_segmented_leg(&self) -> bool {
        self.legs.iter().any(TradeLeg::is_segmented)
    }

    /// Tabular rendering for debug logs.
    pub fn table(&self) -> String {
        let mut out = String::from("idx | cid | exchange | tknin -> tknout | amtin | amtout\n");
        for (i, leg) in self.legs.iter().enumerate() {
            let amtout = leg
                .amtout
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{i} | {} | {} | {:#x} -> {:#x} | {} | {}",
                leg.cid, leg.exchange_name, leg.tknin, leg.tknout, leg.amtin, amtout
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use rust_decimal_macros::dec;

    fn leg(cid: &str) -> TradeLeg {
        TradeLeg {
            cid: cid.to_string(),
            tknin: address!("0000000000000000000000000000000000000001"),
            tknout: address!("0000000000000000000000000000000000000002"),
            amtin: dec!(1),
            amtout: None,
            tknin_decimals: 18,
            tknout_decimals: 6,
            exchange_name: "carbon_v1".to_string(),
            strategy_id: None,
        }
    }

    #[test]
    fn segment_suffix_is_parsed() {
        assert_eq!(leg("340282366920938463463374607431768211457-1").segment().map(|s| s.1), Some(1));
        assert!(leg("0xabc").segment().is_none());
        assert!(!leg("0xabc").is_segmented());
    }

    #[test]
    fn self_swap_is_rejected() {
        let mut l = leg("a");
        l.tknout = l.tknin;
        assert!(matches!(l.validate(), Err(AppError::Validation { .. })));
    }

    #[test]
    fn negative_output_is_rejected() {
        let mut l = leg("a");
        l.amtout = Some(dec!(-0.1));
        assert!(l.validate().is_err());
    }
}
