// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::BANCOR_V3_NAME;
use crate::domain::pool::ExchangeCatalog;
use crate::domain::trade::TradeLeg;
use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::Serialize;

/// One pool's share of a planned leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegPart {
    pub cid: String,
    pub strategy_id: Option<String>,
    pub amtin: Decimal,
    pub amtout: Decimal,
}

/// A leg as it will be executed: one on-chain call, possibly spanning
/// several pools of the same exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedLeg {
    pub exchange_name: String,
    pub tknin: Address,
    pub tknout: Address,
    pub tknin_decimals: u8,
    pub tknout_decimals: u8,
    pub amtin: Decimal,
    pub amtout: Decimal,
    pub parts: Vec<LegPart>,
}

impl PlannedLeg {
    pub fn from_leg(leg: &TradeLeg) -> Self {
        let amtout = leg.amtout.unwrap_or_default();
        Self {
            exchange_name: leg.exchange_name.clone(),
            tknin: leg.tknin,
            tknout: leg.tknout,
            tknin_decimals: leg.tknin_decimals,
            tknout_decimals: leg.tknout_decimals,
            amtin: leg.amtin,
            amtout,
            parts: vec![LegPart {
                cid: leg.cid.clone(),
                strategy_id: leg.strategy_id.clone(),
                amtin: leg.amtin,
                amtout,
            }],
        }
    }

    pub fn primary_cid(&self) -> &str {
        self.parts.first().map(|p| p.cid.as_str()).unwrap_or_default()
    }

    pub fn is_aggregated(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Folds order-book legs of the same exchange and direction into one leg
/// that sits where the first of them was. Other legs keep their position.
pub fn merge_segmented_legs(legs: &[TradeLeg], catalog: &ExchangeCatalog) -> Vec<PlannedLeg> {
    let mut out: Vec<PlannedLeg> = Vec::with_capacity(legs.len());
    if !legs.iter().any(TradeLeg::is_segmented) {
        out.extend(legs.iter().map(PlannedLeg::from_leg));
        return out;
    }

    for leg in legs {
        let mergeable = leg.is_segmented() || catalog.is_carbon(&leg.exchange_name);
        let existing = out.iter_mut().find(|p| {
            mergeable
                && p.exchange_name == leg.exchange_name
                && p.tknin == leg.tknin
                && p.tknout == leg.tknout
        });
        match existing {
            Some(group) => {
                let planned = PlannedLeg::from_leg(leg);
                group.amtin += planned.amtin;
                group.amtout += planned.amtout;
                group.parts.extend(planned.parts);
            }
            None => out.push(PlannedLeg::from_leg(leg)),
        }
    }
    out
}

/// Chains consecutive Bancor V3 hops (`A→B`, `B→C`) into one `A→C` call.
/// Run after outputs are known.
pub fn merge_bancor_v3_legs(legs: Vec<PlannedLeg>) -> Vec<PlannedLeg> {
    let mut out: Vec<PlannedLeg> = Vec::with_capacity(legs.len());
    for leg in legs {
        if let Some(prev) = out.last_mut() {
            if prev.exchange_name == BANCOR_V3_NAME
                && leg.exchange_name == BANCOR_V3_NAME
                && prev.tknout == leg.tknin
            {
                prev.tknout = leg.tknout;
                prev.tknout_decimals = leg.tknout_decimals;
                prev.amtout = leg.amtout;
                prev.parts.extend(leg.parts);
                continue;
            }
        }
        out.push(leg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(cid: &str, exchange: &str, tin: u8, tout: u8, amt: Decimal) -> TradeLeg {
        TradeLeg {
            cid: cid.to_string(),
            tknin: Address::repeat_byte(tin),
            tknout: Address::repeat_byte(tout),
            amtin: amt,
            amtout: Some(amt * dec!(2)),
            tknin_decimals: 18,
            tknout_decimals: 6,
            exchange_name: exchange.to_string(),
            strategy_id: Some(cid.split('-').next().unwrap_or_default().to_string()),
        }
    }

    #[test]
    fn carbon_legs_merge_at_first_position() {
        let catalog = ExchangeCatalog::default();
        let legs = vec![
            leg("11-0", "carbon_v1", 1, 2, dec!(3)),
            leg("0xuni", "uniswap_v2", 2, 3, dec!(6)),
            leg("12-1", "carbon_v1", 1, 2, dec!(4)),
            leg("0xsushi", "sushiswap_v2", 3, 1, dec!(5)),
        ];
        let planned = merge_segmented_legs(&legs, &catalog);
        assert_eq!(planned.len(), 3);
        assert_eq!(planned[0].amtin, dec!(7));
        assert_eq!(planned[0].amtout, dec!(14));
        assert_eq!(planned[0].parts.len(), 2);
        assert_eq!(planned[1].primary_cid(), "0xuni");
        assert_eq!(planned[2].primary_cid(), "0xsushi");
    }

    #[test]
    fn opposite_directions_stay_apart() {
        let catalog = ExchangeCatalog::default();
        let legs = vec![
            leg("11-0", "carbon_v1", 1, 2, dec!(3)),
            leg("12-1", "carbon_v1", 2, 1, dec!(4)),
        ];
        assert_eq!(merge_segmented_legs(&legs, &catalog).len(), 2);
    }

    #[test]
    fn bancor_v3_hops_chain() {
        let catalog = ExchangeCatalog::default();
        let legs = vec![
            leg("0xa", "bancor_v3", 1, 2, dec!(1)),
            leg("0xb", "bancor_v3", 2, 3, dec!(2)),
            leg("0xc", "uniswap_v2", 3, 1, dec!(4)),
        ];
        let planned = merge_bancor_v3_legs(merge_segmented_legs(&legs, &catalog));
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].tknin, Address::repeat_byte(1));
        assert_eq!(planned[0].tknout, Address::repeat_byte(3));
        assert_eq!(planned[0].amtin, dec!(1));
        assert_eq!(planned[0].amtout, dec!(4));
    }
}
