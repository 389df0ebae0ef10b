// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::SOURCE_LEG_SCALING_FACTOR;
use crate::domain::trade::TradeLeg;
use alloy::primitives::Address;

/// Legs spending the flashloan token, then unrelated legs, then legs paying
/// it back. Order inside each block is preserved. Returns the reordered legs
/// and the size of the first block.
pub fn order_by_source_token(legs: &[TradeLeg], flashloan_token: Address) -> (Vec<TradeLeg>, usize) {
    let spending: Vec<TradeLeg> = legs
        .iter()
        .filter(|l| l.tknin == flashloan_token)
        .cloned()
        .collect();
    let middle = legs
        .iter()
        .filter(|l| l.tknin != flashloan_token && l.tknout != flashloan_token);
    let closing = legs.iter().filter(|l| l.tknout == flashloan_token);

    let tx_in_count = spending.len();
    let mut ordered = spending;
    ordered.extend(middle.cloned());
    ordered.extend(closing.cloned());
    (ordered, tx_in_count)
}

/// Applies the source-leg safety factor to every leg spending the flashloan
/// token. Call once per assembled route.
pub fn scale_source_legs(legs: &mut [TradeLeg], flashloan_token: Address) {
    for leg in legs.iter_mut().filter(|l| l.tknin == flashloan_token) {
        leg.amtin *= SOURCE_LEG_SCALING_FACTOR;
    }
}
