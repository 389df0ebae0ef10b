// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::trade::Opportunity;
use rand::Rng;

/// Sorts by profit (descending) and picks uniformly among the top `top_n`.
///
/// `top_n` is clamped to `[1, len]`, so `0` means "always the best one".
pub fn select(opportunities: Vec<Opportunity>, top_n: usize) -> Option<Opportunity> {
    select_with(opportunities, top_n, &mut rand::thread_rng())
}

pub fn select_with<R: Rng + ?Sized>(
    mut opportunities: Vec<Opportunity>,
    top_n: usize,
    rng: &mut R,
) -> Option<Opportunity> {
    if opportunities.is_empty() {
        return None;
    }
    opportunities.sort_by(|a, b| b.profit.cmp(&a.profit));
    let n = top_n.clamp(1, opportunities.len());
    let idx = rng.gen_range(0..n);
    Some(opportunities.swap_remove(idx))
}
