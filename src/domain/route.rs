// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use serde::Serialize;

/// Loan taken for one source token of an executed route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlashloanStruct {
    pub platform_id: u16,
    pub token: Address,
    /// Smallest-unit amount borrowed.
    pub amount: U256,
    /// Fee owed to the lender, in token units.
    pub fee: Decimal,
}

/// Per-leg execution record consumed by the executor contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStruct {
    pub platform_id: u16,
    pub source_token: Address,
    pub target_token: Address,
    /// Zero means "spend the whole balance".
    pub source_amount: U256,
    pub min_target_amount: U256,
    pub deadline: U256,
    pub custom_address: Address,
    pub custom_int: U256,
    pub custom_data: Bytes,
}

/// Keep only the last route spending each token on a full-balance amount.
pub fn maximize_last_route_per_token(routes: &mut [RouteStruct]) {
    let mut seen: Vec<Address> = Vec::new();
    for route in routes.iter_mut().rev() {
        if !seen.contains(&route.source_token) {
            seen.push(route.source_token);
            route.source_amount = U256::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn route(src: Address, amount: u64) -> RouteStruct {
        RouteStruct {
            platform_id: 3,
            source_token: src,
            target_token: Address::ZERO,
            source_amount: U256::from(amount),
            min_target_amount: U256::ZERO,
            deadline: U256::ZERO,
            custom_address: Address::ZERO,
            custom_int: U256::ZERO,
            custom_data: Bytes::new(),
        }
    }

    #[test]
    fn only_the_last_spender_per_token_is_maximized() {
        let a = address!("00000000000000000000000000000000000000aa");
        let b = address!("00000000000000000000000000000000000000bb");
        let mut routes = vec![route(a, 5), route(a, 7), route(b, 9)];
        maximize_last_route_per_token(&mut routes);
        assert_eq!(routes[0].source_amount, U256::from(5u8));
        assert_eq!(routes[1].source_amount, U256::ZERO);
        assert_eq!(routes[2].source_amount, U256::ZERO);
    }
}
