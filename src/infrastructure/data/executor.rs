// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::route::{FlashloanStruct, RouteStruct};
use alloy::primitives::U256;
use alloy::sol;

sol! {
    #[derive(Debug, PartialEq)]
    struct Route {
        uint16 platformId;
        address sourceToken;
        address targetToken;
        uint256 sourceAmount;
        uint256 minTargetAmount;
        uint256 deadline;
        address customAddress;
        uint256 customInt;
        bytes customData;
    }

    #[derive(Debug, PartialEq)]
    struct Flashloan {
        uint16 platformId;
        address[] sourceTokens;
        uint256[] sourceAmounts;
    }

    // Carbon trade-by-source action, packed into Route.customData
    #[derive(Debug, PartialEq)]
    struct TradeAction {
        uint256 strategyId;
        uint128 amount;
    }

    interface ArbitrageExecutor {
        function fundAndArb(Route[] calldata routes, address token, uint256 sourceAmount) external payable;
        function flashloanAndArb(Route[] calldata routes, address token, uint256 sourceAmount) external;
        function flashloanAndArbV2(Flashloan[] calldata flashloans, Route[] calldata routes) external;

        error InvalidFlashloan();
        error InsufficientProfit();
        error DeadlineExpired();
    }

    #[sol(rpc)]
    interface GasPriceOracle {
        function getL1Fee(bytes memory data) external view returns (uint256);
    }
}

impl From<&RouteStruct> for Route {
    fn from(r: &RouteStruct) -> Self {
        Route {
            platformId: r.platform_id,
            sourceToken: r.source_token,
            targetToken: r.target_token,
            sourceAmount: r.source_amount,
            minTargetAmount: r.min_target_amount,
            deadline: r.deadline,
            customAddress: r.custom_address,
            customInt: r.custom_int,
            customData: r.custom_data.clone(),
        }
    }
}

/// Groups loans by platform so each platform is called once.
pub fn flashloans_for(structs: &[FlashloanStruct]) -> Vec<Flashloan> {
    let mut out: Vec<Flashloan> = Vec::new();
    for fl in structs {
        match out.iter_mut().find(|f| f.platformId == fl.platform_id) {
            Some(existing) => {
                existing.sourceTokens.push(fl.token);
                existing.sourceAmounts.push(fl.amount);
            }
            None => out.push(Flashloan {
                platformId: fl.platform_id,
                sourceTokens: vec![fl.token],
                sourceAmounts: vec![fl.amount],
            }),
        }
    }
    out
}

pub fn routes_for(structs: &[RouteStruct]) -> Vec<Route> {
    structs.iter().map(Route::from).collect()
}

pub fn trade_action(strategy_id: U256, amount: u128) -> TradeAction {
    TradeAction {
        strategyId: strategy_id,
        amount,
    }
}
