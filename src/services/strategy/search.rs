// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::domain::trade::Opportunity;
use crate::services::strategy::pricing::CurveContainer;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Route-search families understood by the external finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbMode {
    SinglePairwise,
    MultiPairwise,
    TriangleSingle,
    TriangleMulti,
    BancorV3TwoHop,
    MultiPairwisePol,
    MultiPairwiseAll,
}

impl ArbMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArbMode::SinglePairwise => "single",
            ArbMode::MultiPairwise => "multi",
            ArbMode::TriangleSingle => "triangle",
            ArbMode::TriangleMulti => "multi_triangle",
            ArbMode::BancorV3TwoHop => "b3_two_hop",
            ArbMode::MultiPairwisePol => "multi_pairwise_pol",
            ArbMode::MultiPairwiseAll => "multi_pairwise_all",
        }
    }

    /// Modes whose small fixed topology has a closed-form optimum.
    pub fn is_math_validated(&self) -> bool {
        matches!(self, ArbMode::BancorV3TwoHop)
    }
}

impl FromStr for ArbMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" | "pairwise_single" => Ok(ArbMode::SinglePairwise),
            "multi" | "pairwise_multi" => Ok(ArbMode::MultiPairwise),
            "triangle" | "triangle_single" => Ok(ArbMode::TriangleSingle),
            "multi_triangle" | "triangle_multi" => Ok(ArbMode::TriangleMulti),
            "b3_two_hop" | "bancor_v3" => Ok(ArbMode::BancorV3TwoHop),
            "multi_pairwise_pol" => Ok(ArbMode::MultiPairwisePol),
            "multi_pairwise_all" => Ok(ArbMode::MultiPairwiseAll),
            other => Err(AppError::Config(format!("unknown arb mode `{other}`"))),
        }
    }
}

impl fmt::Display for ArbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Only the single most profitable route.
    Best,
    /// Every profitable candidate, for randomized selection.
    Candidates,
    /// The token universe and pair combinations the search would cover.
    Tokens,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinderOutput {
    Candidates(Vec<Opportunity>),
    Tokens {
        tokens: Vec<Address>,
        combos: Vec<(Address, Address)>,
    },
}

/// External route-search capability.
#[async_trait]
pub trait RouteFinder: Send + Sync {
    async fn find(
        &self,
        flashloan_tokens: &[Address],
        curves: &CurveContainer,
        mode: ArbMode,
        kind: ResultKind,
    ) -> Result<FinderOutput, AppError>;
}
