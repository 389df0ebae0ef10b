// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::domain::trade::Opportunity;
use crate::services::strategy::pricing::CurveContainer;
use crate::services::strategy::search::{ArbMode, FinderOutput, ResultKind, RouteFinder};
use alloy::primitives::Address;
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads candidate routes dumped by an external search process.
///
/// The file holds a JSON array of opportunities. It is re-read on every call
/// so the searcher can overwrite it between passes.
pub struct FileRouteFinder {
    path: PathBuf,
}

impl FileRouteFinder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Vec<Opportunity>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Config(format!(
                    "candidate file {} read failed: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!(
                "candidate file {} parse failed: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl RouteFinder for FileRouteFinder {
    async fn find(
        &self,
        flashloan_tokens: &[Address],
        curves: &CurveContainer,
        mode: ArbMode,
        kind: ResultKind,
    ) -> Result<FinderOutput, AppError> {
        let mut candidates: Vec<Opportunity> = self
            .load()
            .await?
            .into_iter()
            .filter(|o| flashloan_tokens.is_empty() || flashloan_tokens.contains(&o.flashloan_token))
            .collect();
        tracing::debug!(
            target: "search",
            %mode,
            candidates = candidates.len(),
            curves = curves.len(),
            "Candidate routes loaded"
        );

        match kind {
            ResultKind::Candidates => Ok(FinderOutput::Candidates(candidates)),
            ResultKind::Best => {
                candidates.sort_by(|a, b| b.profit.cmp(&a.profit));
                candidates.truncate(1);
                Ok(FinderOutput::Candidates(candidates))
            }
            ResultKind::Tokens => {
                let tokens = curves.tokens();
                let sources: Vec<Address> = if flashloan_tokens.is_empty() {
                    tokens.clone()
                } else {
                    flashloan_tokens.to_vec()
                };
                let combos = sources
                    .iter()
                    .flat_map(|s| tokens.iter().filter(move |t| *t != s).map(move |t| (*s, *t)))
                    .collect();
                Ok(FinderOutput::Tokens { tokens, combos })
            }
        }
    }
}
