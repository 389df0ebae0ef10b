// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::constants::TENDERLY_FORK_RPC_PREFIX;
use crate::domain::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }

    /// Accepts a full fork RPC URL or a bare Tenderly fork id.
    pub fn fork_url(fork: &str) -> String {
        let fork = fork.trim();
        if fork.starts_with("http://") || fork.starts_with("https://") {
            fork.to_string()
        } else {
            format!("{TENDERLY_FORK_RPC_PREFIX}{fork}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_fork_id_expands_to_tenderly_rpc() {
        assert_eq!(
            ConnectionFactory::fork_url("9f3c-11"),
            "https://rpc.tenderly.co/fork/9f3c-11"
        );
        assert_eq!(
            ConnectionFactory::fork_url("http://127.0.0.1:8545"),
            "http://127.0.0.1:8545"
        );
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        assert!(matches!(
            ConnectionFactory::http("not a url"),
            Err(AppError::Config(_))
        ));
    }
}
