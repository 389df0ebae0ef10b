// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::strip_0x;
use crate::domain::error::AppError;
use alloy::primitives::{B256, keccak256};
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use reqwest::header::HeaderValue;
use serde_json::{Value, json};
use std::str::FromStr;
use std::time::Duration;

const RELAY_TIMEOUT_MS: u64 = 2_500;
const RELAY_MAX_ATTEMPTS: u64 = 2;

/// JSON-RPC client for `eth_sendPrivateTransaction` relays.
pub struct PrivateRelay {
    url: String,
    signer: Option<PrivateKeySigner>,
    client: reqwest::Client,
}

impl PrivateRelay {
    pub fn new(url: String, signer: Option<PrivateKeySigner>) -> Self {
        Self {
            url,
            signer,
            client: reqwest::Client::new(),
        }
    }

    pub fn payload(raw_tx: &[u8], max_block: u64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_sendPrivateTransaction",
            "params": [{
                "tx": format!("0x{}", hex::encode(raw_tx)),
                "maxBlockNumber": format!("0x{:x}", max_block),
                "preferences": { "fast": true }
            }]
        })
    }

    pub async fn send_private_transaction(
        &self,
        raw_tx: &[u8],
        max_block: u64,
    ) -> Result<B256, AppError> {
        let body_bytes = serde_json::to_vec(&Self::payload(raw_tx, max_block))
            .map_err(|e| AppError::Initialization(e.to_string()))?;
        let sig_header = match &self.signer {
            Some(signer) => Some(Self::sign_request(signer, &body_bytes)?),
            None => None,
        };

        let mut attempts = 0u64;
        loop {
            attempts += 1;
            let mut request = self
                .client
                .post(&self.url)
                .header("Content-Type", "application/json")
                .body(body_bytes.clone())
                .timeout(Duration::from_millis(RELAY_TIMEOUT_MS));
            if let Some(sig) = &sig_header {
                request = request.header(
                    "X-Flashbots-Signature",
                    HeaderValue::from_str(sig).map_err(|e| {
                        AppError::Connection(format!("Signature header invalid: {}", e))
                    })?,
                );
            }

            let resp = match request.send().await {
                Ok(r) => r,
                Err(e) if attempts < RELAY_MAX_ATTEMPTS => {
                    tracing::warn!(target: "relay", relay = %self.url, error = %e, attempt = attempts, "Private relay POST failed, retrying");
                    continue;
                }
                Err(e) => {
                    return Err(AppError::Connection(format!("Private relay POST failed: {}", e)));
                }
            };

            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            if !status.is_success() {
                if attempts < RELAY_MAX_ATTEMPTS {
                    tracing::warn!(target: "relay", status = %status, body = %body_text, attempt = attempts, "Private relay rejected request, retrying");
                    continue;
                }
                return Err(AppError::ApiCall {
                    provider: self.url.clone(),
                    status: status.as_u16(),
                });
            }
            return Self::parse_hash(&body_text);
        }
    }

    fn parse_hash(body: &str) -> Result<B256, AppError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AppError::Connection(format!("Relay response not JSON: {}", e)))?;
        if let Some(err) = value.get("error") {
            return Err(AppError::Transaction {
                hash: String::new(),
                reason: err.to_string(),
            });
        }
        let result = value
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Connection(format!("Relay response missing result: {body}")))?;
        B256::from_str(strip_0x(result))
            .map_err(|e| AppError::Connection(format!("Relay returned bad hash {result}: {e}")))
    }

    fn sign_request(signer: &PrivateKeySigner, body_bytes: &[u8]) -> Result<String, AppError> {
        // EIP-191 signature over the hex string of keccak256(body).
        let message_hash = keccak256(body_bytes).to_string();
        let signature = signer
            .sign_message_sync(message_hash.as_bytes())
            .map_err(|e| AppError::Connection(format!("Relay signing failed: {}", e)))?;
        Ok(format!(
            "{}:0x{}",
            signer.address(),
            hex::encode(signature.as_bytes())
        ))
    }
}
