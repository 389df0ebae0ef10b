// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::BASE_FEE_FIELD_MARKER;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_address(raw: &str) -> Result<Address, AppError> {
    let trimmed = raw.trim();
    Address::from_str(strip_0x(trimmed)).map_err(|_| AppError::InvalidAddress(trimmed.to_string()))
}

/// Accepts comma and/or whitespace separated addresses.
pub fn parse_address_list(raw: &str) -> Result<Vec<Address>, AppError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(parse_address)
        .collect()
}

/// Pulls the integer following `baseFee:` out of a node error message.
///
/// Nodes report e.g. `max fee per gas less than block base fee: address 0x..,
/// maxFeePerGas: 10 baseFee: 27455112404`.
pub fn parse_base_fee_from_error(message: &str) -> Option<u128> {
    let (_, tail) = message.split_once(BASE_FEE_FIELD_MARKER)?;
    let digits: String = tail
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fee_is_extracted_from_node_message() {
        let msg = "server returned an error response: error code -32000: max fee per gas less than block base fee: address 0x1, maxFeePerGas: 10 baseFee: 27455112404 (supplied gas 300000)";
        assert_eq!(parse_base_fee_from_error(msg), Some(27_455_112_404));
        assert_eq!(parse_base_fee_from_error("nonce too low"), None);
        assert_eq!(parse_base_fee_from_error("baseFee: none"), None);
    }

    #[test]
    fn address_lists_accept_mixed_separators() {
        let list = parse_address_list(
            "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2, 0X6B175474E89094C44Da98b954EedeAC495271d0F",
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert!(matches!(
            parse_address_list("0x12,nothex"),
            Err(AppError::InvalidAddress(_))
        ));
    }
}
