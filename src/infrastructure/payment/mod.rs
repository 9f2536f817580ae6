//! On-chain payment verification
//!
//! Reads the G$ token balance of a wallet through a public JSON-RPC
//! endpoint (`eth_call` on `balanceOf`). Every check is a fresh round trip;
//! there is no retry, caching, or rate limiting.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::traits::PaymentChecker;
use crate::application::errors::PaymentError;

/// Function selector for `balanceOf(address)`
const BALANCE_OF_SELECTOR: &str = "70a08231";

/// Token decimals; balances come back scaled by 10^18
const TOKEN_DECIMALS: i32 = 18;

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: (CallParams, &'static str),
}

#[derive(Serialize)]
struct CallParams {
    to: String,
    data: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Payment checker backed by a Celo JSON-RPC endpoint
pub struct CeloRpcChecker {
    client: Client,
    rpc_endpoint: String,
    token_contract: String,
}

impl CeloRpcChecker {
    pub fn new(
        rpc_endpoint: impl Into<String>,
        token_contract: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        Ok(Self {
            client,
            rpc_endpoint: rpc_endpoint.into(),
            token_contract: token_contract.into(),
        })
    }

    /// Fetch the raw balance in smallest units
    async fn fetch_balance(&self, address: &str) -> Result<u128, PaymentError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (
                CallParams {
                    to: self.token_contract.clone(),
                    data: balance_of_calldata(address)?,
                },
                "latest",
            ),
        };

        let response = self.client
            .post(&self.rpc_endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Network(format!(
                "RPC endpoint returned {}",
                response.status()
            )));
        }

        let data: RpcResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        if let Some(err) = data.error {
            return Err(PaymentError::Rpc(format!("{} (code {})", err.message, err.code)));
        }

        let result = data
            .result
            .ok_or_else(|| PaymentError::Parse("response carried neither result nor error".to_string()))?;

        decode_balance(&result)
    }
}

#[async_trait]
impl PaymentChecker for CeloRpcChecker {
    async fn check_payment(&self, address: &str, min_amount: f64) -> Result<bool, PaymentError> {
        let balance = self.fetch_balance(address).await?;
        tracing::debug!("Balance for {}: {} smallest units", address, balance);
        Ok(meets_threshold(balance, min_amount))
    }
}

/// ABI-encode a `balanceOf(address)` call: selector plus the address
/// left-padded to 32 bytes
fn balance_of_calldata(address: &str) -> Result<String, PaymentError> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| PaymentError::InvalidAddress(address.to_string()))?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PaymentError::InvalidAddress(address.to_string()));
    }

    Ok(format!("0x{}{:0>64}", BALANCE_OF_SELECTOR, hex.to_lowercase()))
}

/// Decode the 32-byte big-endian integer an `eth_call` returns
fn decode_balance(result: &str) -> Result<u128, PaymentError> {
    let hex = result.strip_prefix("0x").unwrap_or(result);
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PaymentError::Parse(format!("malformed balance: {:?}", result)));
    }

    let digits = hex.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    if digits.len() > 32 {
        // Past u128 the balance clears any realistic threshold anyway
        return Ok(u128::MAX);
    }

    u128::from_str_radix(digits, 16)
        .map_err(|e| PaymentError::Parse(format!("malformed balance {:?}: {}", result, e)))
}

/// Whether a raw balance meets a whole-token threshold. The threshold is
/// converted to smallest units so the comparison happens in integers.
fn meets_threshold(balance: u128, min_amount: f64) -> bool {
    balance >= (min_amount * 10f64.powi(TOKEN_DECIMALS)) as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calldata_pads_address_to_32_bytes() {
        let data = balance_of_calldata("0xE4C4cF3cB472F1417924C73Ff98fB7059A93D692").unwrap();
        assert_eq!(
            data,
            "0x70a08231000000000000000000000000e4c4cf3cb472f1417924c73ff98fb7059a93d692"
        );
        // 0x + 4-byte selector + 32-byte argument
        assert_eq!(data.len(), 2 + 8 + 64);
    }

    #[test]
    fn malformed_addresses_are_rejected_before_any_network_call() {
        assert!(matches!(
            balance_of_calldata("not-an-address"),
            Err(PaymentError::InvalidAddress(_))
        ));
        assert!(matches!(
            balance_of_calldata("0x1234"),
            Err(PaymentError::InvalidAddress(_))
        ));
        assert!(matches!(
            balance_of_calldata("0xZZC4cF3cB472F1417924C73Ff98fB7059A93D692"),
            Err(PaymentError::InvalidAddress(_))
        ));
    }

    #[test]
    fn decodes_zero_and_full_width_balances() {
        let zero = "0x0000000000000000000000000000000000000000000000000000000000000000";
        assert_eq!(decode_balance(zero).unwrap(), 0);

        // 2 * 10^18
        let two = "0x0000000000000000000000000000000000000000000000001bc16d674ec80000";
        assert_eq!(decode_balance(two).unwrap(), 2_000_000_000_000_000_000);
    }

    #[test]
    fn oversized_balance_saturates() {
        let huge = format!("0x{}", "f".repeat(64));
        assert_eq!(decode_balance(&huge).unwrap(), u128::MAX);
    }

    #[test]
    fn garbage_result_is_a_parse_error() {
        assert!(matches!(decode_balance("0xnope"), Err(PaymentError::Parse(_))));
        assert!(matches!(decode_balance(""), Err(PaymentError::Parse(_))));
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let one_token: u128 = 1_000_000_000_000_000_000;

        assert!(meets_threshold(one_token, 1.0));
        assert!(!meets_threshold(one_token - 1, 1.0));
        assert!(meets_threshold(2 * one_token, 1.0));
        assert!(!meets_threshold(0, 1.0));
        assert!(meets_threshold(u128::MAX, 1.0));
    }

    #[test]
    fn fractional_thresholds_scale() {
        assert!(meets_threshold(500_000_000_000_000_000, 0.5));
        assert!(!meets_threshold(499_999_999_999_999_999, 0.5));
    }

    #[tokio::test]
    async fn check_payment_rejects_bad_address_without_reaching_the_network() {
        // Unroutable endpoint; the address error must fire first
        let checker = CeloRpcChecker::new(
            "http://127.0.0.1:1",
            "0xE4C4cF3cB472F1417924C73Ff98fB7059A93D692",
            Duration::from_millis(100),
        )
        .unwrap();

        let err = checker.check_payment("definitely-not-hex", 1.0).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAddress(_)));
    }
}
