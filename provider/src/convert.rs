//! RPC parameter conversions
//!
//! Helpers translating between the hex-quantity conventions of Ethereum
//! JSON-RPC and the decimal-friendly types the gateway expects.

use primitive_types::U256;
use serde_json::Value;

use okto_client::RawTransaction;

use crate::error::ProviderError;

/// Render a chain id (or any quantity) as a 0x-prefixed hex string.
pub fn number_to_hex(n: u64) -> String {
    format!("0x{n:x}")
}

/// Parse a chain id from the shapes wallet frameworks send:
/// a bare number, a decimal or 0x-hex string, or the EIP-3326 object form
/// `{ "chainId": "0x89" }`.
pub fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_u64(s),
        Value::Object(map) => map.get("chainId").and_then(parse_chain_id),
        _ => None,
    }
}

fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Parse a wei quantity from a decimal or 0x-hex string.
pub fn parse_quantity(s: &str) -> Option<U256> {
    match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(s).ok(),
    }
}

/// An `eth_sendTransaction` object after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTransaction {
    pub transaction: RawTransaction,
    /// Gas limit supplied by the caller, decoded from hex when necessary.
    /// The gateway estimates gas itself; this is carried for logging only.
    pub gas: Option<u64>,
}

/// Normalize a raw `eth_sendTransaction` parameter object.
///
/// `value` defaults to `"0"` and `data` to `"0x"` - callers like viem send
/// those fields explicitly set to null. Hex gas strings become integers and
/// string values become 256-bit integers.
pub fn normalize_transaction(params: &Value) -> Result<NormalizedTransaction, ProviderError> {
    let object = params
        .as_object()
        .ok_or_else(|| ProviderError::InvalidParams("transaction must be an object".into()))?;

    let from = object
        .get("from")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::InvalidParams("missing \"from\" address".into()))?
        .to_string();
    let to = object
        .get("to")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::InvalidParams("missing \"to\" address".into()))?
        .to_string();

    let data = match object.get("data") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "0x".to_string(),
        Some(other) => {
            return Err(ProviderError::InvalidParams(format!(
                "unexpected \"data\" field: {other}"
            )))
        }
    };

    let value = match object.get("value") {
        Some(Value::String(s)) => parse_quantity(s)
            .ok_or_else(|| ProviderError::InvalidParams(format!("unparseable value: {s}")))?,
        Some(Value::Number(n)) => U256::from(
            n.as_u64()
                .ok_or_else(|| ProviderError::InvalidParams(format!("unparseable value: {n}")))?,
        ),
        Some(Value::Null) | None => U256::zero(),
        Some(other) => {
            return Err(ProviderError::InvalidParams(format!(
                "unexpected \"value\" field: {other}"
            )))
        }
    };

    let gas = match object.get("gas") {
        Some(Value::String(s)) => Some(parse_u64(s).ok_or_else(|| {
            ProviderError::InvalidParams(format!("unparseable gas: {s}"))
        })?),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    };

    Ok(NormalizedTransaction {
        transaction: RawTransaction {
            from,
            to,
            data,
            value,
        },
        gas,
    })
}
