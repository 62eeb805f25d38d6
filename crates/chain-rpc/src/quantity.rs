//! Hex quantity and byte-string helpers.
//!
//! Node responses encode numbers as `0x`-prefixed hex. A missing or
//! malformed value decodes to `None` ("unknown"), never to zero.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::RpcError;

/// Parses a hex quantity such as `"0x1a"`.
pub fn parse_quantity(value: &str) -> Option<U256> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    U256::from_str_radix(digits, 16).ok()
}

pub fn parse_quantity_u64(value: &str) -> Option<u64> {
    parse_quantity(value).and_then(|v| u64::try_from(v).ok())
}

/// Encodes a number as a minimal hex quantity (`0x0` for zero).
pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

pub fn to_quantity_u64(value: u64) -> String {
    format!("0x{value:x}")
}

/// Encodes bytes as `0x`-prefixed hex data. Empty data is `"0x"`.
pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes `0x`-prefixed hex data.
pub fn from_hex_data(value: &str) -> Result<Vec<u8>, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| RpcError::Decode(format!("invalid hex data: {e}")))
}

/// Serde adapter for optional quantity fields: anything that is not a
/// well-formed hex string becomes `None`.
pub fn deserialize_opt_quantity<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_quantity))
}

/// Like [`deserialize_opt_quantity`] for a list of quantities, keeping
/// unparseable entries as `None` so positions are preserved.
pub fn deserialize_quantity_list<'de, D>(deserializer: D) -> Result<Vec<Option<U256>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .iter()
        .map(|v| v.as_str().and_then(parse_quantity))
        .collect())
}
