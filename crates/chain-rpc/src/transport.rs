//! JSON-RPC transports.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::RpcError;

/// Sends one JSON-RPC request and returns the raw `result` value.
///
/// A `null` result is returned as [`Value::Null`]; interpreting it is up to
/// the caller (a pending receipt is `null`, a missing fee history is an
/// error).
#[async_trait]
pub trait RpcTransport: Send + Sync + fmt::Debug {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// HTTP JSON-RPC transport backed by `reqwest`.
#[derive(Debug)]
pub struct HttpTransport {
    /// HTTP client used for RPC calls.
    client: reqwest::Client,
    /// Target JSON-RPC endpoint URL.
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Config`] when HTTP client creation fails.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RpcError::Config(error.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// Result value for successful calls.
    #[serde(default)]
    result: Value,
    /// Error payload for failed calls.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

fn map_reqwest(error: reqwest::Error) -> RpcError {
    if error.is_timeout() {
        RpcError::Timeout
    } else {
        RpcError::Transport(error.to_string())
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, url = %self.url, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(map_reqwest)?
            .error_for_status()
            .map_err(map_reqwest)?;

        let parsed: JsonRpcResponse = response.json().await.map_err(map_reqwest)?;

        if let Some(error) = parsed.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(parsed.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_result() {
        let parsed: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#).unwrap();
        assert_eq!(parsed.result, Value::String("0x1".into()));
        assert!(parsed.error.is_none());
    }

    #[test]
    fn envelope_with_null_result() {
        let parsed: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert!(parsed.result.is_null());
    }

    #[test]
    fn envelope_with_error() {
        let parsed: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        let error = parsed.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "method not found");
    }

    #[test]
    fn builds_with_timeout() {
        let transport = HttpTransport::new("http://127.0.0.1:8545", Duration::from_secs(3)).unwrap();
        assert_eq!(transport.url(), "http://127.0.0.1:8545");
    }
}
