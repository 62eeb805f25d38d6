use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RpcError;
use crate::transport::RpcTransport;

/// Typed wrapper over a shared transport handle.
#[derive(Debug, Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Calls `method` and deserializes the result. Use `Option<T>` for
    /// methods that legitimately return `null`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let value = self.transport.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Decode(format!("{method}: {e}")))
    }

    /// Like [`RpcClient::call`] but treats a `null` result as
    /// [`RpcError::EmptyResult`].
    pub async fn call_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let value: Option<T> = self.call(method, params).await?;
        value.ok_or_else(|| RpcError::EmptyResult(method.to_string()))
    }
}
