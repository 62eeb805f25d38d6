use std::sync::Arc;

use alloy_primitives::U256;
use chain_rpc::quantity::{
    deserialize_opt_quantity, deserialize_quantity_list, from_hex_data, parse_quantity,
    parse_quantity_u64, to_hex_data, to_quantity,
};
use chain_rpc::{RpcClient, RpcError, RpcTransport};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::debug;
use wallet_types::NodeStatus;

use crate::error::EthError;

/// A contract or value call as sent to `eth_estimateGas` / `eth_call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmCall {
    pub to: String,
    pub value: U256,
    pub data: Vec<u8>,
}

impl EvmCall {
    fn to_json(&self, from: Option<&str>) -> Value {
        let mut call = json!({
            "to": self.to,
            "value": to_quantity(self.value),
            "data": to_hex_data(&self.data),
        });
        if let Some(from) = from {
            call["from"] = json!(from);
        }
        call
    }
}

/// Result of `eth_feeHistory`. Unparseable entries stay `None` so columns
/// keep their positions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistory {
    #[serde(default, deserialize_with = "deserialize_quantity_list")]
    pub base_fee_per_gas: Vec<Option<U256>>,
    #[serde(default, deserialize_with = "deserialize_reward_matrix")]
    pub reward: Vec<Vec<Option<U256>>>,
}

fn deserialize_reward_matrix<'de, D>(deserializer: D) -> Result<Vec<Vec<Option<U256>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Vec<Value>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .iter()
        .map(|row| row.iter().map(|v| v.as_str().and_then(parse_quantity)).collect())
        .collect())
}

/// The receipt fields the status client needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    pub gas_used: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    pub effective_gas_price: Option<U256>,
    /// OP-stack receipts only.
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    pub l1_fee: Option<U256>,
}

/// Typed EVM JSON-RPC calls over a shared transport.
#[derive(Debug, Clone)]
pub struct EvmClient {
    rpc: RpcClient,
}

impl EvmClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            rpc: RpcClient::new(transport),
        }
    }

    pub async fn balance(&self, address: &str) -> Result<U256, EthError> {
        let raw: String = self
            .rpc
            .call_required("eth_getBalance", json!([address, "latest"]))
            .await?;
        quantity("eth_getBalance", &raw)
    }

    pub async fn nonce(&self, address: &str) -> Result<u64, EthError> {
        let raw: String = self
            .rpc
            .call_required("eth_getTransactionCount", json!([address, "latest"]))
            .await?;
        parse_quantity_u64(&raw)
            .ok_or_else(|| RpcError::Decode(format!("eth_getTransactionCount: {raw}")).into())
    }

    /// Raw node estimate, before any safety margin.
    pub async fn estimate_gas(&self, from: &str, call: &EvmCall) -> Result<U256, EthError> {
        let raw: String = self
            .rpc
            .call_required("eth_estimateGas", json!([call.to_json(Some(from))]))
            .await
            .map_err(EthError::GasEstimateUnavailable)?;
        parse_quantity(&raw)
            .ok_or_else(|| EthError::GasEstimateUnavailable(RpcError::Decode(raw)))
    }

    pub async fn fee_history(&self, blocks: u64, percentiles: &[u64]) -> Result<FeeHistory, EthError> {
        let history: Option<FeeHistory> = self
            .rpc
            .call(
                "eth_feeHistory",
                json!([format!("0x{blocks:x}"), "latest", percentiles]),
            )
            .await
            .map_err(EthError::BaseFeeUnavailable)?;
        history.ok_or_else(|| {
            EthError::BaseFeeUnavailable(RpcError::EmptyResult("eth_feeHistory".into()))
        })
    }

    /// `eth_call` against the latest block, returning the raw return data.
    pub async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, EthError> {
        let call = json!({ "to": to, "data": to_hex_data(data) });
        let raw: String = self
            .rpc
            .call_required("eth_call", json!([call, "latest"]))
            .await?;
        Ok(from_hex_data(&raw)?)
    }

    /// Submits signed bytes and returns the node-reported hash.
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, EthError> {
        let hash: String = self
            .rpc
            .call_required("eth_sendRawTransaction", json!([to_hex_data(raw_tx)]))
            .await?;
        debug!(%hash, "transaction submitted");
        Ok(hash)
    }

    /// `None` while the transaction is unknown or unmined.
    pub async fn receipt(&self, hash: &str) -> Result<Option<TransactionReceipt>, EthError> {
        Ok(self
            .rpc
            .call("eth_getTransactionReceipt", json!([hash]))
            .await?)
    }

    pub async fn chain_id(&self) -> Result<u64, EthError> {
        let raw: String = self.rpc.call_required("eth_chainId", json!([])).await?;
        parse_quantity_u64(&raw).ok_or_else(|| RpcError::Decode(format!("eth_chainId: {raw}")).into())
    }

    pub async fn block_number(&self) -> Result<u64, EthError> {
        let raw: String = self.rpc.call_required("eth_blockNumber", json!([])).await?;
        parse_quantity_u64(&raw)
            .ok_or_else(|| RpcError::Decode(format!("eth_blockNumber: {raw}")).into())
    }

    /// `eth_syncing` answers `false` when synced, or a progress object.
    pub async fn is_syncing(&self) -> Result<bool, EthError> {
        let value: Value = self.rpc.call("eth_syncing", json!([])).await?;
        Ok(!matches!(value, Value::Bool(false) | Value::Null))
    }

    /// Probes chain id, head block and sync state. Each field is `None` when
    /// its own call fails.
    pub async fn node_status(&self) -> NodeStatus {
        let (chain_id, block, syncing) =
            futures_util::join!(self.chain_id(), self.block_number(), self.is_syncing());
        NodeStatus {
            chain_id: chain_id.ok().map(|id| id.to_string()),
            latest_block: block.ok(),
            is_synced: syncing.ok().map(|syncing| !syncing),
        }
    }
}

fn quantity(method: &str, raw: &str) -> Result<U256, EthError> {
    parse_quantity(raw).ok_or_else(|| RpcError::Decode(format!("{method}: {raw}")).into())
}
