//! Broadcast and receipt polling.

use alloy_primitives::U256;
use tracing::{info, warn};
use wallet_types::{TransactionState, TransactionStatus};

use crate::client::{EvmClient, TransactionReceipt};
use crate::error::EthError;

/// Submits signed transactions in order and returns the hash of the last
/// one. Stops at the first rejection.
pub async fn broadcast(client: &EvmClient, raw_txs: &[Vec<u8>]) -> Result<String, EthError> {
    let mut last = None;
    for raw in raw_txs {
        last = Some(client.send_raw_transaction(raw).await?);
    }
    let hash = last.ok_or_else(|| EthError::TransactionBuildError("nothing to broadcast".into()))?;
    info!(%hash, count = raw_txs.len(), "broadcast");
    Ok(hash)
}

/// Status of `hash`. Node errors read as pending so callers keep polling.
pub async fn transaction_status(client: &EvmClient, hash: &str) -> TransactionStatus {
    match client.receipt(hash).await {
        Ok(receipt) => receipt_status(receipt.as_ref()),
        Err(e) => {
            warn!(%hash, error = %e, "receipt lookup failed");
            TransactionStatus::pending()
        }
    }
}

/// `0x1` confirms, `0x0` reverts, anything else is still pending.
pub fn receipt_status(receipt: Option<&TransactionReceipt>) -> TransactionStatus {
    let Some(receipt) = receipt else {
        return TransactionStatus::pending();
    };
    let state = match receipt.status.as_deref() {
        Some("0x1") => TransactionState::Confirmed,
        Some("0x0") => TransactionState::Reverted,
        _ => return TransactionStatus::pending(),
    };
    TransactionStatus::terminal(state, realized_fee(receipt))
}

/// `gas_used * effective_gas_price`, plus the L1 fee on rollups.
pub fn realized_fee(receipt: &TransactionReceipt) -> Option<U256> {
    let execution = receipt
        .gas_used?
        .saturating_mul(receipt.effective_gas_price?);
    Some(execution.saturating_add(receipt.l1_fee.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_rpc::mock::MockTransport;
    use chain_rpc::RpcError;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

    fn client(mock: MockTransport) -> EvmClient {
        EvmClient::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn successful_receipt_confirms_with_fee() {
        let client = client(MockTransport::new().with(
            "eth_getTransactionReceipt",
            json!({"status": "0x1", "gasUsed": "0x5208", "effectiveGasPrice": "0x2"}),
        ));
        let status = transaction_status(&client, HASH).await;
        assert_eq!(status.state, TransactionState::Confirmed);
        assert_eq!(status.fee, Some(U256::from(42_000)));
    }

    #[tokio::test]
    async fn rollup_receipt_adds_l1_fee() {
        let client = client(MockTransport::new().with(
            "eth_getTransactionReceipt",
            json!({
                "status": "0x1",
                "gasUsed": "0x5208",
                "effectiveGasPrice": "0x2",
                "l1Fee": "0x64"
            }),
        ));
        let status = transaction_status(&client, HASH).await;
        assert_eq!(status.fee, Some(U256::from(42_100)));
    }

    #[tokio::test]
    async fn failed_receipt_is_reverted() {
        let client = client(MockTransport::new().with(
            "eth_getTransactionReceipt",
            json!({"status": "0x0", "gasUsed": "0x5208", "effectiveGasPrice": "0x2"}),
        ));
        let status = transaction_status(&client, HASH).await;
        assert_eq!(status.state, TransactionState::Reverted);
        assert!(status.is_terminal());
    }

    #[tokio::test]
    async fn unknown_transaction_is_pending() {
        let client = client(MockTransport::new().with("eth_getTransactionReceipt", Value::Null));
        assert_eq!(
            transaction_status(&client, HASH).await,
            TransactionStatus::pending()
        );
    }

    #[tokio::test]
    async fn node_error_is_pending() {
        let client = client(
            MockTransport::new().with_error("eth_getTransactionReceipt", RpcError::Timeout),
        );
        assert_eq!(
            transaction_status(&client, HASH).await,
            TransactionStatus::pending()
        );
    }

    #[test]
    fn unexpected_status_code_is_pending() {
        let receipt = TransactionReceipt {
            status: Some("0x2".into()),
            ..Default::default()
        };
        assert_eq!(receipt_status(Some(&receipt)), TransactionStatus::pending());
    }

    #[tokio::test]
    async fn broadcast_sends_in_order_and_returns_last_hash() {
        let mock = Arc::new(MockTransport::new());
        mock.push("eth_sendRawTransaction", json!("0xaa"));
        mock.push("eth_sendRawTransaction", json!("0xbb"));
        let client = EvmClient::new(mock.clone());

        let hash = broadcast(&client, &[vec![1], vec![2]]).await.unwrap();

        assert_eq!(hash, "0xbb");
        let sent: Vec<Value> = mock
            .calls()
            .into_iter()
            .map(|(_, params)| params[0].clone())
            .collect();
        assert_eq!(sent, vec![json!("0x01"), json!("0x02")]);
    }

    #[tokio::test]
    async fn broadcast_rejection_is_an_error() {
        let client = client(MockTransport::new().with_error(
            "eth_sendRawTransaction",
            RpcError::Rpc {
                code: -32000,
                message: "nonce too low".into(),
            },
        ));
        let err = broadcast(&client, &[vec![1]]).await.unwrap_err();
        assert!(matches!(err, EthError::Rpc(RpcError::Rpc { .. })));
    }
}
