//! Broadcast and confirmation lookup.

use alloy_primitives::U256;
use tracing::{info, warn};
use wallet_types::{TransactionState, TransactionStatus};

use crate::client::{SolanaClient, TransactionResult};
use crate::error::SolError;

/// Submits signed transactions in order and returns the signature of the
/// last one. Stops at the first rejection.
pub async fn broadcast(client: &SolanaClient, raw_txs: &[Vec<u8>]) -> Result<String, SolError> {
    let mut last = None;
    for raw in raw_txs {
        last = Some(client.send_transaction(raw).await?);
    }
    let signature =
        last.ok_or_else(|| SolError::TransactionBuildError("nothing to broadcast".into()))?;
    info!(%signature, count = raw_txs.len(), "broadcast");
    Ok(signature)
}

/// Status of `signature`. Node errors read as pending so callers keep
/// polling.
pub async fn transaction_status(client: &SolanaClient, signature: &str) -> TransactionStatus {
    match client.transaction(signature).await {
        Ok(result) => result_status(result.as_ref()),
        Err(e) => {
            warn!(%signature, error = %e, "transaction lookup failed");
            TransactionStatus::pending()
        }
    }
}

/// Unknown transactions are pending; a `null` error confirms, anything else
/// failed. Both terminal states report the fee that was charged.
pub fn result_status(result: Option<&TransactionResult>) -> TransactionStatus {
    let Some(meta) = result.and_then(|r| r.meta.as_ref()) else {
        return TransactionStatus::pending();
    };
    let state = match meta.err {
        None => TransactionState::Confirmed,
        Some(_) => TransactionState::Failed,
    };
    TransactionStatus::terminal(state, meta.fee.map(U256::from))
}
