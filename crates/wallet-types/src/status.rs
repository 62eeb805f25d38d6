use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Pending,
    Confirmed,
    Failed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub state: TransactionState,
    /// Realized fee, known only once the transaction is terminal.
    pub fee: Option<U256>,
    /// Set when the chain re-identified the transaction after inclusion.
    pub new_hash: Option<String>,
}

impl TransactionStatus {
    pub fn pending() -> Self {
        Self {
            state: TransactionState::Pending,
            fee: None,
            new_hash: None,
        }
    }

    pub fn terminal(state: TransactionState, fee: Option<U256>) -> Self {
        Self {
            state,
            fee,
            new_hash: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, TransactionState::Pending)
    }
}

/// Health probe of a node. Each field is fetched independently and is `None`
/// when that probe failed or returned garbage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub chain_id: Option<String>,
    pub latest_block: Option<u64>,
    pub is_synced: Option<bool>,
}
