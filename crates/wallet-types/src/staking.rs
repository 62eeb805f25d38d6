use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::chain::Chain;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationValidator {
    pub chain: Chain,
    pub id: String,
    pub name: String,
    pub is_active: bool,
    /// Commission in percent.
    pub commission: f64,
    /// Annual percentage rate in percent.
    pub apr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationState {
    Active,
    Pending,
    Activating,
    Deactivating,
    Undelegating,
    AwaitingWithdrawal,
}

/// A delegation as reported by the chain.
///
/// The state is never stored: an undelegation flips from `Undelegating` to
/// `AwaitingWithdrawal` purely by the passage of time, so it is derived from
/// `unlock_time` whenever it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub asset: AssetId,
    pub validator_id: String,
    pub delegation_id: String,
    pub balance: U256,
    pub shares: U256,
    pub rewards: U256,
    /// Unix seconds after which the funds can be withdrawn.
    pub unlock_time: Option<u64>,
    /// State reported when no unlock time applies.
    pub base_state: DelegationState,
}

impl Delegation {
    pub fn state_at(&self, now_secs: u64) -> DelegationState {
        match self.unlock_time {
            None => self.base_state,
            Some(unlock) if now_secs <= unlock => DelegationState::Undelegating,
            Some(_) => DelegationState::AwaitingWithdrawal,
        }
    }

    pub fn state(&self) -> DelegationState {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.state_at(now)
    }
}
