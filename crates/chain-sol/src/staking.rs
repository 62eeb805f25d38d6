use alloy_primitives::U256;
use tracing::instrument;
use wallet_types::{AssetId, Chain, Delegation, DelegationState, DelegationValidator};

use crate::client::{SolanaClient, StakeAccount, StakeDelegation, VoteAccounts};
use crate::error::SolError;

/// Validators from `getVoteAccounts` and delegations from the wallet's stake
/// accounts.
#[derive(Debug, Clone)]
pub struct SolanaStakingClient {
    client: SolanaClient,
    chain: Chain,
}

impl SolanaStakingClient {
    pub fn new(client: SolanaClient, chain: Chain) -> Self {
        Self { client, chain }
    }

    #[instrument(skip_all)]
    pub async fn validators(&self) -> Result<Vec<DelegationValidator>, SolError> {
        let accounts = self.client.vote_accounts().await?;
        Ok(validators(self.chain, accounts))
    }

    #[instrument(skip_all, fields(address = %address))]
    pub async fn delegations(&self, address: &str) -> Result<Vec<Delegation>, SolError> {
        let (accounts, epoch) = futures_util::try_join!(
            self.client.stake_accounts(address),
            self.client.epoch_info(),
        )?;
        Ok(accounts
            .iter()
            .filter_map(|account| delegation(self.chain, account, epoch.epoch))
            .collect())
    }
}

/// Current validators first, by activated stake, then delinquent ones.
/// Vote accounts carry no yield figure, so `apr` is left at zero.
pub fn validators(chain: Chain, mut accounts: VoteAccounts) -> Vec<DelegationValidator> {
    accounts
        .current
        .sort_by(|a, b| b.activated_stake.cmp(&a.activated_stake));
    let current = accounts.current.into_iter().map(|v| (v, true));
    let delinquent = accounts.delinquent.into_iter().map(|v| (v, false));

    current
        .chain(delinquent)
        .map(|(vote, active)| DelegationValidator {
            chain,
            name: vote.node_pubkey,
            id: vote.vote_pubkey,
            is_active: active && vote.epoch_vote_account,
            commission: f64::from(vote.commission),
            apr: 0.0,
        })
        .collect()
}

/// Activation state of a stake delegation in `epoch`.
pub fn stake_state(delegation: &StakeDelegation, epoch: u64) -> DelegationState {
    if delegation.deactivation_epoch == u64::MAX {
        if delegation.activation_epoch >= epoch {
            DelegationState::Activating
        } else {
            DelegationState::Active
        }
    } else if delegation.deactivation_epoch >= epoch {
        DelegationState::Deactivating
    } else {
        DelegationState::AwaitingWithdrawal
    }
}

/// Accounts that were never delegated are skipped.
pub fn delegation(chain: Chain, account: &StakeAccount, epoch: u64) -> Option<Delegation> {
    let stake = account.delegation.as_ref()?;
    Some(Delegation {
        asset: AssetId::native(chain),
        validator_id: stake.voter.clone(),
        delegation_id: account.address.clone(),
        balance: U256::from(account.lamports),
        shares: U256::from(stake.stake),
        rewards: U256::ZERO,
        unlock_time: None,
        base_state: stake_state(stake, epoch),
    })
}
