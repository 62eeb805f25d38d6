use alloy_primitives::U256;
use chain_rpc::RpcError;
use tracing::instrument;
use wallet_types::{Delegation, DelegationState, DelegationValidator};

use crate::client::EvmClient;
use crate::error::EthError;
use crate::stake_hub::{self, HUB_READER, STAKE_HUB};

/// Staked and unbonding totals for an address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakeBalance {
    pub staked: U256,
    pub pending: U256,
}

/// Validator and delegation listing through the StakeHub reader.
#[derive(Debug, Clone)]
pub struct StakeHubClient {
    client: EvmClient,
    page_limit: Option<u16>,
}

impl StakeHubClient {
    pub fn new(client: EvmClient) -> Self {
        Self {
            client,
            page_limit: None,
        }
    }

    /// Caps the page size below the elected validator count.
    pub fn with_page_limit(mut self, limit: Option<u16>) -> Self {
        self.page_limit = limit;
        self
    }

    pub async fn max_elected_validators(&self) -> Result<u16, EthError> {
        let output = self
            .client
            .call(STAKE_HUB, &stake_hub::encode_max_elected_validators())
            .await?;
        stake_hub::decode_max_elected_validators(&output)
    }

    /// Page size for reader calls: the number of elected validators, capped
    /// by the configured limit.
    pub async fn page_size(&self) -> Result<u16, EthError> {
        let elected = self.max_elected_validators().await?;
        Ok(self.page_limit.map_or(elected, |limit| elected.min(limit)))
    }

    #[instrument(skip_all)]
    pub async fn validators(&self) -> Result<Vec<DelegationValidator>, EthError> {
        let limit = self.page_size().await?;
        match self.read(&stake_hub::encode_validators_call(limit)).await? {
            Some(output) => stake_hub::decode_validators(&output),
            None => Ok(Vec::new()),
        }
    }

    /// Active delegations followed by pending undelegations.
    #[instrument(skip_all, fields(address = %address))]
    pub async fn delegations(&self, address: &str) -> Result<Vec<Delegation>, EthError> {
        let limit = self.page_size().await?;
        let delegations_call = stake_hub::encode_delegations_call(address, limit)?;
        let undelegations_call = stake_hub::encode_undelegations_call(address, limit)?;

        let (delegations, undelegations) = futures_util::try_join!(
            self.read(&delegations_call),
            self.read(&undelegations_call),
        )?;

        let mut all = match delegations {
            Some(output) => stake_hub::decode_delegations(&output)?,
            None => Vec::new(),
        };
        if let Some(output) = undelegations {
            all.extend(stake_hub::decode_undelegations(&output)?);
        }
        Ok(all)
    }

    pub async fn balance(&self, address: &str) -> Result<StakeBalance, EthError> {
        let delegations = self.delegations(address).await?;
        Ok(stake_balance(&delegations))
    }

    /// Reader output, or `None` when the node returned nothing.
    async fn read(&self, data: &[u8]) -> Result<Option<Vec<u8>>, EthError> {
        match self.client.call(HUB_READER, data).await {
            Ok(output) if output.is_empty() => Ok(None),
            Ok(output) => Ok(Some(output)),
            Err(EthError::Rpc(RpcError::EmptyResult(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub fn stake_balance(delegations: &[Delegation]) -> StakeBalance {
    delegations
        .iter()
        .fold(StakeBalance::default(), |mut acc, d| {
            match d.state() {
                DelegationState::Active => acc.staked = acc.staked.saturating_add(d.balance),
                DelegationState::Undelegating | DelegationState::AwaitingWithdrawal => {
                    acc.pending = acc.pending.saturating_add(d.balance)
                }
                _ => {}
            }
            acc
        })
}
