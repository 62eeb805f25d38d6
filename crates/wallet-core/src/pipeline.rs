//! The pipeline facade: preload, sign, broadcast and status for every chain,
//! routed to the native chain crates or to the gateway.

use std::collections::BTreeMap;
use std::sync::Arc;

use chain_eth::{EvmChain, EvmClient, EvmPreloader, EvmSigner, StakeHubClient};
use chain_rpc::{HttpTransport, RpcError, RpcTransport};
use chain_sol::{SolanaClient, SolanaPreloader, SolanaSigner, SolanaStakingClient};
use crypto_utils::PrivateKey;
use futures_util::future::try_join_all;
use tracing::{debug, info, instrument, warn};
use wallet_types::{
    Chain, ChainFamily, Delegation, DelegationValidator, FeePriority, Intent, MessageKind,
    NodeStatus, TransactionStatus, U256,
};

use crate::config::PipelineConfig;
use crate::dispatch::{
    fill_ranks, gateway_quote, route, ChainSignData, GatewaySignData, Operation, Route,
};
use crate::error::WalletError;
use crate::gateway::{AddressStatus, Gateway, GatewayLoadInput, GatewayTransactionInput};

/// An intent paired with the chain data preloaded for it. Consumed by one
/// sign call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerParams {
    pub intent: Intent,
    pub data: ChainSignData,
}

impl SignerParams {
    /// Amount sent at `priority`: the full amount, or for a send-max native
    /// transfer the amount less that rank's fee.
    pub fn final_amount(&self, priority: FeePriority) -> Result<U256, WalletError> {
        let fee = match self.data.fee(priority) {
            Some(quote) => quote.amount,
            None if !self.intent.is_max_native_transfer() => U256::ZERO,
            None => {
                return Err(WalletError::ChainDataMismatch(format!(
                    "no {priority} fee quote"
                )))
            }
        };
        Ok(self.intent.final_amount(fee)?)
    }
}

enum Native {
    Evm(EvmClient, EvmChain),
    Solana(SolanaClient),
}

#[derive(Debug, Clone)]
pub struct TransactionPipeline {
    config: PipelineConfig,
    transports: BTreeMap<Chain, Arc<dyn RpcTransport>>,
    gateway: Arc<dyn Gateway>,
}

impl TransactionPipeline {
    /// Opens an HTTP transport for every natively supported chain with a
    /// known endpoint.
    pub fn new(config: PipelineConfig, gateway: Arc<dyn Gateway>) -> Result<Self, WalletError> {
        let mut transports: BTreeMap<Chain, Arc<dyn RpcTransport>> = BTreeMap::new();
        for chain in Chain::ALL {
            if !matches!(chain.family(), ChainFamily::Evm | ChainFamily::Solana) {
                continue;
            }
            if let Some(url) = config.rpc_url(chain) {
                let transport = HttpTransport::new(url, config.request_timeout())?;
                transports.insert(chain, Arc::new(transport));
            }
        }
        debug!(chains = transports.len(), "pipeline transports ready");
        Ok(Self {
            config,
            transports,
            gateway,
        })
    }

    /// Replaces the transport used for `chain`.
    pub fn with_transport(mut self, chain: Chain, transport: Arc<dyn RpcTransport>) -> Self {
        self.transports.insert(chain, transport);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn transport(&self, chain: Chain) -> Result<Arc<dyn RpcTransport>, WalletError> {
        self.transports
            .get(&chain)
            .cloned()
            .ok_or_else(|| WalletError::UnsupportedChain(format!("no RPC endpoint for {chain}")))
    }

    fn native(&self, chain: Chain) -> Result<Native, WalletError> {
        match chain.family() {
            ChainFamily::Evm => Ok(Native::Evm(
                EvmClient::new(self.transport(chain)?),
                self.config.evm_chain(chain)?,
            )),
            ChainFamily::Solana => Ok(Native::Solana(SolanaClient::new(self.transport(chain)?))),
            family => Err(WalletError::UnsupportedChain(format!(
                "{chain} ({family:?}) has no native client"
            ))),
        }
    }

    /// Fetches everything needed to sign `intent` at any priority.
    #[instrument(skip_all, fields(chain = %intent.from.chain))]
    pub async fn preload(&self, intent: &Intent) -> Result<SignerParams, WalletError> {
        let chain = intent.from.chain;
        let data = match route(chain, Operation::Preload) {
            Route::Gateway => ChainSignData::Gateway(self.gateway_preload(intent).await?),
            Route::Native => match self.native(chain)? {
                Native::Evm(client, def) => {
                    ChainSignData::Evm(EvmPreloader::new(client, def).preload(intent).await?)
                }
                Native::Solana(client) => ChainSignData::Solana(
                    SolanaPreloader::new(client, chain).preload(intent).await?,
                ),
            },
        };
        Ok(SignerParams {
            intent: intent.clone(),
            data,
        })
    }

    async fn gateway_preload(&self, intent: &Intent) -> Result<GatewaySignData, WalletError> {
        let chain = intent.from.chain;
        let id = chain.as_str();
        let gateway = &self.gateway;
        let input = GatewayTransactionInput::from(intent);

        let (preload, rates) = futures_util::try_join!(
            gateway.transaction_preload(id, &input),
            gateway.fee_rates(id, &input),
        )?;

        let rates: Vec<_> = rates
            .into_iter()
            .filter_map(|rate| match rate.priority.parse::<FeePriority>() {
                Ok(priority) => Some((priority, rate)),
                Err(_) => {
                    warn!(priority = %rate.priority, "ignoring unknown fee rate");
                    None
                }
            })
            .collect();

        let loads = try_join_all(rates.iter().map(|(_, rate)| {
            let load = GatewayLoadInput {
                input: input.clone(),
                rate: rate.clone(),
                metadata: preload.metadata.clone(),
            };
            async move { gateway.transaction_load(id, &load).await }
        }))
        .await?;

        let quotes = rates
            .iter()
            .zip(&loads)
            .map(|((priority, rate), load)| {
                gateway_quote(chain, *priority, &load.fee, rate.priority_fee)
            })
            .collect();
        let fees = fill_ranks(quotes);
        if fees.is_empty() {
            return Err(RpcError::EmptyResult(format!("fee_rates for {id}")).into());
        }
        info!(rates = rates.len(), "gateway preload");
        Ok(GatewaySignData {
            metadata: preload.metadata,
            fees,
        })
    }

    /// Signs preloaded params at `priority`. Raw transactions come back in
    /// broadcast order.
    pub fn sign(
        &self,
        params: &SignerParams,
        priority: FeePriority,
        key: &PrivateKey,
    ) -> Result<Vec<Vec<u8>>, WalletError> {
        let chain = params.intent.from.chain;
        if route(chain, Operation::Sign) == Route::Gateway {
            return Err(WalletError::UnsupportedOperation(format!("signing on {chain}")));
        }
        match (&params.data, chain.family()) {
            (ChainSignData::Evm(data), ChainFamily::Evm) => {
                let signer = EvmSigner::new(self.config.evm_chain(chain)?);
                Ok(signer.sign(&params.intent, data, priority, key)?)
            }
            (ChainSignData::Solana(data), ChainFamily::Solana) => {
                Ok(SolanaSigner::new().sign(&params.intent, data, priority, key)?)
            }
            (ChainSignData::Gateway(_), _) => Err(WalletError::UnsupportedOperation(format!(
                "signing gateway data on {chain}"
            ))),
            (_, family) => Err(WalletError::ChainDataMismatch(format!(
                "{family:?} intent with foreign chain data"
            ))),
        }
    }

    pub fn sign_message(
        &self,
        chain: Chain,
        kind: MessageKind,
        message: &[u8],
        key: &PrivateKey,
    ) -> Result<Vec<u8>, WalletError> {
        match chain.family() {
            ChainFamily::Evm => {
                let signer = EvmSigner::new(self.config.evm_chain(chain)?);
                Ok(signer.sign_message(kind, message, key)?)
            }
            ChainFamily::Solana => Ok(SolanaSigner::new().sign_message(kind, message, key)?),
            _ => Err(WalletError::UnsupportedOperation(format!(
                "message signing on {chain}"
            ))),
        }
    }

    /// Submits signed transactions in order and returns the last hash.
    #[instrument(skip_all, fields(chain = %chain, count = raw_txs.len()))]
    pub async fn broadcast(&self, chain: Chain, raw_txs: &[Vec<u8>]) -> Result<String, WalletError> {
        match route(chain, Operation::Broadcast) {
            Route::Gateway => Ok(self.gateway.broadcast(chain.as_str(), raw_txs).await?),
            Route::Native => match self.native(chain)? {
                Native::Evm(client, _) => Ok(chain_eth::status::broadcast(&client, raw_txs).await?),
                Native::Solana(client) => Ok(chain_sol::status::broadcast(&client, raw_txs).await?),
            },
        }
    }

    /// Never fails: anything that prevents a lookup reads as pending.
    #[instrument(skip_all, fields(chain = %chain, hash = %hash))]
    pub async fn transaction_status(&self, chain: Chain, hash: &str) -> TransactionStatus {
        let native = match route(chain, Operation::Status) {
            Route::Gateway => {
                return match self.gateway.transaction_status(chain.as_str(), hash).await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(error = %e, "gateway status lookup failed");
                        TransactionStatus::pending()
                    }
                };
            }
            Route::Native => self.native(chain),
        };
        match native {
            Ok(Native::Evm(client, _)) => chain_eth::status::transaction_status(&client, hash).await,
            Ok(Native::Solana(client)) => {
                chain_sol::status::transaction_status(&client, hash).await
            }
            Err(e) => {
                warn!(error = %e, "no client for status lookup");
                TransactionStatus::pending()
            }
        }
    }

    #[instrument(skip_all, fields(chain = %chain))]
    pub async fn validators(&self, chain: Chain) -> Result<Vec<DelegationValidator>, WalletError> {
        if route(chain, Operation::Staking) == Route::Gateway {
            return Ok(self.gateway.staking_validators(chain.as_str()).await?);
        }
        match self.native(chain)? {
            Native::Evm(client, _) => Ok(self.stake_hub(client).validators().await?),
            Native::Solana(client) => {
                let mut validators = SolanaStakingClient::new(client, chain).validators().await?;
                if let Some(limit) = self.config.staking_page_limit {
                    validators.truncate(usize::from(limit));
                }
                Ok(validators)
            }
        }
    }

    #[instrument(skip_all, fields(chain = %chain, address = %address))]
    pub async fn delegations(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Vec<Delegation>, WalletError> {
        if route(chain, Operation::Staking) == Route::Gateway {
            return Ok(self
                .gateway
                .staking_delegations(chain.as_str(), address)
                .await?);
        }
        match self.native(chain)? {
            Native::Evm(client, _) => Ok(self.stake_hub(client).delegations(address).await?),
            Native::Solana(client) => Ok(SolanaStakingClient::new(client, chain)
                .delegations(address)
                .await?),
        }
    }

    fn stake_hub(&self, client: EvmClient) -> StakeHubClient {
        StakeHubClient::new(client).with_page_limit(self.config.staking_page_limit)
    }

    pub async fn address_status(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<Vec<AddressStatus>, WalletError> {
        Ok(self.gateway.address_status(chain.as_str(), address).await?)
    }

    /// Native coin balance in the smallest unit.
    pub async fn balance(&self, chain: Chain, address: &str) -> Result<U256, WalletError> {
        match self.native(chain)? {
            Native::Evm(client, _) => Ok(client.balance(address).await?),
            Native::Solana(client) => Ok(U256::from(client.balance(address).await?)),
        }
    }

    pub async fn node_status(&self, chain: Chain) -> Result<NodeStatus, WalletError> {
        Ok(match self.native(chain)? {
            Native::Evm(client, _) => client.node_status().await,
            Native::Solana(client) => client.node_status().await,
        })
    }
}
