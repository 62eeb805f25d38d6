//! Pipeline configuration.
//!
//! Everything has a default taken from the static chain tables, so an empty
//! JSON object is a valid config. Overrides are keyed by the chain's gateway
//! identifier (`"ethereum"`, `"smartchain"`, ...).

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chain_eth::chains::{self, EvmChain, EvmFeeConfig};
use serde::{Deserialize, Serialize};
use wallet_types::Chain;

use crate::error::WalletError;

const DEFAULT_SOLANA_RPC: &str = "https://api.mainnet-beta.solana.com";

/// Partial override of an EVM chain's fee parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmFeeOverride {
    pub reward_percentiles: Option<[u64; 3]>,
    pub min_priority_fee: Option<u64>,
    pub history_blocks: Option<u64>,
}

impl EvmFeeOverride {
    pub fn apply(&self, base: EvmFeeConfig) -> EvmFeeConfig {
        EvmFeeConfig {
            reward_percentiles: self.reward_percentiles.unwrap_or(base.reward_percentiles),
            min_priority_fee: self.min_priority_fee.unwrap_or(base.min_priority_fee),
            history_blocks: self.history_blocks.unwrap_or(base.history_blocks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-request timeout for node calls.
    pub request_timeout_secs: u64,
    /// RPC endpoint overrides.
    pub rpc_urls: BTreeMap<Chain, String>,
    /// Fee parameter overrides for EVM chains.
    pub evm_fees: BTreeMap<Chain, EvmFeeOverride>,
    pub solana_rpc_url: String,
    /// Upper bound on validators and delegations fetched per staking query.
    pub staking_page_limit: Option<u16>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            rpc_urls: BTreeMap::new(),
            evm_fees: BTreeMap::new(),
            solana_rpc_url: DEFAULT_SOLANA_RPC.to_string(),
            staking_page_limit: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WalletError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.request_timeout_secs == 0 {
            return Err(WalletError::Config("request_timeout_secs must be positive".into()));
        }
        for (chain, fees) in &self.evm_fees {
            if chains::for_chain(*chain).is_none() {
                return Err(WalletError::Config(format!("{chain} is not an EVM chain")));
            }
            if let Some(p) = fees.reward_percentiles {
                if !p.windows(2).all(|w| w[0] <= w[1]) || p[2] > 100 {
                    return Err(WalletError::Config(format!(
                        "{chain}: reward percentiles must ascend within 0..=100"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Override, or the chain table's endpoint. Solana falls back to
    /// `solana_rpc_url`; gateway chains have no default.
    pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
        if let Some(url) = self.rpc_urls.get(&chain) {
            return Some(url);
        }
        match chain {
            Chain::Solana => Some(&self.solana_rpc_url),
            _ => chains::for_chain(chain).map(|c| c.rpc_url),
        }
    }

    /// The chain table entry with fee overrides applied.
    pub fn evm_chain(&self, chain: Chain) -> Result<EvmChain, WalletError> {
        let base = chains::for_chain(chain)
            .ok_or_else(|| WalletError::UnsupportedChain(format!("{chain} is not an EVM chain")))?;
        let mut def = base.clone();
        if let Some(fees) = self.evm_fees.get(&chain) {
            def.fee = fees.apply(base.fee);
        }
        Ok(def)
    }
}
