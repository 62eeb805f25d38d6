use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::Chain;

/// Identifies an asset: the chain's native coin, or a token on that chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId {
    pub chain: Chain,
    /// Contract address / mint for tokens, `None` for the native coin.
    pub token_id: Option<String>,
}

impl AssetId {
    pub fn native(chain: Chain) -> Self {
        Self {
            chain,
            token_id: None,
        }
    }

    pub fn token(chain: Chain, token_id: impl Into<String>) -> Self {
        Self {
            chain,
            token_id: Some(token_id.into()),
        }
    }

    pub fn is_native(&self) -> bool {
        self.token_id.is_none()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_id {
            Some(token) => write!(f, "{}_{}", self.chain, token),
            None => write!(f, "{}", self.chain),
        }
    }
}

/// The account an intent originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub chain: Chain,
    pub address: String,
    /// Informational only; keys are derived outside the pipeline.
    pub derivation_path: Option<String>,
}

impl Account {
    pub fn new(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            derivation_path: None,
        }
    }
}
