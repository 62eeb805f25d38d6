use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    // EVM
    Ethereum,
    SmartChain,
    Polygon,
    Arbitrum,
    Base,
    Optimism,
    OpBnb,
    AvalancheC,
    Sepolia,
    PolygonAmoy,
    // Solana
    Solana,
    // Gateway-backed
    Bitcoin,
    Litecoin,
    Doge,
    Cosmos,
    Osmosis,
    Tron,
    Ton,
    Sui,
    Aptos,
    Xrp,
    Near,
    Stellar,
    Polkadot,
    Cardano,
    Algorand,
}

/// Protocol family a chain belongs to. Routing and fee-shape decisions are
/// keyed on this, never on the individual chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
    Bitcoin,
    Cosmos,
    Tron,
    Ton,
    Sui,
    Aptos,
    Xrp,
    Near,
    Stellar,
    Polkadot,
    Cardano,
    Algorand,
}

impl Chain {
    pub const ALL: [Chain; 26] = [
        Chain::Ethereum,
        Chain::SmartChain,
        Chain::Polygon,
        Chain::Arbitrum,
        Chain::Base,
        Chain::Optimism,
        Chain::OpBnb,
        Chain::AvalancheC,
        Chain::Sepolia,
        Chain::PolygonAmoy,
        Chain::Solana,
        Chain::Bitcoin,
        Chain::Litecoin,
        Chain::Doge,
        Chain::Cosmos,
        Chain::Osmosis,
        Chain::Tron,
        Chain::Ton,
        Chain::Sui,
        Chain::Aptos,
        Chain::Xrp,
        Chain::Near,
        Chain::Stellar,
        Chain::Polkadot,
        Chain::Cardano,
        Chain::Algorand,
    ];

    pub fn family(&self) -> ChainFamily {
        match self {
            Chain::Ethereum
            | Chain::SmartChain
            | Chain::Polygon
            | Chain::Arbitrum
            | Chain::Base
            | Chain::Optimism
            | Chain::OpBnb
            | Chain::AvalancheC
            | Chain::Sepolia
            | Chain::PolygonAmoy => ChainFamily::Evm,
            Chain::Solana => ChainFamily::Solana,
            Chain::Bitcoin | Chain::Litecoin | Chain::Doge => ChainFamily::Bitcoin,
            Chain::Cosmos | Chain::Osmosis => ChainFamily::Cosmos,
            Chain::Tron => ChainFamily::Tron,
            Chain::Ton => ChainFamily::Ton,
            Chain::Sui => ChainFamily::Sui,
            Chain::Aptos => ChainFamily::Aptos,
            Chain::Xrp => ChainFamily::Xrp,
            Chain::Near => ChainFamily::Near,
            Chain::Stellar => ChainFamily::Stellar,
            Chain::Polkadot => ChainFamily::Polkadot,
            Chain::Cardano => ChainFamily::Cardano,
            Chain::Algorand => ChainFamily::Algorand,
        }
    }

    /// Identifier used on the gateway boundary and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::SmartChain => "smartchain",
            Chain::Polygon => "polygon",
            Chain::Arbitrum => "arbitrum",
            Chain::Base => "base",
            Chain::Optimism => "optimism",
            Chain::OpBnb => "opbnb",
            Chain::AvalancheC => "avalanchec",
            Chain::Sepolia => "sepolia",
            Chain::PolygonAmoy => "polygonamoy",
            Chain::Solana => "solana",
            Chain::Bitcoin => "bitcoin",
            Chain::Litecoin => "litecoin",
            Chain::Doge => "doge",
            Chain::Cosmos => "cosmos",
            Chain::Osmosis => "osmosis",
            Chain::Tron => "tron",
            Chain::Ton => "ton",
            Chain::Sui => "sui",
            Chain::Aptos => "aptos",
            Chain::Xrp => "xrp",
            Chain::Near => "near",
            Chain::Stellar => "stellar",
            Chain::Polkadot => "polkadot",
            Chain::Cardano => "cardano",
            Chain::Algorand => "algorand",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .iter()
            .find(|chain| chain.as_str() == s)
            .copied()
            .ok_or_else(|| TypesError::UnknownChain(s.to_string()))
    }
}
