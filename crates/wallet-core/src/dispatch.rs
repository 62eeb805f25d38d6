//! Routing tables keyed by chain family, and the translation of gateway
//! answers into typed quotes and sign data.

use chain_eth::{chains, EvmSignData};
use chain_sol::SolanaSignData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wallet_types::{
    select_quote, AssetId, Chain, ChainFamily, FeePriority, FeeQuote, FeeShape, FeeShapeKind, U256,
};

use crate::gateway::GatewayFee;

/// Fee shape a chain family prices in.
pub fn fee_shape_kind(family: ChainFamily) -> FeeShapeKind {
    match family {
        ChainFamily::Evm => FeeShapeKind::Eip1559,
        ChainFamily::Solana => FeeShapeKind::Solana,
        ChainFamily::Bitcoin | ChainFamily::Cosmos | ChainFamily::Sui | ChainFamily::Aptos => {
            FeeShapeKind::Regular
        }
        ChainFamily::Tron
        | ChainFamily::Ton
        | ChainFamily::Xrp
        | ChainFamily::Near
        | ChainFamily::Stellar
        | ChainFamily::Polkadot
        | ChainFamily::Cardano
        | ChainFamily::Algorand => FeeShapeKind::Flat,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Native,
    Gateway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Preload,
    Sign,
    Broadcast,
    Status,
    Staking,
    AddressStatus,
}

pub fn route(chain: Chain, operation: Operation) -> Route {
    match (chain.family(), operation) {
        (_, Operation::AddressStatus) => Route::Gateway,
        (ChainFamily::Evm, Operation::Staking) => {
            match chains::for_chain(chain).map(|c| c.stake_hub) {
                Some(true) => Route::Native,
                _ => Route::Gateway,
            }
        }
        (ChainFamily::Evm | ChainFamily::Solana, _) => Route::Native,
        _ => Route::Gateway,
    }
}

/// Chain state a gateway preload returned, with quotes already typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySignData {
    pub metadata: Value,
    pub fees: Vec<FeeQuote>,
}

/// Preloaded inputs for one sign call, by family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum ChainSignData {
    Evm(EvmSignData),
    Solana(SolanaSignData),
    Gateway(GatewaySignData),
}

impl ChainSignData {
    pub fn fees(&self) -> &[FeeQuote] {
        match self {
            ChainSignData::Evm(data) => &data.fees,
            ChainSignData::Solana(data) => &data.fees,
            ChainSignData::Gateway(data) => &data.fees,
        }
    }

    pub fn fee(&self, priority: FeePriority) -> Option<&FeeQuote> {
        select_quote(self.fees(), priority)
    }
}

/// Typed quote for one gateway fee, shaped by the chain's family.
pub fn gateway_quote(
    chain: Chain,
    priority: FeePriority,
    fee: &GatewayFee,
    priority_fee: Option<U256>,
) -> FeeQuote {
    let shape = match fee_shape_kind(chain.family()) {
        FeeShapeKind::Flat => FeeShape::Flat,
        FeeShapeKind::Regular => FeeShape::Regular {
            gas_limit: fee.gas_limit,
            gas_price: fee.gas_price,
        },
        FeeShapeKind::Eip1559 => FeeShape::Eip1559 {
            gas_limit: fee.gas_limit,
            max_fee_per_gas: fee.gas_price,
            max_priority_fee_per_gas: priority_fee.unwrap_or_default(),
        },
        FeeShapeKind::Solana => FeeShape::Solana {
            gas_limit: fee.gas_limit,
            base_fee: fee.fee.saturating_sub(
                fee.options
                    .values()
                    .fold(U256::ZERO, |acc, v| acc.saturating_add(*v)),
            ),
            unit_price: fee.gas_price,
        },
    };
    let mut quote = FeeQuote::new(priority, AssetId::native(chain), fee.fee, shape);
    quote.options = fee.options.clone();
    quote
}

/// One quote per rank. A missing rank copies the nearest present one,
/// preferring the faster rank on a tie. Empty input stays empty.
pub fn fill_ranks(quotes: Vec<FeeQuote>) -> Vec<FeeQuote> {
    if quotes.is_empty() {
        return quotes;
    }
    FeePriority::ALL
        .iter()
        .filter_map(|rank| {
            quotes
                .iter()
                .min_by_key(|q| {
                    let distance = q.priority.index().abs_diff(rank.index());
                    (distance, std::cmp::Reverse(q.priority))
                })
                .map(|q| q.with_priority(*rank))
        })
        .collect()
}
