use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::error::TypesError;

/// Option key for the rent paid when a recipient token account is created
/// as part of the transfer.
pub const TOKEN_ACCOUNT_CREATION: &str = "tokenAccountCreation";

/// Fee priority ranks, ordered from cheapest to fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePriority {
    Slow,
    Normal,
    Fast,
}

impl FeePriority {
    pub const ALL: [FeePriority; 3] = [FeePriority::Slow, FeePriority::Normal, FeePriority::Fast];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeePriority::Slow => "slow",
            FeePriority::Normal => "normal",
            FeePriority::Fast => "fast",
        }
    }

    /// Position in [`FeePriority::ALL`].
    pub fn index(&self) -> usize {
        match self {
            FeePriority::Slow => 0,
            FeePriority::Normal => 1,
            FeePriority::Fast => 2,
        }
    }
}

impl fmt::Display for FeePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeePriority {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow" => Ok(FeePriority::Slow),
            "normal" => Ok(FeePriority::Normal),
            "fast" => Ok(FeePriority::Fast),
            other => Err(TypesError::UnknownPriority(other.to_string())),
        }
    }
}

/// Chain-family specific pricing parameters behind a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeShape {
    /// A single fixed amount with no gas accounting.
    Flat,
    /// Legacy gas pricing.
    Regular { gas_limit: U256, gas_price: U256 },
    /// EIP-1559 pricing. `max_priority_fee_per_gas` is the miner fee that
    /// ends up in the signed transaction.
    Eip1559 {
        gas_limit: U256,
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    /// Solana pricing: per-signature base fee plus a compute-unit price in
    /// micro-lamports over `gas_limit` compute units.
    Solana {
        gas_limit: U256,
        base_fee: U256,
        unit_price: U256,
    },
}

/// Discriminant of [`FeeShape`], used by the dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeShapeKind {
    Flat,
    Regular,
    Eip1559,
    Solana,
}

impl FeeShape {
    pub fn kind(&self) -> FeeShapeKind {
        match self {
            FeeShape::Flat => FeeShapeKind::Flat,
            FeeShape::Regular { .. } => FeeShapeKind::Regular,
            FeeShape::Eip1559 { .. } => FeeShapeKind::Eip1559,
            FeeShape::Solana { .. } => FeeShapeKind::Solana,
        }
    }

    pub fn gas_limit(&self) -> Option<U256> {
        match self {
            FeeShape::Flat => None,
            FeeShape::Regular { gas_limit, .. }
            | FeeShape::Eip1559 { gas_limit, .. }
            | FeeShape::Solana { gas_limit, .. } => Some(*gas_limit),
        }
    }
}

/// One priced option for executing an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub priority: FeePriority,
    pub fee_asset: AssetId,
    /// Total fee in the smallest unit of `fee_asset`, options included.
    pub amount: U256,
    pub shape: FeeShape,
    /// Named one-off surcharges that are part of `amount`.
    pub options: BTreeMap<String, U256>,
}

impl FeeQuote {
    pub fn new(priority: FeePriority, fee_asset: AssetId, amount: U256, shape: FeeShape) -> Self {
        Self {
            priority,
            fee_asset,
            amount,
            shape,
            options: BTreeMap::new(),
        }
    }

    pub fn options_total(&self) -> U256 {
        self.options
            .values()
            .fold(U256::ZERO, |acc, value| acc.saturating_add(*value))
    }

    /// Same quote relabelled for another rank.
    pub fn with_priority(&self, priority: FeePriority) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }
}

/// Picks the quote for `priority`, falling back to the first quote when the
/// rank is absent.
pub fn select_quote(quotes: &[FeeQuote], priority: FeePriority) -> Option<&FeeQuote> {
    quotes
        .iter()
        .find(|quote| quote.priority == priority)
        .or_else(|| quotes.first())
}
