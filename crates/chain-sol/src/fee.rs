//! Solana fee calculation.
//!
//! A transaction pays a per-signature base fee plus a priority fee of
//! `unit_price` micro-lamports for each of `COMPUTE_UNIT_LIMIT` compute
//! units. Token transfers that must create the recipient's token account
//! also pay its rent-exempt minimum. There is a single market price, so the
//! one quote is repeated for every rank.

use alloy_primitives::U256;
use tracing::{debug, instrument};
use wallet_types::{AssetId, Chain, FeePriority, FeeQuote, FeeShape, Intent, IntentAction, TOKEN_ACCOUNT_CREATION};

use crate::client::SolanaClient;
use crate::error::SolError;
use crate::spl_token::TOKEN_ACCOUNT_SIZE;

/// Lamports per signature.
pub const BASE_FEE: u64 = 5_000;
pub const COMPUTE_UNIT_LIMIT: u32 = 100_000;
/// Micro-lamports per compute unit.
pub const DEFAULT_UNIT_PRICE: u64 = 10_000;
pub const TOKEN_UNIT_PRICE: u64 = 100_000;

const MICRO_LAMPORTS_PER_LAMPORT: u128 = 1_000_000;

/// Floor price for an intent.
pub fn default_unit_price(intent: &Intent) -> u64 {
    match intent.action {
        IntentAction::TokenTransfer => TOKEN_UNIT_PRICE,
        _ => DEFAULT_UNIT_PRICE,
    }
}

/// Highest non-zero reported price, never below `default`.
pub fn unit_price(reported: &[u64], default: u64) -> u64 {
    reported
        .iter()
        .copied()
        .filter(|fee| *fee > 0)
        .max()
        .map_or(default, |highest| highest.max(default))
}

/// `BASE_FEE + unit_price * limit / 1e6 + rent`, in lamports.
pub fn total_fee(unit_price: u64, unit_limit: u32, rent: u64) -> U256 {
    let priority = u128::from(unit_price) * u128::from(unit_limit) / MICRO_LAMPORTS_PER_LAMPORT;
    U256::from(BASE_FEE) + U256::from(priority) + U256::from(rent)
}

/// The single quote, repeated for Slow, Normal and Fast. `rent` is the
/// recipient token account creation cost, when one is needed.
pub fn quotes(chain: Chain, unit_price: u64, rent: Option<u64>) -> Vec<FeeQuote> {
    let mut quote = FeeQuote::new(
        FeePriority::Normal,
        AssetId::native(chain),
        total_fee(unit_price, COMPUTE_UNIT_LIMIT, rent.unwrap_or_default()),
        FeeShape::Solana {
            gas_limit: U256::from(COMPUTE_UNIT_LIMIT),
            base_fee: U256::from(BASE_FEE),
            unit_price: U256::from(unit_price),
        },
    );
    if let Some(rent) = rent {
        quote
            .options
            .insert(TOKEN_ACCOUNT_CREATION.to_string(), U256::from(rent));
    }
    FeePriority::ALL
        .iter()
        .map(|&priority| quote.with_priority(priority))
        .collect()
}

/// Compute-unit limit and price carried by a Solana quote.
pub fn compute_budget_of(quote: &FeeQuote) -> Result<(u32, u64), SolError> {
    let FeeShape::Solana {
        gas_limit,
        unit_price,
        ..
    } = &quote.shape
    else {
        return Err(SolError::TransactionBuildError(format!(
            "expected a Solana fee shape, got {:?}",
            quote.shape.kind()
        )));
    };
    let limit = u32::try_from(*gas_limit)
        .map_err(|_| SolError::TransactionBuildError(format!("compute limit {gas_limit}")))?;
    let price = u64::try_from(*unit_price)
        .map_err(|_| SolError::TransactionBuildError(format!("unit price {unit_price}")))?;
    Ok((limit, price))
}

#[derive(Debug, Clone)]
pub struct SolanaFeeCalculator {
    client: SolanaClient,
    chain: Chain,
}

impl SolanaFeeCalculator {
    pub fn new(client: SolanaClient, chain: Chain) -> Self {
        Self { client, chain }
    }

    /// Current unit price for `intent`.
    async fn unit_price(&self, intent: &Intent) -> Result<u64, SolError> {
        let reported = self.client.prioritization_fees().await?;
        let price = unit_price(&reported, default_unit_price(intent));
        debug!(price, samples = reported.len(), "unit price");
        Ok(price)
    }

    /// Rent for the recipient token account, fetched only when it must be
    /// created.
    async fn token_account_rent(&self, create: bool) -> Result<Option<u64>, SolError> {
        if !create {
            return Ok(None);
        }
        Ok(Some(self.client.rent_exemption(TOKEN_ACCOUNT_SIZE).await?))
    }

    #[instrument(skip_all, fields(chain = %self.chain))]
    pub async fn calculate(
        &self,
        intent: &Intent,
        create_token_account: bool,
    ) -> Result<Vec<FeeQuote>, SolError> {
        let (price, rent) = futures_util::try_join!(
            self.unit_price(intent),
            self.token_account_rent(create_token_account),
        )?;
        Ok(quotes(self.chain, price, rent))
    }
}
