//! EVM fee calculation.
//!
//! A quote is derived from two concurrent signals: the node's gas estimate
//! for the exact call, and an `eth_feeHistory` window sampled at the chain's
//! reward percentiles. OP-stack chains add an L1 data fee on top, see
//! [`crate::optimism`].

use alloy_primitives::U256;
use chain_rpc::RpcError;
use tracing::{debug, instrument};
use wallet_types::{AssetId, FeePriority, FeeQuote, FeeShape, Intent};

use crate::chains::EvmChain;
use crate::client::{EvmCall, EvmClient, FeeHistory};
use crate::error::EthError;
use crate::optimism::OptimismGasOracle;

/// Gas used by a plain value transfer. Estimates equal to this are exact and
/// get no margin.
pub const NATIVE_GAS_LIMIT: u64 = 21_000;

/// Applies the 50% safety margin to a node estimate.
pub fn gas_limit_with_margin(estimate: U256) -> U256 {
    if estimate == U256::from(NATIVE_GAS_LIMIT) {
        estimate
    } else {
        estimate.saturating_add(estimate / U256::from(2))
    }
}

/// Highest base fee in the window.
pub fn base_fee(history: &FeeHistory) -> Result<U256, EthError> {
    history
        .base_fee_per_gas
        .iter()
        .flatten()
        .max()
        .copied()
        .ok_or_else(|| {
            EthError::BaseFeeUnavailable(RpcError::Decode("no base fee in fee history".into()))
        })
}

/// Per-rank priority fee: the integer mean of the column's non-zero rewards,
/// never below `floor`. Empty or all-zero columns use `floor`.
pub fn priority_fees(history: &FeeHistory, floor: U256) -> [U256; 3] {
    let mut fees = [floor; 3];
    for (rank, fee) in fees.iter_mut().enumerate() {
        let column: Vec<U256> = history
            .reward
            .iter()
            .filter_map(|row| row.get(rank).copied().flatten())
            .filter(|reward| !reward.is_zero())
            .collect();
        if column.is_empty() {
            continue;
        }
        let sum = column
            .iter()
            .fold(U256::ZERO, |acc, reward| acc.saturating_add(*reward));
        *fee = (sum / U256::from(column.len())).max(floor);
    }
    fees
}

/// Market snapshot shared by every rank of one preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeMarket {
    /// Gas limit with margin applied.
    pub gas_limit: U256,
    pub base_fee: U256,
    /// Slow, Normal, Fast.
    pub priority_fees: [U256; 3],
}

impl FeeMarket {
    pub fn priority_fee(&self, priority: FeePriority) -> U256 {
        self.priority_fees[priority.index()]
    }

    pub fn max_fee(&self, priority: FeePriority) -> U256 {
        self.base_fee.saturating_add(self.priority_fee(priority))
    }

    /// Tip placed in the transaction. A send-max native transfer bids the
    /// whole max fee so that the fee deducted from the balance is exact.
    pub fn miner_fee(&self, intent: &Intent, priority: FeePriority) -> U256 {
        if intent.is_max_native_transfer() {
            self.max_fee(priority)
        } else {
            self.priority_fee(priority)
        }
    }

    /// `gas_limit * max_fee` for the rank.
    pub fn execution_fee(&self, priority: FeePriority) -> U256 {
        self.gas_limit.saturating_mul(self.max_fee(priority))
    }
}

/// Fee shape for `chain`: EIP-1559 where supported, a single gas price
/// otherwise.
pub fn fee_shape(chain: &EvmChain, gas_limit: U256, max_fee: U256, miner_fee: U256) -> FeeShape {
    if chain.eip1559 {
        FeeShape::Eip1559 {
            gas_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: miner_fee,
        }
    } else {
        FeeShape::Regular {
            gas_limit,
            gas_price: max_fee,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvmFeeCalculator {
    client: EvmClient,
    chain: EvmChain,
}

impl EvmFeeCalculator {
    pub fn new(client: EvmClient, chain: EvmChain) -> Self {
        Self { client, chain }
    }

    /// Fetches the gas estimate and fee history concurrently.
    async fn market(&self, from: &str, call: &EvmCall) -> Result<FeeMarket, EthError> {
        let fee = self.chain.fee;
        let (estimate, history) = futures_util::try_join!(
            self.client.estimate_gas(from, call),
            self.client
                .fee_history(fee.history_blocks, &fee.reward_percentiles),
        )?;

        let market = FeeMarket {
            gas_limit: gas_limit_with_margin(estimate),
            base_fee: base_fee(&history)?,
            priority_fees: priority_fees(&history, U256::from(fee.min_priority_fee)),
        };
        debug!(
            gas_limit = %market.gas_limit,
            base_fee = %market.base_fee,
            "fee market"
        );
        Ok(market)
    }

    /// One quote per rank from a market snapshot, without any L1 surcharge.
    fn quotes(&self, intent: &Intent, market: &FeeMarket) -> Vec<FeeQuote> {
        FeePriority::ALL
            .iter()
            .map(|&priority| {
                let max_fee = market.max_fee(priority);
                FeeQuote::new(
                    priority,
                    AssetId::native(self.chain.chain),
                    market.execution_fee(priority),
                    fee_shape(
                        &self.chain,
                        market.gas_limit,
                        max_fee,
                        market.miner_fee(intent, priority),
                    ),
                )
            })
            .collect()
    }

    /// Turns a market snapshot into final quotes, asking the L1 oracle on
    /// OP-stack chains.
    async fn finalize(
        &self,
        intent: &Intent,
        call: &EvmCall,
        market: &FeeMarket,
        nonce: u64,
    ) -> Result<Vec<FeeQuote>, EthError> {
        if self.chain.op_stack {
            OptimismGasOracle::new(&self.client, &self.chain)
                .quotes(intent, call, market, nonce)
                .await
        } else {
            Ok(self.quotes(intent, market))
        }
    }

    /// Sender nonce and one quote per rank for `call`. The nonce is fetched
    /// alongside the market since the L1 oracle prices a nonce-bearing
    /// transaction.
    #[instrument(skip_all, fields(chain = %self.chain.chain))]
    pub async fn calculate(
        &self,
        intent: &Intent,
        call: &EvmCall,
    ) -> Result<(u64, Vec<FeeQuote>), EthError> {
        let from = intent.from.address.as_str();
        let (nonce, market) =
            futures_util::try_join!(self.client.nonce(from), self.market(from, call))?;
        let fees = self.finalize(intent, call, &market, nonce).await?;
        Ok((nonce, fees))
    }
}
