//! L1 data fee on OP-stack rollups.
//!
//! The fee is priced by the `GasPriceOracle` predeploy from the serialized
//! transaction. The transaction is signed with a throwaway key and the
//! signature is cut off before asking, so the oracle sees roughly the bytes
//! that will be posted to L1.

use alloy_primitives::{Bytes, U256};
use chain_rpc::RpcError;
use crypto_utils::random::throwaway_key;
use futures_util::future::try_join_all;
use tracing::debug;
use wallet_types::{AssetId, FeePriority, FeeQuote, Intent, IntentAction};

use crate::abi::{decode_uint256, encode_function_call, selector, AbiParam};
use crate::address::parse_address;
use crate::chains::EvmChain;
use crate::client::{EvmCall, EvmClient};
use crate::error::EthError;
use crate::fee::{fee_shape, FeeMarket};
use crate::transaction::{sign_transaction, EthTransaction, GasPricing};

/// `GasPriceOracle` predeploy address.
pub const GAS_PRICE_ORACLE: &str = "0x420000000000000000000000000000000000000F";

/// `y_parity` (1) + `r` (1 + 32) + `s` (1 + 32).
const SIGNATURE_RLP_LEN: usize = 67;

pub struct OptimismGasOracle<'a> {
    client: &'a EvmClient,
    chain: &'a EvmChain,
}

impl<'a> OptimismGasOracle<'a> {
    pub fn new(client: &'a EvmClient, chain: &'a EvmChain) -> Self {
        Self { client, chain }
    }

    /// One quote per rank, each `l1_fee + gas_limit * max_fee`.
    pub async fn quotes(
        &self,
        intent: &Intent,
        call: &EvmCall,
        market: &FeeMarket,
        nonce: u64,
    ) -> Result<Vec<FeeQuote>, EthError> {
        match intent.action {
            IntentAction::Stake(_) | IntentAction::AccountActivation => {
                return Err(EthError::UnsupportedOperation(format!(
                    "l1 fee estimation for {:?} on {}",
                    intent.action, self.chain.name
                )));
            }
            _ => {}
        }

        try_join_all(
            FeePriority::ALL
                .iter()
                .map(|&priority| self.quote(intent, call, market, nonce, priority)),
        )
        .await
    }

    async fn quote(
        &self,
        intent: &Intent,
        call: &EvmCall,
        market: &FeeMarket,
        nonce: u64,
        priority: FeePriority,
    ) -> Result<FeeQuote, EthError> {
        let max_fee = market.max_fee(priority);
        let miner_fee = market.miner_fee(intent, priority);
        let l2_fee = market.execution_fee(priority);

        // Send-max pays the execution fee out of the amount. The L1 fee is
        // not known yet, so the encoded value is only approximate.
        let value = if intent.is_max_native_transfer() {
            call.value.saturating_sub(l2_fee)
        } else {
            call.value
        };

        let tx = EthTransaction {
            chain_id: self.chain.chain_id,
            nonce,
            gas_limit: market.gas_limit,
            to: parse_address(&call.to)?,
            value,
            data: Bytes::from(call.data.clone()),
            pricing: GasPricing::Eip1559 {
                max_priority_fee_per_gas: miner_fee,
                max_fee_per_gas: max_fee,
            },
        };
        let encoded = encode_for_l1(&tx, intent.asset.is_native())?;
        let l1_fee = self.l1_fee(&encoded).await?;
        debug!(%priority, %l1_fee, %l2_fee, "l1 fee");

        Ok(FeeQuote::new(
            priority,
            AssetId::native(self.chain.chain),
            l1_fee.saturating_add(l2_fee),
            fee_shape(self.chain, market.gas_limit, max_fee, miner_fee),
        ))
    }

    async fn l1_fee(&self, encoded: &[u8]) -> Result<U256, EthError> {
        let data = encode_function_call(
            selector("getL1Fee(bytes)"),
            &[AbiParam::Bytes(encoded.to_vec())],
        );
        let output = self
            .client
            .call(GAS_PRICE_ORACLE, &data)
            .await
            .map_err(|e| match e {
                EthError::Rpc(source) => EthError::L1FeeUnavailable(source),
                other => other,
            })?;
        decode_uint256(&output)
            .map_err(|e| EthError::L1FeeUnavailable(RpcError::Decode(e.to_string())))
    }
}

/// Signs `tx` with a throwaway key and strips it for the oracle.
pub fn encode_for_l1(tx: &EthTransaction, native: bool) -> Result<Vec<u8>, EthError> {
    let key = throwaway_key();
    let signed = sign_transaction(tx, key.expose())?;
    Ok(strip_signature(signed.raw_tx, native))
}

/// Signed bytes minus the signature. Native sends also drop the byte at
/// index 2.
pub fn strip_signature(mut encoded: Vec<u8>, native: bool) -> Vec<u8> {
    encoded.truncate(encoded.len().saturating_sub(SIGNATURE_RLP_LEN));
    if native && encoded.len() > 2 {
        encoded.remove(2);
    }
    encoded
}
