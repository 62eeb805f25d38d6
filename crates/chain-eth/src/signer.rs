//! Builds and signs EVM transactions from preloaded data.

use alloy_primitives::{Bytes, U256};
use crypto_utils::PrivateKey;
use tracing::debug;
use wallet_types::{FeePriority, FeeQuote, FeeShape, Intent, IntentAction, MessageKind};

use crate::address::{address_from_private_key, parse_address, same_address};
use crate::chains::EvmChain;
use crate::client::EvmCall;
use crate::error::EthError;
use crate::preloader::{approval_call, call_for, swap_call, EvmSignData};
use crate::transaction::{sign_hash, sign_message, sign_transaction, EthTransaction, GasPricing};

/// Signs EVM intents for one chain.
#[derive(Debug, Clone)]
pub struct EvmSigner {
    chain: EvmChain,
}

impl EvmSigner {
    pub fn new(chain: EvmChain) -> Self {
        Self { chain }
    }

    /// Raw signed transactions, in broadcast order. A swap that needs an
    /// allowance yields the approval at the preloaded nonce and the swap at
    /// the next one.
    pub fn sign(
        &self,
        intent: &Intent,
        data: &EvmSignData,
        priority: FeePriority,
        key: &PrivateKey,
    ) -> Result<Vec<Vec<u8>>, EthError> {
        self.check_key(intent, key)?;
        let quote = data.fee(priority).ok_or_else(|| {
            EthError::TransactionBuildError("no fee quote in preloaded data".into())
        })?;
        let (gas_limit, pricing) = pricing_of(quote)?;

        if let IntentAction::Swap(swap) = &intent.action {
            if let Some(approval) = &swap.approval {
                let swap_gas_limit = swap.gas_limit.ok_or_else(|| {
                    EthError::TransactionBuildError("swap gas limit required with approval".into())
                })?;
                let approve = self.build(
                    data,
                    data.nonce,
                    gas_limit,
                    pricing,
                    &approval_call(approval, None)?,
                )?;
                let swap_tx = self.build(
                    data,
                    next_nonce(data.nonce)?,
                    swap_gas_limit,
                    pricing,
                    &swap_call(swap)?,
                )?;
                return self.sign_all(&[approve, swap_tx], key);
            }
        }

        let mut call = call_for(intent, &self.chain)?;
        call.value = match &intent.action {
            IntentAction::NativeTransfer => intent.final_amount(quote.amount)?,
            _ => call.value,
        };
        let tx = self.build(data, data.nonce, gas_limit, pricing, &call)?;
        self.sign_all(&[tx], key)
    }

    /// EIP-191 for plain messages; typed data must already be hashed.
    pub fn sign_message(
        &self,
        kind: MessageKind,
        message: &[u8],
        key: &PrivateKey,
    ) -> Result<Vec<u8>, EthError> {
        match kind {
            MessageKind::Plain => sign_message(message, key.expose()),
            MessageKind::Typed => sign_hash(message, key.expose()),
        }
    }

    fn check_key(&self, intent: &Intent, key: &PrivateKey) -> Result<(), EthError> {
        let address = address_from_private_key(key.expose())?;
        if !same_address(&address, &intent.from.address) {
            return Err(EthError::SigningError(format!(
                "key does not control {}",
                intent.from.address
            )));
        }
        Ok(())
    }

    fn build(
        &self,
        data: &EvmSignData,
        nonce: u64,
        gas_limit: U256,
        pricing: GasPricing,
        call: &EvmCall,
    ) -> Result<EthTransaction, EthError> {
        if data.chain_id != self.chain.chain_id {
            return Err(EthError::UnsupportedChain(format!(
                "preloaded for chain {}, signing for {}",
                data.chain_id, self.chain.chain_id
            )));
        }
        Ok(EthTransaction {
            chain_id: data.chain_id,
            nonce,
            gas_limit,
            to: parse_address(&call.to)?,
            value: call.value,
            data: Bytes::from(call.data.clone()),
            pricing,
        })
    }

    fn sign_all(&self, txs: &[EthTransaction], key: &PrivateKey) -> Result<Vec<Vec<u8>>, EthError> {
        txs.iter()
            .map(|tx| {
                let signed = sign_transaction(tx, key.expose())?;
                debug!(chain = %self.chain.chain, nonce = tx.nonce, hash = %signed.tx_hash, "signed");
                Ok(signed.raw_tx)
            })
            .collect()
    }
}

fn pricing_of(quote: &FeeQuote) -> Result<(U256, GasPricing), EthError> {
    match quote.shape {
        FeeShape::Eip1559 {
            gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } => Ok((
            gas_limit,
            GasPricing::Eip1559 {
                max_priority_fee_per_gas,
                max_fee_per_gas,
            },
        )),
        FeeShape::Regular {
            gas_limit,
            gas_price,
        } => Ok((gas_limit, GasPricing::Legacy { gas_price })),
        FeeShape::Flat | FeeShape::Solana { .. } => Err(EthError::TransactionBuildError(format!(
            "{:?} fee shape on an evm chain",
            quote.shape.kind()
        ))),
    }
}

fn next_nonce(nonce: u64) -> Result<u64, EthError> {
    nonce
        .checked_add(1)
        .ok_or_else(|| EthError::TransactionBuildError("nonce overflow".into()))
}
