//! Builds and signs Solana transactions from preloaded data.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_rpc::RpcError;
use crypto_utils::PrivateKey;
use ed25519_dalek::{Signer, SigningKey};
use tracing::debug;
use wallet_types::{
    FeePriority, GenericInputType, Intent, IntentAction, MessageKind, StakeAction, SwapData, U256,
};

use crate::address::{address_from_private_key, address_to_bytes};
use crate::compute_budget::budget_instructions;
use crate::error::SolError;
use crate::fee::compute_budget_of;
use crate::preloader::{check_supported, SolanaSignData};
use crate::spl_token::{create_associated_token_account_idempotent, transfer_checked};
use crate::transaction::{
    compile_transaction, sign_transaction, RawTransaction, SolInstruction, SIGNATURE_LEN,
};
use crate::{memo, stake, system};

/// Longest seed the system program accepts for derived accounts.
const MAX_SEED_LEN: usize = 32;

/// Signs Solana intents. Built transactions come back as wire bytes ready
/// for `sendTransaction`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaSigner;

impl SolanaSigner {
    pub fn new() -> Self {
        Self
    }

    pub fn sign(
        &self,
        intent: &Intent,
        data: &SolanaSignData,
        priority: FeePriority,
        key: &PrivateKey,
    ) -> Result<Vec<Vec<u8>>, SolError> {
        check_supported(intent)?;
        let owner = check_key(intent, key)?;
        let quote = data.fee(priority).ok_or_else(|| {
            SolError::TransactionBuildError("no fee quote in preloaded data".into())
        })?;
        let (unit_limit, unit_price) = compute_budget_of(quote)?;

        let instructions = match &intent.action {
            IntentAction::Swap(swap) => {
                return Ok(vec![sign_swap(swap, unit_limit, unit_price, key)?]);
            }
            IntentAction::GenericTransfer { input_type } => {
                return Ok(vec![sign_generic(intent, *input_type, key)?]);
            }
            IntentAction::NativeTransfer => {
                let to = address_to_bytes(intent.require_destination()?)?;
                let lamports = lamports(intent.final_amount(quote.amount)?)?;
                let mut ixs = vec![system::transfer(&owner, &to, lamports)];
                ixs.extend(memo::optional_memo(&owner, intent.memo.as_deref()));
                ixs
            }
            IntentAction::TokenTransfer => token_transfer(intent, data, &owner)?,
            IntentAction::Stake(action) => stake_instructions(intent, action, data, &owner)?,
            _ => return Err(SolError::UnsupportedOperation("intent on Solana".into())),
        };

        let mut all = budget_instructions(unit_limit, unit_price);
        all.extend(instructions);
        let blockhash = address_to_bytes(&data.blockhash)
            .map_err(|e| SolError::BlockhashUnavailable(RpcError::Decode(e.to_string())))?;
        let tx = compile_transaction(&all, &owner, &blockhash)?;
        debug!(instructions = all.len(), "signing transaction");
        Ok(vec![sign_transaction(&tx, key.expose())?])
    }

    /// Signs a dApp message envelope: base64 of a single-signature
    /// placeholder transaction (`0x01 || 64 bytes || message || 1 byte`).
    /// Returns base64 of `0x01 || signature || message`.
    pub fn sign_message(
        &self,
        kind: MessageKind,
        message: &[u8],
        key: &PrivateKey,
    ) -> Result<Vec<u8>, SolError> {
        if kind == MessageKind::Typed {
            return Err(SolError::UnsupportedOperation(
                "typed message signing on Solana".into(),
            ));
        }
        let bytes = decode_base64(message)?;
        match bytes.first() {
            Some(1) => {}
            _ => {
                return Err(SolError::SigningError("only one signature supported".into()));
            }
        }
        let body_start = 1 + SIGNATURE_LEN;
        if bytes.len() <= body_start {
            return Err(SolError::SerializationError("message envelope too short".into()));
        }
        let body = &bytes[body_start..bytes.len() - 1];
        let signature = SigningKey::from_bytes(key.expose()).sign(body).to_bytes();

        let mut signed = Vec::with_capacity(1 + SIGNATURE_LEN + body.len());
        signed.push(1);
        signed.extend_from_slice(&signature);
        signed.extend_from_slice(body);
        Ok(BASE64.encode(signed).into_bytes())
    }
}

/// The key's public key, which must be the intent's sender.
fn check_key(intent: &Intent, key: &PrivateKey) -> Result<[u8; 32], SolError> {
    let address = address_from_private_key(key.expose());
    if address != intent.from.address {
        return Err(SolError::SigningError(format!(
            "key does not control {}",
            intent.from.address
        )));
    }
    address_to_bytes(&address)
}

fn lamports(amount: U256) -> Result<u64, SolError> {
    u64::try_from(amount)
        .map_err(|_| SolError::TransactionBuildError(format!("amount {amount} exceeds u64")))
}

fn decode_base64(input: &[u8]) -> Result<Vec<u8>, SolError> {
    let text = std::str::from_utf8(input)
        .map_err(|e| SolError::SerializationError(format!("invalid utf-8: {e}")))?;
    BASE64
        .decode(text.trim())
        .map_err(|e| SolError::SerializationError(format!("invalid base64: {e}")))
}

/// Create-if-missing for the recipient's token account, then
/// `TransferChecked`, then the optional memo.
fn token_transfer(
    intent: &Intent,
    data: &SolanaSignData,
    owner: &[u8; 32],
) -> Result<Vec<SolInstruction>, SolError> {
    let mint = intent.asset.token_id.as_deref().ok_or_else(|| {
        SolError::TransactionBuildError("token transfer without mint".into())
    })?;
    let mint = address_to_bytes(mint)?;
    let source = data.sender_token_address.as_deref().ok_or_else(|| {
        SolError::TokenAccountUnavailable("sender token account not preloaded".into())
    })?;
    let source = address_to_bytes(source)?;
    let recipient = address_to_bytes(intent.require_destination()?)?;

    let mut ixs = Vec::with_capacity(3);
    let destination = match data.recipient_token_address.as_deref() {
        Some(account) => address_to_bytes(account)?,
        None => {
            let (create, ata) = create_associated_token_account_idempotent(
                owner,
                &recipient,
                &mint,
                data.token_program,
            )?;
            ixs.push(create);
            ata
        }
    };
    ixs.push(transfer_checked(
        data.token_program,
        &source,
        &mint,
        &destination,
        owner,
        lamports(intent.amount)?,
        data.decimals,
    ));
    ixs.extend(memo::optional_memo(owner, intent.memo.as_deref()));
    Ok(ixs)
}

fn stake_instructions(
    intent: &Intent,
    action: &StakeAction,
    data: &SolanaSignData,
    owner: &[u8; 32],
) -> Result<Vec<SolInstruction>, SolError> {
    match action {
        StakeAction::Delegate { validator } => {
            let vote = address_to_bytes(validator)?;
            let seed = stake_seed(&data.blockhash);
            let (mut ixs, _account) = stake::delegate(owner, &vote, seed, lamports(intent.amount)?)?;
            ixs.push(memo::memo(owner, intent.memo.as_deref().unwrap_or_default()));
            Ok(ixs)
        }
        StakeAction::Undelegate { delegation } => {
            let account = address_to_bytes(&delegation.delegation_id)?;
            Ok(vec![stake::deactivate(&account, owner)])
        }
        StakeAction::Withdraw { delegation } => {
            let account = address_to_bytes(&delegation.delegation_id)?;
            let amount = if intent.amount.is_zero() {
                delegation.balance
            } else {
                intent.amount
            };
            Ok(vec![stake::withdraw(&account, owner, lamports(amount)?)])
        }
        StakeAction::Redelegate { .. } | StakeAction::ClaimRewards { .. } => Err(
            SolError::UnsupportedOperation("stake action on Solana".into()),
        ),
    }
}

/// A fresh stake account per delegation: the seed is the blockhash prefix.
fn stake_seed(blockhash: &str) -> &str {
    match blockhash.char_indices().nth(MAX_SEED_LEN) {
        Some((end, _)) => &blockhash[..end],
        None => blockhash,
    }
}

/// Signs an aggregator-built transaction. When the wallet is the only
/// signer the compute budget is repriced first; co-signed transactions are
/// signed untouched so the other signatures stay valid.
fn sign_swap(
    swap: &SwapData,
    unit_limit: u32,
    unit_price: u64,
    key: &PrivateKey,
) -> Result<Vec<u8>, SolError> {
    let bytes = decode_base64(swap.data.as_bytes())?;
    if bytes.is_empty() {
        return Err(SolError::TransactionBuildError("empty swap transaction".into()));
    }
    let mut tx = RawTransaction::parse(&bytes)?;
    if tx.signatures.len() == 1 {
        let rewritten = tx.set_compute_budget(unit_limit, unit_price)?;
        debug!(rewritten, "swap compute budget");
    }
    tx.sign(key.expose())?;
    Ok(tx.to_bytes())
}

/// dApp-supplied transaction in the memo. `Signature` returns the base58
/// signature; `EncodeTransaction` returns the base64 transaction with the
/// first slot filled.
fn sign_generic(
    intent: &Intent,
    input_type: GenericInputType,
    key: &PrivateKey,
) -> Result<Vec<u8>, SolError> {
    let payload = intent
        .memo
        .as_deref()
        .ok_or_else(|| SolError::TransactionBuildError("no transaction data".into()))?;
    let mut tx = RawTransaction::parse(&decode_base64(payload.as_bytes())?)?;
    let signature = SigningKey::from_bytes(key.expose())
        .sign(&tx.message)
        .to_bytes();

    match input_type {
        GenericInputType::Signature => Ok(bs58::encode(signature).into_string().into_bytes()),
        GenericInputType::EncodeTransaction => {
            let slot = tx.signatures.first_mut().ok_or_else(|| {
                SolError::SerializationError("transaction has no signature slot".into())
            })?;
            *slot = signature;
            Ok(BASE64.encode(tx.to_bytes()).into_bytes())
        }
    }
}
