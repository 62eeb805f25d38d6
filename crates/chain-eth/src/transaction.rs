use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::error::EthError;

/// How an EVM transaction pays for gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPricing {
    /// EIP-1559 (type 2).
    Eip1559 {
        max_priority_fee_per_gas: U256,
        max_fee_per_gas: U256,
    },
    /// Pre-London gas price, signed with EIP-155 replay protection.
    Legacy { gas_price: U256 },
}

/// An unsigned EVM transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: U256,
    pub to: Address,
    /// Transfer value in wei.
    pub value: U256,
    /// Calldata (empty for simple transfers).
    pub data: Bytes,
    pub pricing: GasPricing,
}

/// A signed EVM transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedEthTransaction {
    /// Raw signed bytes. Type-2 transactions carry the 0x02 prefix.
    pub raw_tx: Vec<u8>,
    /// Transaction hash as a 0x-prefixed hex string.
    pub tx_hash: String,
}

/// Signs a transaction with the given secp256k1 private key.
///
/// Type-2 transactions hash `0x02 || rlp(fields)` and append
/// `y_parity, r, s`. Legacy transactions hash the EIP-155 nine-field list
/// and encode `v = chain_id * 2 + 35 + y_parity`.
pub fn sign_transaction(
    tx: &EthTransaction,
    private_key: &[u8; 32],
) -> Result<SignedEthTransaction, EthError> {
    let unsigned_payload = encode_unsigned_tx(tx);
    let msg_hash = Keccak256::digest(&unsigned_payload);
    let (r, s, y_parity) = sign_prehash(msg_hash.as_slice(), private_key)?;

    let mut raw_tx = Vec::new();
    match tx.pricing {
        GasPricing::Eip1559 {
            max_priority_fee_per_gas,
            max_fee_per_gas,
        } => {
            let signed_fields = SignedEip1559Fields {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                max_priority_fee_per_gas,
                max_fee_per_gas,
                gas_limit: tx.gas_limit,
                to: tx.to,
                value: tx.value,
                data: tx.data.clone(),
                access_list: Vec::new(),
                signature_y_parity: y_parity,
                signature_r: r,
                signature_s: s,
            };
            raw_tx.push(0x02);
            signed_fields.encode(&mut raw_tx);
        }
        GasPricing::Legacy { gas_price } => {
            let v = tx
                .chain_id
                .checked_mul(2)
                .and_then(|v| v.checked_add(35 + u64::from(y_parity)))
                .ok_or_else(|| {
                    EthError::TransactionBuildError(format!("chain id {} too large", tx.chain_id))
                })?;
            let signed_fields = LegacyFields {
                nonce: tx.nonce,
                gas_price,
                gas_limit: tx.gas_limit,
                to: tx.to,
                value: tx.value,
                data: tx.data.clone(),
                v,
                r,
                s,
            };
            signed_fields.encode(&mut raw_tx);
        }
    }

    let tx_hash = Keccak256::digest(&raw_tx);

    Ok(SignedEthTransaction {
        raw_tx,
        tx_hash: format!("0x{}", hex::encode(tx_hash)),
    })
}

/// Signs an arbitrary message using EIP-191 personal_sign.
///
/// Returns the 65-byte signature `r || s || v` where v is 27 or 28.
pub fn sign_message(message: &[u8], private_key: &[u8; 32]) -> Result<Vec<u8>, EthError> {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    let msg_hash = hasher.finalize();

    sign_hash(msg_hash.as_slice(), private_key)
}

/// Signs a precomputed 32-byte digest (an EIP-712 hash), returning
/// `r || s || v` with v = 27 or 28.
pub fn sign_hash(hash: &[u8], private_key: &[u8; 32]) -> Result<Vec<u8>, EthError> {
    if hash.len() != 32 {
        return Err(EthError::SigningError(format!(
            "expected a 32-byte hash, got {} bytes",
            hash.len()
        )));
    }
    let (r, s, y_parity) = sign_prehash(hash, private_key)?;

    let mut sig = Vec::with_capacity(65);
    sig.extend_from_slice(&r.to_be_bytes::<32>());
    sig.extend_from_slice(&s.to_be_bytes::<32>());
    sig.push(y_parity + 27);
    Ok(sig)
}

/// The payload whose Keccak-256 hash is signed.
pub fn encode_unsigned_tx(tx: &EthTransaction) -> Vec<u8> {
    let mut payload = Vec::new();
    match tx.pricing {
        GasPricing::Eip1559 {
            max_priority_fee_per_gas,
            max_fee_per_gas,
        } => {
            let fields = UnsignedEip1559Fields {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                max_priority_fee_per_gas,
                max_fee_per_gas,
                gas_limit: tx.gas_limit,
                to: tx.to,
                value: tx.value,
                data: tx.data.clone(),
                access_list: Vec::new(),
            };
            payload.push(0x02);
            fields.encode(&mut payload);
        }
        GasPricing::Legacy { gas_price } => {
            let fields = LegacyFields {
                nonce: tx.nonce,
                gas_price,
                gas_limit: tx.gas_limit,
                to: tx.to,
                value: tx.value,
                data: tx.data.clone(),
                v: tx.chain_id,
                r: U256::ZERO,
                s: U256::ZERO,
            };
            fields.encode(&mut payload);
        }
    }
    payload
}

fn sign_prehash(hash: &[u8], private_key: &[u8; 32]) -> Result<(U256, U256, u8), EthError> {
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    let signing_key = signing_key?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(hash)
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let r = U256::from_be_slice(&signature.r().to_bytes());
    let s = U256::from_be_slice(&signature.s().to_bytes());
    Ok((r, s, u8::from(recovery_id.is_y_odd())))
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

#[derive(RlpEncodable)]
struct UnsignedEip1559Fields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
    access_list: Vec<AccessListItem>,
}

#[derive(RlpEncodable)]
struct SignedEip1559Fields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
    access_list: Vec<AccessListItem>,
    signature_y_parity: u8,
    signature_r: U256,
    signature_s: U256,
}

/// Legacy field list. Unsigned EIP-155 payloads put `chain_id, 0, 0` in the
/// signature slots.
#[derive(RlpEncodable)]
struct LegacyFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

/// An EIP-2930 access list entry (always empty here).
#[derive(Debug, Clone, RlpEncodable)]
struct AccessListItem {
    address: Address,
    storage_keys: Vec<B256>,
}
