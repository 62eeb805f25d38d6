//! Solana addresses.
//!
//! An address is the Base58 encoding of a 32-byte Ed25519 public key, or of
//! a program-derived address that is deliberately off the curve.

use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

use crate::error::SolError;

/// Base58 form of a public key.
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decodes an address to its 32 bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

pub fn validate_address(address: &str) -> bool {
    address_to_bytes(address).is_ok()
}

/// Address controlled by an Ed25519 seed.
pub fn address_from_private_key(seed: &[u8; 32]) -> String {
    let signing_key = SigningKey::from_bytes(seed);
    bytes_to_address(&signing_key.verifying_key().to_bytes())
}

/// `SystemProgram::createAccountWithSeed` address:
/// `sha256(base || seed || owner)`.
pub fn create_with_seed(base: &[u8; 32], seed: &str, owner: &[u8; 32]) -> Result<[u8; 32], SolError> {
    if seed.len() > 32 {
        return Err(SolError::InvalidAddress(format!(
            "seed longer than 32 bytes: {}",
            seed.len()
        )));
    }
    let mut hasher = Sha256::new();
    hasher.update(base);
    hasher.update(seed.as_bytes());
    hasher.update(owner);
    Ok(hasher.finalize().into())
}
