use alloy_primitives::Address;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Parses a 0x-prefixed address. Mixed-case input must carry a valid EIP-55
/// checksum; all-lowercase and all-uppercase input is accepted as is.
pub fn parse_address(address: &str) -> Result<Address, EthError> {
    let hex_part = strip_hex_prefix(address)?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|_| EthError::InvalidAddress("address contains non-hex characters".into()))?;

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
    if !is_all_lower && !is_all_upper {
        let checksummed = checksum_address(address)?;
        if checksummed[2..] != *hex_part {
            return Err(EthError::InvalidAddress(format!("bad checksum: {address}")));
        }
    }

    Ok(Address::from_slice(&bytes))
}

/// Whether `address` is a well-formed EVM address.
pub fn validate_address(address: &str) -> bool {
    parse_address(address).is_ok()
}

/// Applies EIP-55 mixed-case checksum encoding. Input case is ignored.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let hex_part = strip_hex_prefix(address)?.to_lowercase();

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let hash = Keccak256::digest(hex_part.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in hex_part.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

/// Checksummed address controlled by a secp256k1 private key.
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<String, EthError> {
    let signing_key = SigningKey::from_bytes(private_key.into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
    let uncompressed = signing_key.verifying_key().to_encoded_point(false);

    // Keccak-256 of the 64-byte key, skipping the 0x04 prefix.
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    checksum_address(&format!("0x{}", hex::encode(&hash[12..])))
}

/// Case-insensitive address comparison.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn strip_hex_prefix(address: &str) -> Result<&str, EthError> {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))
}
