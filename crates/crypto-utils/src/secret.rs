use std::fmt;

use secrecy::{ExposeSecret, SecretBox};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// A 32-byte private key handed in by the key-management layer.
///
/// The bytes live in a [`SecretBox`] and are zeroed when the key is dropped.
/// `Debug` never prints the key. Signing code borrows the key for the
/// duration of one call and must not copy it anywhere that outlives it.
pub struct PrivateKey(SecretBox<[u8; 32]>);

impl PrivateKey {
    /// Wraps a 32-byte array and zeroes the by-value copy it was passed.
    /// Arrays are `Copy`, so a caller holding its own binding must zeroize
    /// that binding itself.
    pub fn new(mut bytes: [u8; 32]) -> Self {
        let key = Self(SecretBox::new(Box::new(bytes)));
        bytes.zeroize();
        key
    }

    /// Copies a key out of a byte slice. The slice is left untouched; callers
    /// holding the only copy should zeroize it themselves.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self::new(arr))
    }

    /// Takes ownership of a key buffer and zeroizes it after copying.
    pub fn from_vec(mut bytes: Vec<u8>) -> Result<Self, CryptoError> {
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    /// Parses a hex-encoded key, with or without a `0x` prefix.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let stripped = encoded.strip_prefix("0x").unwrap_or(encoded);
        let bytes =
            hex::decode(stripped).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        Self::from_vec(bytes)
    }

    /// Borrows the raw key bytes.
    pub fn expose(&self) -> &[u8; 32] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}
