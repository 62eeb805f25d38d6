use thiserror::Error;

/// Key material errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid key encoding: {0}")]
    InvalidEncoding(String),
}
