//! # crypto-utils
//!
//! Key material handling for the signing pipeline: a zeroize-on-drop private
//! key container and secure random generation for throwaway keys.

pub mod error;
pub mod random;
pub mod secret;

pub use error::CryptoError;
pub use secret::PrivateKey;
