//! Solana support for the transaction pipeline.
//!
//! Transactions are assembled by hand in Solana's compact wire format and
//! signed with `ed25519-dalek`, without `solana-sdk`. On top of that sit the
//! JSON-RPC client, the compute-unit fee calculator, the preloader and sign
//! client, broadcast and status, and native stake account listing.

pub mod address;
pub mod client;
pub mod compute_budget;
pub mod error;
pub mod fee;
pub mod memo;
pub mod preloader;
pub mod signer;
pub mod spl_token;
pub mod stake;
pub mod staking;
pub mod status;
pub mod system;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, validate_address};
pub use client::SolanaClient;
pub use error::SolError;
pub use preloader::{SolanaPreloader, SolanaSignData};
pub use signer::SolanaSigner;
pub use spl_token::TokenProgram;
pub use staking::SolanaStakingClient;
