//! EVM support for the transaction pipeline.
//!
//! This crate provides:
//! - Address parsing and EIP-55 checksums
//! - Fee quotes from `eth_estimateGas` and `eth_feeHistory`, with the OP-stack L1 data fee
//! - EIP-1559 and EIP-155 legacy transaction signing
//! - ERC-20, ERC-721/1155 and BSC StakeHub call encoding
//! - Preloading, signing, broadcast and receipt polling per chain

pub mod abi;
pub mod address;
pub mod chains;
pub mod client;
pub mod erc20;
pub mod error;
pub mod fee;
pub mod nft;
pub mod optimism;
pub mod preloader;
pub mod signer;
pub mod stake_hub;
pub mod staking;
pub mod status;
pub mod transaction;

pub use chains::EvmChain;
pub use client::EvmClient;
pub use error::EthError;
pub use preloader::{EvmPreloader, EvmSignData};
pub use signer::EvmSigner;
pub use staking::StakeHubClient;
