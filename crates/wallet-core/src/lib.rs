//! # wallet-core
//!
//! Entry point of the transaction pipeline. [`TransactionPipeline`] routes
//! each intent by chain family to the native EVM or Solana crates, or to the
//! shared [`Gateway`] for every other chain:
//!
//! ```text
//! Intent -> preload -> (pick a priority) -> sign -> broadcast -> status
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod pipeline;

pub use config::PipelineConfig;
pub use dispatch::{ChainSignData, GatewaySignData, Operation, Route};
pub use error::{ErrorKind, WalletError};
pub use gateway::{AddressStatus, Gateway};
pub use pipeline::{SignerParams, TransactionPipeline};

#[cfg(any(test, feature = "mock"))]
pub use gateway::MockGateway;
