//! Chain-agnostic data model for the transaction pipeline.
//!
//! Everything that flows between the preloaders, sign clients and the
//! dispatch layer lives here: chain tags, user intents, fee quotes,
//! transaction status and staking records. Amounts are always
//! [`U256`](alloy_primitives::U256) in the asset's smallest unit.

pub mod asset;
pub mod chain;
pub mod error;
pub mod fee;
pub mod intent;
pub mod staking;
pub mod status;

pub use alloy_primitives::U256;
pub use asset::{Account, AssetId};
pub use chain::{Chain, ChainFamily};
pub use error::TypesError;
pub use fee::{select_quote, FeePriority, FeeQuote, FeeShape, FeeShapeKind, TOKEN_ACCOUNT_CREATION};
pub use intent::{
    ApprovalData, DelegationRef, GenericInputType, Intent, IntentAction, MessageKind, NftAsset,
    NftStandard, StakeAction, SwapData,
};
pub use staking::{Delegation, DelegationState, DelegationValidator};
pub use status::{NodeStatus, TransactionState, TransactionStatus};
