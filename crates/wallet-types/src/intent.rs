use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::asset::{Account, AssetId};
use crate::error::TypesError;

/// A chain-agnostic description of what the user wants to do.
///
/// Intents are immutable once built; the `with_*` helpers consume and return
/// a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub from: Account,
    pub asset: AssetId,
    /// Amount in the asset's smallest unit. For send-max transfers this is
    /// the full spendable balance; the fee is subtracted at signing time.
    pub amount: U256,
    pub destination: Option<String>,
    /// Free-form memo (Solana) or hex call data (EVM native sends).
    pub memo: Option<String>,
    pub use_max: bool,
    pub action: IntentAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentAction {
    NativeTransfer,
    TokenTransfer,
    /// A dApp-supplied payload carried in `memo`.
    GenericTransfer { input_type: GenericInputType },
    TokenApproval(ApprovalData),
    Stake(StakeAction),
    Swap(SwapData),
    NftTransfer(NftAsset),
    AccountActivation,
}

/// What a generic (dApp) request wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericInputType {
    /// Only the signature.
    Signature,
    /// The full signed transaction.
    EncodeTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalData {
    /// Token contract being approved.
    pub token: String,
    pub spender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapData {
    pub provider: String,
    /// Router / program the swap calls.
    pub to: String,
    /// Native value attached to the call.
    pub value: U256,
    /// Hex call data on EVM, base64 transaction on Solana.
    pub data: String,
    /// Present when the router needs an allowance first.
    pub approval: Option<ApprovalData>,
    /// Quoted gas limit for the swap itself, required alongside an approval
    /// since the swap cannot be simulated before the allowance exists.
    pub gas_limit: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NftStandard {
    Erc721,
    Erc1155,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftAsset {
    pub contract: String,
    pub token_id: U256,
    pub standard: NftStandard,
}

/// An existing delegation an unstake-type action refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRef {
    pub validator: String,
    /// Stake account on Solana, `validator--unlock` on BSC.
    pub delegation_id: String,
    pub shares: U256,
    pub balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StakeAction {
    Delegate { validator: String },
    Undelegate { delegation: DelegationRef },
    Redelegate {
        delegation: DelegationRef,
        to_validator: String,
    },
    Withdraw { delegation: DelegationRef },
    ClaimRewards { validators: Vec<String> },
}

/// Message signing flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Raw message bytes, wrapped per chain convention before signing.
    Plain,
    /// A precomputed 32-byte structured-data hash.
    Typed,
}

impl Intent {
    fn base(from: Account, asset: AssetId, amount: U256, action: IntentAction) -> Self {
        Self {
            from,
            asset,
            amount,
            destination: None,
            memo: None,
            use_max: false,
            action,
        }
    }

    pub fn native_transfer(from: Account, destination: impl Into<String>, amount: U256) -> Self {
        let asset = AssetId::native(from.chain);
        Self::base(from, asset, amount, IntentAction::NativeTransfer)
            .with_destination(destination)
    }

    pub fn token_transfer(
        from: Account,
        token_id: impl Into<String>,
        destination: impl Into<String>,
        amount: U256,
    ) -> Self {
        let asset = AssetId::token(from.chain, token_id);
        Self::base(from, asset, amount, IntentAction::TokenTransfer).with_destination(destination)
    }

    pub fn generic(
        from: Account,
        destination: Option<String>,
        amount: U256,
        payload: impl Into<String>,
        input_type: GenericInputType,
    ) -> Self {
        let asset = AssetId::native(from.chain);
        let mut intent = Self::base(
            from,
            asset,
            amount,
            IntentAction::GenericTransfer { input_type },
        )
        .with_memo(payload);
        intent.destination = destination;
        intent
    }

    pub fn approval(from: Account, approval: ApprovalData) -> Self {
        let asset = AssetId::token(from.chain, approval.token.clone());
        Self::base(from, asset, U256::ZERO, IntentAction::TokenApproval(approval))
    }

    pub fn stake(from: Account, amount: U256, action: StakeAction) -> Self {
        let asset = AssetId::native(from.chain);
        Self::base(from, asset, amount, IntentAction::Stake(action))
    }

    pub fn swap(from: Account, asset: AssetId, amount: U256, swap: SwapData) -> Self {
        let destination = swap.to.clone();
        Self::base(from, asset, amount, IntentAction::Swap(swap)).with_destination(destination)
    }

    pub fn nft_transfer(from: Account, destination: impl Into<String>, nft: NftAsset) -> Self {
        let asset = AssetId::token(from.chain, nft.contract.clone());
        Self::base(from, asset, U256::from(1), IntentAction::NftTransfer(nft))
            .with_destination(destination)
    }

    pub fn activation(from: Account, asset: AssetId) -> Self {
        Self::base(from, asset, U256::ZERO, IntentAction::AccountActivation)
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_max(mut self, use_max: bool) -> Self {
        self.use_max = use_max;
        self
    }

    /// The destination, or an error for intents that require one.
    pub fn require_destination(&self) -> Result<&str, TypesError> {
        self.destination
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or(TypesError::MissingDestination)
    }

    /// A native-coin transfer spending the whole balance. Only this case pays
    /// the full `max_fee_per_gas` and has its fee deducted from the amount.
    pub fn is_max_native_transfer(&self) -> bool {
        self.use_max
            && self.asset.is_native()
            && matches!(self.action, IntentAction::NativeTransfer)
    }

    /// Amount actually sent once `fee` is known.
    pub fn final_amount(&self, fee: U256) -> Result<U256, TypesError> {
        if !self.is_max_native_transfer() {
            return Ok(self.amount);
        }
        self.amount
            .checked_sub(fee)
            .ok_or_else(|| TypesError::FeeExceedsAmount {
                fee: fee.to_string(),
                amount: self.amount.to_string(),
            })
    }
}
