use chain_eth::EthError;
use chain_rpc::RpcError;
use chain_sol::SolError;
use crypto_utils::error::CryptoError;
use thiserror::Error;
use wallet_types::TypesError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("ETH: {0}")]
    Eth(#[from] EthError),

    #[error("SOL: {0}")]
    Sol(#[from] SolError),

    #[error("Network error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Invalid input: {0}")]
    InvalidIntent(#[from] TypesError),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(#[from] CryptoError),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Chain data mismatch: {0}")]
    ChainDataMismatch(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification callers use to decide between retrying, showing
/// a message, or giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout. Retryable.
    Network,
    /// A required signal was null or empty.
    DataUnavailable,
    /// Never retried.
    UnsupportedOperation,
    /// Malformed hex, ABI, base58 or base64.
    Decode,
    /// Bad address, missing destination, fee above amount.
    InvalidInput,
    Signing,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Eth(e) => eth_kind(e),
            WalletError::Sol(e) => sol_kind(e),
            WalletError::Rpc(e) => rpc_kind(e),
            WalletError::InvalidIntent(_)
            | WalletError::InvalidPrivateKey(_)
            | WalletError::ChainDataMismatch(_)
            | WalletError::Config(_) => ErrorKind::InvalidInput,
            WalletError::UnsupportedChain(_) | WalletError::UnsupportedOperation(_) => {
                ErrorKind::UnsupportedOperation
            }
        }
    }

    /// Only network failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

fn rpc_kind(e: &RpcError) -> ErrorKind {
    match e {
        RpcError::Transport(_) | RpcError::Timeout | RpcError::Rpc { .. } => ErrorKind::Network,
        RpcError::EmptyResult(_) => ErrorKind::DataUnavailable,
        RpcError::Decode(_) => ErrorKind::Decode,
        RpcError::Config(_) => ErrorKind::InvalidInput,
    }
}

/// A fee signal the node could not serve is missing data, unless the
/// request never reached it.
fn signal_kind(source: &RpcError) -> ErrorKind {
    match source {
        RpcError::Transport(_) | RpcError::Timeout => ErrorKind::Network,
        _ => ErrorKind::DataUnavailable,
    }
}

fn eth_kind(e: &EthError) -> ErrorKind {
    match e {
        EthError::Rpc(e) => rpc_kind(e),
        EthError::BaseFeeUnavailable(source)
        | EthError::GasEstimateUnavailable(source)
        | EthError::L1FeeUnavailable(source) => signal_kind(source),
        EthError::UnsupportedChain(_) | EthError::UnsupportedOperation(_) => {
            ErrorKind::UnsupportedOperation
        }
        EthError::EncodingError(_) => ErrorKind::Decode,
        EthError::SigningError(_) => ErrorKind::Signing,
        EthError::InvalidPrivateKey(_)
        | EthError::InvalidAddress(_)
        | EthError::TransactionBuildError(_)
        | EthError::InvalidIntent(_) => ErrorKind::InvalidInput,
    }
}

fn sol_kind(e: &SolError) -> ErrorKind {
    match e {
        SolError::Rpc(e) => rpc_kind(e),
        SolError::BlockhashUnavailable(source) => signal_kind(source),
        SolError::TokenAccountUnavailable(_) => ErrorKind::DataUnavailable,
        SolError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
        SolError::SerializationError(_) | SolError::UnknownTokenProgram(_) => ErrorKind::Decode,
        SolError::SigningError(_) => ErrorKind::Signing,
        SolError::InvalidPrivateKey(_)
        | SolError::InvalidAddress(_)
        | SolError::TransactionBuildError(_)
        | SolError::InvalidIntent(_) => ErrorKind::InvalidInput,
    }
}
