use chain_rpc::RpcError;
use thiserror::Error;
use wallet_types::TypesError;

/// Solana pipeline errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("unable to get blockhash: {0}")]
    BlockhashUnavailable(#[source] RpcError),

    #[error("token account unavailable: {0}")]
    TokenAccountUnavailable(String),

    #[error("unknown token program: {0}")]
    UnknownTokenProgram(String),

    #[error("invalid intent: {0}")]
    InvalidIntent(#[from] TypesError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}
