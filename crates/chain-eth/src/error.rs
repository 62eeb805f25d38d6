use chain_rpc::RpcError;
use thiserror::Error;
use wallet_types::TypesError;

/// EVM pipeline errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("unable to calculate base fee: {0}")]
    BaseFeeUnavailable(#[source] RpcError),

    #[error("unable to estimate gas: {0}")]
    GasEstimateUnavailable(#[source] RpcError),

    #[error("unable to get l1 fee: {0}")]
    L1FeeUnavailable(#[source] RpcError),

    #[error("invalid intent: {0}")]
    InvalidIntent(#[from] TypesError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = EthError::InvalidPrivateKey("key too short".into());
        assert_eq!(err.to_string(), "invalid private key: key too short");
    }

    #[test]
    fn display_invalid_address() {
        let err = EthError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn fee_failures_have_distinct_messages() {
        let base = EthError::BaseFeeUnavailable(RpcError::EmptyResult("eth_feeHistory".into()))
            .to_string();
        let gas = EthError::GasEstimateUnavailable(RpcError::Rpc {
            code: 3,
            message: "execution reverted".into(),
        })
        .to_string();
        assert!(base.starts_with("unable to calculate base fee"));
        assert!(gas.starts_with("unable to estimate gas"));
        assert_ne!(base, gas);
    }

    #[test]
    fn unavailable_errors_keep_their_source() {
        use std::error::Error as _;
        let err = EthError::GasEstimateUnavailable(RpcError::Timeout);
        assert_eq!(err.to_string(), "unable to estimate gas: request timed out");
        assert_eq!(err.source().map(|s| s.to_string()), Some("request timed out".into()));
    }

    #[test]
    fn rpc_errors_convert() {
        let err: EthError = RpcError::Timeout.into();
        assert!(matches!(err, EthError::Rpc(RpcError::Timeout)));
        assert_eq!(err.to_string(), "request timed out");
    }

    #[test]
    fn types_errors_convert() {
        let err: EthError = TypesError::MissingDestination.into();
        assert!(err.to_string().starts_with("invalid intent"));
    }

    #[test]
    fn debug_format_works() {
        let err = EthError::UnsupportedChain("tron".into());
        let debug = format!("{:?}", err);
        assert!(debug.contains("UnsupportedChain"));
    }
}
