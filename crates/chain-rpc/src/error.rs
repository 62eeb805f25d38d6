use thiserror::Error;

/// Failures talking to a JSON-RPC node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("empty result for {0}")]
    EmptyResult(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RpcError {
    /// Whether the failure came from the network rather than the payload.
    pub fn is_network(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::Timeout | RpcError::Rpc { .. })
    }
}
