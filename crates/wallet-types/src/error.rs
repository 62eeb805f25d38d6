use thiserror::Error;

/// Errors raised while constructing or interpreting model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    #[error("unknown fee priority: {0}")]
    UnknownPriority(String),

    #[error("missing destination address")]
    MissingDestination,

    #[error("fee {fee} exceeds available amount {amount}")]
    FeeExceedsAmount { fee: String, amount: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_chain() {
        let err = TypesError::UnknownChain("atlantis".into());
        assert_eq!(err.to_string(), "unknown chain: atlantis");
    }

    #[test]
    fn display_fee_exceeds_amount() {
        let err = TypesError::FeeExceedsAmount {
            fee: "10".into(),
            amount: "5".into(),
        };
        assert_eq!(err.to_string(), "fee 10 exceeds available amount 5");
    }
}
