use thiserror::Error;

/// Cosmos chain operation errors.
#[derive(Debug, Error)]
pub enum CosmosError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("wrong network: {0}")]
    WrongNetwork(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_public_key() {
        let err = CosmosError::InvalidPublicKey("33 bytes expected".into());
        assert_eq!(err.to_string(), "invalid public key: 33 bytes expected");
    }

    #[test]
    fn display_invalid_address() {
        let err = CosmosError::InvalidAddress("wrong hrp".into());
        assert_eq!(err.to_string(), "invalid address: wrong hrp");
    }

    #[test]
    fn display_wrong_network() {
        let err = CosmosError::WrongNetwork("expected prefix \"cosmos\", got \"terra\"".into());
        assert_eq!(
            err.to_string(),
            "wrong network: expected prefix \"cosmos\", got \"terra\""
        );
    }

    #[test]
    fn display_transaction_build_error() {
        let err = CosmosError::TransactionBuildError("zero gas".into());
        assert_eq!(err.to_string(), "transaction build error: zero gas");
    }

    #[test]
    fn display_signing_error() {
        let err = CosmosError::SigningError("bad length".into());
        assert_eq!(err.to_string(), "signing error: bad length");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(CosmosError::EncodingError("json".into()));
        assert!(err.to_string().contains("json"));
    }

    #[test]
    fn debug_format_works() {
        let err = CosmosError::SigningError("x".into());
        assert!(format!("{:?}", err).contains("SigningError"));
    }
}
