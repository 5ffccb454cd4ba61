use thiserror::Error;

/// Solana chain operation errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("key not found in static keys or any lookup table: {0}")]
    KeyNotFoundInStaticOrAnyTable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_public_key() {
        let err = SolError::InvalidPublicKey("expected 32 bytes".into());
        assert_eq!(err.to_string(), "invalid public key: expected 32 bytes");
    }

    #[test]
    fn display_invalid_address() {
        let err = SolError::InvalidAddress("bad decode".into());
        assert_eq!(err.to_string(), "invalid address: bad decode");
    }

    #[test]
    fn display_transaction_build_error() {
        let err = SolError::TransactionBuildError("lamports must be > 0".into());
        assert_eq!(err.to_string(), "transaction build error: lamports must be > 0");
    }

    #[test]
    fn display_signing_error() {
        let err = SolError::SigningError("signature does not verify".into());
        assert_eq!(err.to_string(), "signing error: signature does not verify");
    }

    #[test]
    fn display_serialization_error() {
        let err = SolError::SerializationError("compact-u16 overflow".into());
        assert_eq!(err.to_string(), "serialization error: compact-u16 overflow");
    }

    #[test]
    fn display_key_not_found() {
        let err = SolError::KeyNotFoundInStaticOrAnyTable("index 7".into());
        assert_eq!(
            err.to_string(),
            "key not found in static keys or any lookup table: index 7"
        );
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(SolError::InvalidAddress("test".into()));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn debug_format_works() {
        let err = SolError::SigningError("fail".into());
        let debug = format!("{:?}", err);
        assert!(debug.contains("SigningError"));
    }
}
