use thiserror::Error;

/// Substrate chain operation errors.
#[derive(Debug, Error)]
pub enum DotError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("wrong network: expected type {expected}, got {actual}")]
    WrongNetwork { expected: u16, actual: u16 },

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_public_key() {
        let err = DotError::InvalidPublicKey("31 bytes".into());
        assert_eq!(err.to_string(), "invalid public key: 31 bytes");
    }

    #[test]
    fn display_invalid_address() {
        let err = DotError::InvalidAddress("checksum".into());
        assert_eq!(err.to_string(), "invalid address: checksum");
    }

    #[test]
    fn display_invalid_checksum() {
        let err = DotError::InvalidChecksum("ss58 checksum mismatch".into());
        assert_eq!(err.to_string(), "invalid checksum: ss58 checksum mismatch");
    }

    #[test]
    fn display_wrong_network() {
        let err = DotError::WrongNetwork {
            expected: 0,
            actual: 42,
        };
        assert_eq!(err.to_string(), "wrong network: expected type 0, got 42");
    }

    #[test]
    fn display_transaction_build_error() {
        let err = DotError::TransactionBuildError("zero amount".into());
        assert_eq!(err.to_string(), "transaction build error: zero amount");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(DotError::SigningError("len".into()));
        assert!(err.to_string().contains("len"));
    }

    #[test]
    fn debug_format_works() {
        let err = DotError::SigningError("x".into());
        assert!(format!("{:?}", err).contains("SigningError"));
    }
}
