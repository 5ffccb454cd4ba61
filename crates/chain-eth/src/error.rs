use thiserror::Error;

/// EVM chain operation errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("fee data unavailable: {0}")]
    FeeDataUnavailable(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),
}
