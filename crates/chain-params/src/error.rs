use thiserror::Error;

/// Errors raised while validating or looking up network parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("invalid parameters for {chain}: {reason}")]
    Invalid { chain: String, reason: String },

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("family mismatch: {0}")]
    FamilyMismatch(String),
}
