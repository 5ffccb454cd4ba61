use thiserror::Error;

/// Errors produced while decoding (or validating) a wire primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("wrong format: {0}")]
    WrongFormat(String),

    #[error("incomplete data: {0}")]
    IncompleteData(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}
