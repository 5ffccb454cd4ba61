use thiserror::Error;

/// HTTP statuses whose body is inspected for a structured API error.
pub const API_ERROR_STATUSES: [u16; 9] = [400, 401, 403, 404, 409, 422, 429, 500, 503];

/// JSON-RPC "limit exceeded", sent by rate-limited nodes.
const JSONRPC_LIMIT_EXCEEDED: i64 = -32005;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("all endpoints exhausted after {attempts} attempts, last error: {last}")]
    AllEndpointsExhausted { attempts: usize, last: String },

    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("broadcast via endpoint {endpoint} failed: {reason}")]
    BroadcastFailed { endpoint: usize, reason: Box<ProviderError> },
}

impl ProviderError {
    /// Whether another endpoint may answer differently.
    ///
    /// Only API errors can be definitive: the backend understood the request
    /// and refused it. Rate limiting and server faults are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { code, .. } => {
                *code == 429 || (500..600).contains(code) || *code == JSONRPC_LIMIT_EXCEEDED
            }
            ProviderError::Timeout(_)
            | ProviderError::Transport(_)
            | ProviderError::Decode(_) => true,
            ProviderError::AllEndpointsExhausted { .. }
            | ProviderError::Unsupported(_)
            | ProviderError::BroadcastFailed { .. } => false,
        }
    }

    /// The node already holds the transaction being broadcast.
    pub fn is_already_known(&self) -> bool {
        let ProviderError::Api { message, .. } = self else {
            return false;
        };
        let message = message.to_ascii_lowercase();
        [
            "already known",
            "already in mempool",
            "txn-already-known",
            "txn-already-in-mempool",
            "tx already exists in cache",
            "alreadyprocessed",
            "already been processed",
            "already imported",
        ]
        .iter()
        .any(|needle| message.contains(needle))
    }
}
