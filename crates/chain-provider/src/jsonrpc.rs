//! JSON-RPC 2.0 envelopes shared by the EVM and Solana backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub fn request(method: &str, params: Value) -> Value {
    serde_json::to_value(RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    })
    .unwrap_or(Value::Null)
}

/// The `result` member of a response body. An `error` member becomes
/// [`ProviderError::Api`] with the JSON-RPC code. A `null` result is
/// returned as `Value::Null`.
pub fn result(body: &str) -> Result<Value, ProviderError> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("json-rpc envelope: {e}")))?;
    if let Some(error) = response.error {
        return Err(ProviderError::Api {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}
