//! Solana JSON-RPC backend.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::endpoint::{Capability, Endpoint};
use crate::error::ProviderError;
use crate::jsonrpc;
use crate::multiplexer::{Multiplexer, MultiplexerConfig};
use crate::target::{Body, HttpMethod, Target};
use crate::transport::Transport;
use crate::types::TxStatus;

const COMMITMENT: &str = "confirmed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolanaRpcTarget {
    Balance(String),
    LatestBlockhash,
    /// Base64 of a serialized message.
    FeeForMessage(String),
    /// Base64 of a signed wire transaction.
    SendTransaction(String),
    SignatureStatus(String),
}

impl SolanaRpcTarget {
    fn rpc_method(&self) -> &'static str {
        match self {
            SolanaRpcTarget::Balance(_) => "getBalance",
            SolanaRpcTarget::LatestBlockhash => "getLatestBlockhash",
            SolanaRpcTarget::FeeForMessage(_) => "getFeeForMessage",
            SolanaRpcTarget::SendTransaction(_) => "sendTransaction",
            SolanaRpcTarget::SignatureStatus(_) => "getSignatureStatuses",
        }
    }

    fn params(&self) -> Value {
        match self {
            SolanaRpcTarget::Balance(address) => json!([address, { "commitment": COMMITMENT }]),
            SolanaRpcTarget::LatestBlockhash => json!([{ "commitment": COMMITMENT }]),
            SolanaRpcTarget::FeeForMessage(message) => {
                json!([message, { "commitment": COMMITMENT }])
            }
            SolanaRpcTarget::SendTransaction(tx) => json!([tx, {
                "encoding": "base64",
                "preflightCommitment": COMMITMENT,
            }]),
            SolanaRpcTarget::SignatureStatus(signature) => {
                json!([[signature], { "searchTransactionHistory": true }])
            }
        }
    }
}

impl Target for SolanaRpcTarget {
    fn capability(&self) -> Capability {
        match self {
            SolanaRpcTarget::Balance(_) | SolanaRpcTarget::LatestBlockhash => Capability::Account,
            SolanaRpcTarget::FeeForMessage(_) => Capability::Fee,
            SolanaRpcTarget::SendTransaction(_) => Capability::Broadcast,
            SolanaRpcTarget::SignatureStatus(_) => Capability::Status,
        }
    }

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn path(&self) -> String {
        String::new()
    }

    fn body(&self) -> Body {
        Body::Json(jsonrpc::request(self.rpc_method(), self.params()))
    }

    fn name(&self) -> &'static str {
        self.rpc_method()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Most Solana results wrap their payload as `{"context": .., "value": ..}`.
fn context_value(body: &str) -> Result<Value, ProviderError> {
    let result = jsonrpc::result(body)?;
    match result {
        Value::Object(mut map) if map.contains_key("context") => {
            Ok(map.remove("value").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

pub fn parse_balance(body: &str) -> Result<u64, ProviderError> {
    let value = context_value(body)?;
    value
        .as_u64()
        .ok_or_else(|| ProviderError::Decode(format!("balance is not a u64: {value}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: [u8; 32],
    pub last_valid_block_height: u64,
}

pub fn parse_latest_blockhash(body: &str) -> Result<LatestBlockhash, ProviderError> {
    let value = context_value(body)?;
    let text = value["blockhash"]
        .as_str()
        .ok_or_else(|| ProviderError::Decode("missing blockhash".into()))?;
    let bytes = bs58::decode(text)
        .into_vec()
        .map_err(|e| ProviderError::Decode(format!("blockhash: {e}")))?;
    let blockhash: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ProviderError::Decode("blockhash is not 32 bytes".into()))?;
    Ok(LatestBlockhash {
        blockhash,
        last_valid_block_height: value["lastValidBlockHeight"].as_u64().unwrap_or(0),
    })
}

/// Fee in lamports; `null` means the blockhash in the message expired.
pub fn parse_fee_for_message(body: &str) -> Result<u64, ProviderError> {
    let value = context_value(body)?;
    match value {
        Value::Null => Err(ProviderError::Decode(
            "fee unavailable: blockhash in message expired".into(),
        )),
        other => other
            .as_u64()
            .ok_or_else(|| ProviderError::Decode(format!("fee is not a u64: {other}"))),
    }
}

pub fn parse_signature(body: &str) -> Result<String, ProviderError> {
    let result = jsonrpc::result(body)?;
    result
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Decode(format!("not a signature: {result}")))
}

pub fn parse_signature_status(body: &str) -> Result<TxStatus, ProviderError> {
    let value = context_value(body)?;
    let status = match value.as_array().and_then(|list| list.first()) {
        None | Some(Value::Null) => return Ok(TxStatus::Pending),
        Some(status) => status,
    };
    if let Some(err) = status.get("err").filter(|e| !e.is_null()) {
        return Ok(TxStatus::Failed {
            reason: err.to_string(),
        });
    }
    match status.get("confirmationStatus").and_then(Value::as_str) {
        Some("confirmed") | Some("finalized") => Ok(TxStatus::Confirmed {
            block: status.get("slot").and_then(Value::as_u64),
        }),
        _ => Ok(TxStatus::Pending),
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SolanaProvider {
    mux: Multiplexer,
}

impl SolanaProvider {
    pub fn new(
        endpoints: Vec<Endpoint>,
        transport: Arc<dyn Transport>,
        config: MultiplexerConfig,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            mux: Multiplexer::new(endpoints, transport, config)?,
        })
    }

    pub fn multiplexer(&self) -> &Multiplexer {
        &self.mux
    }

    pub async fn balance(&self, address: &str) -> Result<u64, ProviderError> {
        self.mux
            .read(&SolanaRpcTarget::Balance(address.to_string()), parse_balance)
            .await
    }

    pub async fn latest_blockhash(&self) -> Result<LatestBlockhash, ProviderError> {
        self.mux
            .read(&SolanaRpcTarget::LatestBlockhash, parse_latest_blockhash)
            .await
    }

    pub async fn fee_for_message(&self, message_base64: &str) -> Result<u64, ProviderError> {
        self.mux
            .read(
                &SolanaRpcTarget::FeeForMessage(message_base64.to_string()),
                parse_fee_for_message,
            )
            .await
    }

    pub async fn send_transaction(
        &self,
        tx_base64: &str,
        signature: &str,
    ) -> Result<String, ProviderError> {
        self.mux
            .broadcast(
                &SolanaRpcTarget::SendTransaction(tx_base64.to_string()),
                signature,
                parse_signature,
            )
            .await
    }

    pub async fn send_transaction_via(
        &self,
        endpoint: usize,
        tx_base64: &str,
        signature: &str,
    ) -> Result<String, ProviderError> {
        let target = SolanaRpcTarget::SendTransaction(tx_base64.to_string());
        self.mux.broadcast_via(endpoint, &target, signature, parse_signature).await
    }

    pub async fn tx_status(&self, signature: &str) -> Result<TxStatus, ProviderError> {
        self.mux
            .read(
                &SolanaRpcTarget::SignatureStatus(signature.to_string()),
                parse_signature_status,
            )
            .await
    }
}
