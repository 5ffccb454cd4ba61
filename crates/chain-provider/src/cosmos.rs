//! Cosmos SDK LCD (REST gateway) backend.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::endpoint::{Capability, Endpoint};
use crate::error::ProviderError;
use crate::multiplexer::{Multiplexer, MultiplexerConfig};
use crate::target::{Body, HttpMethod, Target};
use crate::transport::Transport;
use crate::types::TxStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CosmosLcdTarget {
    Account(String),
    Balance { address: String, denom: String },
    /// Base64 `TxRaw` to dry-run for its gas usage.
    Simulate(String),
    /// The JSON broadcast envelope, sent as is.
    Broadcast(String),
    Tx(String),
}

impl Target for CosmosLcdTarget {
    fn capability(&self) -> Capability {
        match self {
            CosmosLcdTarget::Account(_) | CosmosLcdTarget::Balance { .. } => Capability::Account,
            CosmosLcdTarget::Simulate(_) => Capability::Fee,
            CosmosLcdTarget::Broadcast(_) => Capability::Broadcast,
            CosmosLcdTarget::Tx(_) => Capability::Status,
        }
    }

    fn method(&self) -> HttpMethod {
        match self {
            CosmosLcdTarget::Simulate(_) | CosmosLcdTarget::Broadcast(_) => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    fn path(&self) -> String {
        match self {
            CosmosLcdTarget::Account(address) => format!("/cosmos/auth/v1beta1/accounts/{address}"),
            CosmosLcdTarget::Balance { address, denom } => {
                format!("/cosmos/bank/v1beta1/balances/{address}/by_denom?denom={denom}")
            }
            CosmosLcdTarget::Simulate(_) => "/cosmos/tx/v1beta1/simulate".into(),
            CosmosLcdTarget::Broadcast(_) => "/cosmos/tx/v1beta1/txs".into(),
            CosmosLcdTarget::Tx(hash) => format!("/cosmos/tx/v1beta1/txs/{hash}"),
        }
    }

    fn body(&self) -> Body {
        match self {
            CosmosLcdTarget::Simulate(tx_bytes) => Body::Json(json!({ "tx_bytes": tx_bytes })),
            CosmosLcdTarget::Broadcast(envelope) => Body::Text(envelope.clone()),
            _ => Body::Empty,
        }
    }

    fn headers(&self, endpoint: &Endpoint) -> Vec<(String, String)> {
        let mut headers = endpoint.auth_headers();
        if !matches!(self.body(), Body::Empty) {
            headers.push(("content-type".into(), "application/json".into()));
        }
        headers
    }

    fn name(&self) -> &'static str {
        match self {
            CosmosLcdTarget::Account(_) => "cosmos_account",
            CosmosLcdTarget::Balance { .. } => "cosmos_balance",
            CosmosLcdTarget::Simulate(_) => "cosmos_simulate",
            CosmosLcdTarget::Broadcast(_) => "cosmos_broadcast",
            CosmosLcdTarget::Tx(_) => "cosmos_tx",
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmosAccount {
    pub account_number: u64,
    pub sequence: u64,
}

fn decode<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(format!("{what}: {e}")))
}

fn string_number<T: std::str::FromStr>(value: &Value, field: &str) -> Result<T, ProviderError> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ProviderError::Decode(format!("{field} is not a number: {value}")))
}

/// Finds the object holding `account_number`, descending through the
/// wrappers vesting and module accounts use.
fn base_account(account: &Value) -> Option<&Value> {
    if account.get("account_number").is_some() {
        return Some(account);
    }
    ["base_account", "base_vesting_account"]
        .iter()
        .find_map(|key| account.get(*key))
        .and_then(base_account)
}

pub fn parse_account(body: &str) -> Result<CosmosAccount, ProviderError> {
    let value: Value = decode(body, "cosmos account")?;
    let account = value
        .get("account")
        .and_then(base_account)
        .ok_or_else(|| ProviderError::Decode("no account_number in response".into()))?;
    Ok(CosmosAccount {
        account_number: string_number(&account["account_number"], "account_number")?,
        sequence: account
            .get("sequence")
            .map(|s| string_number(s, "sequence"))
            .transpose()?
            .unwrap_or(0),
    })
}

pub fn parse_balance(body: &str) -> Result<u128, ProviderError> {
    let value: Value = decode(body, "cosmos balance")?;
    match value.get("balance") {
        Some(Value::Null) | None => Ok(0),
        Some(balance) => string_number(&balance["amount"], "amount"),
    }
}

pub fn parse_gas_used(body: &str) -> Result<u64, ProviderError> {
    let value: Value = decode(body, "cosmos simulate")?;
    string_number(&value["gas_info"]["gas_used"], "gas_used")
}

#[derive(Deserialize)]
struct TxResponseEnvelope {
    tx_response: TxResponse,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    height: Value,
    txhash: String,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    raw_log: String,
}

/// Hash from a broadcast response; a non-zero ABCI code is an API error.
pub fn parse_broadcast(body: &str) -> Result<String, ProviderError> {
    let response: TxResponseEnvelope = decode(body, "cosmos broadcast")?;
    let tx = response.tx_response;
    if tx.code != 0 {
        return Err(ProviderError::Api {
            code: tx.code,
            message: tx.raw_log,
        });
    }
    Ok(tx.txhash.to_ascii_uppercase())
}

pub fn parse_tx(body: &str) -> Result<TxStatus, ProviderError> {
    let response: TxResponseEnvelope = decode(body, "cosmos tx")?;
    let tx = response.tx_response;
    if tx.code != 0 {
        return Ok(TxStatus::Failed { reason: tx.raw_log });
    }
    let block = string_number(&tx.height, "height").ok();
    Ok(TxStatus::Confirmed { block })
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CosmosProvider {
    mux: Multiplexer,
}

impl CosmosProvider {
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

    /// `None` when the chain has never seen the address.
    pub async fn account(&self, address: &str) -> Result<Option<CosmosAccount>, ProviderError> {
        match self
            .mux
            .read(&CosmosLcdTarget::Account(address.to_string()), parse_account)
            .await
        {
            Ok(account) => Ok(Some(account)),
            Err(ProviderError::Api { code: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn balance(&self, address: &str, denom: &str) -> Result<u128, ProviderError> {
        let target = CosmosLcdTarget::Balance {
            address: address.to_string(),
            denom: denom.to_string(),
        };
        self.mux.read(&target, parse_balance).await
    }

    pub async fn simulate(&self, tx_bytes_base64: &str) -> Result<u64, ProviderError> {
        self.mux
            .read(&CosmosLcdTarget::Simulate(tx_bytes_base64.to_string()), parse_gas_used)
            .await
    }

    pub async fn broadcast(&self, envelope: &str, tx_hash: &str) -> Result<String, ProviderError> {
        self.mux
            .broadcast(&CosmosLcdTarget::Broadcast(envelope.to_string()), tx_hash, parse_broadcast)
            .await
    }

    pub async fn broadcast_via(
        &self,
        endpoint: usize,
        envelope: &str,
        tx_hash: &str,
    ) -> Result<String, ProviderError> {
        let target = CosmosLcdTarget::Broadcast(envelope.to_string());
        self.mux.broadcast_via(endpoint, &target, tx_hash, parse_broadcast).await
    }

    pub async fn tx_status(&self, tx_hash: &str) -> Result<TxStatus, ProviderError> {
        match self
            .mux
            .read(&CosmosLcdTarget::Tx(tx_hash.to_string()), parse_tx)
            .await
        {
            Err(ProviderError::Api { code: 404, .. }) => Ok(TxStatus::Pending),
            other => other,
        }
    }
}
