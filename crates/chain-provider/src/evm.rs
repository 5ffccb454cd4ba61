//! Ethereum JSON-RPC backend.

use std::sync::Arc;

use alloy_primitives::U256;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::endpoint::{Capability, Endpoint};
use crate::error::ProviderError;
use crate::jsonrpc;
use crate::multiplexer::{Multiplexer, MultiplexerConfig};
use crate::target::{Body, HttpMethod, Target};
use crate::transport::Transport;
use crate::types::TxStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvmRpcTarget {
    Balance(String),
    TransactionCount(String),
    GasPrice,
    FeeHistory { block_count: u64, percentiles: Vec<u8> },
    EstimateGas { from: String, to: String, value: U256, data: Vec<u8> },
    Call { to: String, data: Vec<u8> },
    SendRawTransaction(Vec<u8>),
    TransactionReceipt(String),
}

fn hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

impl EvmRpcTarget {
    fn rpc_method(&self) -> &'static str {
        match self {
            EvmRpcTarget::Balance(_) => "eth_getBalance",
            EvmRpcTarget::TransactionCount(_) => "eth_getTransactionCount",
            EvmRpcTarget::GasPrice => "eth_gasPrice",
            EvmRpcTarget::FeeHistory { .. } => "eth_feeHistory",
            EvmRpcTarget::EstimateGas { .. } => "eth_estimateGas",
            EvmRpcTarget::Call { .. } => "eth_call",
            EvmRpcTarget::SendRawTransaction(_) => "eth_sendRawTransaction",
            EvmRpcTarget::TransactionReceipt(_) => "eth_getTransactionReceipt",
        }
    }

    fn params(&self) -> Value {
        match self {
            EvmRpcTarget::Balance(address) => json!([address, "latest"]),
            EvmRpcTarget::TransactionCount(address) => json!([address, "pending"]),
            EvmRpcTarget::GasPrice => json!([]),
            EvmRpcTarget::FeeHistory {
                block_count,
                percentiles,
            } => json!([format!("{block_count:#x}"), "pending", percentiles]),
            EvmRpcTarget::EstimateGas {
                from,
                to,
                value,
                data,
            } => json!([{
                "from": from,
                "to": to,
                "value": format!("{value:#x}"),
                "data": hex_data(data),
            }]),
            EvmRpcTarget::Call { to, data } => {
                json!([{ "to": to, "data": hex_data(data) }, "latest"])
            }
            EvmRpcTarget::SendRawTransaction(raw) => json!([hex_data(raw)]),
            EvmRpcTarget::TransactionReceipt(hash) => json!([hash]),
        }
    }
}

impl Target for EvmRpcTarget {
    fn capability(&self) -> Capability {
        match self {
            EvmRpcTarget::Balance(_)
            | EvmRpcTarget::TransactionCount(_)
            | EvmRpcTarget::Call { .. } => Capability::Account,
            EvmRpcTarget::GasPrice
            | EvmRpcTarget::FeeHistory { .. }
            | EvmRpcTarget::EstimateGas { .. } => Capability::Fee,
            EvmRpcTarget::SendRawTransaction(_) => Capability::Broadcast,
            EvmRpcTarget::TransactionReceipt(_) => Capability::Status,
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

fn quantity(value: &Value) -> Result<U256, ProviderError> {
    let text = value
        .as_str()
        .ok_or_else(|| ProviderError::Decode(format!("expected hex quantity, got {value}")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| ProviderError::Decode(format!("missing 0x prefix: {text}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::Decode(format!("bad quantity {text}: {e}")))
}

pub fn parse_quantity(body: &str) -> Result<U256, ProviderError> {
    quantity(&jsonrpc::result(body)?)
}

pub fn parse_u64_quantity(body: &str) -> Result<u64, ProviderError> {
    let value = parse_quantity(body)?;
    u64::try_from(value).map_err(|_| ProviderError::Decode(format!("{value} exceeds u64")))
}

pub fn parse_data(body: &str) -> Result<Vec<u8>, ProviderError> {
    let result = jsonrpc::result(body)?;
    let text = result
        .as_str()
        .and_then(|t| t.strip_prefix("0x"))
        .ok_or_else(|| ProviderError::Decode(format!("expected hex data, got {result}")))?;
    hex::decode(text).map_err(|e| ProviderError::Decode(format!("bad hex data: {e}")))
}

/// `eth_feeHistory` reduced to what fee estimation needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeHistory {
    /// One entry per block plus the pending block.
    pub base_fee_per_gas: Vec<U256>,
    /// One row per block, one column per requested percentile.
    pub reward: Vec<Vec<U256>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeeHistory {
    #[serde(default)]
    base_fee_per_gas: Vec<Value>,
    #[serde(default)]
    reward: Vec<Vec<Value>>,
}

pub fn parse_fee_history(body: &str) -> Result<FeeHistory, ProviderError> {
    let raw: RawFeeHistory = serde_json::from_value(jsonrpc::result(body)?)
        .map_err(|e| ProviderError::Decode(format!("fee history: {e}")))?;
    let base_fee_per_gas = raw
        .base_fee_per_gas
        .iter()
        .map(quantity)
        .collect::<Result<_, _>>()?;
    let reward = raw
        .reward
        .iter()
        .map(|row| row.iter().map(quantity).collect::<Result<Vec<_>, _>>())
        .collect::<Result<_, _>>()?;
    Ok(FeeHistory {
        base_fee_per_gas,
        reward,
    })
}

pub fn parse_tx_hash(body: &str) -> Result<String, ProviderError> {
    let result = jsonrpc::result(body)?;
    result
        .as_str()
        .filter(|h| h.len() == 66 && h.starts_with("0x"))
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| ProviderError::Decode(format!("not a tx hash: {result}")))
}

pub fn parse_receipt(body: &str) -> Result<TxStatus, ProviderError> {
    let receipt = jsonrpc::result(body)?;
    if receipt.is_null() {
        return Ok(TxStatus::Pending);
    }
    let block = receipt
        .get("blockNumber")
        .filter(|b| !b.is_null())
        .map(quantity)
        .transpose()?
        .and_then(|b| u64::try_from(b).ok());
    match receipt.get("status").and_then(Value::as_str) {
        Some("0x1") => Ok(TxStatus::Confirmed { block }),
        Some("0x0") => Ok(TxStatus::Failed {
            reason: "execution reverted".into(),
        }),
        other => Err(ProviderError::Decode(format!("unknown receipt status {other:?}"))),
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EvmProvider {
    mux: Multiplexer,
}

impl EvmProvider {
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

    pub async fn balance(&self, address: &str) -> Result<U256, ProviderError> {
        self.mux
            .read(&EvmRpcTarget::Balance(address.to_string()), parse_quantity)
            .await
    }

    /// Pending nonce, counting transactions still in the mempool.
    pub async fn nonce(&self, address: &str) -> Result<u64, ProviderError> {
        self.mux
            .read(&EvmRpcTarget::TransactionCount(address.to_string()), parse_u64_quantity)
            .await
    }

    pub async fn gas_price(&self) -> Result<U256, ProviderError> {
        self.mux.read(&EvmRpcTarget::GasPrice, parse_quantity).await
    }

    pub async fn fee_history(
        &self,
        block_count: u64,
        percentiles: &[u8],
    ) -> Result<FeeHistory, ProviderError> {
        let target = EvmRpcTarget::FeeHistory {
            block_count,
            percentiles: percentiles.to_vec(),
        };
        self.mux.read(&target, parse_fee_history).await
    }

    pub async fn estimate_gas(
        &self,
        from: &str,
        to: &str,
        value: U256,
        data: &[u8],
    ) -> Result<u64, ProviderError> {
        let target = EvmRpcTarget::EstimateGas {
            from: from.to_string(),
            to: to.to_string(),
            value,
            data: data.to_vec(),
        };
        self.mux.read(&target, parse_u64_quantity).await
    }

    pub async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let target = EvmRpcTarget::Call {
            to: to.to_string(),
            data: data.to_vec(),
        };
        self.mux.read(&target, parse_data).await
    }

    pub async fn send_raw_transaction(
        &self,
        raw_tx: &[u8],
        tx_hash: &str,
    ) -> Result<String, ProviderError> {
        self.mux
            .broadcast(&EvmRpcTarget::SendRawTransaction(raw_tx.to_vec()), tx_hash, parse_tx_hash)
            .await
    }

    pub async fn send_raw_transaction_via(
        &self,
        endpoint: usize,
        raw_tx: &[u8],
        tx_hash: &str,
    ) -> Result<String, ProviderError> {
        let target = EvmRpcTarget::SendRawTransaction(raw_tx.to_vec());
        self.mux.broadcast_via(endpoint, &target, tx_hash, parse_tx_hash).await
    }

    pub async fn tx_status(&self, tx_hash: &str) -> Result<TxStatus, ProviderError> {
        self.mux
            .read(&EvmRpcTarget::TransactionReceipt(tx_hash.to_string()), parse_receipt)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpTransport;
    use httpmock::{Method, MockServer};
    use url::Url;

    fn ok(result: Value) -> String {
        json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
    }

    #[test]
    fn fee_history_body() {
        let target = EvmRpcTarget::FeeHistory {
            block_count: 5,
            percentiles: vec![25, 50, 75],
        };
        let Body::Json(body) = target.body() else {
            panic!("expected json body");
        };
        assert_eq!(body["method"], "eth_feeHistory");
        assert_eq!(body["params"], json!(["0x5", "pending", [25, 50, 75]]));
        assert_eq!(target.capability(), Capability::Fee);
        assert_eq!(target.path(), "");
    }

    #[test]
    fn parses_quantities() {
        assert_eq!(parse_quantity(&ok(json!("0x1bc16d674ec80000"))).unwrap(), U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(parse_u64_quantity(&ok(json!("0x0"))).unwrap(), 0);
        assert_eq!(parse_quantity(&ok(json!("0x"))).unwrap(), U256::ZERO);
        assert!(parse_quantity(&ok(json!("12"))).is_err());
        assert!(parse_quantity(&ok(json!(12))).is_err());
    }

    #[test]
    fn parses_fee_history() {
        let body = ok(json!({
            "oldestBlock": "0x10",
            "baseFeePerGas": ["0x64", "0x6e"],
            "gasUsedRatio": [0.5],
            "reward": [["0x1", "0x2", "0x3"]],
        }));
        let history = parse_fee_history(&body).unwrap();
        assert_eq!(history.base_fee_per_gas, vec![U256::from(100), U256::from(110)]);
        assert_eq!(history.reward[0][2], U256::from(3));

        let no_reward = ok(json!({"oldestBlock": "0x10", "baseFeePerGas": ["0x0"]}));
        assert!(parse_fee_history(&no_reward).unwrap().reward.is_empty());
    }

    #[test]
    fn parses_receipts() {
        assert_eq!(parse_receipt(&ok(Value::Null)).unwrap(), TxStatus::Pending);
        assert_eq!(
            parse_receipt(&ok(json!({"status": "0x1", "blockNumber": "0x10"}))).unwrap(),
            TxStatus::Confirmed { block: Some(16) }
        );
        assert!(matches!(
            parse_receipt(&ok(json!({"status": "0x0", "blockNumber": "0x10"}))).unwrap(),
            TxStatus::Failed { .. }
        ));
    }

    #[test]
    fn rpc_error_propagates() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#;
        assert_eq!(
            parse_tx_hash(body),
            Err(ProviderError::Api {
                code: -32000,
                message: "nonce too low".into()
            })
        );
    }

    #[tokio::test]
    async fn nonce_over_http() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/")
                .json_body_partial(r#"{"method":"eth_getTransactionCount"}"#);
            then.status(200).body(ok(json!("0xc4")));
        });
        let provider = EvmProvider::new(
            vec![Endpoint::new(Url::parse(&server.base_url()).unwrap())],
            Arc::new(HttpTransport::new()),
            MultiplexerConfig::default(),
        )
        .unwrap();

        assert_eq!(provider.nonce("0xabc").await.unwrap(), 196);
        mock.assert();
    }

    #[tokio::test]
    async fn known_transaction_resolves_to_local_hash() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::POST);
            then.status(200).body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"already known"}}"#,
            );
        });
        let provider = EvmProvider::new(
            vec![Endpoint::new(Url::parse(&server.base_url()).unwrap())],
            Arc::new(HttpTransport::new()),
            MultiplexerConfig::default(),
        )
        .unwrap();

        let local = format!("0x{}", "ab".repeat(32));
        let hash = provider.send_raw_transaction(&[0x02, 0xf8], &local).await.unwrap();
        assert_eq!(hash, local);
    }
}
