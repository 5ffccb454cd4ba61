//! Esplora REST backend for UTXO chains.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::endpoint::{Capability, Endpoint};
use crate::error::ProviderError;
use crate::multiplexer::{Multiplexer, MultiplexerConfig};
use crate::target::{Body, HttpMethod, Target};
use crate::transport::Transport;
use crate::types::{TxStatus, UtxoEntry};

/// Confirmation targets, in blocks, for the slow, market and fast tiers.
pub const CONFIRMATION_TARGETS: [u32; 3] = [25, 6, 1];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EsploraTarget {
    Address(String),
    Utxos(String),
    FeeEstimates,
    /// Raw transaction hex.
    Broadcast(String),
    TxStatus(String),
}

impl Target for EsploraTarget {
    fn capability(&self) -> Capability {
        match self {
            EsploraTarget::Address(_) => Capability::Account,
            EsploraTarget::Utxos(_) => Capability::Utxo,
            EsploraTarget::FeeEstimates => Capability::Fee,
            EsploraTarget::Broadcast(_) => Capability::Broadcast,
            EsploraTarget::TxStatus(_) => Capability::Status,
        }
    }

    fn method(&self) -> HttpMethod {
        match self {
            EsploraTarget::Broadcast(_) => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    fn path(&self) -> String {
        match self {
            EsploraTarget::Address(address) => format!("/address/{address}"),
            EsploraTarget::Utxos(address) => format!("/address/{address}/utxo"),
            EsploraTarget::FeeEstimates => "/fee-estimates".into(),
            EsploraTarget::Broadcast(_) => "/tx".into(),
            EsploraTarget::TxStatus(txid) => format!("/tx/{txid}/status"),
        }
    }

    fn body(&self) -> Body {
        match self {
            EsploraTarget::Broadcast(raw_hex) => Body::Text(raw_hex.clone()),
            _ => Body::Empty,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            EsploraTarget::Address(_) => "esplora_address",
            EsploraTarget::Utxos(_) => "esplora_utxos",
            EsploraTarget::FeeEstimates => "esplora_fee_estimates",
            EsploraTarget::Broadcast(_) => "esplora_broadcast",
            EsploraTarget::TxStatus(_) => "esplora_tx_status",
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressBalance {
    pub confirmed: u64,
    /// Net mempool change; negative while spends are unconfirmed.
    pub pending: i64,
}

#[derive(Deserialize)]
struct Stats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

#[derive(Deserialize)]
struct AddressInfo {
    chain_stats: Stats,
    mempool_stats: Stats,
}

pub fn parse_balance(body: &str) -> Result<AddressBalance, ProviderError> {
    let info: AddressInfo = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("esplora address: {e}")))?;
    let confirmed = info
        .chain_stats
        .funded_txo_sum
        .checked_sub(info.chain_stats.spent_txo_sum)
        .ok_or_else(|| ProviderError::Decode("spent exceeds funded".into()))?;
    let pending = i128::from(info.mempool_stats.funded_txo_sum)
        - i128::from(info.mempool_stats.spent_txo_sum);
    let pending = i64::try_from(pending)
        .map_err(|_| ProviderError::Decode("mempool delta out of range".into()))?;
    Ok(AddressBalance { confirmed, pending })
}

#[derive(Deserialize)]
struct RawUtxo {
    txid: String,
    vout: u32,
    value: u64,
    status: RawStatus,
}

#[derive(Deserialize)]
struct RawStatus {
    confirmed: bool,
    #[serde(default)]
    block_height: Option<u64>,
}

pub fn parse_utxos(body: &str) -> Result<Vec<UtxoEntry>, ProviderError> {
    let raw: Vec<RawUtxo> = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("esplora utxos: {e}")))?;
    Ok(raw
        .into_iter()
        .map(|u| UtxoEntry {
            txid: u.txid,
            vout: u.vout,
            value: u.value,
            confirmed: u.status.confirmed,
        })
        .collect())
}

/// Rounds a non-negative JSON decimal up to an integer without going
/// through floating point.
fn ceil_decimal(number: &Number) -> Option<u64> {
    if let Some(v) = number.as_u64() {
        return Some(v);
    }
    let text = number.to_string();
    if text.contains(['e', 'E', '-']) {
        return None;
    }
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let whole: u64 = whole.parse().ok()?;
    if fraction.bytes().any(|b| b != b'0') {
        whole.checked_add(1)
    } else {
        Some(whole)
    }
}

/// Per-vbyte rates for [`CONFIRMATION_TARGETS`], rounded up.
///
/// A target missing from the response uses the closest faster target.
pub fn parse_fee_estimates(body: &str) -> Result<[u64; 3], ProviderError> {
    let map: serde_json::Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("esplora fee estimates: {e}")))?;
    let mut estimates: Vec<(u32, u64)> = map
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Number(n) => Some((k.parse().ok()?, ceil_decimal(n)?)),
            _ => None,
        })
        .collect();
    estimates.sort_unstable();

    let mut rates = [0u64; 3];
    for (slot, target) in rates.iter_mut().zip(CONFIRMATION_TARGETS) {
        *slot = estimates
            .iter()
            .rev()
            .find(|(blocks, _)| *blocks <= target)
            .map(|(_, rate)| *rate)
            .ok_or_else(|| ProviderError::Decode(format!("no estimate for {target} blocks")))?;
    }
    Ok(rates)
}

pub fn parse_tx_status(body: &str) -> Result<TxStatus, ProviderError> {
    let status: RawStatus = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("esplora tx status: {e}")))?;
    Ok(if status.confirmed {
        TxStatus::Confirmed {
            block: status.block_height,
        }
    } else {
        TxStatus::Pending
    })
}

/// The txid Esplora answers a broadcast with.
pub fn parse_txid(body: &str) -> Result<String, ProviderError> {
    let txid = body.trim();
    if txid.len() != 64 || !txid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ProviderError::Decode(format!("not a txid: {txid:.80}")));
    }
    Ok(txid.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EsploraProvider {
    mux: Multiplexer,
}

impl EsploraProvider {
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

    pub async fn balance(&self, address: &str) -> Result<AddressBalance, ProviderError> {
        self.mux
            .read(&EsploraTarget::Address(address.to_string()), parse_balance)
            .await
    }

    /// Unspent outputs for each address, in input order.
    pub async fn utxos(&self, addresses: &[String]) -> Vec<Result<Vec<UtxoEntry>, ProviderError>> {
        self.mux
            .read_many(addresses.to_vec(), EsploraTarget::Utxos, parse_utxos)
            .await
    }

    pub async fn fee_rates(&self) -> Result<[u64; 3], ProviderError> {
        self.mux
            .read(&EsploraTarget::FeeEstimates, parse_fee_estimates)
            .await
    }

    pub async fn broadcast(&self, raw_tx: &[u8], txid: &str) -> Result<String, ProviderError> {
        self.mux
            .broadcast(&EsploraTarget::Broadcast(hex::encode(raw_tx)), txid, parse_txid)
            .await
    }

    /// Pushes the transaction through endpoint `endpoint` only.
    pub async fn broadcast_via(
        &self,
        endpoint: usize,
        raw_tx: &[u8],
        txid: &str,
    ) -> Result<String, ProviderError> {
        let target = EsploraTarget::Broadcast(hex::encode(raw_tx));
        self.mux.broadcast_via(endpoint, &target, txid, parse_txid).await
    }

    pub async fn tx_status(&self, txid: &str) -> Result<TxStatus, ProviderError> {
        match self
            .mux
            .read(&EsploraTarget::TxStatus(txid.to_string()), parse_tx_status)
            .await
        {
            Err(ProviderError::Api { code: 404, .. }) => Ok(TxStatus::Pending),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpTransport;
    use httpmock::{Method, MockServer};
    use url::Url;

    #[test]
    fn target_mapping() {
        let t = EsploraTarget::Utxos("bc1qxyz".into());
        assert_eq!(t.path(), "/address/bc1qxyz/utxo");
        assert_eq!(t.method(), HttpMethod::Get);
        assert_eq!(t.capability(), Capability::Utxo);

        let b = EsploraTarget::Broadcast("0100".into());
        assert_eq!(b.method(), HttpMethod::Post);
        assert_eq!(b.body(), Body::Text("0100".into()));
    }

    #[test]
    fn balance_nets_mempool() {
        let body = r#"{"address":"x","chain_stats":{"funded_txo_sum":5000,"spent_txo_sum":1000,"tx_count":2},
                       "mempool_stats":{"funded_txo_sum":0,"spent_txo_sum":700,"tx_count":1}}"#;
        assert_eq!(
            parse_balance(body).unwrap(),
            AddressBalance {
                confirmed: 4000,
                pending: -700
            }
        );
    }

    #[test]
    fn fee_estimates_round_up_exactly() {
        let body = r#"{"1": 87.882, "2": 50.0, "3": 40.1, "6": 20.000, "10": 12.5, "25": 5.0001, "144": 1.0}"#;
        assert_eq!(parse_fee_estimates(body).unwrap(), [6, 20, 88]);

        // 25 missing: fall back to the closest faster target (10).
        let sparse = r#"{"1": 10, "6": 4, "10": 3}"#;
        assert_eq!(parse_fee_estimates(sparse).unwrap(), [3, 4, 10]);
        assert!(parse_fee_estimates(r#"{"6": 4}"#).is_err());
    }

    #[test]
    fn utxos_and_status() {
        let body = r#"[{"txid":"aa","vout":1,"value":1500,"status":{"confirmed":true,"block_height":800000}}]"#;
        let utxos = parse_utxos(body).unwrap();
        assert_eq!(utxos[0].value, 1500);
        assert!(utxos[0].confirmed);

        assert_eq!(
            parse_tx_status(r#"{"confirmed":true,"block_height":800001}"#).unwrap(),
            TxStatus::Confirmed {
                block: Some(800001)
            }
        );
        assert_eq!(parse_tx_status(r#"{"confirmed":false}"#).unwrap(), TxStatus::Pending);
    }

    #[test]
    fn txid_validation() {
        let txid = "A".repeat(64);
        assert_eq!(parse_txid(&format!("{txid}\n")).unwrap(), "a".repeat(64));
        assert!(parse_txid("sendrawtransaction RPC error").is_err());
    }

    #[tokio::test]
    async fn reads_utxos_over_http() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::GET).path("/api/address/addr1/utxo");
            then.status(200).body(
                r#"[{"txid":"bb","vout":0,"value":42,"status":{"confirmed":false}}]"#,
            );
        });
        let endpoint = Endpoint::new(Url::parse(&server.url("/api")).unwrap());
        let provider = EsploraProvider::new(
            vec![endpoint],
            Arc::new(HttpTransport::new()),
            MultiplexerConfig::default(),
        )
        .unwrap();

        let results = provider.utxos(&["addr1".to_string()]).await;
        mock.assert();
        assert_eq!(results[0].as_ref().unwrap()[0].value, 42);
    }

    #[tokio::test]
    async fn broadcast_can_be_pushed_to_a_chosen_endpoint() {
        let txid = "ab".repeat(32);
        let down = MockServer::start();
        let refused = down.mock(|when, then| {
            when.method(Method::POST).path("/tx");
            then.status(502).body("bad gateway");
        });
        let up = MockServer::start();
        let accepted = up.mock(|when, then| {
            when.method(Method::POST).path("/tx").body("00ff");
            then.status(200).body(txid.clone());
        });
        let endpoints = vec![
            Endpoint::new(Url::parse(&down.base_url()).unwrap()),
            Endpoint::new(Url::parse(&up.base_url()).unwrap()),
        ];
        let provider = EsploraProvider::new(
            endpoints,
            Arc::new(HttpTransport::new()),
            MultiplexerConfig::default(),
        )
        .unwrap();

        let err = provider.broadcast(&[0x00, 0xff], &txid).await.unwrap_err();
        assert!(matches!(err, ProviderError::BroadcastFailed { endpoint: 0, .. }));
        refused.assert_hits(1);
        accepted.assert_hits(0);

        let hash = provider.broadcast_via(1, &[0x00, 0xff], &txid).await.unwrap();
        assert_eq!(hash, txid);
        accepted.assert();
    }
}
