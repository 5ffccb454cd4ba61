//! Substrate API sidecar backend (Polkadot, Kusama, Westend).
//!
//! The sidecar exposes the chain over plain REST. Numbers that can exceed
//! 2^53 arrive as decimal strings.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::endpoint::{Capability, Endpoint};
use crate::error::ProviderError;
use crate::multiplexer::{Multiplexer, MultiplexerConfig};
use crate::target::{Body, HttpMethod, Target};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarTarget {
    BalanceInfo(String),
    TransactionMaterial,
    /// `0x`-hex of a signed extrinsic.
    FeeEstimate(String),
    /// `0x`-hex of a signed extrinsic.
    Submit(String),
}

impl Target for SidecarTarget {
    fn capability(&self) -> Capability {
        match self {
            SidecarTarget::BalanceInfo(_) | SidecarTarget::TransactionMaterial => {
                Capability::Account
            }
            SidecarTarget::FeeEstimate(_) => Capability::Fee,
            SidecarTarget::Submit(_) => Capability::Broadcast,
        }
    }

    fn method(&self) -> HttpMethod {
        match self {
            SidecarTarget::FeeEstimate(_) | SidecarTarget::Submit(_) => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    fn path(&self) -> String {
        match self {
            SidecarTarget::BalanceInfo(address) => format!("/accounts/{address}/balance-info"),
            SidecarTarget::TransactionMaterial => "/transaction/material?noMeta=true".into(),
            SidecarTarget::FeeEstimate(_) => "/transaction/fee-estimate".into(),
            SidecarTarget::Submit(_) => "/transaction".into(),
        }
    }

    fn body(&self) -> Body {
        match self {
            SidecarTarget::FeeEstimate(tx) | SidecarTarget::Submit(tx) => {
                Body::Json(json!({ "tx": tx }))
            }
            _ => Body::Empty,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SidecarTarget::BalanceInfo(_) => "sidecar_balance_info",
            SidecarTarget::TransactionMaterial => "sidecar_material",
            SidecarTarget::FeeEstimate(_) => "sidecar_fee_estimate",
            SidecarTarget::Submit(_) => "sidecar_submit",
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn decode<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(format!("{what}: {e}")))
}

fn number<T: std::str::FromStr>(text: &str, field: &str) -> Result<T, ProviderError> {
    text.parse()
        .map_err(|_| ProviderError::Decode(format!("{field} is not a number: {text}")))
}

fn hash32(text: &str, field: &str) -> Result<[u8; 32], ProviderError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let bytes =
        hex::decode(digits).map_err(|e| ProviderError::Decode(format!("{field}: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| ProviderError::Decode(format!("{field} is not 32 bytes")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceInfo {
    pub nonce: u64,
    pub free: u128,
}

#[derive(Deserialize)]
struct RawBalanceInfo {
    nonce: String,
    free: String,
}

pub fn parse_balance_info(body: &str) -> Result<BalanceInfo, ProviderError> {
    let raw: RawBalanceInfo = decode(body, "balance info")?;
    Ok(BalanceInfo {
        nonce: number(&raw.nonce, "nonce")?,
        free: number(&raw.free, "free")?,
    })
}

/// Everything an extrinsic needs from the chain besides the nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMaterial {
    pub block_hash: [u8; 32],
    pub block_number: u64,
    pub genesis_hash: [u8; 32],
    pub spec_version: u32,
    pub transaction_version: u32,
}

#[derive(Deserialize)]
struct RawAt {
    hash: String,
    height: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMaterial {
    at: RawAt,
    genesis_hash: String,
    spec_version: String,
    tx_version: String,
}

pub fn parse_material(body: &str) -> Result<TransactionMaterial, ProviderError> {
    let raw: RawMaterial = decode(body, "transaction material")?;
    Ok(TransactionMaterial {
        block_hash: hash32(&raw.at.hash, "at.hash")?,
        block_number: number(&raw.at.height, "at.height")?,
        genesis_hash: hash32(&raw.genesis_hash, "genesisHash")?,
        spec_version: number(&raw.spec_version, "specVersion")?,
        transaction_version: number(&raw.tx_version, "txVersion")?,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeeEstimate {
    partial_fee: String,
}

/// `partialFee` in planck: the inclusion fee without the tip.
pub fn parse_fee_estimate(body: &str) -> Result<u128, ProviderError> {
    let raw: RawFeeEstimate = decode(body, "fee estimate")?;
    number(&raw.partial_fee, "partialFee")
}

#[derive(Deserialize)]
struct RawSubmit {
    hash: String,
}

pub fn parse_submit(body: &str) -> Result<String, ProviderError> {
    let raw: RawSubmit = decode(body, "submit")?;
    hash32(&raw.hash, "hash")?;
    Ok(raw.hash.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SidecarProvider {
    mux: Multiplexer,
}

impl SidecarProvider {
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

    pub async fn balance_info(&self, address: &str) -> Result<BalanceInfo, ProviderError> {
        self.mux
            .read(&SidecarTarget::BalanceInfo(address.to_string()), parse_balance_info)
            .await
    }

    pub async fn material(&self) -> Result<TransactionMaterial, ProviderError> {
        self.mux
            .read(&SidecarTarget::TransactionMaterial, parse_material)
            .await
    }

    pub async fn fee_estimate(&self, extrinsic: &[u8]) -> Result<u128, ProviderError> {
        let tx = format!("0x{}", hex::encode(extrinsic));
        self.mux
            .read(&SidecarTarget::FeeEstimate(tx), parse_fee_estimate)
            .await
    }

    pub async fn submit(&self, extrinsic: &[u8], tx_hash: &str) -> Result<String, ProviderError> {
        let tx = format!("0x{}", hex::encode(extrinsic));
        self.mux
            .broadcast(&SidecarTarget::Submit(tx), tx_hash, parse_submit)
            .await
    }

    pub async fn submit_via(
        &self,
        endpoint: usize,
        extrinsic: &[u8],
        tx_hash: &str,
    ) -> Result<String, ProviderError> {
        let tx = format!("0x{}", hex::encode(extrinsic));
        self.mux
            .broadcast_via(endpoint, &SidecarTarget::Submit(tx), tx_hash, parse_submit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpTransport;
    use httpmock::{Method, MockServer};
    use url::Url;

    const HASH: &str = "0x91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3";

    #[test]
    fn target_mapping() {
        assert_eq!(
            SidecarTarget::BalanceInfo("15oF4".into()).path(),
            "/accounts/15oF4/balance-info"
        );
        let submit = SidecarTarget::Submit("0x2d02".into());
        assert_eq!(submit.method(), HttpMethod::Post);
        assert_eq!(submit.body(), Body::Json(json!({"tx": "0x2d02"})));
        assert_eq!(submit.capability(), Capability::Broadcast);
    }

    #[test]
    fn parses_balance_info() {
        let body = r#"{"at":{"hash":"0x00","height":"100"},"nonce":"7","tokenSymbol":"DOT",
                       "free":"25000000000","reserved":"0","locks":[]}"#;
        assert_eq!(
            parse_balance_info(body).unwrap(),
            BalanceInfo {
                nonce: 7,
                free: 25_000_000_000
            }
        );
    }

    #[test]
    fn parses_material() {
        let body = format!(
            r#"{{"at":{{"hash":"{HASH}","height":"19000000"}},"genesisHash":"{HASH}",
                 "chainName":"Polkadot","specName":"polkadot","specVersion":"1002000","txVersion":"26"}}"#
        );
        let material = parse_material(&body).unwrap();
        assert_eq!(material.block_number, 19_000_000);
        assert_eq!(material.spec_version, 1_002_000);
        assert_eq!(material.transaction_version, 26);
        assert_eq!(material.genesis_hash[0], 0x91);

        let bad = body.replace(HASH, "0x1234");
        assert!(matches!(parse_material(&bad), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn parses_fee_and_submit() {
        assert_eq!(
            parse_fee_estimate(r#"{"weight":"150000000","class":"Normal","partialFee":"154123456"}"#).unwrap(),
            154_123_456
        );
        assert_eq!(parse_submit(&format!(r#"{{"hash":"{HASH}"}}"#)).unwrap(), HASH);
        assert!(parse_submit(r#"{"hash":"0xabc"}"#).is_err());
    }

    #[tokio::test]
    async fn already_imported_counts_as_success() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::POST).path("/transaction");
            then.status(400).body(
                r#"{"code":400,"error":"Failed to submit transaction.","transaction":"0x2d02","cause":"1013: Transaction Already Imported","stack":""}"#,
            );
        });
        let provider = SidecarProvider::new(
            vec![Endpoint::new(Url::parse(&server.base_url()).unwrap())],
            Arc::new(HttpTransport::new()),
            MultiplexerConfig::default(),
        )
        .unwrap();

        assert_eq!(provider.submit(&[0x2d, 0x02], HASH).await.unwrap(), HASH);
    }

    #[tokio::test]
    async fn banned_transaction_is_a_broadcast_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::POST).path("/transaction");
            then.status(400).body(
                r#"{"code":400,"error":"Failed to submit transaction.","cause":"1012: Transaction is temporarily banned"}"#,
            );
        });
        let provider = SidecarProvider::new(
            vec![Endpoint::new(Url::parse(&server.base_url()).unwrap())],
            Arc::new(HttpTransport::new()),
            MultiplexerConfig::default(),
        )
        .unwrap();

        let err = provider.submit(&[0x2d, 0x02], HASH).await.unwrap_err();
        assert!(matches!(err, ProviderError::BroadcastFailed { endpoint: 0, .. }));
    }
}
