//! One network provider per chain family.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_params::ChainFamily;
use chain_provider::cosmos::CosmosProvider;
use chain_provider::esplora::EsploraProvider;
use chain_provider::evm::EvmProvider;
use chain_provider::sidecar::SidecarProvider;
use chain_provider::solana::SolanaProvider;
use chain_provider::{
    Endpoint, EndpointHealth, Multiplexer, MultiplexerConfig, ProviderError, Transport, TxStatus,
};

use crate::transaction::SignedTransaction;

#[derive(Debug)]
pub enum ChainBackend {
    Utxo(EsploraProvider),
    Evm(EvmProvider),
    Cosmos(CosmosProvider),
    Solana(SolanaProvider),
    Substrate(SidecarProvider),
}

impl ChainBackend {
    pub fn new(
        family: ChainFamily,
        endpoints: Vec<Endpoint>,
        transport: Arc<dyn Transport>,
        config: MultiplexerConfig,
    ) -> Result<Self, ProviderError> {
        Ok(match family {
            ChainFamily::Utxo => {
                ChainBackend::Utxo(EsploraProvider::new(endpoints, transport, config)?)
            }
            ChainFamily::Evm => ChainBackend::Evm(EvmProvider::new(endpoints, transport, config)?),
            ChainFamily::Cosmos => {
                ChainBackend::Cosmos(CosmosProvider::new(endpoints, transport, config)?)
            }
            ChainFamily::Solana => {
                ChainBackend::Solana(SolanaProvider::new(endpoints, transport, config)?)
            }
            ChainFamily::Substrate => {
                ChainBackend::Substrate(SidecarProvider::new(endpoints, transport, config)?)
            }
        })
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            ChainBackend::Utxo(_) => ChainFamily::Utxo,
            ChainBackend::Evm(_) => ChainFamily::Evm,
            ChainBackend::Cosmos(_) => ChainFamily::Cosmos,
            ChainBackend::Solana(_) => ChainFamily::Solana,
            ChainBackend::Substrate(_) => ChainFamily::Substrate,
        }
    }

    pub fn multiplexer(&self) -> &Multiplexer {
        match self {
            ChainBackend::Utxo(p) => p.multiplexer(),
            ChainBackend::Evm(p) => p.multiplexer(),
            ChainBackend::Cosmos(p) => p.multiplexer(),
            ChainBackend::Solana(p) => p.multiplexer(),
            ChainBackend::Substrate(p) => p.multiplexer(),
        }
    }

    pub fn health(&self) -> Vec<EndpointHealth> {
        self.multiplexer().health_snapshot()
    }

    /// Submits `signed` once and returns the transaction hash.
    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<String, ProviderError> {
        self.submit(signed, None).await
    }

    /// Submits `signed` once through endpoint `endpoint` only. Used after a
    /// failed broadcast when the caller chooses another node.
    pub async fn broadcast_via(
        &self,
        signed: &SignedTransaction,
        endpoint: usize,
    ) -> Result<String, ProviderError> {
        self.submit(signed, Some(endpoint)).await
    }

    async fn submit(
        &self,
        signed: &SignedTransaction,
        endpoint: Option<usize>,
    ) -> Result<String, ProviderError> {
        let hash = signed.tx_hash.as_str();
        let raw = signed.raw_tx.as_slice();
        match (self, endpoint) {
            (ChainBackend::Utxo(p), None) => p.broadcast(raw, hash).await,
            (ChainBackend::Utxo(p), Some(i)) => p.broadcast_via(i, raw, hash).await,
            (ChainBackend::Evm(p), None) => p.send_raw_transaction(raw, hash).await,
            (ChainBackend::Evm(p), Some(i)) => p.send_raw_transaction_via(i, raw, hash).await,
            (ChainBackend::Cosmos(p), endpoint) => {
                let envelope = signed.envelope.as_deref().ok_or_else(|| {
                    ProviderError::Unsupported("cosmos broadcast needs an envelope".into())
                })?;
                match endpoint {
                    None => p.broadcast(envelope, hash).await,
                    Some(i) => p.broadcast_via(i, envelope, hash).await,
                }
            }
            (ChainBackend::Solana(p), endpoint) => {
                let tx = STANDARD.encode(raw);
                match endpoint {
                    None => p.send_transaction(&tx, hash).await,
                    Some(i) => p.send_transaction_via(i, &tx, hash).await,
                }
            }
            (ChainBackend::Substrate(p), None) => p.submit(raw, hash).await,
            (ChainBackend::Substrate(p), Some(i)) => p.submit_via(i, raw, hash).await,
        }
    }

    pub async fn tx_status(&self, tx_hash: &str) -> Result<TxStatus, ProviderError> {
        match self {
            ChainBackend::Utxo(p) => p.tx_status(tx_hash).await,
            ChainBackend::Evm(p) => p.tx_status(tx_hash).await,
            ChainBackend::Cosmos(p) => p.tx_status(tx_hash).await,
            ChainBackend::Solana(p) => p.tx_status(tx_hash).await,
            ChainBackend::Substrate(_) => Err(ProviderError::Unsupported(
                "substrate sidecar has no transaction status".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_provider::HttpTransport;
    use url::Url;

    fn endpoints() -> Vec<Endpoint> {
        vec![Endpoint::new(Url::parse("http://127.0.0.1:1").unwrap())]
    }

    #[test]
    fn builds_one_provider_per_family() {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
        for family in [
            ChainFamily::Utxo,
            ChainFamily::Evm,
            ChainFamily::Cosmos,
            ChainFamily::Solana,
            ChainFamily::Substrate,
        ] {
            let backend =
                ChainBackend::new(family, endpoints(), transport.clone(), MultiplexerConfig::default())
                    .unwrap();
            assert_eq!(backend.family(), family);
            assert_eq!(backend.health().len(), 1);
        }
    }

    #[test]
    fn no_endpoints_is_an_error() {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
        assert!(ChainBackend::new(
            ChainFamily::Evm,
            Vec::new(),
            transport,
            MultiplexerConfig::default()
        )
        .is_err());
    }

    #[tokio::test]
    async fn broadcast_via_rejects_unknown_endpoint() {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
        let signed = SignedTransaction {
            raw_tx: vec![0x02, 0xf8],
            tx_hash: "0x00".into(),
            envelope: None,
        };
        for family in [ChainFamily::Utxo, ChainFamily::Evm, ChainFamily::Solana, ChainFamily::Substrate] {
            let backend =
                ChainBackend::new(family, endpoints(), transport.clone(), MultiplexerConfig::default())
                    .unwrap();
            assert!(matches!(
                backend.broadcast_via(&signed, 3).await,
                Err(ProviderError::Unsupported(_))
            ));
        }

        let cosmos =
            ChainBackend::new(ChainFamily::Cosmos, endpoints(), transport, MultiplexerConfig::default())
                .unwrap();
        assert!(matches!(
            cosmos.broadcast_via(&signed, 0).await,
            Err(ProviderError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn substrate_status_is_unsupported() {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
        let backend = ChainBackend::new(
            ChainFamily::Substrate,
            endpoints(),
            transport,
            MultiplexerConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            backend.tx_status("0x00").await,
            Err(ProviderError::Unsupported(_))
        ));
    }
}
