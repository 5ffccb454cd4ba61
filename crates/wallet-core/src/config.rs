//! Wallet configuration loaded from TOML.
//!
//! ```toml
//! [provider]
//! max_retries = 1
//! max_concurrency = 4
//! default_timeout_ms = 10000
//!
//! [[chains]]
//! chain = "bitcoin"
//! dust_threshold = 1000
//! cache_ttl_secs = 30
//! fee_multipliers = { market = [12, 10], fast = [15, 10] }
//!
//! [[chains.endpoints]]
//! url = "https://blockstream.info/api"
//! capabilities = ["account", "utxo", "fee", "broadcast", "status"]
//! ```

use std::time::Duration;

use chain_params::{parameters, Chain, FeeMultipliers, NetworkParameters};
use chain_provider::multiplexer::MAX_RETRIES_LIMIT;
use chain_provider::{Capability, Endpoint, MultiplexerConfig};
use serde::Deserialize;
use url::Url;

use crate::error::WalletError;

fn default_max_retries() -> u8 {
    1
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn all_capabilities() -> Vec<Capability> {
    Capability::ALL.to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_concurrency: default_max_concurrency(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    #[serde(default = "all_capabilities")]
    pub capabilities: Vec<Capability>,
    /// Falls back to `provider.default_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub api_key_header: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    pub chain: Chain,
    pub endpoints: Vec<EndpointConfig>,
    /// UTXO chains only.
    #[serde(default)]
    pub dust_threshold: Option<u64>,
    #[serde(default)]
    pub fee_multipliers: FeeMultipliers,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

/// Everything a wallet manager needs to know about its chain.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub chain: Chain,
    /// The registry entry with configured overrides applied.
    pub params: NetworkParameters,
    pub endpoints: Vec<Endpoint>,
    pub multiplexer: MultiplexerConfig,
    pub fee_multipliers: FeeMultipliers,
    pub cache_ttl: Duration,
}

impl WalletConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, WalletError> {
        let config: WalletConfig =
            toml::from_str(text).map_err(|e| WalletError::Config(format!("invalid toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.provider.max_retries > MAX_RETRIES_LIMIT {
            return Err(WalletError::Config(format!(
                "max_retries {} exceeds {MAX_RETRIES_LIMIT}",
                self.provider.max_retries
            )));
        }
        if self.provider.max_concurrency == 0 {
            return Err(WalletError::Config("max_concurrency must be at least 1".into()));
        }

        for (index, chain) in self.chains.iter().enumerate() {
            if self.chains[..index].iter().any(|c| c.chain == chain.chain) {
                return Err(WalletError::Config(format!(
                    "{} is configured twice",
                    chain.chain
                )));
            }
            chain.validate()?;
        }
        Ok(())
    }

    pub fn chain(&self, chain: Chain) -> Result<&ChainConfig, WalletError> {
        self.chains
            .iter()
            .find(|c| c.chain == chain)
            .ok_or_else(|| WalletError::Config(format!("{chain} is not configured")))
    }

    pub fn multiplexer_config(&self) -> MultiplexerConfig {
        MultiplexerConfig {
            max_retries: self.provider.max_retries,
            max_concurrency: self.provider.max_concurrency,
        }
    }

    /// Resolved settings for `chain`.
    pub fn settings(&self, chain: Chain) -> Result<ChainSettings, WalletError> {
        let config = self.chain(chain)?;
        let default_timeout = Duration::from_millis(self.provider.default_timeout_ms);
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| e.endpoint(default_timeout))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChainSettings {
            chain,
            params: config.params()?,
            endpoints,
            multiplexer: self.multiplexer_config(),
            fee_multipliers: config.fee_multipliers,
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        })
    }
}

impl ChainConfig {
    fn invalid(&self, reason: impl std::fmt::Display) -> WalletError {
        WalletError::Config(format!("{}: {reason}", self.chain))
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.endpoints.is_empty() {
            return Err(self.invalid("no endpoints configured"));
        }
        for endpoint in &self.endpoints {
            endpoint.parse_url().map_err(|e| self.invalid(e))?;
            if endpoint.capabilities.is_empty() {
                return Err(self.invalid(format!("{} has no capabilities", endpoint.url)));
            }
            if endpoint.timeout_ms == Some(0) {
                return Err(self.invalid(format!("{} has a zero timeout", endpoint.url)));
            }
            if endpoint.api_key.is_some() != endpoint.api_key_header.is_some() {
                return Err(self.invalid(format!(
                    "{} needs both api_key and api_key_header",
                    endpoint.url
                )));
            }
        }
        self.fee_multipliers
            .validate()
            .map_err(|e| self.invalid(e))?;
        self.params()?;
        Ok(())
    }

    /// The registry entry with the dust override applied.
    pub fn params(&self) -> Result<NetworkParameters, WalletError> {
        let mut params = parameters(self.chain).clone();
        if let Some(dust) = self.dust_threshold {
            let NetworkParameters::Utxo(utxo) = &mut params else {
                return Err(self.invalid("dust_threshold only applies to UTXO chains"));
            };
            if dust == 0 {
                return Err(self.invalid("dust_threshold must be positive"));
            }
            utxo.dust_threshold = dust;
        }
        Ok(params)
    }
}

impl EndpointConfig {
    fn parse_url(&self) -> Result<Url, WalletError> {
        let url = Url::parse(&self.url)
            .map_err(|e| WalletError::Config(format!("bad url {}: {e}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WalletError::Config(format!(
                "unsupported scheme in {}",
                self.url
            )));
        }
        Ok(url)
    }

    pub fn endpoint(&self, default_timeout: Duration) -> Result<Endpoint, WalletError> {
        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(default_timeout);
        let mut endpoint = Endpoint::new(self.parse_url()?)
            .with_capabilities(&self.capabilities)
            .with_timeout(timeout);
        if let (Some(header), Some(key)) = (&self.api_key_header, &self.api_key) {
            endpoint = endpoint.with_api_key(header, key);
        }
        Ok(endpoint)
    }
}
