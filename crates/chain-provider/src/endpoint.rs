//! Endpoint descriptions and their health.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// What an endpoint may be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Account,
    Utxo,
    Fee,
    Broadcast,
    Status,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Account,
        Capability::Utxo,
        Capability::Fee,
        Capability::Broadcast,
        Capability::Status,
    ];
}

/// A static header carrying an API key, e.g. `x-api-key: ...`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub header: String,
    pub value: String,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("header", &self.header)
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub capabilities: Vec<Capability>,
    /// Limit for one attempt against this endpoint.
    pub timeout: Duration,
    pub api_key: Option<ApiKey>,
}

impl Endpoint {
    /// An endpoint with every capability and a 10 s timeout.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            capabilities: Capability::ALL.to_vec(),
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: &[Capability]) -> Self {
        self.capabilities = capabilities.to_vec();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, header: &str, value: &str) -> Self {
        self.api_key = Some(ApiKey {
            header: header.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn auth_headers(&self) -> Vec<(String, String)> {
        self.api_key
            .iter()
            .map(|key| (key.header.clone(), key.value.clone()))
            .collect()
    }

    /// `url` joined with `path`, keeping any path prefix the base carries.
    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.url.as_str().trim_end_matches('/');
        if path.is_empty() {
            return Url::parse(base);
        }
        Url::parse(&format!("{base}{path}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Alive,
    Degraded,
    Dead,
}

/// One row of a health snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointHealth {
    pub index: usize,
    pub url: String,
    pub health: Health,
}
