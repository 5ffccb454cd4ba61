//! HTTP transport and status interpretation.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{ProviderError, API_ERROR_STATUSES};
use crate::target::{Body, HttpMethod, Target};

/// A fully resolved request for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Request {
    pub fn for_target(target: &dyn Target, endpoint: &Endpoint) -> Result<Self, ProviderError> {
        let url = endpoint
            .join(&target.path())
            .map_err(|e| ProviderError::Transport(format!("bad url for {}: {e}", target.name())))?;
        Ok(Self {
            method: target.method(),
            url,
            headers: target.headers(endpoint),
            body: target.body(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// The body of a 2xx response, or the error the status stands for.
    pub fn into_success(self) -> Result<String, ProviderError> {
        if (200..300).contains(&self.status) {
            return Ok(self.body);
        }
        if API_ERROR_STATUSES.contains(&self.status) {
            if let Some(message) = api_error_message(&self.body) {
                return Err(ProviderError::Api {
                    code: i64::from(self.status),
                    message,
                });
            }
        }
        let snippet: String = self.body.chars().take(200).collect();
        Err(ProviderError::Transport(format!("HTTP {}: {snippet}", self.status)))
    }
}

/// Message of a known error schema:
/// `{"error":{"code","message"}}`, `{"code","message"}` or `{"error":"..."}`,
/// the last with an optional `cause`.
pub fn api_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let text = |v: &Value| v.as_str().map(str::to_string);
    match value.get("error") {
        Some(Value::Object(inner)) => inner.get("message").and_then(text),
        Some(Value::String(message)) => match value.get("cause").and_then(text) {
            Some(cause) => Some(format!("{message} {cause}")),
            None => Some(message.clone()),
        },
        _ => value
            .get("message")
            .filter(|_| value.get("code").is_some())
            .and_then(text),
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, ProviderError>;
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, ProviderError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Text(text) => builder.body(text),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("request failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("reading body failed: {e}")))?;
        Ok(Response { status, body })
    }
}
