//! The request side of every backend contract.
//!
//! Each family defines a closed enum of targets and maps every variant to a
//! method, a path and a body with a plain `match`. Adding a variant fails to
//! compile until every mapping handles it.

use serde_json::Value;

use crate::endpoint::{Capability, Endpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
}

pub trait Target: Send + Sync {
    /// Endpoints lacking this capability are skipped.
    fn capability(&self) -> Capability;

    fn method(&self) -> HttpMethod;

    /// Appended to the endpoint URL; empty for JSON-RPC.
    fn path(&self) -> String;

    fn body(&self) -> Body;

    fn headers(&self, endpoint: &Endpoint) -> Vec<(String, String)> {
        let mut headers = endpoint.auth_headers();
        match self.body() {
            Body::Json(_) => headers.push(("content-type".into(), "application/json".into())),
            Body::Text(_) => headers.push(("content-type".into(), "text/plain".into())),
            Body::Empty => {}
        }
        headers
    }

    /// Short label for logs.
    fn name(&self) -> &'static str;
}
