//! Reqwest-based client for the OpenCPU `do.call` JSON endpoint.

use reqwest::Client;
use serde_json::Value as Json;

use crate::{
    config::Config,
    error::{BridgeError, Result},
    unmarshal::ResponseShape,
};

#[derive(Debug, Clone)]
pub struct OpenCpuClient {
    http: Client,
    endpoint: String,
}

impl OpenCpuClient {
    /// Client using the transport's default timeouts.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| BridgeError::RemoteCall(format!("building HTTP client: {}", e)))?;
        Ok(Self { http, endpoint: endpoint.into() })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| BridgeError::RemoteCall(format!("building HTTP client: {}", e)))?;
        Ok(Self { http, endpoint: cfg.endpoint() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts `what=<source>&args=<args>` and returns the first element of the JSON array reply.
    pub async fn call(&self, source: &str, args: &str, shape: ResponseShape) -> Result<Json> {
        let resp = self
            .http
            .post(&self.endpoint)
            .form(&[("what", source), ("args", args)])
            .send()
            .await
            .map_err(|e| BridgeError::RemoteCall(format!("POST {}: {}", self.endpoint, e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BridgeError::RemoteCall(format!("reading response body: {}", e)))?;
        if !status.is_success() {
            return Err(BridgeError::RemoteCall(format!("{} - {}", status, body.trim())));
        }
        tracing::debug!(%status, bytes = body.len(), "remote call returned");
        parse_response(&body, shape)
    }
}

/// Form body as the service sees it, before URL encoding. Used for diagnostics only.
pub fn form_preview(source: &str, args: &str) -> String {
    format!("what={}&args={}", source, args)
}

/// First element of a JSON array body.
///
/// With [`ResponseShape::Keyed`] a bare object body is also accepted, which is how
/// OpenCPU renders an R list.
pub fn parse_response(body: &str, shape: ResponseShape) -> Result<Json> {
    let parsed: Json = serde_json::from_str(body)
        .map_err(|e| BridgeError::ResponseParse(format!("body is not JSON ({}): {}", e, snippet(body))))?;
    match parsed {
        Json::Array(mut items) if !items.is_empty() => Ok(items.swap_remove(0)),
        Json::Array(_) => Err(BridgeError::ResponseParse("empty result array".into())),
        obj @ Json::Object(_) if shape == ResponseShape::Keyed => Ok(obj),
        other => Err(BridgeError::ResponseParse(format!("expected a JSON array, got {}", snippet(&other.to_string())))),
    }
}

fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
