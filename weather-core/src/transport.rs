use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::TransportError;

/// "Perform GET, return the JSON body or fail" capability.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        tracing::debug!(host = url.host_str().unwrap_or_default(), path = url.path(), "GET");

        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError::Body(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Body(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
