//! HTTP transport used by the gateway.
//!
//! The gateway only needs "GET this URL and give me JSON"; keeping that behind
//! a trait lets tests substitute a scripted transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;

use super::GatewayError;

const USER_AGENT: &str = concat!("dashsync/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request and decode the body as JSON.
    /// Non-2xx responses are errors.
    async fn get_json(&self, url: &str) -> Result<Value, GatewayError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport. Without a timeout, requests wait for the
    /// underlying connection to give up.
    pub fn new(timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::from_response(status, retry_after.as_deref(), &body))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(url = url, bytes = text.len(), "Provider response received");

        Ok(serde_json::from_str(&text)?)
    }
}
