//! The HTTP boundary: one request in, one fully-read response out.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use url::Url;

use crate::{config::ClientConfig, errors::sanitize_url, Error};

/// A request to the registry. The API is read-only, so there is no body.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub url: Url,
}

/// A completed round-trip with its body already read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub method: Method,
    pub url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// Performs exactly one request/response exchange.
///
/// Implementations must not retry or follow pagination; both are the
/// caller's business.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, Error>;
}

/// [`Transport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Transport(e)
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, Error> {
        let RawRequest { method, url } = request;
        tracing::debug!("{} {}", method, sanitize_url(&url));

        let resp = self
            .client
            .request(method.clone(), url.clone())
            .send()
            .await
            .map_err(|e| {
                // reqwest errors embed the raw URL, credentials included.
                let e = e.without_url();
                tracing::error!("Failed to get resource: {}", e);
                Error::Transport(e)
            })?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to read response body: {}", e);
            Error::Transport(e)
        })?;

        Ok(RawResponse {
            method,
            url,
            status,
            headers,
            body,
        })
    }
}
