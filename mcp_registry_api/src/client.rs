//! HTTP client for the MCP registry API.

use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::ClientConfig,
    response::{classify, Rate, Response},
    servers::ServersService,
    transport::{HttpTransport, RawRequest, Transport},
    Error,
};

/// Path of the server collection, relative to the base URL.
const SERVERS_PATH: [&str; 2] = ["v0", "servers"];

/// HTTP client for the MCP registry API.
///
/// Every call is a single request: nothing is retried, cached or paced. The
/// rate snapshot of the most recent response is kept for callers that want
/// to implement their own backoff.
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    last_rate: Mutex<Option<Rate>>,
}

impl Client {
    /// Creates a client for the production registry.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_config(ClientConfig::default().with_base_url(base_url)?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client that sends every request through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            last_rate: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Server listing and lookup operations.
    pub fn servers(&self) -> ServersService<'_> {
        ServersService::new(self)
    }

    /// Rate limit reported by the most recent response that carried one.
    pub fn last_rate(&self) -> Option<Rate> {
        *self.last_rate.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// URL of the server collection, with `segments` appended as individually
    /// percent-encoded path segments (server names contain `/`).
    pub(crate) fn servers_url(&self, segments: &[&str]) -> Result<Url, Error> {
        // Dot segments would be resolved away and silently hit another endpoint.
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(Error::InvalidRequest(format!(
                "path segment {:?} is not a valid server name or version",
                segment
            )));
        }
        let mut url = self.config.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                tracing::error!("Invalid base URL: {}", self.config.base_url);
                Error::InvalidRequest(format!(
                    "base URL {} cannot carry a path",
                    self.config.base_url
                ))
            })?;
            path.pop_if_empty();
            path.extend(SERVERS_PATH);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Sends one GET, classifies the response and decodes a success body.
    pub(crate) async fn get<T>(&self, url: Url) -> Result<(T, Response), Error>
    where
        T: DeserializeOwned,
    {
        let raw = self
            .transport
            .send(RawRequest {
                method: Method::GET,
                url,
            })
            .await?;

        let rate = Rate::from_headers(&raw.headers);
        if rate.is_reported() {
            *self.last_rate.lock().unwrap_or_else(|e| e.into_inner()) = Some(rate);
        }

        classify(raw)?.decode::<T>()
    }
}
