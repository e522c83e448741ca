//! Error types for the API client.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::response::Rate;
use crate::types::Server;

/// Placeholder written over any credentials embedded in a URL.
const REDACTED: &str = "REDACTED";

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be built (bad base URL, unencodable path).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// No response was obtained: connection failure, timeout, or cancellation.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A successful response whose body does not match the expected schema.
    #[error("{method} {url}: failed to decode response: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// The registry answered with a non-2xx status other than 429.
    #[error(transparent)]
    Api(#[from] ErrorResponse),
    /// The registry answered with 429 Too Many Requests.
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
}

impl Error {
    /// HTTP status of the response behind this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(e) => Some(e.status),
            Error::RateLimit(e) => Some(e.status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            Error::InvalidRequest(_) | Error::Decode { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// One field-level problem reported by the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match (self.resource.is_empty(), self.field.is_empty()) {
            (false, false) => format!("{}.{}", self.resource, self.field),
            (false, true) => self.resource.clone(),
            (true, false) => self.field.clone(),
            (true, true) => String::new(),
        };
        let mut parts = Vec::new();
        if !location.is_empty() {
            parts.push(format!("{}:", location));
        }
        if !self.code.is_empty() {
            parts.push(self.code.clone());
        }
        if !self.message.is_empty() {
            parts.push(format!("({})", self.message));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Shape of an error body as the registry sends it.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// A completed response with a non-2xx status (other than 429).
#[derive(thiserror::Error, Debug, Clone)]
pub struct ErrorResponse {
    pub method: Method,
    /// The request URL as sent. Rendering always goes through [`sanitize_url`].
    pub url: Url,
    pub status: u16,
    /// Top-level message, or the raw body when it was not structured JSON.
    pub message: Option<String>,
    pub errors: Vec<ErrorDetail>,
    /// Rate headers that came with the response; not part of the rendering.
    pub rate: Rate,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.method,
            sanitize_url(&self.url),
            self.status
        )?;
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            write!(f, " {}", message)?;
        } else if !self.errors.is_empty() {
            let details: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            write!(f, " [{}]", details.join(", "))?;
        }
        Ok(())
    }
}

/// A completed response with status 429.
///
/// Equality compares the rate snapshot, message, status, method and the
/// *sanitized* URL string, so two errors for the same endpoint compare equal
/// even when the raw URLs carried different credentials.
#[derive(thiserror::Error, Debug, Clone)]
pub struct RateLimitError {
    pub rate: Rate,
    pub method: Method,
    pub url: Url,
    pub status: u16,
    pub message: Option<String>,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.method,
            sanitize_url(&self.url),
            self.status
        )?;
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            write!(f, " {}", message)?;
        }
        write!(
            f,
            " (rate limit: {}/{}, reset at {})",
            self.rate.remaining,
            self.rate.limit,
            self.rate.reset_display()
        )
    }
}

impl PartialEq for RateLimitError {
    fn eq(&self, other: &Self) -> bool {
        self.rate == other.rate
            && self.message == other.message
            && self.status == other.status
            && self.method == other.method
            && sanitize_url(&self.url).as_str() == sanitize_url(&other.url).as_str()
    }
}

/// Servers gathered by a multi-page listing before one of its page fetches
/// failed.
///
/// Returned instead of a bare [`Error`] so callers can still use what was
/// already retrieved; `servers` is in page order.
#[derive(thiserror::Error, Debug)]
#[error("{source} (after {} servers were fetched)", .servers.len())]
pub struct PartialResults {
    pub servers: Vec<Server>,
    #[source]
    pub source: Error,
}

impl PartialResults {
    pub fn into_error(self) -> Error {
        self.source
    }
}

/// Replaces any userinfo in `url` with `REDACTED:REDACTED`.
///
/// A username without a password is redacted the same way, so the rendered
/// form never reveals which parts were present.
pub fn sanitize_url(url: &Url) -> Url {
    let mut sanitized = url.clone();
    if !url.username().is_empty() || url.password().is_some() {
        // Only cannot-be-a-base URLs reject userinfo, and those never carry any.
        let _ = sanitized.set_username(REDACTED);
        let _ = sanitized.set_password(Some(REDACTED));
    }
    sanitized
}
