//! Response classification: turns a raw transport response into either a
//! decodable success envelope or a typed error, and extracts rate-limit
//! metadata along the way.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::errors::{sanitize_url, Error, ErrorBody, ErrorResponse, RateLimitError};
use crate::transport::RawResponse;

pub const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_RESET: &str = "x-ratelimit-reset";

/// Rate-limit window as reported by the registry.
///
/// All-zero (and `reset: None`) when the response carried no rate headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rate {
    /// Requests allowed in the current window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset: Option<DateTime<Utc>>,
}

impl Rate {
    /// Reads the `X-RateLimit-*` headers. Missing or unparsable values are zero.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        };
        Rate {
            limit: header(HEADER_RATE_LIMIT)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            remaining: header(HEADER_RATE_REMAINING)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            reset: header(HEADER_RATE_RESET).and_then(parse_reset),
        }
    }

    /// Whether the registry reported any rate limit at all.
    pub fn is_reported(&self) -> bool {
        self.limit > 0
    }

    /// Reset time as used in rendered error messages.
    pub(crate) fn reset_display(&self) -> String {
        match self.reset {
            Some(reset) => reset.format("%Y-%m-%d %H:%M:%S +0000 UTC").to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// Reset values come either as RFC3339 timestamps or as epoch seconds.
fn parse_reset(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Coarse outcome of one round-trip, derived from the status code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    RateLimited,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            429 => StatusClass::RateLimited,
            _ => StatusClass::ClientError,
        }
    }
}

/// Per-call metadata returned next to every decoded value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub status: u16,
    pub rate: Rate,
    /// Cursor for the following page; only set by list calls.
    pub next_cursor: Option<String>,
}

/// A response that classified as a success, with its body not yet decoded.
#[derive(Debug)]
pub struct Envelope {
    raw: RawResponse,
    pub response: Response,
}

impl Envelope {
    /// Decodes the body into the shape the calling operation expects.
    ///
    /// Every registry endpoint answers with a JSON body, so an empty 2xx body
    /// (e.g. 204) is an [`Error::Decode`] rather than an empty value.
    pub fn decode<T: DeserializeOwned>(self) -> Result<(T, Response), Error> {
        let parsed = serde_json::from_str::<T>(&self.raw.body).map_err(|e| {
            let url = sanitize_url(&self.raw.url).to_string();
            tracing::error!(
                "Failed to parse response from {} {}: {} | body: {}",
                self.raw.method,
                url,
                e,
                truncate_body(&self.raw.body)
            );
            Error::Decode {
                method: self.raw.method.clone(),
                url,
                source: e,
            }
        })?;
        Ok((parsed, self.response))
    }
}

/// Classifies a completed round-trip.
///
/// 2xx yields an [`Envelope`]; 429 yields [`Error::RateLimit`]; any other
/// status yields [`Error::Api`], decoding a structured error body when there
/// is one and otherwise keeping the raw body text as the message.
pub fn classify(raw: RawResponse) -> Result<Envelope, Error> {
    let rate = Rate::from_headers(&raw.headers);
    let status = raw.status;

    match StatusClass::of(status) {
        StatusClass::Success => Ok(Envelope {
            response: Response {
                status,
                rate,
                next_cursor: None,
            },
            raw,
        }),
        StatusClass::RateLimited => {
            let body = parse_error_body(&raw.body);
            tracing::warn!(
                "Rate limited on {} {} ({}/{} remaining, reset at {})",
                raw.method,
                sanitize_url(&raw.url),
                rate.remaining,
                rate.limit,
                rate.reset_display()
            );
            Err(Error::RateLimit(RateLimitError {
                rate,
                method: raw.method,
                url: raw.url,
                status,
                message: body.message,
            }))
        }
        StatusClass::ClientError => {
            let body = parse_error_body(&raw.body);
            tracing::error!(
                "Request failed with status {}: {} {} | body: {}",
                status,
                raw.method,
                sanitize_url(&raw.url),
                truncate_body(&raw.body)
            );
            Err(Error::Api(ErrorResponse {
                method: raw.method,
                url: raw.url,
                status,
                message: body.message,
                errors: body.errors,
                rate,
            }))
        }
    }
}

fn parse_error_body(body: &str) -> ErrorBody {
    if body.trim().is_empty() {
        return ErrorBody::default();
    }
    serde_json::from_str::<ErrorBody>(body).unwrap_or_else(|_| ErrorBody {
        message: Some(body.to_string()),
        errors: Vec::new(),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
