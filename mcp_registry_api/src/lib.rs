//! Read-only client for the MCP server registry API.
//!
//! [`Client::servers`] exposes the paginated list endpoint and the queries
//! derived from it (all pages, exact-name matches, latest and latest-active
//! versions, exact versions, updated-since). Responses are classified into
//! successes, [`ErrorResponse`]s and [`RateLimitError`]s; nothing is retried.

mod client;
mod config;
mod errors;
mod query;
mod response;
mod servers;
mod transport;
pub mod types;
pub use self::client::Client;
pub use self::config::{ClientConfig, ExactVersionLookup, DEFAULT_BASE_URL};
pub use self::errors::{sanitize_url, Error, ErrorDetail, ErrorResponse, PartialResults, RateLimitError};
pub use self::query::{ListOptions, Query, ServerGetOptions, ServerListOptions, LATEST};
pub use self::response::{classify, Envelope, Rate, Response, StatusClass};
pub use self::servers::{ServersService, SEARCH_PAGE_SIZE};
pub use self::transport::{HttpTransport, RawRequest, RawResponse, Transport};
