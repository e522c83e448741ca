//! Client configuration: where the registry lives and how to talk to it.

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::Error;

/// Production registry.
pub const DEFAULT_BASE_URL: &str = "https://registry.modelcontextprotocol.io/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How `get_by_name_exact_version` finds a single version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExactVersionLookup {
    /// `GET v0/servers/{name}/versions/{version}`.
    #[default]
    Endpoint,
    /// Page through a name search and match client-side, for registries
    /// without the per-version endpoint.
    Scan,
}

impl FromStr for ExactVersionLookup {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "endpoint" => Ok(ExactVersionLookup::Endpoint),
            "scan" => Ok(ExactVersionLookup::Scan),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Always ends with `/` so endpoint paths join beneath it.
    pub base_url: Url,
    pub user_agent: String,
    /// Per-request timeout, covering connect through body read.
    pub timeout: Duration,
    pub exact_version_lookup: ExactVersionLookup,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            user_agent: format!("mcp-registry-rs/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            exact_version_lookup: ExactVersionLookup::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `MCP_REGISTRY_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("MCP_REGISTRY_BASE_URL") {
            match parse_base_url(&raw) {
                Ok(url) => config.base_url = url,
                Err(e) => tracing::warn!("Ignoring MCP_REGISTRY_BASE_URL: {}", e),
            }
        }
        if let Some(user_agent) = lookup("MCP_REGISTRY_USER_AGENT").filter(|v| !v.is_empty()) {
            config.user_agent = user_agent;
        }
        if let Some(raw) = lookup("MCP_REGISTRY_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring MCP_REGISTRY_TIMEOUT_SECS={:?}", raw),
            }
        }
        if let Some(raw) = lookup("MCP_REGISTRY_EXACT_VERSION") {
            match raw.parse() {
                Ok(mode) => config.exact_version_lookup = mode,
                Err(()) => tracing::warn!("Ignoring MCP_REGISTRY_EXACT_VERSION={:?}", raw),
            }
        }

        config
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Error> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_exact_version_lookup(mut self, lookup: ExactVersionLookup) -> Self {
        self.exact_version_lookup = lookup;
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)
        .map_err(|e| Error::InvalidRequest(format!("invalid base URL {:?}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidRequest(format!(
            "base URL {:?} cannot carry a path",
            raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
