use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use super::{common::ListOptions, Query};

/// `version` filter value selecting only latest-flagged entries.
pub const LATEST: &str = "latest";

/// Filters for the `v0/servers` list endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServerListOptions {
    pub common: ListOptions,
    /// Case-insensitive substring match on server names, applied server-side.
    pub search: Option<String>,
    /// Version filter; [`LATEST`] keeps only the latest version of each server.
    pub version: Option<String>,
    /// Only servers updated after this instant.
    pub updated_since: Option<DateTime<Utc>>,
}

impl Query for ServerListOptions {
    fn get_common(&mut self) -> &mut ListOptions {
        &mut self.common
    }

    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            url.query_pairs_mut().append_pair("search", search);
        };
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            url.query_pairs_mut().append_pair("version", version);
        };
        if let Some(updated_since) = self.updated_since {
            url.query_pairs_mut().append_pair(
                "updated_since",
                &updated_since.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            );
        };
        url
    }
}

impl ServerListOptions {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_latest_only(self) -> Self {
        self.with_version(LATEST)
    }

    pub fn with_updated_since(mut self, updated_since: DateTime<Utc>) -> Self {
        self.updated_since = Some(updated_since);
        self
    }

    /// A copy of these filters positioned at `cursor`.
    pub(crate) fn at_cursor(&self, cursor: Option<&str>) -> Self {
        let mut page = self.clone();
        page.common.cursor = cursor.map(String::from);
        page
    }
}

/// Options for the single-server lookup endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerGetOptions {
    /// A specific version instead of the latest one.
    pub version: Option<String>,
}

impl ServerGetOptions {
    /// Appends the lookup parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            url.query_pairs_mut().append_pair("version", version);
        };
        url
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }
}
