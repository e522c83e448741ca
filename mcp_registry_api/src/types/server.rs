//! Server records as published in the MCP registry.
//!
//! Field names follow the current camelCase wire format; the snake_case
//! spellings used by earlier registry releases are accepted as aliases.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single server record, identified by `name` + `version`.
///
/// Names are namespaced (`io.github.owner/server`) and are not unique: every
/// published version is its own record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Server {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Usually a semantic version, but the registry does not enforce it.
    #[serde(default)]
    pub version: String,

    #[serde(
        rename = "websiteUrl",
        alias = "website_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub website_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<Package>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remotes: Vec<Remote>,

    /// Lifecycle status as carried by older registry releases. Newer releases
    /// move it into the official registry metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,

    #[serde(
        rename = "_meta",
        alias = "meta",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<ServerMeta>,

    /// Any other fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Server {
    /// Official registry metadata attached to the record itself, if any.
    pub fn official(&self) -> Option<&RegistryExtensions> {
        self.meta.as_ref().and_then(|m| m.official.as_ref())
    }

    /// Lifecycle status from the official metadata, falling back to the
    /// legacy top-level field.
    pub fn current_status(&self) -> Option<ServerStatus> {
        self.official().and_then(|o| o.status).or(self.status)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Repository {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
}

/// An installable distribution of a server (npm, pypi, oci, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Package {
    #[serde(rename = "registryType", alias = "registry_type", default)]
    pub registry_type: String,

    #[serde(default)]
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A hosted endpoint for a server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Remote {
    #[serde(rename = "type", alias = "transport_type", default)]
    pub transport_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `_meta` block, found both on a server record and on the list entry
/// wrapping it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ServerMeta {
    #[serde(
        rename = "io.modelcontextprotocol.registry/official",
        alias = "official",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub official: Option<RegistryExtensions>,

    #[serde(
        rename = "io.modelcontextprotocol.registry/publisher-provided",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher_provided: Option<Value>,
}

/// Metadata the registry itself maintains for each published version.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RegistryExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(
        rename = "serverId",
        alias = "server_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_id: Option<String>,

    #[serde(
        rename = "versionId",
        alias = "version_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,

    #[serde(
        rename = "publishedAt",
        alias = "published_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(
        rename = "updatedAt",
        alias = "updated_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(rename = "isLatest", alias = "is_latest", default)]
    pub is_latest: bool,
}

/// Lifecycle state of a published server version.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Active,
    Deprecated,
    Deleted,
    /// A status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ServerStatus::Active => "active",
                ServerStatus::Deprecated => "deprecated",
                ServerStatus::Deleted => "deleted",
                ServerStatus::Unknown => "unknown",
            }
        )
    }
}
