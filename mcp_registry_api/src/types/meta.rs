use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RegistryExtensions, Server, ServerMeta, ServerStatus};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ListMetadata {
    #[serde(
        rename = "next_cursor",
        alias = "nextCursor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

/// Body of the `/v0/servers` list endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ServerListResponse {
    #[serde(default)]
    pub servers: Vec<ServerResponse>,
    #[serde(default)]
    pub metadata: ListMetadata,
}

impl ServerListResponse {
    /// The cursor for the following page. An empty cursor counts as absent.
    pub fn next_cursor(&self) -> Option<&str> {
        self.metadata
            .next_cursor
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
    }

    /// Unwraps every entry to its server record, keeping server order.
    pub fn into_servers(self) -> Vec<Server> {
        self.servers
            .into_iter()
            .map(ServerResponse::into_server)
            .collect()
    }
}

/// One list entry: a server record plus the registry metadata about it.
///
/// Accepts both the wrapped shape (`{"server": {...}, "_meta": {...}}`) and
/// the flat shape older registries return, where the record is the entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "ServerResponseRepr")]
pub struct ServerResponse {
    pub server: Server,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ServerMeta>,
}

impl ServerResponse {
    fn official(&self) -> Option<&RegistryExtensions> {
        self.meta.as_ref().and_then(|m| m.official.as_ref())
    }

    /// Lifecycle status, wherever this registry version put it.
    pub fn status(&self) -> Option<ServerStatus> {
        self.official()
            .and_then(|o| o.status)
            .or_else(|| self.server.current_status())
    }

    /// Last update time, wherever this registry version put it.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.official()
            .and_then(|o| o.updated_at)
            .or_else(|| self.server.official().and_then(|o| o.updated_at))
    }

    pub fn is_latest(&self) -> bool {
        self.official()
            .or_else(|| self.server.official())
            .is_some_and(|o| o.is_latest)
    }

    /// The server record, carrying the entry's official registry metadata
    /// when the record has none of its own.
    pub fn into_server(self) -> Server {
        let ServerResponse { mut server, meta } = self;
        let official = meta.and_then(|m| m.official);
        if server.official().is_none() && official.is_some() {
            server.meta.get_or_insert_with(ServerMeta::default).official = official;
        }
        server
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServerResponseRepr {
    Wrapped {
        server: Server,
        #[serde(rename = "_meta", default)]
        meta: Option<ServerMeta>,
    },
    Flat(Server),
}

impl From<ServerResponseRepr> for ServerResponse {
    fn from(repr: ServerResponseRepr) -> Self {
        match repr {
            ServerResponseRepr::Wrapped { server, meta } => ServerResponse { server, meta },
            ServerResponseRepr::Flat(server) => ServerResponse { server, meta: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_entry_reads_status_from_envelope() {
        let entry: ServerResponse = serde_json::from_str(
            r#"{
                "server": {"name": "io.github.acme/tools", "version": "1.2.0"},
                "_meta": {
                    "io.modelcontextprotocol.registry/official": {
                        "status": "deprecated",
                        "updatedAt": "2024-05-01T10:00:00Z",
                        "isLatest": true
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(entry.server.name, "io.github.acme/tools");
        assert_eq!(entry.status(), Some(ServerStatus::Deprecated));
        assert!(entry.is_latest());
        assert_eq!(
            entry.updated_at().unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn flat_entry_reads_legacy_status() {
        let entry: ServerResponse = serde_json::from_str(
            r#"{"name": "test-server", "version": "1.0.0", "status": "active"}"#,
        )
        .unwrap();

        assert!(entry.meta.is_none());
        assert_eq!(entry.server.version, "1.0.0");
        assert_eq!(entry.status(), Some(ServerStatus::Active));
        assert!(!entry.is_latest());
    }

    #[test]
    fn into_server_keeps_envelope_metadata() {
        let entry: ServerResponse = serde_json::from_str(
            r#"{
                "server": {"name": "a", "version": "1.0.0"},
                "_meta": {"io.modelcontextprotocol.registry/official": {"status": "deleted"}}
            }"#,
        )
        .unwrap();

        let server = entry.into_server();
        assert_eq!(server.current_status(), Some(ServerStatus::Deleted));
    }

    #[test]
    fn flat_entry_reads_nested_official_meta() {
        let entry: ServerResponse = serde_json::from_str(
            r#"{
                "name": "test/server1",
                "version": "1.0.0",
                "meta": {"official": {"id": "server1", "updated_at": "2024-01-02T00:00:00Z"}}
            }"#,
        )
        .unwrap();

        let official = entry.server.official().unwrap();
        assert_eq!(official.id.as_deref(), Some("server1"));
        assert!(entry.updated_at().is_some());
        assert_eq!(entry.status(), None);
    }

    #[test]
    fn unknown_status_does_not_fail_decoding() {
        let entry: ServerResponse =
            serde_json::from_str(r#"{"name": "a", "version": "1.0.0", "status": "archived"}"#)
                .unwrap();
        assert_eq!(entry.status(), Some(ServerStatus::Unknown));
    }

    #[test]
    fn empty_cursor_counts_as_absent() {
        let page: ServerListResponse =
            serde_json::from_str(r#"{"servers": [], "metadata": {"next_cursor": ""}}"#).unwrap();
        assert_eq!(page.next_cursor(), None);

        let page: ServerListResponse =
            serde_json::from_str(r#"{"servers": [], "metadata": {"nextCursor": "abc"}}"#).unwrap();
        assert_eq!(page.next_cursor(), Some("abc"));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let server: Server = serde_json::from_str(
            r#"{"name": "a", "version": "1.0.0", "$schema": "https://example.com/schema.json"}"#,
        )
        .unwrap();
        assert_eq!(
            server.extra.get("$schema").and_then(|v| v.as_str()),
            Some("https://example.com/schema.json")
        );
    }
}
