//! Server listing and lookup: the paginated list primitive and the queries
//! built on top of it.
//!
//! Every multi-page operation fetches pages strictly one after another and
//! stops when a page comes back without a cursor. Dropping the returned
//! future (e.g. via `tokio::time::timeout`) abandons the loop at the next
//! page boundary.

use std::cmp::Ordering;
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use semver::Version;

use crate::{
    client::Client,
    errors::PartialResults,
    query::{Query, ServerGetOptions, ServerListOptions},
    response::Response,
    types::{Server, ServerListResponse, ServerResponse, ServerStatus},
    ExactVersionLookup, Error,
};

/// Page size used by the name-based queries.
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Operations on the `v0/servers` endpoints. Obtained from [`Client::servers`].
pub struct ServersService<'a> {
    client: &'a Client,
}

impl<'a> ServersService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetches one page of servers.
    ///
    /// The returned [`Response`] carries the cursor of the following page,
    /// `None` when this was the last one.
    pub async fn list(
        &self,
        opts: &ServerListOptions,
    ) -> Result<(ServerListResponse, Response), Error> {
        let url = opts.add_to_url(&self.client.servers_url(&[])?);
        let (page, mut response) = self.client.get::<ServerListResponse>(url).await?;
        response.next_cursor = page.next_cursor().map(String::from);
        tracing::debug!(
            "Fetched {} servers (more: {})",
            page.servers.len(),
            response.next_cursor.is_some()
        );
        Ok((page, response))
    }

    /// Fetches a server by name: its latest version, or `opts.version`.
    ///
    /// This is a direct lookup, so an unknown name is an [`Error::Api`] with
    /// status 404.
    pub async fn get(
        &self,
        name: &str,
        opts: Option<&ServerGetOptions>,
    ) -> Result<(Server, Response), Error> {
        let mut url = self.client.servers_url(&[name])?;
        if let Some(opts) = opts {
            url = opts.add_to_url(&url);
        }
        let (entry, response) = self.client.get::<ServerResponse>(url).await?;
        Ok((entry.into_server(), response))
    }

    /// Every published version of the server called `name`.
    pub async fn list_versions_by_name(
        &self,
        name: &str,
    ) -> Result<(Vec<Server>, Response), Error> {
        let url = self.client.servers_url(&[name, "versions"])?;
        let (page, response) = self.client.get::<ServerListResponse>(url).await?;
        Ok((page.into_servers(), response))
    }

    /// Follows cursors until the last page and returns every server seen, in
    /// page order.
    ///
    /// If a page fetch fails midway, the servers gathered so far are handed
    /// back inside [`PartialResults`] together with the error.
    pub async fn list_all(
        &self,
        opts: &ServerListOptions,
    ) -> Result<(Vec<Server>, Response), PartialResults> {
        let mut servers = Vec::new();
        let result = self
            .scan(opts, |entry| {
                servers.push(entry.into_server());
                ControlFlow::Continue(())
            })
            .await;
        match result {
            Ok(response) => Ok((servers, response)),
            Err(source) => Err(PartialResults { servers, source }),
        }
    }

    /// All versions of the server whose name is exactly `name`.
    ///
    /// The registry's `search` is a substring match, so results are narrowed
    /// client-side. No match is an empty list, not an error.
    pub async fn list_by_name(&self, name: &str) -> Result<(Vec<Server>, Response), Error> {
        let opts = ServerListOptions::default()
            .with_search(name)
            .with_limit(SEARCH_PAGE_SIZE);
        let (servers, response) = self
            .list_all(&opts)
            .await
            .map_err(PartialResults::into_error)?;
        let matching = servers.into_iter().filter(|s| s.name == name).collect();
        Ok((matching, response))
    }

    /// The version the registry flags as latest for `name`.
    ///
    /// Stops at the first exact-name hit without reading further pages.
    pub async fn get_by_name_latest(
        &self,
        name: &str,
    ) -> Result<(Option<Server>, Response), Error> {
        let opts = ServerListOptions::default()
            .with_search(name)
            .with_latest_only()
            .with_limit(SEARCH_PAGE_SIZE);
        self.find_first(&opts, |server| server.name == name).await
    }

    /// A specific version of `name`, or `None` if the registry has no such
    /// version.
    ///
    /// Uses the per-version endpoint unless the client is configured with
    /// [`ExactVersionLookup::Scan`], in which case a name search is paged
    /// through until the version turns up.
    pub async fn get_by_name_exact_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<(Option<Server>, Response), Error> {
        match self.client.config().exact_version_lookup {
            ExactVersionLookup::Endpoint => {
                let url = self.client.servers_url(&[name, "versions", version])?;
                match self.client.get::<ServerResponse>(url).await {
                    Ok((entry, response)) => Ok((Some(entry.into_server()), response)),
                    Err(Error::Api(e)) if e.status == 404 => {
                        tracing::debug!("{}@{} not found", name, version);
                        let response = Response {
                            status: e.status,
                            rate: e.rate,
                            next_cursor: None,
                        };
                        Ok((None, response))
                    }
                    Err(e) => Err(e),
                }
            }
            ExactVersionLookup::Scan => {
                let opts = ServerListOptions::default()
                    .with_search(name)
                    .with_limit(SEARCH_PAGE_SIZE);
                self.find_first(&opts, |server| {
                    server.name == name && server.version == version
                })
                .await
            }
        }
    }

    /// The highest semantic version of `name` whose status is active.
    ///
    /// Versions that do not parse as semver are skipped. Among equal
    /// versions the first one seen wins.
    pub async fn get_by_name_latest_active_version(
        &self,
        name: &str,
    ) -> Result<(Option<Server>, Response), Error> {
        let opts = ServerListOptions::default()
            .with_search(name)
            .with_limit(SEARCH_PAGE_SIZE);

        let mut latest: Option<(Version, Server)> = None;
        let response = self
            .scan(&opts, |entry| {
                if entry.server.name != name || entry.status() != Some(ServerStatus::Active) {
                    return ControlFlow::Continue(());
                }
                let version = match parse_version(&entry.server.version) {
                    Ok(version) => version,
                    Err(e) => {
                        tracing::debug!(
                            "Skipping {}@{}: not a semantic version ({})",
                            name,
                            entry.server.version,
                            e
                        );
                        return ControlFlow::Continue(());
                    }
                };
                let newer = match &latest {
                    Some((best, _)) => cmp_precedence(&version, best) == Ordering::Greater,
                    None => true,
                };
                if newer {
                    latest = Some((version, entry.into_server()));
                }
                ControlFlow::Continue(())
            })
            .await?;

        Ok((latest.map(|(_, server)| server), response))
    }

    /// Every server updated after `since`, across all pages.
    ///
    /// Filtering happens server-side. Partial results are returned on a
    /// mid-listing failure, as with [`list_all`](Self::list_all).
    pub async fn list_updated_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<(Vec<Server>, Response), PartialResults> {
        let opts = ServerListOptions::default()
            .with_updated_since(since)
            .with_limit(SEARCH_PAGE_SIZE);
        self.list_all(&opts).await
    }

    async fn find_first<P>(
        &self,
        opts: &ServerListOptions,
        mut matches: P,
    ) -> Result<(Option<Server>, Response), Error>
    where
        P: FnMut(&Server) -> bool,
    {
        let mut found = None;
        let response = self
            .scan(opts, |entry| {
                if matches(&entry.server) {
                    found = Some(entry.into_server());
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await?;
        Ok((found, response))
    }

    /// Walks pages starting from `opts` (which is never modified), handing
    /// each entry to `visit` until it breaks or the cursor runs out.
    /// Returns the metadata of the last page fetched.
    async fn scan<F>(&self, opts: &ServerListOptions, mut visit: F) -> Result<Response, Error>
    where
        F: FnMut(ServerResponse) -> ControlFlow<()>,
    {
        let mut cursor: Option<String> = opts.common.cursor.clone();
        loop {
            let (page, response) = self.list(&opts.at_cursor(cursor.as_deref())).await?;
            for entry in page.servers {
                if visit(entry).is_break() {
                    return Ok(response);
                }
            }
            match &response.next_cursor {
                Some(next) => cursor = Some(next.clone()),
                None => return Ok(response),
            }
        }
    }
}

/// Parses a version the way registry publishers write them: a leading `v` is
/// allowed and missing minor/patch components count as zero (`1.5` is
/// `1.5.0`).
fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim();
    let unprefixed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    let split = unprefixed.find(['-', '+']).unwrap_or(unprefixed.len());
    let (core, suffix) = unprefixed.split_at(split);
    let mut padded = core.to_string();
    if !core.is_empty() {
        for _ in core.split('.').count()..3 {
            padded.push_str(".0");
        }
    }
    padded.push_str(suffix);
    Version::parse(&padded)
}

/// Semantic version precedence: build metadata does not count.
fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use reqwest::header::HeaderMap;

    use super::*;
    use crate::transport::{RawRequest, RawResponse, Transport};
    use crate::ClientConfig;

    /// Replays canned responses in order and records every request URL.
    struct Scripted {
        responses: Mutex<VecDeque<(u16, String)>>,
        requests: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(responses: Vec<(u16, String)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, request: RawRequest) -> Result<RawResponse, Error> {
            self.requests.lock().unwrap().push(request.url.to_string());
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra request");
            Ok(RawResponse {
                method: request.method,
                url: request.url,
                status,
                headers: HeaderMap::new(),
                body,
            })
        }
    }

    fn client(transport: Arc<Scripted>) -> Client {
        Client::with_transport(ClientConfig::default(), transport)
    }

    fn page(entries: &[&str], next_cursor: Option<&str>) -> String {
        let metadata = match next_cursor {
            Some(cursor) => format!(r#"{{"next_cursor": "{}"}}"#, cursor),
            None => "{}".to_string(),
        };
        format!(
            r#"{{"servers": [{}], "metadata": {}}}"#,
            entries.join(","),
            metadata
        )
    }

    fn entry(name: &str, version: &str, status: &str) -> String {
        format!(
            r#"{{"server": {{"name": "{}", "version": "{}"}}, "_meta": {{"io.modelcontextprotocol.registry/official": {{"status": "{}"}}}}}}"#,
            name, version, status
        )
    }

    fn versions(servers: &[Server]) -> Vec<&str> {
        servers.iter().map(|s| s.version.as_str()).collect()
    }

    #[tokio::test]
    async fn list_all_concatenates_pages_with_one_call_each() {
        let e1 = entry("a", "1.0.0", "active");
        let e2 = entry("b", "2.0.0", "active");
        let e3 = entry("c", "3.0.0", "active");
        let transport = Scripted::new(vec![
            (200, page(&[e1.as_str()], Some("p2"))),
            (200, page(&[e2.as_str()], Some("p3"))),
            (200, page(&[e3.as_str()], None)),
        ]);
        let client = client(transport.clone());

        let (servers, response) = client
            .servers()
            .list_all(&ServerListOptions::default().with_limit(1))
            .await
            .unwrap();

        assert_eq!(versions(&servers), vec!["1.0.0", "2.0.0", "3.0.0"]);
        assert_eq!(servers[0].current_status(), Some(ServerStatus::Active));
        assert_eq!(response.next_cursor, None);
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(!requests[0].contains("cursor="));
        assert!(requests[1].ends_with("cursor=p2"));
        assert!(requests[2].ends_with("cursor=p3"));
    }

    #[tokio::test]
    async fn list_all_treats_empty_cursor_as_last_page() {
        let e1 = entry("a", "1.0.0", "active");
        let transport = Scripted::new(vec![(200, page(&[e1.as_str()], Some("")))]);
        let client = client(transport.clone());

        let (servers, _) = client
            .servers()
            .list_all(&ServerListOptions::default())
            .await
            .unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn list_all_returns_partial_results_on_failure() {
        let e1 = entry("a", "1.0.0", "active");
        let e2 = entry("b", "1.0.0", "active");
        let transport = Scripted::new(vec![
            (200, page(&[e1.as_str(), e2.as_str()], Some("p2"))),
            (500, r#"{"message": "Internal server error"}"#.to_string()),
        ]);
        let client = client(transport);

        let partial = client
            .servers()
            .list_all(&ServerListOptions::default())
            .await
            .unwrap_err();
        assert_eq!(partial.servers.len(), 2);
        assert_eq!(partial.source.status(), Some(500));
    }

    #[tokio::test]
    async fn list_by_name_keeps_exact_matches_in_order() {
        let entries = [
            entry("test-server", "1.0.0", "active"),
            entry("test-server-alpha", "1.0.0", "active"),
            entry("test-server-beta", "1.0.0", "active"),
            entry("test-server", "2.0.0", "active"),
        ];
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![(200, page(&refs, None))]);
        let client = client(transport.clone());

        let (servers, _) = client.servers().list_by_name("test-server").await.unwrap();
        assert_eq!(versions(&servers), vec!["1.0.0", "2.0.0"]);
        assert!(servers.iter().all(|s| s.name == "test-server"));
        assert!(transport.requests()[0].contains("search=test-server"));
        assert!(transport.requests()[0].contains("limit=100"));
    }

    #[tokio::test]
    async fn latest_stops_at_first_exact_match() {
        let first = [
            entry("srv-plus", "9.0.0", "active"),
            entry("srv", "3.0.0", "active"),
        ];
        let refs: Vec<&str> = first.iter().map(String::as_str).collect();
        // A second page is advertised but must never be requested.
        let transport = Scripted::new(vec![(200, page(&refs, Some("p2")))]);
        let client = client(transport.clone());

        let (server, _) = client.servers().get_by_name_latest("srv").await.unwrap();
        assert_eq!(server.unwrap().version, "3.0.0");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("version=latest"));
    }

    #[tokio::test]
    async fn latest_is_absent_when_nothing_matches() {
        let transport = Scripted::new(vec![(200, page(&[], None))]);
        let client = client(transport);

        let (server, _) = client.servers().get_by_name_latest("nope").await.unwrap();
        assert!(server.is_none());
    }

    #[tokio::test]
    async fn latest_active_ignores_higher_non_active_versions() {
        let entries = [
            entry("test-server", "1.0.0", "active"),
            entry("test-server", "2.0.0", "deprecated"),
            entry("test-server", "1.5.0", "active"),
        ];
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![(200, page(&refs, None))]);
        let client = client(transport);

        let (server, _) = client
            .servers()
            .get_by_name_latest_active_version("test-server")
            .await
            .unwrap();
        assert_eq!(server.unwrap().version, "1.5.0");
    }

    #[tokio::test]
    async fn latest_active_skips_invalid_versions() {
        let entries = [
            entry("test-server", "invalid", "active"),
            entry("test-server", "1.0.0", "active"),
            entry("test-server", "not-semver", "active"),
        ];
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![(200, page(&refs, None))]);
        let client = client(transport);

        let (server, _) = client
            .servers()
            .get_by_name_latest_active_version("test-server")
            .await
            .unwrap();
        assert_eq!(server.unwrap().version, "1.0.0");
    }

    #[tokio::test]
    async fn latest_active_spans_pages() {
        let p1 = [entry("srv", "1.2.0", "active")];
        let p2 = [
            entry("srv", "2.0.0-rc.1", "active"),
            entry("srv", "1.10.0", "active"),
        ];
        let r1: Vec<&str> = p1.iter().map(String::as_str).collect();
        let r2: Vec<&str> = p2.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![
            (200, page(&r1, Some("p2"))),
            (200, page(&r2, None)),
        ]);
        let client = client(transport);

        let (server, _) = client
            .servers()
            .get_by_name_latest_active_version("srv")
            .await
            .unwrap();
        assert_eq!(server.unwrap().version, "2.0.0-rc.1");
    }

    #[tokio::test]
    async fn latest_active_absent_without_active_versions() {
        let entries = [
            entry("test-server", "1.0.0", "deprecated"),
            entry("test-server", "2.0.0", "deleted"),
        ];
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![(200, page(&refs, None))]);
        let client = client(transport);

        let (server, _) = client
            .servers()
            .get_by_name_latest_active_version("test-server")
            .await
            .unwrap();
        assert!(server.is_none());
    }

    #[tokio::test]
    async fn exact_version_scan_matches_name_and_version() {
        let entries = [
            entry("exact-name-plus", "1.5.0", "active"),
            entry("exact-name", "1.0.0", "active"),
            entry("exact-name", "1.5.0", "active"),
        ];
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![(200, page(&refs, None))]);
        let config =
            ClientConfig::default().with_exact_version_lookup(ExactVersionLookup::Scan);
        let client = Client::with_transport(config, transport.clone());

        let (server, _) = client
            .servers()
            .get_by_name_exact_version("exact-name", "1.5.0")
            .await
            .unwrap();
        let server = server.unwrap();
        assert_eq!(server.name, "exact-name");
        assert_eq!(server.version, "1.5.0");
        assert!(transport.requests()[0].contains("/v0/servers?"));
    }

    #[tokio::test]
    async fn exact_version_endpoint_not_found_is_absent() {
        let transport = Scripted::new(vec![(404, r#"{"message": "Server not found"}"#.to_string())]);
        let client = client(transport.clone());

        let (server, response) = client
            .servers()
            .get_by_name_exact_version("io.github.acme/tools", "9.9.9")
            .await
            .unwrap();
        assert!(server.is_none());
        assert_eq!(response.status, 404);
        assert!(transport.requests()[0]
            .ends_with("/v0/servers/io.github.acme%2Ftools/versions/9.9.9"));
    }

    #[tokio::test]
    async fn exact_version_endpoint_propagates_other_errors() {
        let transport = Scripted::new(vec![(500, "".to_string())]);
        let client = client(transport);

        let err = client
            .servers()
            .get_by_name_exact_version("a", "1.0.0")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn latest_active_accepts_prefixed_and_partial_versions() {
        let entries = [
            entry("srv", "1.0.0", "active"),
            entry("srv", "v2.0.0", "active"),
            entry("srv", "1.5", "active"),
        ];
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        let transport = Scripted::new(vec![(200, page(&refs, None))]);
        let client = client(transport);

        let (server, _) = client
            .servers()
            .get_by_name_latest_active_version("srv")
            .await
            .unwrap();
        assert_eq!(server.unwrap().version, "v2.0.0");
    }

    #[tokio::test]
    async fn exact_version_rejects_dot_segment_without_request() {
        let transport = Scripted::new(vec![]);
        let client = client(transport.clone());

        let err = client
            .servers()
            .get_by_name_exact_version("a/b", "..")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn parse_version_is_lenient_about_prefix_and_padding() {
        assert_eq!(parse_version("v2.0.0").unwrap(), Version::new(2, 0, 0));
        assert_eq!(parse_version("V1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_version("1.5").unwrap(), Version::new(1, 5, 0));
        assert_eq!(parse_version("3").unwrap(), Version::new(3, 0, 0));
        assert_eq!(
            parse_version("1.2-beta.1").unwrap(),
            Version::parse("1.2.0-beta.1").unwrap()
        );
        assert!(parse_version("invalid").is_err());
        assert!(parse_version("not-semver").is_err());
        assert!(parse_version("").is_err());
        assert!(parse_version("1.2.3.4").is_err());
    }

    #[test]
    fn precedence_ignores_build_metadata() {
        let a = Version::parse("1.0.0+build.1").unwrap();
        let b = Version::parse("1.0.0+build.2").unwrap();
        assert_eq!(cmp_precedence(&a, &b), Ordering::Equal);

        let pre = Version::parse("1.0.0-alpha").unwrap();
        let release = Version::parse("1.0.0").unwrap();
        assert_eq!(cmp_precedence(&pre, &release), Ordering::Less);
    }
}
