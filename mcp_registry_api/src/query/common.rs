//! Shared query infrastructure: the [`Query`] trait and [`ListOptions`].

use url::Url;

/// Trait implemented by all query builders. Provides URL serialization and
/// the shared cursor-pagination builder methods.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    ///
    /// Only non-empty, non-zero values are written.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the pagination fields.
    fn get_common(&mut self) -> &mut ListOptions;

    /// Sets the page-size hint. The registry caps it server-side.
    fn with_limit(mut self, limit: u32) -> Self
    where
        Self: Sized,
    {
        self.get_common().limit = Some(limit);
        self
    }

    /// Sets the opaque cursor returned as `next_cursor` by a previous page.
    fn with_cursor(mut self, cursor: &str) -> Self
    where
        Self: Sized,
    {
        self.get_common().cursor = Some(cursor.to_string());
        self
    }
}

/// Cursor pagination fields shared by list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum items per page. `None` uses the registry default.
    pub limit: Option<u32>,
    /// Continuation token. `None` starts from the first page.
    pub cursor: Option<String>,
}

impl ListOptions {
    /// Appends the pagination parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        };
        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            url.query_pairs_mut().append_pair("cursor", cursor);
        };
        url
    }
}
