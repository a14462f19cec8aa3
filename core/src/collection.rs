//! Paginated collections.
//!
//! # Design
//! A `Collection` is created from a request template and fetches nothing
//! until `next` is called. Each call requests the page at the current
//! offset, replaces the held items, and advances the offset by the number
//! of items received. Like the resource builders, it is split into
//! `build_next` / `parse_next` so a host can drive pagination itself.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::context::check_status;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// One page of an array response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Page size and extra query parameters for a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    pub limit: u64,
    pub query: Vec<(String, String)>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            query: Vec::new(),
        }
    }
}

impl CollectionOptions {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Add a query parameter such as `order=-sys.createdAt` or
    /// `content_type=blogPost`.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    request: HttpRequest,
    limit: u64,
    skip: u64,
    total: Option<u64>,
    items: Vec<T>,
    locale: Option<String>,
}

/// Items a `Collection` can hold.
pub trait CollectionItem: DeserializeOwned {
    /// Called on every decoded item with the locale the collection was
    /// created for.
    fn attach_locale(&mut self, _locale: Option<&str>) {}
}

impl<T: CollectionItem> Collection<T> {
    /// Wrap a list request. The request's own `skip`/`limit` parameters are
    /// overwritten on every page.
    pub fn new(request: HttpRequest, options: &CollectionOptions) -> Self {
        let mut request = request;
        for (name, value) in &options.query {
            request.set_query(name, value.clone());
        }
        Self {
            request,
            limit: options.limit.max(1),
            skip: 0,
            total: None,
            items: Vec::new(),
            locale: None,
        }
    }

    /// Locale handed to every decoded item.
    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    /// The request for the next page, or `None` once every item has been
    /// fetched.
    pub fn build_next(&self) -> Option<HttpRequest> {
        if self.is_exhausted() {
            return None;
        }
        let mut request = self.request.clone();
        request.set_query("skip", self.skip.to_string());
        request.set_query("limit", self.limit.to_string());
        Some(request)
    }

    /// Consume the response to a `build_next` request.
    pub fn parse_next(&mut self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200])?;
        let page: Page<T> = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;

        // The offset advances from what was requested; the echoed `skip`
        // may be missing or wrong.
        self.total = Some(page.total);
        self.skip = self.skip.saturating_add(page.items.len() as u64);
        if page.items.is_empty() {
            // An empty page ends iteration even if `total` claims more.
            self.total = Some(self.skip);
        }
        self.items = page.items;
        for item in &mut self.items {
            item.attach_locale(self.locale.as_deref());
        }
        Ok(())
    }

    /// Fetch the next page. Returns `false` without I/O when the collection
    /// is already exhausted.
    pub fn next<X: Transport>(&mut self, transport: &X) -> Result<bool, ApiError> {
        let Some(request) = self.build_next() else {
            return Ok(false);
        };
        let response = transport.execute(request)?;
        self.parse_next(response)?;
        Ok(true)
    }

    /// Fetch every remaining page and return all items, in order.
    pub fn collect_all<X: Transport>(mut self, transport: &X) -> Result<Vec<T>, ApiError> {
        let mut all = Vec::new();
        while self.next(transport)? {
            all.append(&mut self.items);
        }
        Ok(all)
    }
}

impl<T> Collection<T> {
    /// Items of the most recently fetched page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Total reported by the server, once a page has been fetched.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Offset of the next page.
    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.total.is_some_and(|total| self.skip >= total)
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }
}
