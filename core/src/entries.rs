//! Request builder, response parser and service for the entries resource.
//!
//! # Design
//! `Entries` holds only the shared `ClientContext` and carries no state
//! between calls. Each operation is a `build_*` method producing an
//! `HttpRequest` and a `parse_*` method consuming the `HttpResponse`, so the
//! mapping from intent to wire format is testable without a network.
//! `EntriesService` glues the two halves to a `Transport`.
//!
//! Delete and unpublish go through `ClientContext::legacy_path`, which
//! omits the environment segment unless the config selects
//! `PathScheme::EnvironmentScoped`.

use std::sync::Arc;

use tracing::debug;

use crate::collection::{Collection, CollectionOptions};
use crate::content_type::{ContentType, ContentTypeLookup};
use crate::context::{check_segment, check_status, ClientContext};
use crate::entry::{Entry, EntryField};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

pub const HEADER_CONTENT_TYPE_ID: &str = "X-Contentful-Content-Type";
pub const HEADER_VERSION: &str = "X-Contentful-Version";

#[derive(Debug, Clone)]
pub struct Entries {
    ctx: Arc<ClientContext>,
}

impl Entries {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }

    fn collection_path(&self, space_id: &str) -> Result<String, ApiError> {
        Ok(format!("{}/entries", self.ctx.environment_path(space_id)?))
    }

    fn item_path(&self, space_id: &str, entry_id: &str) -> Result<String, ApiError> {
        check_segment("entry id", entry_id)?;
        Ok(format!("{}/{entry_id}", self.collection_path(space_id)?))
    }

    fn legacy_item_path(&self, space_id: &str, entry_id: &str) -> Result<String, ApiError> {
        check_segment("entry id", entry_id)?;
        Ok(format!("{}/entries/{entry_id}", self.ctx.legacy_path(space_id)?))
    }

    pub fn build_list(&self, space_id: &str) -> Result<HttpRequest, ApiError> {
        let path = self.collection_path(space_id)?;
        self.ctx.new_request(HttpMethod::Get, &path, Vec::new(), None)
    }

    pub fn build_get(&self, space_id: &str, entry_id: &str) -> Result<HttpRequest, ApiError> {
        let path = self.item_path(space_id, entry_id)?;
        self.ctx.new_request(HttpMethod::Get, &path, Vec::new(), None)
    }

    /// PUT to the item path when the entry has an id, POST to the collection
    /// path otherwise. The entry must name its content type.
    pub fn build_upsert(&self, space_id: &str, entry: &Entry) -> Result<HttpRequest, ApiError> {
        let content_type_id = entry
            .content_type_id()
            .ok_or(ApiError::Precondition("entry.sys.contentType.sys.id is required"))?
            .to_string();
        let body = serde_json::to_string(entry).map_err(|e| ApiError::Serialization(e.to_string()))?;

        let (method, path) = match entry.id() {
            Some(id) => (HttpMethod::Put, self.item_path(space_id, id)?),
            None => (HttpMethod::Post, self.collection_path(space_id)?),
        };
        let mut request = self.ctx.new_request(method, &path, Vec::new(), Some(body))?;
        request.set_header(HEADER_CONTENT_TYPE_ID, content_type_id);
        Ok(request)
    }

    pub fn build_delete(&self, space_id: &str, entry_id: &str) -> Result<HttpRequest, ApiError> {
        let path = self.legacy_item_path(space_id, entry_id)?;
        self.ctx.new_request(HttpMethod::Delete, &path, Vec::new(), None)
    }

    pub fn build_publish(&self, space_id: &str, entry: &Entry) -> Result<HttpRequest, ApiError> {
        let (id, version) = published_target(entry)?;
        let path = format!("{}/published", self.item_path(space_id, id)?);
        let mut request = self.ctx.new_request(HttpMethod::Put, &path, Vec::new(), None)?;
        request.set_header(HEADER_VERSION, version.to_string());
        Ok(request)
    }

    pub fn build_unpublish(&self, space_id: &str, entry: &Entry) -> Result<HttpRequest, ApiError> {
        let (id, version) = published_target(entry)?;
        let path = format!("{}/published", self.legacy_item_path(space_id, id)?);
        let mut request = self.ctx.new_request(HttpMethod::Delete, &path, Vec::new(), None)?;
        request.set_header(HEADER_VERSION, version.to_string());
        Ok(request)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<Entry, ApiError> {
        self.decode_entry(&response, &[200])
    }

    /// Refresh `entry` in place from the server's echo of the saved entry.
    pub fn parse_upsert(&self, response: HttpResponse, entry: &mut Entry) -> Result<(), ApiError> {
        let saved: Entry = self.ctx.decode(&response, &[200, 201])?;
        entry.replace_with(saved);
        Ok(())
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    pub fn parse_publish(&self, response: HttpResponse) -> Result<Entry, ApiError> {
        self.decode_entry(&response, &[200])
    }

    pub fn parse_unpublish(&self, response: HttpResponse) -> Result<Entry, ApiError> {
        self.decode_entry(&response, &[200])
    }

    fn decode_entry(&self, response: &HttpResponse, expected: &[u16]) -> Result<Entry, ApiError> {
        let mut entry: Entry = self.ctx.decode(response, expected)?;
        entry.set_locale(self.ctx.locale().map(str::to_string));
        Ok(entry)
    }
}

fn published_target(entry: &Entry) -> Result<(&str, u64), ApiError> {
    let sys = entry
        .sys
        .as_ref()
        .ok_or(ApiError::Precondition("entry.sys is required"))?;
    let id = sys.id().ok_or(ApiError::Precondition("entry.sys.id is required"))?;
    let version = sys
        .version
        .ok_or(ApiError::Precondition("entry.sys.version is required"))?;
    Ok((id, version))
}

/// Pair `entry.fields[key]` with the type declared for `key` by the
/// content type `content_type_id`, if it is among `content_types`.
pub fn resolve_entry_field(
    entry: &Entry,
    key: &str,
    content_type_id: &str,
    content_types: &[ContentType],
) -> EntryField {
    let data_type = content_types
        .iter()
        .filter(|ct| ct.id() == Some(content_type_id))
        .find_map(|ct| ct.field(key))
        .map(|field| field.data_type.clone())
        .unwrap_or_default();
    EntryField {
        value: entry.field(key).cloned(),
        data_type,
    }
}

fn lookup_ids(entry: &Entry) -> Result<(&str, &str), ApiError> {
    let space_id = entry
        .space_id()
        .ok_or(ApiError::Precondition("entry.sys.space.sys.id is required"))?;
    let content_type_id = entry
        .content_type_id()
        .ok_or(ApiError::Precondition("entry.sys.contentType.sys.id is required"))?;
    Ok((space_id, content_type_id))
}

/// Executes entry operations through a transport.
pub struct EntriesService<'a, T, L> {
    requests: &'a Entries,
    transport: &'a T,
    lookup: L,
}

impl<'a, T: Transport, L: ContentTypeLookup> EntriesService<'a, T, L> {
    pub fn new(requests: &'a Entries, transport: &'a T, lookup: L) -> Self {
        Self {
            requests,
            transport,
            lookup,
        }
    }

    /// A lazy collection over the space's entries. Nothing is fetched until
    /// `Collection::next` is called.
    pub fn list(&self, space_id: &str) -> Result<Collection<Entry>, ApiError> {
        self.list_with(space_id, &CollectionOptions::default())
    }

    pub fn list_with(
        &self,
        space_id: &str,
        options: &CollectionOptions,
    ) -> Result<Collection<Entry>, ApiError> {
        let request = self.requests.build_list(space_id)?;
        let locale = self.requests.ctx.locale().map(str::to_string);
        Ok(Collection::new(request, options).with_locale(locale))
    }

    pub fn get(&self, space_id: &str, entry_id: &str) -> Result<Entry, ApiError> {
        let request = self.requests.build_get(space_id, entry_id)?;
        self.requests.parse_get(self.transport.execute(request)?)
    }

    /// Create or update `entry`, then overwrite it with the server's copy.
    pub fn upsert(&self, space_id: &str, entry: &mut Entry) -> Result<(), ApiError> {
        let request = self.requests.build_upsert(space_id, entry)?;
        debug!(space_id, method = %request.method, "upserting entry");
        let response = self.transport.execute(request)?;
        self.requests.parse_upsert(response, entry)
    }

    pub fn delete(&self, space_id: &str, entry_id: &str) -> Result<(), ApiError> {
        let request = self.requests.build_delete(space_id, entry_id)?;
        debug!(space_id, entry_id, "deleting entry");
        self.requests.parse_delete(self.transport.execute(request)?)
    }

    /// Publish the entry at its current version. A stale version is
    /// rejected by the server with 409 and returned as-is.
    pub fn publish(&self, space_id: &str, entry: &Entry) -> Result<Entry, ApiError> {
        let request = self.requests.build_publish(space_id, entry)?;
        debug!(space_id, version = entry.version(), "publishing entry");
        self.requests.parse_publish(self.transport.execute(request)?)
    }

    pub fn unpublish(&self, space_id: &str, entry: &Entry) -> Result<Entry, ApiError> {
        let request = self.requests.build_unpublish(space_id, entry)?;
        debug!(space_id, version = entry.version(), "unpublishing entry");
        self.requests.parse_unpublish(self.transport.execute(request)?)
    }

    /// Resolve the declared type of `key` for this entry.
    ///
    /// Only the first page of the space's content types is searched. If the
    /// entry's content type is not on it, the result carries the raw value
    /// and an empty type. Use `get_entry_key_all_pages` to search further.
    pub fn get_entry_key(&self, entry: &Entry, key: &str) -> Result<EntryField, ApiError> {
        let (space_id, content_type_id) = lookup_ids(entry)?;
        let page = self.lookup.content_type_page(space_id, 0)?;
        Ok(resolve_entry_field(entry, key, content_type_id, &page.items))
    }

    /// Like `get_entry_key`, but keeps fetching content-type pages until the
    /// entry's content type is found or the listing ends.
    pub fn get_entry_key_all_pages(&self, entry: &Entry, key: &str) -> Result<EntryField, ApiError> {
        let (space_id, content_type_id) = lookup_ids(entry)?;
        let mut skip: u64 = 0;
        loop {
            let page = self.lookup.content_type_page(space_id, skip)?;
            if page.items.iter().any(|ct| ct.id() == Some(content_type_id)) {
                return Ok(resolve_entry_field(entry, key, content_type_id, &page.items));
            }
            skip = skip.saturating_add(page.items.len() as u64);
            if page.items.is_empty() || skip >= page.total {
                return Ok(resolve_entry_field(entry, key, content_type_id, &[]));
            }
        }
    }
}
