//! Content types: the schemas entries are validated against.
//!
//! Entries only need content types to resolve a field's declared data type,
//! so the dependency is expressed as the `ContentTypeLookup` capability
//! rather than a reference to a concrete client.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::{Collection, CollectionItem, CollectionOptions, Page};
use crate::context::{check_segment, ClientContext};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::types::Sys;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    #[serde(default)]
    pub sys: Sys,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ContentType {
    pub fn id(&self) -> Option<&str> {
        self.sys.id()
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }
}

impl CollectionItem for ContentType {}

/// Declaration of one field in a content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `Symbol`, `Text`, `Integer`, `Number`, `Date`, `Boolean`, `Link`,
    /// `Array`, `Object`, `Location`, `RichText`.
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Value>,
}

/// Source of content-type pages for a space.
pub trait ContentTypeLookup {
    /// The page of content types starting at offset `skip`.
    fn content_type_page(&self, space_id: &str, skip: u64) -> Result<Page<ContentType>, ApiError>;
}

impl<L: ContentTypeLookup + ?Sized> ContentTypeLookup for &L {
    fn content_type_page(&self, space_id: &str, skip: u64) -> Result<Page<ContentType>, ApiError> {
        (**self).content_type_page(space_id, skip)
    }
}

/// Request builder and response parser for the content-types resource.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    ctx: Arc<ClientContext>,
}

impl ContentTypes {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }

    pub fn build_list(&self, space_id: &str, skip: u64, limit: u64) -> Result<HttpRequest, ApiError> {
        let path = format!("{}/content_types", self.ctx.environment_path(space_id)?);
        let query = vec![
            ("skip".to_string(), skip.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        self.ctx.new_request(HttpMethod::Get, &path, query, None)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Page<ContentType>, ApiError> {
        self.ctx.decode(&response, &[200])
    }

    pub fn build_get(&self, space_id: &str, content_type_id: &str) -> Result<HttpRequest, ApiError> {
        check_segment("content type id", content_type_id)?;
        let path = format!(
            "{}/content_types/{content_type_id}",
            self.ctx.environment_path(space_id)?
        );
        self.ctx.new_request(HttpMethod::Get, &path, Vec::new(), None)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<ContentType, ApiError> {
        self.ctx.decode(&response, &[200])
    }
}

/// Executes content-type requests through a transport.
pub struct ContentTypesService<'a, T> {
    pub(crate) requests: &'a ContentTypes,
    pub(crate) transport: &'a T,
}

impl<T: Transport> ContentTypesService<'_, T> {
    pub fn list(&self, space_id: &str) -> Result<Collection<ContentType>, ApiError> {
        self.list_with(space_id, &CollectionOptions::default())
    }

    pub fn list_with(
        &self,
        space_id: &str,
        options: &CollectionOptions,
    ) -> Result<Collection<ContentType>, ApiError> {
        let request = self.requests.build_list(space_id, 0, options.limit)?;
        Ok(Collection::new(request, options))
    }

    pub fn get(&self, space_id: &str, content_type_id: &str) -> Result<ContentType, ApiError> {
        let request = self.requests.build_get(space_id, content_type_id)?;
        self.requests.parse_get(self.transport.execute(request)?)
    }
}

impl<T: Transport> ContentTypeLookup for ContentTypesService<'_, T> {
    fn content_type_page(&self, space_id: &str, skip: u64) -> Result<Page<ContentType>, ApiError> {
        let request = self
            .requests
            .build_list(space_id, skip, crate::collection::DEFAULT_PAGE_LIMIT)?;
        self.requests.parse_list(self.transport.execute(request)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ClientConfig;

    fn builder() -> ContentTypes {
        let config = ClientConfig::new("token").with_base_url("http://localhost:3000");
        ContentTypes::new(Arc::new(ClientContext::new(config).unwrap()))
    }

    #[test]
    fn build_list_targets_environment() {
        let req = builder().build_list("space1", 100, 50).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.path,
            "http://localhost:3000/spaces/space1/environments/master/content_types"
        );
        assert_eq!(req.query_param("skip"), Some("100"));
        assert_eq!(req.query_param("limit"), Some("50"));
    }

    #[test]
    fn build_get_rejects_bad_id() {
        assert!(matches!(builder().build_get("space1", ""), Err(ApiError::Request(_))));
    }

    #[test]
    fn parse_list_decodes_field_definitions() {
        let body = json!({
            "sys": {"type": "Array"},
            "total": 1, "skip": 0, "limit": 100,
            "items": [{
                "sys": {"id": "post", "type": "ContentType", "version": 3},
                "name": "Post",
                "displayField": "title",
                "fields": [
                    {"id": "title", "name": "Title", "type": "Symbol", "required": true, "localized": true},
                    {"id": "author", "name": "Author", "type": "Link", "linkType": "Entry"},
                    {"id": "tags", "name": "Tags", "type": "Array", "items": {"type": "Symbol"}}
                ]
            }]
        });
        let page = builder()
            .parse_list(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            })
            .unwrap();
        assert_eq!(page.total, 1);
        let post = &page.items[0];
        assert_eq!(post.id(), Some("post"));
        assert_eq!(post.display_field.as_deref(), Some("title"));
        assert_eq!(post.field("title").map(|f| f.data_type.as_str()), Some("Symbol"));
        assert!(post.field("title").unwrap().required);
        assert_eq!(post.field("author").and_then(|f| f.link_type.as_deref()), Some("Entry"));
        assert!(post.field("tags").unwrap().items.is_some());
        assert!(post.field("missing").is_none());
    }
}
