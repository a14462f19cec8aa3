//! Wire types shared by every resource: system metadata, links and field
//! values.
//!
//! # Design
//! Everything under `sys` is owned by the server. All of it is optional so
//! a locally built entry can carry as little as a content-type link, and a
//! missing value is something callers check instead of something that
//! panics. Field values are a closed sum type rather than raw
//! `serde_json::Value`, so traversal is typed while schema-less content
//! still decodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// System metadata attached to every resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_counter: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Link>,
}

impl Sys {
    /// The id, treating an empty string the same as an absent one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn space_id(&self) -> Option<&str> {
        self.space.as_ref().map(Link::id).filter(|id| !id.is_empty())
    }

    pub fn content_type_id(&self) -> Option<&str> {
        self.content_type
            .as_ref()
            .map(Link::id)
            .filter(|id| !id.is_empty())
    }
}

/// Marker for the `"type": "Link"` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMarker {
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSys {
    #[serde(rename = "type")]
    pub kind: LinkMarker,
    #[serde(rename = "linkType")]
    pub link_type: String,
    pub id: String,
}

/// A reference to another resource: `{"sys":{"type":"Link","linkType":..,"id":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub sys: LinkSys,
}

impl Link {
    pub fn new(link_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                kind: LinkMarker::Link,
                link_type: link_type.into(),
                id: id.into(),
            },
        }
    }

    pub fn entry(id: impl Into<String>) -> Self {
        Self::new("Entry", id)
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::new("Asset", id)
    }

    pub fn space(id: impl Into<String>) -> Self {
        Self::new("Space", id)
    }

    pub fn environment(id: impl Into<String>) -> Self {
        Self::new("Environment", id)
    }

    pub fn content_type(id: impl Into<String>) -> Self {
        Self::new("ContentType", id)
    }

    pub fn id(&self) -> &str {
        &self.sys.id
    }

    pub fn link_type(&self) -> &str {
        &self.sys.link_type
    }
}

/// One field value of an entry.
///
/// Variant order matters for decoding: an object that is exactly a link
/// decodes as `Link`, every other object as `Map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Link(Link),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            FieldValue::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in a `Map` value. Localized fields are maps keyed by
    /// locale code, so `value.get("en-US")` is the common use.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(FieldValue::Null, FieldValue::Number)
    }
}

impl From<Link> for FieldValue {
    fn from(value: Link) -> Self {
        FieldValue::Link(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(value: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Map(value)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => match serde_json::from_value::<Link>(Value::Object(map.clone())) {
                Ok(link) => FieldValue::Link(link),
                Err(_) => FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
            },
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => Value::Number(n),
            FieldValue::String(s) => Value::String(s),
            FieldValue::Link(link) => serde_json::json!({
                "sys": {
                    "type": "Link",
                    "linkType": link.sys.link_type,
                    "id": link.sys.id,
                }
            }),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            FieldValue::Map(map) => Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn link_serializes_to_contentful_shape() {
        let json = serde_json::to_value(Link::content_type("blogPost")).unwrap();
        assert_eq!(
            json,
            json!({"sys": {"type": "Link", "linkType": "ContentType", "id": "blogPost"}})
        );
    }

    #[test]
    fn sys_omits_absent_fields() {
        let sys = Sys {
            content_type: Some(Link::content_type("post")),
            ..Default::default()
        };
        let json = serde_json::to_value(&sys).unwrap();
        assert_eq!(
            json,
            json!({"contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "post"}}})
        );
    }

    #[test]
    fn sys_decodes_server_metadata() {
        let sys: Sys = serde_json::from_value(json!({
            "id": "abc",
            "type": "Entry",
            "version": 4,
            "publishedVersion": 3,
            "createdAt": "2024-01-01T00:00:00.000Z",
            "space": {"sys": {"type": "Link", "linkType": "Space", "id": "sp"}},
            "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "post"}},
            "createdBy": {"sys": {"type": "Link", "linkType": "User", "id": "u1"}}
        }))
        .unwrap();
        assert_eq!(sys.id(), Some("abc"));
        assert_eq!(sys.version, Some(4));
        assert_eq!(sys.published_version, Some(3));
        assert_eq!(sys.space_id(), Some("sp"));
        assert_eq!(sys.content_type_id(), Some("post"));
    }

    #[test]
    fn empty_id_counts_as_absent() {
        let sys = Sys {
            id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(sys.id(), None);
    }

    #[test]
    fn field_value_decodes_each_variant() {
        let value: FieldValue = serde_json::from_value(json!({
            "title": {"en-US": "Hello"},
            "count": 3,
            "ratio": 0.5,
            "draft": false,
            "nothing": null,
            "tags": ["a", "b"],
            "author": {"sys": {"type": "Link", "linkType": "Entry", "id": "e1"}}
        }))
        .unwrap();

        assert_eq!(value.get("title").and_then(|t| t.get("en-US")).and_then(FieldValue::as_str), Some("Hello"));
        assert_eq!(value.get("count").and_then(FieldValue::as_i64), Some(3));
        assert_eq!(value.get("ratio").and_then(FieldValue::as_f64), Some(0.5));
        assert_eq!(value.get("draft").and_then(FieldValue::as_bool), Some(false));
        assert!(value.get("nothing").is_some_and(FieldValue::is_null));
        assert_eq!(value.get("tags").and_then(FieldValue::as_list).map(<[_]>::len), Some(2));
        assert_eq!(value.get("author").and_then(FieldValue::as_link).map(Link::id), Some("e1"));
    }

    #[test]
    fn object_with_extra_sys_keys_is_a_map_not_a_link() {
        let value: FieldValue = serde_json::from_value(json!({
            "sys": {"type": "Link", "linkType": "Entry", "id": "e1", "extra": true}
        }))
        .unwrap();
        assert!(matches!(value, FieldValue::Map(_)));
    }

    #[test]
    fn nested_tree_survives_json_round_trip() {
        let original = json!({
            "en-US": [
                {"k": [1, -2, 3.25, u64::MAX]},
                {"sys": {"type": "Link", "linkType": "Asset", "id": "img"}},
                null,
                "text",
                true
            ]
        });
        let value: FieldValue = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&value).unwrap(), original);
        assert_eq!(Value::from(FieldValue::from(original.clone())), original);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert!(FieldValue::from(f64::NAN).is_null());
    }
}
