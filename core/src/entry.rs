//! The entry model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collection::CollectionItem;
use crate::types::{FieldValue, Link, Sys};

/// One content entry: server-owned `sys` metadata plus a field map.
///
/// An entry whose `sys.id` is present and non-empty is *existing* and is
/// updated by `upsert`; otherwise it is *new* and gets created. `locale` is
/// carried alongside the entry but never sent over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(skip)]
    locale: Option<String>,
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Entry {
    /// A new, unsaved entry of the given content type.
    pub fn new(content_type_id: impl Into<String>) -> Self {
        Self {
            locale: None,
            sys: Some(Sys {
                content_type: Some(Link::content_type(content_type_id)),
                ..Default::default()
            }),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn set_locale(&mut self, locale: Option<String>) {
        self.locale = locale;
    }

    /// The entry id, if the server has assigned one.
    pub fn id(&self) -> Option<&str> {
        self.sys.as_ref().and_then(Sys::id)
    }

    /// Current version. An entry without `sys` has never been saved and
    /// reports version 1.
    pub fn version(&self) -> u64 {
        match &self.sys {
            Some(sys) => sys.version.unwrap_or(0),
            None => 1,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.as_ref().and_then(Sys::content_type_id)
    }

    pub fn space_id(&self) -> Option<&str> {
        self.sys.as_ref().and_then(Sys::space_id)
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Replace `sys` and `fields` with those of `other`, keeping this entry's
    /// locale.
    pub(crate) fn replace_with(&mut self, other: Entry) {
        self.sys = other.sys;
        self.fields = other.fields;
    }
}

impl CollectionItem for Entry {
    fn attach_locale(&mut self, locale: Option<&str>) {
        self.locale = locale.map(str::to_string);
    }
}

/// A field's raw value paired with the data type its content type declares.
///
/// `data_type` is empty when the declaring content type or field could not
/// be found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryField {
    pub value: Option<FieldValue>,
    pub data_type: String,
}

impl EntryField {
    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn is_resolved(&self) -> bool {
        !self.data_type.is_empty()
    }
}
