//! Synchronous client for the Contentful Content Management API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` executes the
//! round-trip; `UreqTransport` is provided behind the default `ureq`
//! feature, and any other HTTP stack can be plugged in by implementing the
//! trait.
//!
//! # Design
//! - `ClientContext` is immutable and shared through `Arc`; resource
//!   builders never reach for global state.
//! - Each entry operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response) on `Entries`; `EntriesService` runs both
//!   halves through a transport.
//! - `sys` metadata is optional everywhere. Operations that need an id, a
//!   version or a content type return `ApiError::Precondition` when it is
//!   missing.
//! - Field values are the closed `FieldValue` sum type.
//! - Field-type resolution depends on the `ContentTypeLookup` capability,
//!   not on a concrete content-types client.

pub mod client;
pub mod collection;
pub mod config;
pub mod content_type;
pub mod context;
pub mod entries;
pub mod entry;
pub mod error;
pub mod http;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::Client;
pub use collection::{Collection, CollectionItem, CollectionOptions, Page};
pub use config::{ClientConfig, PathScheme};
pub use content_type::{ContentType, ContentTypeLookup, ContentTypes, ContentTypesService, FieldDefinition};
pub use context::ClientContext;
pub use entries::{Entries, EntriesService, HEADER_CONTENT_TYPE_ID, HEADER_VERSION};
pub use entry::{Entry, EntryField};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{FieldValue, Link, Sys};
