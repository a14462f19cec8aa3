//! Error types for the Contentful management client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the entry does not exist" from "the server rejected the call." Every
//! other unexpected status lands in `Http` with the raw status, the error id
//! from Contentful's error envelope when one was sent, and the body.
//! Network-level failures reported by a `Transport` are `Transport`; the
//! client never retries either kind.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by request builders, response parsers and services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request could not be assembled (bad identifier, bad path).
    #[error("invalid request: {0}")]
    Request(String),

    /// The entry payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status other than the expected one or 404.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(.body.as_str()))]
    Http {
        status: u16,
        error_id: Option<String>,
        message: Option<String>,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A field required to build the request is absent from the entry.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    /// Client configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server refused a write because the supplied
    /// `X-Contentful-Version` did not match the stored version.
    pub fn is_version_conflict(&self) -> bool {
        match self {
            ApiError::Http { status, error_id, .. } => {
                *status == 409 || error_id.as_deref() == Some("VersionMismatch")
            }
            _ => false,
        }
    }
}
