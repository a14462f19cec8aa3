//! Shared, immutable request context.
//!
//! # Design
//! Every resource builder holds an `Arc<ClientContext>` instead of reaching
//! for a global client. The context knows how to turn a path into a full
//! `HttpRequest` (base URL, auth and standard headers) and how to turn an
//! `HttpResponse` back into a typed value or an `ApiError`. It never
//! performs I/O.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{ClientConfig, PathScheme};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub const CONTENT_TYPE_MANAGEMENT: &str = "application/vnd.contentful.management.v1+json";
const DEFAULT_USER_AGENT: &str = concat!("contentful-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientContext {
    base_url: String,
    access_token: String,
    environment: String,
    locale: Option<String>,
    path_scheme: PathScheme,
    user_agent: String,
}

impl ClientContext {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token,
            environment: config.environment,
            locale: config.locale,
            path_scheme: config.path_scheme,
            user_agent: config
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn path_scheme(&self) -> PathScheme {
        self.path_scheme
    }

    /// `/spaces/{space}/environments/{environment}`, after checking the
    /// space id is usable as a path segment.
    pub fn environment_path(&self, space_id: &str) -> Result<String, ApiError> {
        check_segment("space id", space_id)?;
        Ok(format!("/spaces/{space_id}/environments/{}", self.environment))
    }

    /// Path prefix for operations that `PathScheme::Legacy` leaves
    /// unscoped by environment.
    pub fn legacy_path(&self, space_id: &str) -> Result<String, ApiError> {
        match self.path_scheme {
            PathScheme::Legacy => {
                check_segment("space id", space_id)?;
                Ok(format!("/spaces/{space_id}"))
            }
            PathScheme::EnvironmentScoped => self.environment_path(space_id),
        }
    }

    /// Assemble a request for `path` (relative to the base URL).
    pub fn new_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<String>,
    ) -> Result<HttpRequest, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::Request(format!("path must start with '/': {path:?}")));
        }
        if path[1..].split('/').any(str::is_empty) {
            return Err(ApiError::Request(format!("path has an empty segment: {path:?}")));
        }

        let mut headers = vec![
            ("authorization".to_string(), format!("Bearer {}", self.access_token)),
            ("user-agent".to_string(), self.user_agent.clone()),
        ];
        if body.is_some() {
            headers.push(("content-type".to_string(), CONTENT_TYPE_MANAGEMENT.to_string()));
        }

        let request = HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            query,
            headers,
            body,
        };
        debug!(method = %request.method, path = %request.path, "built request");
        Ok(request)
    }

    /// Decode a JSON body into `T` after checking the status is one of
    /// `expected`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        response: &HttpResponse,
        expected: &[u16],
    ) -> Result<T, ApiError> {
        check_status(response, expected)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

/// True when `value` is non-empty and made only of URI unreserved
/// characters (`A-Z a-z 0-9 - . _ ~`), so it can be placed in a path as is.
pub(crate) fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Reject identifiers that cannot be used verbatim as a path segment.
pub(crate) fn check_segment(what: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Request(format!("{what} is empty")));
    }
    if !is_path_segment(value) {
        return Err(ApiError::Request(format!("{what} {value:?} is not a valid path segment")));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    sys: ErrorSys,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorSys {
    id: String,
}

/// Map a status outside `expected` to the matching `ApiError` variant.
pub fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), ApiError> {
    debug!(status = response.status, "received response");
    if expected.contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    let envelope = serde_json::from_str::<ErrorEnvelope>(&response.body).ok();
    let (error_id, message) = match envelope {
        Some(e) => (Some(e.sys.id), e.message),
        None => (None, None),
    };
    warn!(
        status = response.status,
        error_id = error_id.as_deref().unwrap_or(""),
        "unexpected response status"
    );
    Err(ApiError::Http {
        status: response.status,
        error_id,
        message,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ClientContext {
        ClientContext::new(ClientConfig::new("token").with_base_url("http://localhost:3000/")).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn new_request_adds_standard_headers() {
        let req = context()
            .new_request(HttpMethod::Get, "/spaces/s1", Vec::new(), None)
            .unwrap();
        assert_eq!(req.path, "http://localhost:3000/spaces/s1");
        assert_eq!(req.header("authorization"), Some("Bearer token"));
        assert!(req.header("user-agent").unwrap().starts_with("contentful-core/"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn new_request_with_body_sets_content_type() {
        let req = context()
            .new_request(HttpMethod::Post, "/spaces/s1", Vec::new(), Some("{}".to_string()))
            .unwrap();
        assert_eq!(req.header("content-type"), Some(CONTENT_TYPE_MANAGEMENT));
    }

    #[test]
    fn new_request_rejects_empty_segments() {
        let err = context()
            .new_request(HttpMethod::Get, "/spaces//entries", Vec::new(), None)
            .unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }

    #[test]
    fn environment_path_validates_space() {
        let ctx = context();
        assert_eq!(ctx.environment_path("s1").unwrap(), "/spaces/s1/environments/master");
        assert!(matches!(ctx.environment_path(""), Err(ApiError::Request(_))));
        assert!(matches!(ctx.environment_path("a/b"), Err(ApiError::Request(_))));
        assert!(matches!(ctx.environment_path("a b"), Err(ApiError::Request(_))));
        for bad in ["é", "50%", "a?b", "a#b", "a\tb"] {
            assert!(
                matches!(ctx.environment_path(bad), Err(ApiError::Request(_))),
                "{bad:?} accepted"
            );
        }
        assert!(ctx.environment_path("Space-1_x.y~z").is_ok());
    }

    #[test]
    fn legacy_path_follows_scheme() {
        let ctx = context();
        assert_eq!(ctx.legacy_path("s1").unwrap(), "/spaces/s1");

        let scoped = ClientContext::new(
            ClientConfig::new("t").with_path_scheme(PathScheme::EnvironmentScoped),
        )
        .unwrap();
        assert_eq!(scoped.legacy_path("s1").unwrap(), "/spaces/s1/environments/master");
    }

    #[test]
    fn context_rejects_invalid_config() {
        assert!(matches!(ClientContext::new(ClientConfig::new("")), Err(ApiError::Config(_))));
    }

    #[test]
    fn check_status_parses_error_envelope() {
        let body = r#"{"sys":{"type":"Error","id":"VersionMismatch"},"message":"stale","requestId":"r1"}"#;
        let err = check_status(&response(409, body), &[200]).unwrap_err();
        match err {
            ApiError::Http { status, error_id, message, .. } => {
                assert_eq!(status, 409);
                assert_eq!(error_id.as_deref(), Some("VersionMismatch"));
                assert_eq!(message.as_deref(), Some("stale"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn check_status_maps_404() {
        let err = check_status(&response(404, ""), &[200]).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn decode_reports_bad_json() {
        let err = context()
            .decode::<serde_json::Value>(&response(200, "not json"), &[200])
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
