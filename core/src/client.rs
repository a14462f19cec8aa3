//! Client facade tying configuration, resource builders and a transport
//! together.

use std::sync::Arc;

use crate::collection::Page;
use crate::config::ClientConfig;
use crate::content_type::{ContentType, ContentTypeLookup, ContentTypes, ContentTypesService};
use crate::context::ClientContext;
use crate::entries::{Entries, EntriesService};
use crate::error::ApiError;
use crate::http::Transport;

/// Entry point for callers that want requests executed for them.
///
/// The context is built once from `ClientConfig` and shared read-only by
/// every resource builder, so a `Client` can be used from several threads
/// whenever its transport allows it.
#[derive(Debug, Clone)]
pub struct Client<T> {
    ctx: Arc<ClientContext>,
    entries: Entries,
    content_types: ContentTypes,
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        let ctx = Arc::new(ClientContext::new(config)?);
        Ok(Self {
            entries: Entries::new(Arc::clone(&ctx)),
            content_types: ContentTypes::new(Arc::clone(&ctx)),
            ctx,
            transport,
        })
    }

    /// Entry operations. Field-type lookups go through this client's
    /// content-types resource.
    pub fn entries(&self) -> EntriesService<'_, T, ContentTypesService<'_, T>> {
        EntriesService::new(&self.entries, &self.transport, self.content_types())
    }

    /// Entry operations with a caller-supplied content-type source.
    pub fn entries_with_lookup<L: ContentTypeLookup>(&self, lookup: L) -> EntriesService<'_, T, L> {
        EntriesService::new(&self.entries, &self.transport, lookup)
    }

    pub fn content_types(&self) -> ContentTypesService<'_, T> {
        ContentTypesService {
            requests: &self.content_types,
            transport: &self.transport,
        }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(feature = "ureq")]
impl Client<crate::transport::UreqTransport> {
    /// A client using the blocking `ureq` transport.
    pub fn with_ureq(config: ClientConfig) -> Result<Self, ApiError> {
        Self::new(config, crate::transport::UreqTransport::new())
    }

    /// A `ureq` client configured from `CONTENTFUL_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::with_ureq(ClientConfig::from_env()?)
    }
}

impl<T: Transport> ContentTypeLookup for Client<T> {
    fn content_type_page(&self, space_id: &str, skip: u64) -> Result<Page<ContentType>, ApiError> {
        self.content_types().content_type_page(space_id, skip)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::entry::Entry;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Records requests and answers each with the next canned response.
    #[derive(Debug)]
    struct Scripted {
        requests: Mutex<Vec<HttpRequest>>,
        responses: Mutex<Vec<HttpResponse>>,
    }

    impl Scripted {
        fn new(responses: Vec<(u16, &str)>) -> Self {
            let mut responses: Vec<HttpResponse> = responses
                .into_iter()
                .map(|(status, body)| HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                })
                .collect();
            responses.reverse();
            Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            }
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ApiError::Transport("no scripted response".to_string()))
        }
    }

    fn client(responses: Vec<(u16, &str)>) -> Client<Scripted> {
        let config = ClientConfig::new("token").with_base_url("http://cma.test");
        Client::new(config, Scripted::new(responses)).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = Client::new(ClientConfig::new(""), Scripted::new(Vec::new())).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn upsert_round_trips_through_transport() {
        let c = client(vec![(201, r#"{"sys":{"id":"abc","version":1},"fields":{"title":"Hello"}}"#)]);
        let mut entry = Entry::new("post").with_field("title", "Hello");
        c.entries().upsert("space1", &mut entry).unwrap();
        assert_eq!(entry.id(), Some("abc"));
        assert_eq!(entry.version(), 1);

        let sent = c.transport().requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].header("X-Contentful-Content-Type"), Some("post"));
    }

    #[test]
    fn publish_conflict_is_not_retried() {
        let c = client(vec![(
            409,
            r#"{"sys":{"type":"Error","id":"VersionMismatch"},"message":"version mismatch"}"#,
        )]);
        let mut entry = Entry::new("post");
        let sys = entry.sys.as_mut().unwrap();
        sys.id = Some("e1".to_string());
        sys.version = Some(3);

        let err = c.entries().publish("space1", &entry).unwrap_err();
        assert!(err.is_version_conflict());
        let sent = c.transport().requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("X-Contentful-Version"), Some("3"));
    }

    #[test]
    fn list_is_lazy() {
        let c = client(Vec::new());
        let col = c.entries().list("space1").unwrap();
        assert!(col.items().is_empty());
        assert!(c.transport().requests.lock().unwrap().is_empty());
    }

    #[test]
    fn client_is_a_content_type_lookup() {
        let body = r#"{"total":1,"skip":0,"limit":100,"items":[{"sys":{"id":"post"},"name":"Post","fields":[]}]}"#;
        let c = client(vec![(200, body)]);
        let page = c.content_type_page("space1", 0).unwrap();
        assert_eq!(page.items[0].id(), Some("post"));
        let sent = c.transport().requests.lock().unwrap();
        assert!(sent[0].path.ends_with("/spaces/space1/environments/master/content_types"));
    }
}
