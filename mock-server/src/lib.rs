//! In-memory imitation of the Contentful management endpoints for entries
//! and content types.
//!
//! Versions follow the real service: a create starts at version 1, every
//! update, publish and unpublish bumps it by one, and publish/unpublish
//! reject a stale `X-Contentful-Version` with 409 `VersionMismatch`. The
//! legacy paths without an environment segment resolve to `master`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_ENVIRONMENT: &str = "master";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u64>,
    pub space: Value,
    pub environment: Value,
    pub content_type: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredEntry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(skip)]
    seq: u64,
}

#[derive(Deserialize)]
pub struct EntryInput {
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub content_type: Option<String>,
}

type Key = (String, String, String);

#[derive(Default)]
pub struct Store {
    entries: HashMap<Key, StoredEntry>,
    content_types: HashMap<Key, (u64, Value)>,
    next_seq: u64,
}

impl Store {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error response in Contentful's envelope shape.
#[derive(Debug)]
pub struct MockError {
    status: StatusCode,
    id: &'static str,
    message: String,
}

impl MockError {
    fn new(status: StatusCode, id: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            id,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", "The resource could not be found.")
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let body = json!({
            "sys": {"type": "Error", "id": self.id},
            "message": self.message,
            "requestId": Uuid::new_v4().to_string(),
        });
        (self.status, Json(body)).into_response()
    }
}

type MockResult<T> = Result<T, MockError>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let env_routes = Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route(
            "/entries/{id}",
            get(get_entry).put(put_entry).delete(delete_entry),
        )
        .route(
            "/entries/{id}/published",
            put(publish_entry).delete(unpublish_entry),
        )
        .route("/content_types", get(list_content_types))
        .route(
            "/content_types/{id}",
            get(get_content_type).put(put_content_type),
        );

    Router::new()
        .nest("/spaces/{space}/environments/{env}", env_routes)
        .route("/spaces/{space}/entries/{id}", delete(delete_entry_legacy))
        .route(
            "/spaces/{space}/entries/{id}/published",
            delete(unpublish_entry_legacy),
        )
        .layer(middleware::from_fn(require_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn require_token(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.is_empty());
    if !authorized {
        return MockError::new(
            StatusCode::UNAUTHORIZED,
            "AccessTokenInvalid",
            "The access token you sent could not be found or is invalid.",
        )
        .into_response();
    }
    debug!(method = %request.method(), uri = %request.uri(), "request");
    next.run(request).await
}

fn link(link_type: &str, id: &str) -> Value {
    json!({"sys": {"type": "Link", "linkType": link_type, "id": id}})
}

fn key(space: &str, env: &str, id: &str) -> Key {
    (space.to_string(), env.to_string(), id.to_string())
}

fn version_header(headers: &HeaderMap) -> MockResult<u64> {
    headers
        .get("x-contentful-version")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| {
            MockError::new(
                StatusCode::BAD_REQUEST,
                "BadRequest",
                "X-Contentful-Version header is required",
            )
        })
}

fn check_version(entry: &StoredEntry, headers: &HeaderMap) -> MockResult<()> {
    let version = version_header(headers)?;
    if version != entry.sys.version {
        return Err(MockError::new(
            StatusCode::CONFLICT,
            "VersionMismatch",
            format!(
                "version {version} does not match current version {}",
                entry.sys.version
            ),
        ));
    }
    Ok(())
}

fn page(items: Vec<Value>, total: usize, skip: usize, limit: usize) -> Value {
    json!({
        "sys": {"type": "Array"},
        "total": total,
        "skip": skip,
        "limit": limit,
        "items": items,
    })
}

async fn list_entries(
    State(db): State<Db>,
    Path((space, env)): Path<(String, String)>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let store = db.read().await;
    let mut matching: Vec<&StoredEntry> = store
        .entries
        .iter()
        .filter(|((s, e, _), _)| *s == space && *e == env)
        .map(|(_, entry)| entry)
        .filter(|entry| match &params.content_type {
            Some(ct) => entry.sys.content_type["sys"]["id"] == ct.as_str(),
            None => true,
        })
        .collect();
    matching.sort_by_key(|entry| entry.seq);

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(100).min(1000);
    let items = matching
        .iter()
        .skip(skip)
        .take(limit)
        .map(|entry| json!(entry))
        .collect();
    Json(page(items, matching.len(), skip, limit))
}

async fn create_entry(
    State(db): State<Db>,
    Path((space, env)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<EntryInput>,
) -> MockResult<(StatusCode, Json<StoredEntry>)> {
    let id = Uuid::new_v4().simple().to_string();
    let entry = insert_new(&db, &space, &env, &id, &headers, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn insert_new(
    db: &Db,
    space: &str,
    env: &str,
    id: &str,
    headers: &HeaderMap,
    input: EntryInput,
) -> MockResult<StoredEntry> {
    let content_type = headers
        .get("x-contentful-content-type")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            MockError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "ValidationFailed",
                "X-Contentful-Content-Type header is required",
            )
        })?;

    let mut store = db.write().await;
    let seq = store.seq();
    let entry = StoredEntry {
        sys: EntrySys {
            id: id.to_string(),
            kind: "Entry".to_string(),
            version: 1,
            published_version: None,
            space: link("Space", space),
            environment: link("Environment", env),
            content_type: link("ContentType", content_type),
        },
        fields: input.fields,
        seq,
    };
    store.entries.insert(key(space, env, id), entry.clone());
    Ok(entry)
}

async fn get_entry(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
) -> MockResult<Json<StoredEntry>> {
    let store = db.read().await;
    store
        .entries
        .get(&key(&space, &env, &id))
        .cloned()
        .map(Json)
        .ok_or_else(MockError::not_found)
}

/// Update an existing entry, or create one under the given id.
async fn put_entry(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(input): Json<EntryInput>,
) -> MockResult<(StatusCode, Json<StoredEntry>)> {
    {
        let mut store = db.write().await;
        if let Some(entry) = store.entries.get_mut(&key(&space, &env, &id)) {
            entry.fields = input.fields;
            entry.sys.version += 1;
            return Ok((StatusCode::OK, Json(entry.clone())));
        }
    }
    let entry = insert_new(&db, &space, &env, &id, &headers, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_entry(db: &Db, space: &str, env: &str, id: &str) -> MockResult<StatusCode> {
    let mut store = db.write().await;
    let k = key(space, env, id);
    let entry = store.entries.get(&k).ok_or_else(MockError::not_found)?;
    if entry.sys.published_version.is_some() {
        return Err(MockError::new(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            "Cannot delete published entry",
        ));
    }
    store.entries.remove(&k);
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_entry(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
) -> MockResult<StatusCode> {
    remove_entry(&db, &space, &env, &id).await
}

async fn delete_entry_legacy(
    State(db): State<Db>,
    Path((space, id)): Path<(String, String)>,
) -> MockResult<StatusCode> {
    remove_entry(&db, &space, DEFAULT_ENVIRONMENT, &id).await
}

async fn publish_entry(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> MockResult<Json<StoredEntry>> {
    let mut store = db.write().await;
    let entry = store
        .entries
        .get_mut(&key(&space, &env, &id))
        .ok_or_else(MockError::not_found)?;
    check_version(entry, &headers)?;
    entry.sys.published_version = Some(entry.sys.version);
    entry.sys.version += 1;
    Ok(Json(entry.clone()))
}

async fn set_unpublished(
    db: &Db,
    space: &str,
    env: &str,
    id: &str,
    headers: &HeaderMap,
) -> MockResult<Json<StoredEntry>> {
    let mut store = db.write().await;
    let entry = store
        .entries
        .get_mut(&key(space, env, id))
        .ok_or_else(MockError::not_found)?;
    check_version(entry, headers)?;
    if entry.sys.published_version.is_none() {
        return Err(MockError::new(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            "Not published",
        ));
    }
    entry.sys.published_version = None;
    entry.sys.version += 1;
    Ok(Json(entry.clone()))
}

async fn unpublish_entry(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> MockResult<Json<StoredEntry>> {
    set_unpublished(&db, &space, &env, &id, &headers).await
}

async fn unpublish_entry_legacy(
    State(db): State<Db>,
    Path((space, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> MockResult<Json<StoredEntry>> {
    set_unpublished(&db, &space, DEFAULT_ENVIRONMENT, &id, &headers).await
}

async fn list_content_types(
    State(db): State<Db>,
    Path((space, env)): Path<(String, String)>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let store = db.read().await;
    let mut matching: Vec<&(u64, Value)> = store
        .content_types
        .iter()
        .filter(|((s, e, _), _)| *s == space && *e == env)
        .map(|(_, ct)| ct)
        .collect();
    matching.sort_by_key(|(seq, _)| *seq);

    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(100).min(1000);
    let items = matching
        .iter()
        .skip(skip)
        .take(limit)
        .map(|(_, ct)| ct.clone())
        .collect();
    Json(page(items, matching.len(), skip, limit))
}

async fn get_content_type(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
) -> MockResult<Json<Value>> {
    let store = db.read().await;
    store
        .content_types
        .get(&key(&space, &env, &id))
        .map(|(_, ct)| Json(ct.clone()))
        .ok_or_else(MockError::not_found)
}

/// Seed or replace a content type. The body's `sys` is overwritten.
async fn put_content_type(
    State(db): State<Db>,
    Path((space, env, id)): Path<(String, String, String)>,
    Json(mut body): Json<Value>,
) -> MockResult<(StatusCode, Json<Value>)> {
    let Some(object) = body.as_object_mut() else {
        return Err(MockError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "ValidationFailed",
            "content type must be a JSON object",
        ));
    };

    let mut store = db.write().await;
    let k = key(&space, &env, &id);
    let existing = store
        .content_types
        .get(&k)
        .map(|(seq, ct)| (*seq, ct["sys"]["version"].as_u64().unwrap_or(0)));
    let (status, seq, version) = match existing {
        Some((seq, version)) => (StatusCode::OK, seq, version + 1),
        None => (StatusCode::CREATED, store.seq(), 1),
    };
    object.insert(
        "sys".to_string(),
        json!({
            "id": id,
            "type": "ContentType",
            "version": version,
            "space": link("Space", &space),
            "environment": link("Environment", &env),
        }),
    );
    store.content_types.insert(k, (seq, body.clone()));
    Ok((status, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_entry_serializes_to_contentful_shape() {
        let entry = StoredEntry {
            sys: EntrySys {
                id: "e1".to_string(),
                kind: "Entry".to_string(),
                version: 2,
                published_version: None,
                space: link("Space", "s1"),
                environment: link("Environment", "master"),
                content_type: link("ContentType", "post"),
            },
            fields: Map::new(),
            seq: 9,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["sys"]["id"], "e1");
        assert_eq!(json["sys"]["type"], "Entry");
        assert_eq!(json["sys"]["contentType"]["sys"]["id"], "post");
        assert!(json["sys"].get("publishedVersion").is_none());
        assert!(json.get("seq").is_none());
    }

    #[test]
    fn entry_input_ignores_sys() {
        let input: EntryInput =
            serde_json::from_str(r#"{"sys":null,"fields":{"title":"Hi"}}"#).unwrap();
        assert_eq!(input.fields["title"], "Hi");
    }

    #[test]
    fn entry_input_defaults_fields() {
        let input: EntryInput = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.fields.is_empty());
    }

    #[test]
    fn check_version_reports_mismatch() {
        let entry = StoredEntry {
            sys: EntrySys {
                id: "e1".to_string(),
                kind: "Entry".to_string(),
                version: 3,
                published_version: None,
                space: Value::Null,
                environment: Value::Null,
                content_type: Value::Null,
            },
            fields: Map::new(),
            seq: 0,
        };
        let mut headers = HeaderMap::new();
        headers.insert("x-contentful-version", "2".parse().unwrap());
        let err = check_version(&entry, &headers).unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.id, "VersionMismatch");

        headers.insert("x-contentful-version", "3".parse().unwrap());
        assert!(check_version(&entry, &headers).is_ok());
    }
}
