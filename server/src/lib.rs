use anyhow::Result;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use boolsearch_core::persist::{load_index, IndexPaths};
use boolsearch_core::{run_query, DocId, DocumentStore, FsDocumentStore, SearchError, SearchIndex, SearchRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(default)]
    pub min_index: usize,
    pub max_index: Option<usize>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

impl From<SearchParams> for SearchRequest {
    fn from(p: SearchParams) -> Self {
        SearchRequest {
            query: p.query,
            sort_by: p.sort_by,
            sort_order: p.sort_order,
            min_index: p.min_index,
            max_index: p.max_index,
            min_date: p.min_date,
            max_date: p.max_date,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SearchResponse {
    Success { docs: Vec<Value>, total: usize },
    Error { message: String },
}

/// Error half of every endpoint: a status code plus `{status: "error", message}`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found() -> Self {
        Self { status: StatusCode::NOT_FOUND, message: "not found".into() }
    }
}

/// Extractor rejections get the same `{status, message}` body as every other error.
fn bad_param(detail: String) -> ApiError {
    tracing::debug!(%detail, "request parameters rejected");
    SearchError::InvalidConfig(detail).into()
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        let status = match &e {
            SearchError::MalformedQuery(_) | SearchError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            SearchError::StoreInconsistency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::Fetch(_) => StatusCode::BAD_GATEWAY,
        };
        Self { status, message: e.public_message() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(SearchResponse::Error { message: self.message })).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<SearchIndex>,
    pub docs: Arc<dyn DocumentStore>,
    pub fetch_timeout: Duration,
}

/// Load the index under `index_dir` once and build the router around it.
pub fn build_app(index_dir: impl Into<PathBuf>, fetch_timeout: Duration) -> Result<Router> {
    let root = index_dir.into();
    let index = load_index(&IndexPaths::new(&root))?;
    let docs = FsDocumentStore::new(&root);
    Ok(router(AppState { index: Arc::new(index), docs: Arc::new(docs), fetch_timeout }))
}

/// Origins listed in `CORS_ALLOW_ORIGIN`, comma-separated; any origin when unset or unparsable.
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|o| o.trim().parse().ok()).collect())
        .unwrap_or_default();
    let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow).allow_methods(Any).allow_headers(Any)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let Query(params) = params.map_err(|e| bad_param(e.body_text()))?;
    let request = SearchRequest::from(params);
    let page = match run_query(&state.index, &request) {
        Ok(page) => page,
        Err(e) => {
            match &e {
                SearchError::StoreInconsistency { .. } => tracing::error!(error = %e, "index and date table disagree"),
                _ => tracing::debug!(query = %request.query, error = %e, "query rejected"),
            }
            return Err(e.into());
        }
    };
    tracing::info!(query = %request.query, total = page.total, min_index = request.min_index, max_index = ?request.max_index, "search matched");

    let docs = fetch_docs(&state, page.ids).await?;
    tracing::debug!(elapsed = ?start.elapsed(), fetched = docs.len(), "search complete");
    Ok(Json(SearchResponse::Success { docs, total: page.total }))
}

/// Run the blocking document fetch off the async workers, bounded by the configured timeout.
async fn fetch_docs(state: &AppState, ids: Vec<DocId>) -> Result<Vec<Value>, SearchError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let store = Arc::clone(&state.docs);
    let task = tokio::task::spawn_blocking(move || store.fetch(&ids));
    let docs = match tokio::time::timeout(state.fetch_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(SearchError::Fetch(format!("fetch task failed: {join}"))),
        Err(_) => Err(SearchError::Fetch(format!("timed out after {:?}", state.fetch_timeout))),
    };
    if let Err(e) = &docs {
        tracing::warn!(error = %e, "document fetch failed");
    }
    docs
}

pub async fn doc_handler(
    State(state): State<AppState>,
    doc_id: Result<Path<DocId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(doc_id) = doc_id.map_err(|e| bad_param(e.body_text()))?;
    let mut docs = fetch_docs(&state, vec![doc_id]).await?;
    docs.pop().map(Json).ok_or_else(ApiError::not_found)
}
