use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use boolsearch_core::persist::{save_dates, save_document, save_meta, save_postings, IndexMeta, IndexPaths};
use boolsearch_core::{DateLookup, DocId, DocumentStore, PostingStore, SearchError, SearchIndex};
use boolsearch_server::{build_app, router, AppState, DEFAULT_FETCH_TIMEOUT};
use http_body_util::BodyExt;
use roaring::RoaringBitmap;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;

fn bitmap(ids: &[u32]) -> RoaringBitmap { ids.iter().copied().collect() }

/// Five documents, `a = {1,2,3}`, `b = {2,3,4}`, doc `n` dated `200n-01-01`.
fn build_tiny_index(dir: &std::path::Path) {
    let paths = IndexPaths::new(dir);
    let store = PostingStore::new(5, vec![("a", bitmap(&[1, 2, 3])), ("b", bitmap(&[2, 3, 4]))]);
    save_postings(&paths, store.terms()).unwrap();
    let dates = DateLookup::from_entries(5, (0..5u32).map(|id| (id, format!("200{id}-01-01"))));
    save_dates(&paths, &dates).unwrap();
    for id in 0..5u32 {
        save_document(&paths, id, &json!({ "id": id, "title": format!("Doc {id}"), "date": format!("200{id}-01-01") })).unwrap();
    }
    let meta = IndexMeta::new(5, "2024-01-01T00:00:00Z");
    save_meta(&paths, &meta).unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn ids(json: &Value) -> Vec<u64> {
    json["docs"].as_array().unwrap().iter().map(|d| d["id"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn search_returns_date_ordered_page() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = build_app(dir.path(), DEFAULT_FETCH_TIMEOUT).unwrap();

    let (status, json) = call(app.clone(), "/search?query=a%20OR%20b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["total"], 4);
    assert_eq!(ids(&json), vec![4, 3, 2, 1]);

    let (_, json) = call(app, "/search?query=a%20OR%20b&sort_order=asc&min_date=2002-01-01&min_index=1&max_index=10").await;
    assert_eq!(json["total"], 3);
    assert_eq!(ids(&json), vec![3, 4]);
}

#[tokio::test]
async fn negation_and_missing_terms() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = build_app(dir.path(), DEFAULT_FETCH_TIMEOUT).unwrap();

    let (_, json) = call(app.clone(), "/search?query=not%20a&sort_order=asc").await;
    assert_eq!(ids(&json), vec![0, 4]);

    let (status, json) = call(app, "/search?query=zzz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
    assert!(json["docs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_query_and_bad_sort_are_rejected() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = build_app(dir.path(), DEFAULT_FETCH_TIMEOUT).unwrap();

    let (status, json) = call(app.clone(), "/search?query=(a%20AND%20b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({ "status": "error", "message": "invalid query" }));

    let (status, json) = call(app.clone(), "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "invalid query");

    let (status, json) = call(app, "/search?query=a&sort_by=title").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().starts_with("invalid configuration"));
}

#[tokio::test]
async fn doc_endpoint() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = build_app(dir.path(), DEFAULT_FETCH_TIMEOUT).unwrap();

    let (status, json) = call(app.clone(), "/doc/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Doc 3");

    let (status, json) = call(app, "/doc/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn unparsable_parameters_get_json_errors() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = build_app(dir.path(), DEFAULT_FETCH_TIMEOUT).unwrap();

    for uri in ["/search?query=a&min_index=abc", "/search?query=a&max_index=-1", "/doc/abc"] {
        let (status, json) = call(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["status"], "error", "{uri}");
        assert!(json["message"].as_str().unwrap().starts_with("invalid configuration"), "{uri}");
    }
}

struct FailingStore;

impl DocumentStore for FailingStore {
    fn fetch(&self, _ids: &[DocId]) -> boolsearch_core::Result<Vec<Value>> {
        Err(SearchError::Fetch("connection refused".into()))
    }
}

struct SlowStore;

impl DocumentStore for SlowStore {
    fn fetch(&self, ids: &[DocId]) -> boolsearch_core::Result<Vec<Value>> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(ids.iter().map(|id| json!({ "id": id })).collect())
    }
}

fn in_memory_index() -> Arc<SearchIndex> {
    let postings = PostingStore::new(3, vec![("a", bitmap(&[0, 1, 2]))]);
    // doc 2 deliberately has no date
    let dates = DateLookup::from_entries(3, vec![(0, "2001-01-01"), (1, "2002-01-01")]);
    Arc::new(SearchIndex::new(postings, dates))
}

#[tokio::test]
async fn store_failures_are_distinguished() {
    let index = in_memory_index();
    let app = router(AppState { index: index.clone(), docs: Arc::new(FailingStore), fetch_timeout: DEFAULT_FETCH_TIMEOUT });
    let (status, json) = call(app.clone(), "/search?query=a&max_date=2001-12-31").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().starts_with("index inconsistency"));

    // no matches means no fetch, so the failing store is never reached
    let (status, json) = call(app.clone(), "/search?query=a%20and%20not%20a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);

    let ok_index = Arc::new(SearchIndex::new(
        PostingStore::new(2, vec![("a", bitmap(&[0, 1]))]),
        DateLookup::from_entries(2, vec![(0, "2001-01-01"), (1, "2002-01-01")]),
    ));
    let app = router(AppState { index: ok_index.clone(), docs: Arc::new(FailingStore), fetch_timeout: DEFAULT_FETCH_TIMEOUT });
    let (status, json) = call(app, "/search?query=a").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json, json!({ "status": "error", "message": "document store failure" }));

    let app = router(AppState { index: ok_index, docs: Arc::new(SlowStore), fetch_timeout: Duration::from_millis(20) });
    let (status, json) = call(app, "/search?query=a").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["message"], "document store failure");
}

#[tokio::test]
async fn health() {
    let app = router(AppState { index: in_memory_index(), docs: Arc::new(FailingStore), fetch_timeout: DEFAULT_FETCH_TIMEOUT });
    let resp = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
