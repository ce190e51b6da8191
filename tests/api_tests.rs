/// HTTP API tests
///
/// Drive the full router with a fake storage collaborator that records every
/// call it receives.
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chlu_query::{
    config::GatewayConfig,
    context::AppContext,
    error::{GatewayError, GatewayResult},
    server::{self, build_router},
    store::{IdentityDocument, ReadOptions, ReviewRecord, ReviewStore, ReviewSummary},
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const MULTIHASH: &str = "QmWBTzAwP8fz2zRsmzqUfSKEZ6GRTuPTsBVfJs6Y72D1hz";
const MISSING_MULTIHASH: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Start,
    Stop,
    ReadReviewRecord(String, ReadOptions),
    GetDid(String, bool),
    WrittenBy(String),
    About(String),
}

#[derive(Default)]
struct FakeStore {
    records: HashMap<String, Value>,
    dids: HashMap<String, Value>,
    written_by: HashMap<String, Vec<ReviewSummary>>,
    about: HashMap<String, Vec<ReviewSummary>>,
    failure: Option<String>,
    /// Simulated propagation delay for waiting DID lookups
    did_hang: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl FakeStore {
    fn seeded() -> Self {
        let summary = ReviewSummary {
            multihash: MULTIHASH.to_string(),
            latest_version: None,
            author_did: Some("did:chlu:abc".to_string()),
            subject_did: Some("did:chlu:shop".to_string()),
            created_at: Some("2018-06-01T00:00:00+00:00".to_string()),
        };

        let mut store = Self::default();
        store.records.insert(
            MULTIHASH.to_string(),
            json!({ "review": "hello world", "editable": false }),
        );
        store
            .dids
            .insert("did:chlu:abc".to_string(), json!({ "content": "data", "editable": true }));
        store
            .written_by
            .insert("did:chlu:abc".to_string(), vec![summary.clone()]);
        store.about.insert("did:chlu:abc".to_string(), vec![summary]);
        store
    }

    fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn fail(&self) -> GatewayResult<()> {
        match &self.failure {
            Some(message) => Err(GatewayError::Storage(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReviewStore for FakeStore {
    async fn start(&self) -> GatewayResult<()> {
        self.record(Call::Start);
        Ok(())
    }

    async fn stop(&self) -> GatewayResult<()> {
        self.record(Call::Stop);
        Ok(())
    }

    async fn read_review_record(
        &self,
        multihash: &str,
        options: &ReadOptions,
    ) -> GatewayResult<Option<ReviewRecord>> {
        self.record(Call::ReadReviewRecord(multihash.to_string(), *options));
        self.fail()?;
        Ok(self
            .records
            .get(multihash)
            .cloned()
            .and_then(ReviewRecord::from_value))
    }

    async fn get_did(
        &self,
        did: &str,
        wait_until_present: bool,
    ) -> GatewayResult<Option<IdentityDocument>> {
        self.record(Call::GetDid(did.to_string(), wait_until_present));
        self.fail()?;
        if wait_until_present {
            if let Some(delay) = self.did_hang {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(self.dids.get(did).cloned())
    }

    async fn get_reviews_written_by_did(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        self.record(Call::WrittenBy(did.to_string()));
        self.fail()?;
        Ok(self.written_by.get(did).cloned().unwrap_or_default())
    }

    async fn get_reviews_about_did(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        self.record(Call::About(did.to_string()));
        self.fail()?;
        Ok(self.about.get(did).cloned().unwrap_or_default())
    }
}

fn create_test_app(store: Arc<FakeStore>) -> Router {
    build_router(AppContext::with_store(GatewayConfig::default(), store))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, content_type, body)
}

#[tokio::test]
async fn test_root_banner() {
    let app = create_test_app(Arc::new(FakeStore::default()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Chlu API Query");
}

#[tokio::test]
async fn test_get_review_record() {
    let store = Arc::new(FakeStore::seeded());
    let app = create_test_app(Arc::clone(&store));

    let (status, content_type, _) = get(&app, "/api/v1/reviews/lol").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, "application/json");
    assert!(store.calls().is_empty());

    let (status, _, body) = get(&app, &format!("/api/v1/reviews/{}", MULTIHASH)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "review": "hello world" }));

    let (status, _, body) = get(
        &app,
        &format!("/api/v1/reviews/{}?getLatestVersion=false", MULTIHASH),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "review": "hello world" }));

    let options: Vec<Value> = store
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::ReadReviewRecord(_, options) => serde_json::to_value(options).unwrap(),
            other => panic!("unexpected call {:?}", other),
        })
        .collect();
    assert_eq!(
        options,
        vec![
            json!({ "getLatestVersion": true, "validate": { "throwErrors": false } }),
            json!({ "getLatestVersion": false, "validate": { "throwErrors": false } }),
        ]
    );
}

#[tokio::test]
async fn test_invalid_multihash_message() {
    let app = create_test_app(Arc::new(FakeStore::seeded()));

    let (status, _, body) = get(&app, "/api/v1/reviews/lol").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Multihash lol is invalid" }));
}

#[tokio::test]
async fn test_missing_review_record() {
    let store = Arc::new(FakeStore::seeded());
    let app = create_test_app(Arc::clone(&store));

    let (status, _, body) = get(&app, &format!("/api/v1/reviews/{}", MISSING_MULTIHASH)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "message": format!("Review Record {} not found", MISSING_MULTIHASH) })
    );
    assert_eq!(
        store.calls(),
        vec![Call::ReadReviewRecord(
            MISSING_MULTIHASH.to_string(),
            ReadOptions::default()
        )]
    );
}

#[tokio::test]
async fn test_latest_version_flag_values() {
    let store = Arc::new(FakeStore::seeded());
    let app = create_test_app(Arc::clone(&store));

    for query in ["", "?getLatestVersion=true", "?getLatestVersion=0", "?getLatestVersion=false"] {
        get(&app, &format!("/api/v1/reviews/{}{}", MULTIHASH, query)).await;
    }

    let flags: Vec<bool> = store
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::ReadReviewRecord(_, options) => Some(options.get_latest_version),
            _ => None,
        })
        .collect();
    assert_eq!(flags, vec![true, true, true, false]);
}

#[tokio::test]
async fn test_get_did() {
    let store = Arc::new(FakeStore::seeded());
    let app = create_test_app(Arc::clone(&store));

    let (status, _, _) = get(&app, "/api/v1/dids/lol").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.calls().is_empty());

    let (status, _, body) = get(&app, "/api/v1/dids/did:chlu:notexists").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "DID did:chlu:notexists not found" }));

    // Identity documents are returned exactly as stored
    let (status, _, body) = get(&app, "/api/v1/dids/did:chlu:abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "content": "data", "editable": true }));

    get(&app, "/api/v1/dids/did:chlu:abc?waitUntilPresent=true").await;
    get(&app, "/api/v1/dids/did:chlu:abc?waitUntilPresent=yes").await;

    assert_eq!(
        store.calls(),
        vec![
            Call::GetDid("did:chlu:notexists".to_string(), false),
            Call::GetDid("did:chlu:abc".to_string(), false),
            Call::GetDid("did:chlu:abc".to_string(), true),
            Call::GetDid("did:chlu:abc".to_string(), false),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_present_is_bounded() {
    let store = Arc::new(FakeStore {
        did_hang: Some(Duration::from_secs(3600)),
        ..FakeStore::seeded()
    });
    let app = create_test_app(Arc::clone(&store));

    let (status, _, _) = get(&app, "/api/v1/dids/did:chlu:abc?waitUntilPresent=true").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_reviews_written_by() {
    let store = Arc::new(FakeStore::seeded());
    let app = create_test_app(Arc::clone(&store));

    let (status, _, _) = get(&app, "/api/v1/dids/lol/reviews/writtenby").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.calls().is_empty());

    let (status, _, body) = get(&app, "/api/v1/dids/did:chlu:abc/reviews/writtenby").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["multihash"], json!(MULTIHASH));

    let (status, _, body) = get(&app, "/api/v1/dids/did:chlu:def/reviews/writtenby").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_reviews_about() {
    let store = Arc::new(FakeStore::seeded());
    let app = create_test_app(Arc::clone(&store));

    let (status, _, _) = get(&app, "/api/v1/dids/lol/reviews/about").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.calls().is_empty());

    let (status, _, body) = get(&app, "/api/v1/dids/did:chlu:abc/reviews/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["subjectDid"], json!("did:chlu:shop"));

    let (status, _, body) = get(&app, "/api/v1/dids/did:chlu:def/reviews/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    assert_eq!(
        store.calls(),
        vec![
            Call::About("did:chlu:abc".to_string()),
            Call::About("did:chlu:def".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_upstream_errors() {
    let store = Arc::new(FakeStore::failing("block unavailable"));
    let app = create_test_app(Arc::clone(&store));

    let routes = [
        format!("/api/v1/reviews/{}", MULTIHASH),
        "/api/v1/dids/did:chlu:abc".to_string(),
        "/api/v1/dids/did:chlu:abc/reviews/writtenby".to_string(),
        "/api/v1/dids/did:chlu:abc/reviews/about".to_string(),
    ];

    for uri in routes {
        let (status, _, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body, json!({ "message": "Storage error: block unavailable" }));
    }
}

#[tokio::test]
async fn test_cors_headers() {
    let app = create_test_app(Arc::new(FakeStore::seeded()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/dids/did:chlu:abc")
                .header(header::ORIGIN, "https://app.chlu.io")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app(Arc::new(FakeStore::default()));

    let (status, _, body) = get(&app, "/api/v2/reviews/whatever").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Endpoint not found" }));
}

#[tokio::test]
async fn test_server_lifecycle() {
    let store = Arc::new(FakeStore::default());
    let mut config = GatewayConfig::default();
    config.service.hostname = "127.0.0.1".to_string();
    config.service.port = 0;

    let ctx = AppContext::with_store(config, Arc::clone(&store) as Arc<dyn ReviewStore>);
    server::serve_with_shutdown(ctx, async {}).await.unwrap();

    assert_eq!(store.calls(), vec![Call::Start, Call::Stop]);
}
