//! Router tests against a scripted Wikidata.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lexsrt::LexSrtConfig;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;
use wikidata::demo_utils::{ScriptedEndpoint, ScriptedFetcher};
use wikidata::WikidataError;

const KEY: &str = "test-key";

fn english() -> ScriptedEndpoint {
    ScriptedEndpoint::new()
        .with_language("en", "Q1860")
        .with_forms("Q1860", "Q1084", "cat", &["L1234-F1"])
        .with_forms("Q1860", "Q24905", "sat", &["L5-F3"])
}

fn app_with(endpoint: Arc<ScriptedEndpoint>, config: ServerConfig) -> Router {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_lexeme("L1234", "en", "cat", &[Some("small domesticated feline")])
            .with_lexeme("L5", "en", "sit", &[None]),
    );
    let state = ServerState::with_endpoint(
        ServerConfig {
            api_keys: [KEY.to_string()].into(),
            ..config
        },
        LexSrtConfig::default(),
        endpoint,
        Some(fetcher),
    )
    .expect("state builds");
    build_router(Arc::new(state))
}

fn app(endpoint: Arc<ScriptedEndpoint>) -> Router {
    app_with(endpoint, ServerConfig::default())
}

fn cat_request(language: &str) -> Value {
    json!({
        "language": language,
        "model": "en_core_web_sm",
        "sentences": [{
            "text": "The cat sat on the mat.",
            "tokens": [
                {"text": "The", "pos": "DET"},
                {"text": "cat", "pos": "NOUN"},
                {"text": "sat", "pos": "VERB"},
                {"text": "on", "pos": "ADP"},
                {"text": "the", "pos": "DET"},
                {"text": "mat", "pos": "NOUN"},
                {"text": ".", "pos": "PUNCT"}
            ]
        }]
    })
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {KEY}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_is_public() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(Arc::new(english())), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn ready_without_live_endpoint() {
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(app(Arc::new(english())), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["wikidata_circuit"], "scripted");
}

#[tokio::test]
async fn resolve_requires_an_api_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/resolve")
        .header("content-type", "application/json")
        .body(Body::from(cat_request("en").to_string()))
        .unwrap();
    let (status, body) = send(app(Arc::new(english())), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn resolves_a_tagged_document() {
    let (status, body) = send(
        app(Arc::new(english())),
        post("/api/v1/resolve", &cat_request("en")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sentence = &body["sentences"][0];
    assert_eq!(sentence["matched_count"], 2);
    assert_eq!(sentence["unmatched_count"], 3);
    assert_eq!(sentence["skipped_count"], 2);
    assert_eq!(body["unique_matched_ids"], json!(["L1234-F1", "L5-F3"]));
    assert_eq!(body["summary"]["eligible_tokens"], 5);
    assert!(body["report"].is_null());
}

#[tokio::test]
async fn report_is_attached_on_request() {
    let mut request = cat_request("en");
    request["report"] = json!(true);
    let (status, body) = send(app(Arc::new(english())), post("/api/v1/resolve", &request)).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body["report"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["lemma"], "cat");
    assert_eq!(body["summary"]["lexemes_lacking_gloss"], 1);
}

#[tokio::test]
async fn report_request_rejected_when_disabled() {
    let mut request = cat_request("en");
    request["report"] = json!(true);
    let config = ServerConfig {
        enable_reports: false,
        ..Default::default()
    };
    let (status, body) = send(
        app_with(Arc::new(english()), config),
        post("/api/v1/resolve", &request),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn invalid_language_code_is_a_bad_request() {
    let endpoint = Arc::new(english());
    let (status, body) = send(
        app(endpoint.clone()),
        post("/api/v1/resolve", &cat_request("english")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_LANGUAGE_CODE");
    assert_eq!(endpoint.call_count(), 0);
}

#[tokio::test]
async fn outage_returns_partial_results() {
    let endpoint = Arc::new(english().with_failure(
        "SELECT DISTINCT ?form",
        WikidataError::Transport("connection refused".into()),
    ));
    let (status, body) = send(app(endpoint), post("/api/v1/resolve", &cat_request("en"))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "REMOTE_SERVICE_UNAVAILABLE");
    let tokens = body["error"]["partial"]["sentences"][0]["tokens"]
        .as_array()
        .unwrap();
    assert_eq!(tokens.len(), 7);
    assert!(tokens.iter().any(|t| t["status"] == "unresolved"));
}

#[tokio::test]
async fn blank_sentences_resolve_to_nothing() {
    let request = json!({
        "language": "en",
        "sentences": [{"text": "   ", "tokens": []}, {"text": "<i></i>", "tokens": []}]
    });
    let (status, body) = send(app(Arc::new(english())), post("/api/v1/resolve", &request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_tokens"], 0);
}

#[tokio::test]
async fn only_request_tokens_are_resolved() {
    let mut request = cat_request("en");
    request["sentences"][0]["tokens"] = json!([{"text": "cat", "pos": "NOUN"}]);
    let (status, body) = send(app(Arc::new(english())), post("/api/v1/resolve", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_tokens"], 1);
    assert_eq!(body["summary"]["matched_tokens"], 1);
}

#[tokio::test]
async fn forms_are_cached_across_requests() {
    let endpoint = Arc::new(english());
    let app = app(endpoint.clone());

    let (first, _) = send(app.clone(), post("/api/v1/resolve", &cat_request("en"))).await;
    let calls = endpoint.call_count();
    let (second, _) = send(app, post("/api/v1/resolve", &cat_request("en"))).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(endpoint.call_count(), calls);
}

#[tokio::test]
async fn language_lookup() {
    let app = app(Arc::new(english()));

    let (status, body) = send(app.clone(), get("/api/v1/languages/en")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"code": "en", "item": "Q1860"}));

    let (status, body) = send(app.clone(), get("/api/v1/languages/xx")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["item"].is_null());

    let (status, _) = send(app, get("/api/v1/languages/english")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body) = send(app(Arc::new(english())), get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app(Arc::new(english())).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}
