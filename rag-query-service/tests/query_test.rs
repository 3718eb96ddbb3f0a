//! Route-level tests for `POST /query` against mocked backends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use rag_query_service::services::providers::mock::{
    MockGenerator, MockPipelineBuilder, MockRetriever,
};
use rag_query_service::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    retriever: Arc<MockRetriever>,
    generator: Arc<MockGenerator>,
    builder: Arc<MockPipelineBuilder>,
}

fn spawn_app_with(retriever: MockRetriever, generator: MockGenerator, failing_builds: usize) -> TestApp {
    let retriever = Arc::new(retriever);
    let generator = Arc::new(generator);
    let builder = Arc::new(
        MockPipelineBuilder::new(retriever.clone(), generator.clone()).failing_first(failing_builds),
    );

    TestApp {
        router: build_router(AppState::new(builder.clone())),
        retriever,
        generator,
        builder,
    }
}

fn paris_app() -> TestApp {
    spawn_app_with(
        MockRetriever::new(["Paris is the capital of France."]),
        MockGenerator::new("Paris"),
        0,
    )
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn answers_question_with_sources() {
    let app = paris_app();

    let (status, body) = send(
        &app,
        json_request(r#"{"question": "What is the capital of France?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"answer": "Paris", "sources": ["Paris is the capital of France."]})
    );
    assert_eq!(app.retriever.calls(), 1);
    assert_eq!(app.generator.calls(), 1);
}

#[tokio::test]
async fn sources_keep_retrieval_order() {
    let app = spawn_app_with(
        MockRetriever::new(["zeta", "alpha", "mu"]),
        MockGenerator::new("ok"),
        0,
    );

    let (status, body) = send(&app, json_request(r#"{"question": "order?"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"], json!(["zeta", "alpha", "mu"]));
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_body_object_is_rejected() {
    let app = paris_app();

    let (status, body) = send(&app, json_request("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No question provided"}));
    assert_eq!(app.retriever.calls(), 0);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn blank_or_non_string_question_is_rejected() {
    let app = paris_app();

    for payload in [r#"{"question": ""}"#, r#"{"question": null}"#, r#"{"question": 7}"#, "[]"] {
        let (status, body) = send(&app, json_request(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"], "No question provided", "{payload}");
    }

    assert_eq!(app.retriever.calls(), 0);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn non_json_content_type_is_rejected() {
    let app = paris_app();
    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"question": "What is the capital of France?"}"#))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Request must be JSON"}));
    assert_eq!(app.retriever.calls(), 0);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn missing_content_type_is_rejected() {
    let app = paris_app();
    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .body(Body::from(r#"{"question": "hi"}"#))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request must be JSON");
    assert_eq!(app.retriever.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = paris_app();

    let (status, body) = send(&app, json_request(r#"{"question": "#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request must be JSON");
    assert_eq!(app.retriever.calls(), 0);
}

#[tokio::test]
async fn retrieval_failure_returns_raw_error_text() {
    let app = spawn_app_with(
        MockRetriever::failing("search quota exceeded"),
        MockGenerator::new("unused"),
        0,
    );

    let (status, body) = send(&app, json_request(r#"{"question": "q"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "search quota exceeded"}));
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn generation_failure_returns_raw_error_text() {
    let app = spawn_app_with(
        MockRetriever::new(["context"]),
        MockGenerator::failing("model overloaded"),
        0,
    );

    let (status, body) = send(&app, json_request(r#"{"question": "q"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "model overloaded");
    assert_eq!(app.retriever.calls(), 1);
}

#[tokio::test]
async fn identical_requests_give_identical_bodies() {
    let app = paris_app();
    let payload = r#"{"question": "What is the capital of France?"}"#;

    let first = send(&app, json_request(payload)).await;
    let second = send(&app, json_request(payload)).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn pipeline_is_built_once_across_requests() {
    let app = paris_app();
    assert_eq!(app.builder.builds(), 0);

    send(&app, json_request(r#"{"question": "one"}"#)).await;
    send(&app, json_request("{}")).await;
    send(&app, json_request(r#"{"question": "two"}"#)).await;

    assert_eq!(app.builder.builds(), 1);
}

#[tokio::test]
async fn failed_initialization_is_retried_on_next_request() {
    let app = spawn_app_with(
        MockRetriever::new(["Paris is the capital of France."]),
        MockGenerator::new("Paris"),
        1,
    );
    let payload = r#"{"question": "What is the capital of France?"}"#;

    let (status, body) = send(&app, json_request(payload)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Provider not configured: mock credentials unavailable"
    );
    assert_eq!(app.retriever.calls(), 0);

    let (status, body) = send(&app, json_request(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Paris");
    assert_eq!(app.builder.builds(), 2);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = paris_app();
    let mut request = json_request(r#"{"question": "q"}"#);
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().unwrap());

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let app = paris_app();
    let request = Request::builder()
        .method("GET")
        .uri("/query")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.retriever.calls(), 0);
}
