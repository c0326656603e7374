//! HTTP contract tests for the router, driven with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use documenter::config::{self, Config};
use documenter::error::AnalysisError;
use documenter::models::{AnalysisRequest, ProjectDocument};
use documenter::pipeline::{AnalysisOutcome, AnalysisService};
use documenter::server::{self, AppState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Service that records requests and answers with a fixed result.
#[derive(Default)]
struct StubService {
    requests: Mutex<Vec<AnalysisRequest>>,
    failure: Option<AnalysisError>,
}

impl StubService {
    fn failing(err: AnalysisError) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Some(err),
        }
    }

    fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for StubService {
    async fn analyse(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let project = ProjectDocument::new(&request.repo_url);
        self.requests.lock().unwrap().push(request);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(AnalysisOutcome {
                project,
                persisted: 0,
                persist_failures: Vec::new(),
            }),
        }
    }
}

fn test_config() -> Config {
    let env: HashMap<&str, &str> = [
        (config::ENV_OAI_KEY, "sk-test-secret"),
        (config::ENV_OAI_ENDPOINT, "https://example.openai.azure.com"),
        (config::ENV_OAI_DEPLOYMENT, "gpt-test"),
        (config::ENV_OAI_API_VERSION, "2024-02-01"),
        (config::ENV_MONGO_HOST, "cluster.example.net"),
        (config::ENV_MONGO_DB, "docs"),
        (config::ENV_MONGO_COLLECTION, "files"),
    ]
    .into_iter()
    .collect();
    config::resolve(None, |key| env.get(key).map(|v| v.to_string())).unwrap()
}

fn app(service: Arc<StubService>) -> axum::Router {
    server::router(AppState::new(&test_config(), service))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_analyse_without_repo_url_is_rejected() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json("/analyse", r#"{"branch":"dev"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, server::MISSING_URL_MESSAGE);
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_analyse_with_empty_body_is_rejected() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json("/analyse", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, server::MISSING_URL_MESSAGE);
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_analyse_with_blank_repo_url_is_rejected() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json("/analyse", r#"{"repoUrl":"   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_analyse_applies_defaults() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json(
            "/analyse",
            r#"{"repoUrl":"https://github.com/acme/widgets"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, server::DONE_MESSAGE);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].repo_url, "https://github.com/acme/widgets");
    assert_eq!(requests[0].branch, "main");
    assert_eq!(requests[0].manifest_path, "documenter.yaml");
}

#[tokio::test]
async fn test_analyse_passes_branch_and_manifest() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json(
            "/analyse",
            r#"{"repoUrl":"https://github.com/acme/widgets","branch":"dev","filePath":"docs/files.yaml"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let requests = service.requests();
    assert_eq!(requests[0].branch, "dev");
    assert_eq!(requests[0].manifest_path, "docs/files.yaml");
}

#[tokio::test]
async fn test_analyse_failure_maps_to_json_error() {
    let service = Arc::new(StubService::failing(AnalysisError::ManifestNotFound {
        url: "https://raw.githubusercontent.com/acme/widgets/main/documenter.yaml".to_string(),
        cause: "HTTP 404".to_string(),
    }));

    let response = app(service)
        .oneshot(post_json(
            "/analyse",
            r#"{"repoUrl":"https://github.com/acme/widgets"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "manifest_not_found");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("documenter.yaml"));
}

#[tokio::test]
async fn test_store_outage_maps_to_service_unavailable() {
    let service = Arc::new(StubService::failing(AnalysisError::StoreUnavailable {
        target: "mongodb+srv://cluster.example.net".to_string(),
        cause: "server selection timeout".to_string(),
    }));

    let response = app(service)
        .oneshot(post_json(
            "/analyse",
            r#"{"repoUrl":"https://github.com/acme/widgets"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "store_unavailable");
}

#[tokio::test]
async fn test_analyse_invalid_json() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json("/analyse", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_home_banner_shows_llm_target_without_key() {
    let service = Arc::new(StubService::default());

    let response = app(service)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.starts_with("Documenter is running!"));
    assert!(text.contains("https://example.openai.azure.com"));
    assert!(text.contains("gpt-test"));
    assert!(text.contains("2024-02-01"));
    assert!(!text.contains("sk-test-secret"));
}

#[tokio::test]
async fn test_generate_summary_placeholder() {
    let service = Arc::new(StubService::default());

    let response = app(service.clone())
        .oneshot(post_json("/generate-summary", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, server::SUMMARY_PLACEHOLDER);
    assert!(service.requests().is_empty());
}

#[tokio::test]
async fn test_analyse_requires_post() {
    let service = Arc::new(StubService::default());

    let response = app(service)
        .oneshot(Request::builder().uri("/analyse").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

/// Service that takes a while and records whether it ran to the end.
#[derive(Default)]
struct SlowService {
    finished: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl AnalysisService for SlowService {
    async fn analyse(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        self.finished
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(AnalysisOutcome {
            project: ProjectDocument::new(&request.repo_url),
            persisted: 0,
            persist_failures: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_analysis_completes_after_client_disconnect() {
    let service = Arc::new(SlowService::default());
    let app = server::router(AppState::new(&test_config(), service.clone()));

    let call = app.oneshot(post_json(
        "/analyse",
        r#"{"repoUrl":"https://github.com/acme/widgets"}"#,
    ));
    let dropped = tokio::time::timeout(std::time::Duration::from_millis(10), call).await;
    assert!(dropped.is_err(), "request should still be in flight");

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    assert!(service
        .finished
        .load(std::sync::atomic::Ordering::SeqCst));
}
