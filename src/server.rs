//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Status banner with the configured LLM target |
//! | `POST` | `/analyse` | Analyse a repository's manifest files |
//! | `POST` | `/generate-summary` | Placeholder, always returns a fixed message |
//!
//! `POST /analyse` accepts
//!
//! ```json
//! { "repoUrl": "https://github.com/org/repo", "branch": "main", "filePath": "documenter.yaml" }
//! ```
//!
//! and answers `200 All Done!` once every listed file has been processed.
//! A missing `repoUrl` is answered with `400 URL is required for analysis.`
//! in plain text.
//!
//! # Error Contract
//!
//! Pipeline failures are returned as JSON:
//!
//! ```json
//! { "error": { "code": "manifest_not_found", "message": "manifest not found at ..." } }
//! ```
//!
//! | Status | Codes |
//! |--------|-------|
//! | 400 | `bad_request` |
//! | 404 | `manifest_not_found`, `file_not_found` |
//! | 422 | `manifest_empty`, `manifest_parse_error` |
//! | 502 | `manifest_fetch_error`, `fetch_error`, `classification_error`, `summarization_error` |
//! | 503 | `store_unavailable` |
//! | 500 | anything else |

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::AnalysisRequest;
use crate::pipeline::AnalysisService;

pub const MISSING_URL_MESSAGE: &str = "URL is required for analysis.";
pub const DONE_MESSAGE: &str = "All Done!";
pub const SUMMARY_PLACEHOLDER: &str = "Summary generation endpoint is under construction.";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    banner: Arc<String>,
    service: Arc<dyn AnalysisService>,
}

impl AppState {
    pub fn new(config: &Config, service: Arc<dyn AnalysisService>) -> Self {
        let banner = format!(
            "Documenter is running! <br> \
             Azure OpenAI Endpoint: {} <br> \
             Azure OpenAI Deployment: {} <br> \
             Azure OpenAI API Version: {} <br> ",
            config.llm.endpoint, config.llm.deployment, config.llm.api_version
        );
        Self {
            banner: Arc::new(banner),
            service,
        }
    }
}

/// Build the router with all routes and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_home))
        .route("/analyse", post(handle_analyse))
        .route("/generate-summary", post(handle_generate_summary))
        .layer(cors)
        .with_state(state)
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_server(config: &Config, service: Arc<dyn AnalysisService>) -> anyhow::Result<()> {
    let app = router(AppState::new(config, service));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("documenter listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal_error".to_string(),
        message: message.into(),
    }
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::ManifestNotFound { .. } | AnalysisError::FileNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        AnalysisError::ManifestEmpty { .. } | AnalysisError::ManifestParseError { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AnalysisError::ManifestFetchError { .. }
        | AnalysisError::FetchError { .. }
        | AnalysisError::ClassificationError { .. }
        | AnalysisError::SummarizationError { .. } => StatusCode::BAD_GATEWAY,
        AnalysisError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError {
            status: status_for(&err),
            code: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET / ============

async fn handle_home(State(state): State<AppState>) -> Html<String> {
    Html(state.banner.as_ref().clone())
}

// ============ POST /analyse ============

#[derive(Debug, Default, Deserialize)]
struct AnalyseBody {
    #[serde(rename = "repoUrl")]
    repo_url: Option<String>,
    branch: Option<String>,
    #[serde(rename = "filePath")]
    file_path: Option<String>,
}

async fn handle_analyse(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body: AnalyseBody = if body.iter().all(u8::is_ascii_whitespace) {
        AnalyseBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| bad_request(format!("invalid JSON body: {}", e)))?
    };

    let repo_url = match body.repo_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => url,
        None => return Ok((StatusCode::BAD_REQUEST, MISSING_URL_MESSAGE).into_response()),
    };

    let request = AnalysisRequest::new(repo_url, body.branch, body.file_path);
    info!(
        repo = %request.repo_url,
        branch = %request.branch,
        manifest = %request.manifest_path,
        "analyse request received"
    );

    // Runs to completion even if the client disconnects.
    let service = state.service.clone();
    tokio::spawn(async move { service.analyse(request).await })
        .await
        .map_err(|e| internal_error(format!("analysis task failed: {}", e)))??;
    Ok((StatusCode::OK, DONE_MESSAGE).into_response())
}

// ============ POST /generate-summary ============

async fn handle_generate_summary() -> &'static str {
    SUMMARY_PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let url = "u".to_string();
        let cause = "c".to_string();
        assert_eq!(
            status_for(&AnalysisError::ManifestNotFound {
                url: url.clone(),
                cause: cause.clone()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&AnalysisError::ManifestEmpty { url: url.clone() }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&AnalysisError::FetchError {
                url: url.clone(),
                cause: cause.clone()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&AnalysisError::StoreUnavailable {
                target: url,
                cause
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&AnalysisError::missing("X")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
