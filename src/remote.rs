//! Raw file retrieval from a hosted repository.
//!
//! Repository web URLs are mapped to raw-content URLs by swapping the
//! GitHub web prefix for the raw-content prefix and appending
//! `/{branch}/{path}`. URLs on other hosts pass through unchanged, which
//! lets a self-hosted raw file server (or a test fixture) stand in for
//! GitHub.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::AnalysisError;

const WEB_PREFIX: &str = "https://github.com/";
const RAW_PREFIX: &str = "https://raw.githubusercontent.com/";

/// Map a repository URL, branch, and repository-relative path to the
/// raw-content URL of that file.
pub fn raw_url(repo_url: &str, branch: &str, path: &str) -> String {
    let base = match repo_url.strip_prefix(WEB_PREFIX) {
        Some(rest) => format!("{}{}", RAW_PREFIX, rest),
        None => repo_url.to_string(),
    };
    format!("{}/{}/{}", base, branch, path)
}

/// Outcome of a failed raw fetch, before it is attributed to a manifest
/// or a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    NotFound { url: String, cause: String },
    Failed { url: String, cause: String },
}

impl FetchFailure {
    pub fn into_manifest_error(self) -> AnalysisError {
        match self {
            FetchFailure::NotFound { url, cause } => AnalysisError::ManifestNotFound { url, cause },
            FetchFailure::Failed { url, cause } => AnalysisError::ManifestFetchError { url, cause },
        }
    }

    pub fn into_file_error(self) -> AnalysisError {
        match self {
            FetchFailure::NotFound { url, cause } => AnalysisError::FileNotFound { url, cause },
            FetchFailure::Failed { url, cause } => AnalysisError::FetchError { url, cause },
        }
    }
}

/// A fetched file: the raw URL it came from and its text.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub url: String,
    pub text: String,
}

/// HTTP client for raw repository content.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, AnalysisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::invalid("fetch", e.to_string()))?;
        Ok(Self { client })
    }

    /// GET `url` and return the body text.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchFailure> {
        debug!(url, "fetching raw content");

        let response = self.client.get(url).send().await.map_err(|e| FetchFailure::Failed {
            url: url.to_string(),
            cause: describe_transport_error(&e),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchFailure::NotFound {
                url: url.to_string(),
                cause: format!("HTTP {}; check repository URL, branch, and path", status),
            });
        }
        if !status.is_success() {
            return Err(FetchFailure::Failed {
                url: url.to_string(),
                cause: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(|e| FetchFailure::Failed {
            url: url.to_string(),
            cause: describe_transport_error(&e),
        })
    }

    /// Fetch one repository file, attributing failures to the file.
    pub async fn fetch_file(
        &self,
        repo_url: &str,
        branch: &str,
        path: &str,
    ) -> Result<RemoteFile, AnalysisError> {
        let url = raw_url(repo_url, branch, path);
        let text = self
            .fetch_text(&url)
            .await
            .map_err(FetchFailure::into_file_error)?;
        Ok(RemoteFile { url, text })
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection error: {}", err)
    } else {
        err.to_string()
    }
}
