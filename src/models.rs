//! Core data models that flow through the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_MANIFEST: &str = "documenter.yaml";

/// One orchestration request: which repository, branch, and manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub repo_url: String,
    pub branch: String,
    pub manifest_path: String,
}

impl AnalysisRequest {
    pub fn new(
        repo_url: impl Into<String>,
        branch: Option<String>,
        manifest_path: Option<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch: branch
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            manifest_path: manifest_path
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MANIFEST.to_string()),
        }
    }
}

/// Per-file record persisted in the document store, keyed by `file_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysisRecord {
    pub repo_url: String,
    /// Raw-content URL of the analysed file.
    pub file_path: String,
    /// Lowercase hex SHA-256 of the file's UTF-8 text.
    #[serde(rename = "hash")]
    pub content_hash: String,
    pub summary: String,
}

/// Entry of [`ProjectDocument::main_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainFile {
    pub path: String,
    pub hash: String,
    pub summary: String,
}

/// Per-repository aggregate assembled in memory during a run.
///
/// Not written to the store; it is returned to callers as part of
/// [`AnalysisOutcome`](crate::pipeline::AnalysisOutcome).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub id: String,
    /// In manifest order.
    pub main_files: Vec<MainFile>,
    pub project_summary: String,
    #[serde(rename = "documentationURL")]
    pub documentation_url: String,
    pub updated_at: DateTime<Utc>,
}

impl ProjectDocument {
    pub fn new(repo_url: &str) -> Self {
        Self {
            id: repo_url.to_string(),
            main_files: Vec::new(),
            project_summary: String::new(),
            documentation_url: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn push(&mut self, record: &FileAnalysisRecord) {
        self.main_files.push(MainFile {
            path: record.file_path.clone(),
            hash: record.content_hash.clone(),
            summary: record.summary.clone(),
        });
    }
}
