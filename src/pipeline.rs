//! Analysis orchestration.
//!
//! Runs the end-to-end flow for one repository:
//!
//! ```text
//! manifest ──▶ for each path, in order:
//!                fetch ─▶ hash ─▶ classify ─▶ summarize ─▶ persist
//! ```
//!
//! Files are processed strictly one after another. A failure while
//! fetching, classifying, or summarizing aborts the whole run. A failed
//! write is logged and the run moves on to the next file. The store
//! connection is opened once per run and closed before returning, on
//! success and on failure. A run that is dropped mid-flight skips the
//! close, so callers that may be cancelled (the HTTP handler) spawn it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::classify::LanguageClassifier;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::hash::content_hash;
use crate::llm::ChatCompletion;
use crate::manifest::load_manifest;
use crate::models::{AnalysisRequest, FileAnalysisRecord, ProjectDocument};
use crate::remote::RemoteFetcher;
use crate::store::{RecordStore, StoreConnector};
use crate::summarize::{CodeSummarizer, SystemRoleTemplate};

/// Step of a run, reported in logs when a step fails.
///
/// Hashing has no stage: it cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ManifestLoading,
    Connecting,
    EnsuringCollection,
    Fetching,
    Classifying,
    Summarizing,
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ManifestLoading => "manifest_loading",
            Stage::Connecting => "connecting",
            Stage::EnsuringCollection => "ensuring_collection",
            Stage::Fetching => "fetching",
            Stage::Classifying => "classifying",
            Stage::Summarizing => "summarizing",
            Stage::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub project: ProjectDocument,
    pub persisted: usize,
    /// Per-file write failures; the run continued past each of them.
    pub persist_failures: Vec<AnalysisError>,
}

/// Anything that can run an analysis; the HTTP layer depends on this.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyse(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError>;
}

pub struct Analyzer {
    fetcher: RemoteFetcher,
    classifier: LanguageClassifier,
    summarizer: CodeSummarizer,
    store: Arc<dyn StoreConnector>,
    collection: String,
}

impl Analyzer {
    pub fn new(
        fetcher: RemoteFetcher,
        classifier: LanguageClassifier,
        summarizer: CodeSummarizer,
        store: Arc<dyn StoreConnector>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            summarizer,
            store,
            collection: collection.into(),
        }
    }

    /// Build the collaborators from configuration.
    ///
    /// The system-role template is read here, once.
    pub fn from_config(
        config: &Config,
        llm: Arc<dyn ChatCompletion>,
        store: Arc<dyn StoreConnector>,
    ) -> Result<Self, AnalysisError> {
        let fetcher = RemoteFetcher::new(&config.fetch)?;
        let template = SystemRoleTemplate::load(&config.prompts.system_role_path)?;
        let classifier = LanguageClassifier::new(
            llm.clone(),
            config.llm.temperature,
            config.llm.classify_max_tokens,
        );
        let summarizer = CodeSummarizer::new(
            llm,
            template,
            config.llm.temperature,
            config.llm.summary_max_tokens,
        );
        Ok(Self::new(
            fetcher,
            classifier,
            summarizer,
            store,
            config.store.collection.clone(),
        ))
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        info!(
            repo = %request.repo_url,
            branch = %request.branch,
            manifest = %request.manifest_path,
            "analysis started"
        );

        let paths = load_manifest(
            &self.fetcher,
            &request.repo_url,
            &request.branch,
            &request.manifest_path,
        )
        .await
        .inspect_err(|e| log_abort(Stage::ManifestLoading, &request.manifest_path, e))?;

        let store = self
            .store
            .connect()
            .await
            .inspect_err(|e| log_abort(Stage::Connecting, &request.repo_url, e))?;

        let result = self.process(store.as_ref(), request, &paths).await;
        store.close().await;

        if let Ok(outcome) = &result {
            info!(
                repo = %request.repo_url,
                files = outcome.project.main_files.len(),
                persisted = outcome.persisted,
                failed_writes = outcome.persist_failures.len(),
                "analysis finished"
            );
        }
        result
    }

    async fn process(
        &self,
        store: &dyn RecordStore,
        request: &AnalysisRequest,
        paths: &[String],
    ) -> Result<AnalysisOutcome, AnalysisError> {
        store
            .ensure_collection(&self.collection)
            .await
            .inspect_err(|e| log_abort(Stage::EnsuringCollection, &self.collection, e))?;

        let mut project = ProjectDocument::new(&request.repo_url);
        let mut persisted = 0;
        let mut persist_failures = Vec::new();

        for path in paths {
            info!(path = %path, "analysing file");

            let file = self
                .fetcher
                .fetch_file(&request.repo_url, &request.branch, path)
                .await
                .inspect_err(|e| log_abort(Stage::Fetching, path, e))?;

            let hash = content_hash(&file.text);

            let language = self
                .classifier
                .classify(path, &file.text)
                .await
                .inspect_err(|e| log_abort(Stage::Classifying, path, e))?;

            let summary = self
                .summarizer
                .summarize(path, &file.text, &language)
                .await
                .inspect_err(|e| log_abort(Stage::Summarizing, path, e))?;

            let record = FileAnalysisRecord {
                repo_url: request.repo_url.clone(),
                file_path: file.url,
                content_hash: hash,
                summary,
            };

            match store.upsert_file_record(&self.collection, &record).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    warn!(
                        stage = %Stage::Persisting,
                        path = %path,
                        error = %e,
                        "record not persisted, continuing"
                    );
                    persist_failures.push(e);
                }
            }

            project.push(&record);
        }

        Ok(AnalysisOutcome {
            project,
            persisted,
            persist_failures,
        })
    }
}

fn log_abort(stage: Stage, subject: &str, err: &AnalysisError) {
    error!(stage = %stage, subject, kind = err.kind(), error = %err, "analysis aborted");
}

#[async_trait]
impl AnalysisService for Analyzer {
    async fn analyse(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        self.run(&request).await
    }
}
