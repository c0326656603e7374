//! Error taxonomy for the analysis pipeline.
//!
//! Every failure the service can surface is one variant of [`AnalysisError`].
//! Variants carry the URL, path, or configuration key that triggered them
//! together with the underlying cause, so a single log line or HTTP error
//! body is enough to diagnose the problem.
//!
//! | Variant | Raised by | Fatal to the run? |
//! |---------|-----------|-------------------|
//! | `ManifestNotFound` | manifest fetch returned 404 | yes |
//! | `ManifestFetchError` | any other manifest transport/HTTP failure | yes |
//! | `ManifestEmpty` | manifest parsed to null or an empty list | yes |
//! | `ManifestParseError` | manifest is not valid YAML or not a list of paths | yes |
//! | `FileNotFound` | source file fetch returned 404 | yes |
//! | `FetchError` | any other source file transport/HTTP failure | yes |
//! | `ClassificationError` | language detection call failed | yes |
//! | `SummarizationError` | summary call failed | yes |
//! | `StoreUnavailable` | store connection or collection creation failed | yes |
//! | `StoreWriteError` | a single record upsert failed | no (logged) |
//! | `ConfigMissing` | required setting absent at startup | process exit |
//! | `ConfigInvalid` | setting present but unusable | process exit |

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("manifest not found at {url}: {cause}")]
    ManifestNotFound { url: String, cause: String },

    #[error("failed to fetch manifest from {url}: {cause}")]
    ManifestFetchError { url: String, cause: String },

    #[error("manifest at {url} is empty")]
    ManifestEmpty { url: String },

    #[error("failed to parse manifest at {url}: {cause}")]
    ManifestParseError { url: String, cause: String },

    #[error("file not found at {url}: {cause}")]
    FileNotFound { url: String, cause: String },

    #[error("failed to fetch file from {url}: {cause}")]
    FetchError { url: String, cause: String },

    #[error("language classification failed for {path}: {message}")]
    ClassificationError { path: String, message: String },

    #[error("summarization failed for {path}: {message}")]
    SummarizationError { path: String, message: String },

    /// `target` is always the redacted connection URI.
    #[error("document store unavailable at {target}: {cause}")]
    StoreUnavailable { target: String, cause: String },

    #[error("failed to write record for {file_path}: {cause}")]
    StoreWriteError { file_path: String, cause: String },

    #[error("required setting {key} is not set")]
    ConfigMissing { key: String },

    #[error("setting {key} is invalid: {reason}")]
    ConfigInvalid { key: String, reason: String },
}

impl AnalysisError {
    /// Stable machine-readable code, used in HTTP error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::ManifestNotFound { .. } => "manifest_not_found",
            AnalysisError::ManifestFetchError { .. } => "manifest_fetch_error",
            AnalysisError::ManifestEmpty { .. } => "manifest_empty",
            AnalysisError::ManifestParseError { .. } => "manifest_parse_error",
            AnalysisError::FileNotFound { .. } => "file_not_found",
            AnalysisError::FetchError { .. } => "fetch_error",
            AnalysisError::ClassificationError { .. } => "classification_error",
            AnalysisError::SummarizationError { .. } => "summarization_error",
            AnalysisError::StoreUnavailable { .. } => "store_unavailable",
            AnalysisError::StoreWriteError { .. } => "store_write_error",
            AnalysisError::ConfigMissing { .. } => "config_missing",
            AnalysisError::ConfigInvalid { .. } => "config_invalid",
        }
    }

    pub(crate) fn missing(key: &str) -> Self {
        AnalysisError::ConfigMissing {
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        AnalysisError::ConfigInvalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
