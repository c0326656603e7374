//! Manifest loading.
//!
//! A manifest is a YAML document at the repository root (by default
//! `documenter.yaml`) listing the repository-relative paths to analyse:
//!
//! ```yaml
//! - src/app.py
//! - src/models.py
//! - README.md
//! ```
//!
//! Only a sequence of non-empty strings is accepted. A mapping, a scalar,
//! or a sequence containing anything other than strings is rejected with
//! [`AnalysisError::ManifestParseError`].

use serde_yaml::Value;
use tracing::info;

use crate::error::AnalysisError;
use crate::remote::{raw_url, FetchFailure, RemoteFetcher};

/// Fetch and parse the manifest for `repo_url` at `branch`.
pub async fn load_manifest(
    fetcher: &RemoteFetcher,
    repo_url: &str,
    branch: &str,
    manifest_path: &str,
) -> Result<Vec<String>, AnalysisError> {
    let url = raw_url(repo_url, branch, manifest_path);
    let text = fetcher
        .fetch_text(&url)
        .await
        .map_err(FetchFailure::into_manifest_error)?;

    let paths = parse_manifest(&url, &text)?;
    info!(url = %url, files = paths.len(), "manifest loaded");
    Ok(paths)
}

/// Parse manifest text fetched from `url`.
pub fn parse_manifest(url: &str, text: &str) -> Result<Vec<String>, AnalysisError> {
    let parse_error = |cause: String| AnalysisError::ManifestParseError {
        url: url.to_string(),
        cause,
    };

    let value: Value = serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;

    let entries = match value {
        Value::Null => {
            return Err(AnalysisError::ManifestEmpty {
                url: url.to_string(),
            })
        }
        Value::Sequence(entries) => entries,
        Value::Mapping(_) => {
            return Err(parse_error(
                "expected a list of file paths, found a mapping".to_string(),
            ))
        }
        _ => {
            return Err(parse_error(
                "expected a list of file paths, found a scalar".to_string(),
            ))
        }
    };

    if entries.is_empty() {
        return Err(AnalysisError::ManifestEmpty {
            url: url.to_string(),
        });
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::String(path) if !path.trim().is_empty() => Ok(path.trim().to_string()),
            Value::String(_) => Err(parse_error(format!("entry {} is an empty path", i))),
            _ => Err(parse_error(format!("entry {} is not a string", i))),
        })
        .collect()
}
