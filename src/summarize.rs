//! Code summarization through a chat-completion model.
//!
//! The system role comes from a text template (by default
//! `system_role.txt`) in which every occurrence of `LANGUAGE` is replaced
//! with the detected language. Substitution is a literal substring
//! replace.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::llm::{ChatCompletion, ChatRequest};

pub const LANGUAGE_PLACEHOLDER: &str = "LANGUAGE";

const DEFAULT_TEMPLATE: &str = "You are an AI programming copilot that helps developers \
understand LANGUAGE code. Explain what the code does in clear, concise prose.";

/// System-role template with a `LANGUAGE` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRoleTemplate {
    text: String,
}

impl SystemRoleTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
        }
    }

    /// Read the template from `path`, falling back to the built-in template
    /// when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "system role template not found, using built-in template"
            );
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::invalid("prompts.system_role_path", format!("{}: {}", path.display(), e))
        })?;
        Ok(Self::new(text))
    }

    pub fn render(&self, language: &str) -> String {
        self.text.replace(LANGUAGE_PLACEHOLDER, language)
    }
}

impl Default for SystemRoleTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

pub struct CodeSummarizer {
    llm: Arc<dyn ChatCompletion>,
    template: SystemRoleTemplate,
    temperature: f32,
    max_tokens: u32,
}

impl CodeSummarizer {
    pub fn new(
        llm: Arc<dyn ChatCompletion>,
        template: SystemRoleTemplate,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            template,
            temperature,
            max_tokens,
        }
    }

    /// Describe what `code` (from `path`, written in `language`) does.
    pub async fn summarize(
        &self,
        path: &str,
        code: &str,
        language: &str,
    ) -> Result<String, AnalysisError> {
        let request = self.request(code, language);
        let summary = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| AnalysisError::SummarizationError {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        debug!(path, chars = summary.len(), "summary generated");
        Ok(summary)
    }

    fn request(&self, code: &str, language: &str) -> ChatRequest {
        ChatRequest {
            system: self.template.render(language),
            user: format!(
                "Describe the function of the following {} code:\n\n```{}\n{}\n```.",
                language,
                fence_tag(language),
                code
            ),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn fence_tag(language: &str) -> String {
    language
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
