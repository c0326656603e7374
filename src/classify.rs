//! Language detection through a chat-completion model.

use std::sync::Arc;

use tracing::debug;

use crate::error::AnalysisError;
use crate::llm::{ChatCompletion, ChatRequest};

const SYSTEM_ROLE: &str = "You are a programming assistant that identifies languages.";

pub struct LanguageClassifier {
    llm: Arc<dyn ChatCompletion>,
    temperature: f32,
    max_tokens: u32,
}

impl LanguageClassifier {
    pub fn new(llm: Arc<dyn ChatCompletion>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens,
        }
    }

    /// Ask the model for the language of `code`, fetched from `path`.
    ///
    /// Returns the model's answer as-is (trimmed); it is expected but not
    /// enforced to be a single word.
    pub async fn classify(&self, path: &str, code: &str) -> Result<String, AnalysisError> {
        let request = self.request(code);
        let language = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| AnalysisError::ClassificationError {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        debug!(path, language = %language, "language detected");
        Ok(language)
    }

    fn request(&self, code: &str) -> ChatRequest {
        ChatRequest {
            system: SYSTEM_ROLE.to_string(),
            user: format!(
                "Identify the programming language of the following code:\n\n```\n{}\n```. Give your answer in one word",
                code
            ),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
