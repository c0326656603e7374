//! Chat-completion client.
//!
//! Defines the [`ChatCompletion`] trait used by the classifier and the
//! summarizer, and [`AzureOpenAiClient`], which calls an Azure OpenAI
//! deployment's `chat/completions` endpoint.
//!
//! Calls are never retried. Any transport failure, non-2xx status, or
//! malformed response body comes back as an [`LlmError`] carrying the
//! provider's message; callers attach it to their own error variant.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::LlmConfig;
use crate::error::AnalysisError;

/// A system/user message pair plus sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one request and return the trimmed text of the first choice.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Azure OpenAI chat-completions client.
pub struct AzureOpenAiClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl AzureOpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::invalid("llm", e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            url: chat_url(&config.endpoint, &config.deployment, &config.api_version),
        })
    }
}

fn chat_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        api_version
    )
}

#[derive(Serialize)]
struct WireRequest<'a> {
    messages: [WireMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: Option<WireReply>,
}

#[derive(Deserialize)]
struct WireReply {
    content: Option<String>,
}

#[async_trait]
impl ChatCompletion for AzureOpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = WireRequest {
            messages: [
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(max_tokens = request.max_tokens, "sending chat completion request");

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("chat completion request failed: {}", e);
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "chat completion rejected");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::InvalidResponse("no content in first choice".to_string()))?;

        debug!("chat completion response received");
        Ok(content.trim().to_string())
    }
}
