//! Completion backend for the query synthesizer
//!
//! One OpenAI-compatible chat-completion client behind a trait, so the
//! pipeline can run against a scripted backend in tests. Configuration is
//! read once at startup and never mutated afterwards.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::PipelineError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Output ceiling for a single completion; generated queries are short.
pub const MAX_COMPLETION_TOKENS: u32 = 200;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl ModelConfig {
    /// Read the model configuration from the environment.
    ///
    /// `model_override` (from the CLI) wins over `OPENAI_MODEL`.
    pub fn from_env(model_override: Option<String>) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set"))?;

        let model = model_override
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            model,
            base_url,
            max_tokens: MAX_COMPLETION_TOKENS,
        })
    }
}

/// A single instruction-in, text-out completion call.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, instruction: &str) -> Result<String, PipelineError>;
}

pub struct OpenAiBackend {
    client: Client,
    config: ModelConfig,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, instruction: &str) -> Result<String, PipelineError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: instruction,
            }],
            temperature: 0.0,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Model(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PipelineError::Model(format!(
                "completion endpoint returned {status}: {body}"
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            PipelineError::Model(format!("could not decode completion response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Model("completion response contained no choices".to_string()))
    }
}
