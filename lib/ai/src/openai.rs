//! OpenAI-compatible chat-completions backend.

use crate::error::GenerationError;
use crate::generator::{GenerationRequest, ResponseGenerator};
use crate::prompt::system_prompt;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use parkline_conversation::Role;
use serde::{Deserialize, Serialize};

/// Configuration for the chat-completions backend.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature, when overridden.
    pub temperature: Option<f32>,
    /// Reply token budget, when overridden.
    pub max_tokens: Option<u32>,
}

/// A [`ResponseGenerator`] backed by any chat-completions API.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: OpenAiConfig,
    retry: RetryPolicy,
}

impl OpenAiGenerator {
    /// Creates a generator, validating the configuration up front.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] for a blank key, model, or
    /// base URL.
    pub fn new(config: OpenAiConfig, retry: RetryPolicy) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "api key is empty".to_string(),
            });
        }
        if config.model.trim().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "model is empty".to_string(),
            });
        }
        if config.base_url.trim().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "base url is empty".to_string(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            retry,
        })
    }

    fn build_messages(&self, request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: system_prompt(request),
        });
        for entry in &request.history {
            messages.push(ChatMessage {
                role: match entry.role {
                    Role::User => "user",
                    Role::Bot => "assistant",
                },
                content: entry.text.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.query.clone(),
        });
        messages
    }

    async fn attempt(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed {
                reason: format!("{status}: {detail}"),
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(GenerationError::ResponseParseFailed {
                reason: "empty completion".to_string(),
            });
        }
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl ResponseGenerator for OpenAiGenerator {
    async fn generate_reply(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let messages = self.build_messages(request);
        self.retry.run(|| self.attempt(&messages)).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
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
