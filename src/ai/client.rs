//! Completion client
//!
//! `CompletionClient` is the seam between the orchestration actions and the
//! hosted model; `GroqClient` implements it against Groq's OpenAI-compatible
//! chat-completions endpoint. Tests substitute their own implementations.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::credentials::ApiKey;
use super::http_client::completion_client;
use super::prompts::Prompt;
use super::types::{ChatMessage, ChatRole};
use crate::config::{Config, DEFAULT_CHAT_MODEL, DEFAULT_GENERATION_MODEL};
use crate::error::CompletionError;

/// Which configured model a request should run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Large model for study package generation
    Generation,
    /// Small, fast model for chat
    Chat,
}

impl ModelTier {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Generation => DEFAULT_GENERATION_MODEL,
            Self::Chat => DEFAULT_CHAT_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub tier: ModelTier,
    pub messages: Vec<ChatMessage>,
    /// Ask the provider to constrain output to a single JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    /// JSON-mode generation request from a built prompt
    pub fn generation(prompt: Prompt) -> Self {
        Self {
            tier: ModelTier::Generation,
            messages: vec![
                ChatMessage::system(prompt.system),
                ChatMessage::user(prompt.user),
            ],
            json_mode: true,
        }
    }

    /// Free-text chat request
    pub fn chat(messages: Vec<ChatMessage>) -> Self {
        Self {
            tier: ModelTier::Chat,
            messages,
            json_mode: false,
        }
    }
}

/// Sends one completion request and returns the raw text of the first choice
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;

    /// Model identifier used for a tier; drives prompt sizing
    fn model_for(&self, tier: ModelTier) -> &str {
        tier.default_model()
    }
}

/// Groq chat-completions client
pub struct GroqClient {
    http: Client,
    base_url: String,
    api_key: Option<ApiKey>,
    generation_model: String,
    chat_model: String,
}

impl GroqClient {
    /// Never fails; a missing key surfaces on the first call instead
    pub fn new(config: &Config) -> Self {
        if config.api_key.is_none() {
            tracing::warn!("GroqClient created without an API key");
        }
        Self {
            http: completion_client(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            generation_model: config.generation_model.clone(),
            chat_model: config.chat_model.clone(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<String, CompletionError> {
        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::MissingCredential);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: provider_message(&text),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Transport(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let model = self.model_for(request.tier);
        let body = ChatRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        tracing::debug!(
            model = model,
            messages = body.messages.len(),
            json_mode = request.json_mode,
            "Sending completion request"
        );

        match self.send(&body).await {
            Ok(content) => {
                tracing::info!(model = model, chars = content.len(), "Completion received");
                Ok(content)
            }
            // Without a key every failure is reported as a credential problem
            Err(e) if self.api_key.is_none() => {
                tracing::error!("Completion failed with no API key configured: {}", e);
                Err(CompletionError::MissingCredential)
            }
            Err(e) => {
                tracing::error!(model = model, "Completion failed: {}", e);
                Err(e)
            }
        }
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Generation => &self.generation_model,
            ModelTier::Chat => &self.chat_model,
        }
    }
}

/// Provider error message from an error body, or the body itself
fn provider_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

// API request/response types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
