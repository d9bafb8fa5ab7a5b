/// LLM Client — the single point of entry for all model calls in the service.
///
/// ARCHITECTURAL RULE: No other module may talk to the model server directly.
/// Handlers receive an `Arc<dyn LlmGateway>` through `AppState`; the production
/// implementation is `OllamaClient`.
///
/// Calls are single-shot: no retry, no streaming. A failure surfaces to the
/// caller immediately as a `GatewayError`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

const GENERATE_PATH: &str = "/api/generate";
const CHAT_PATH: &str = "/api/chat";
/// Upstream error bodies are truncated to this many bytes before being logged.
const MAX_ERROR_BODY: usize = 2048;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not reach LLM server: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("LLM server did not answer within {0:?}")]
    Timeout(Duration),

    #[error("LLM server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM server returned an unreadable envelope: {0}")]
    InvalidEnvelope(String),
}

impl GatewayError {
    /// Short, caller-safe description. Never includes upstream bodies.
    pub fn public_summary(&self) -> String {
        match self {
            GatewayError::Connection(_) => "serviço indisponível".to_string(),
            GatewayError::Timeout(_) => "tempo limite excedido".to_string(),
            GatewayError::Status { status, .. } => format!("status {status}"),
            GatewayError::InvalidEnvelope(_) => "resposta inválida do servidor".to_string(),
        }
    }
}

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// A fully built prompt, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmRequest {
    /// Raw completion: one prompt string, optional system prompt.
    Completion { system: Option<String>, prompt: String },
    /// Chat completion over an ordered message list.
    Chat { messages: Vec<ChatMessage> },
}

/// Prompt in, raw model text out.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, request: &LlmRequest) -> Result<String, GatewayError>;

    /// Model identifier, for logs and the health endpoint.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Client for an Ollama-compatible model server.
/// One pooled `reqwest::Client` is shared by every request.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Connection)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url} (model: {})", self.model);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Connection(err)
        }
    }
}

#[async_trait]
impl LlmGateway for OllamaClient {
    async fn generate(&self, request: &LlmRequest) -> Result<String, GatewayError> {
        let text = match request {
            LlmRequest::Completion { system, prompt } => {
                let body = GenerateRequest {
                    model: &self.model,
                    prompt,
                    system: system.as_deref(),
                    stream: false,
                };
                let raw = self.post(GENERATE_PATH, &body).await?;
                let envelope: GenerateResponse = serde_json::from_str(&raw)
                    .map_err(|e| GatewayError::InvalidEnvelope(e.to_string()))?;
                envelope.response
            }
            LlmRequest::Chat { messages } => {
                let body = ChatRequest { model: &self.model, messages, stream: false };
                let raw = self.post(CHAT_PATH, &body).await?;
                let envelope: ChatResponse = serde_json::from_str(&raw)
                    .map_err(|e| GatewayError::InvalidEnvelope(e.to_string()))?;
                envelope.message.map(|m| m.content).unwrap_or_default()
            }
        };

        Ok(text.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
