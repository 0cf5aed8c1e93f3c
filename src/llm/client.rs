//! Chat-completions client for documentation, judging and answers.
//!
//! Talks to any server exposing `/v1/chat/completions`. The default target
//! is a local Ollama instance, which needs no API key, so the bearer
//! header is only sent when a key is configured.

use super::TextGenerator;
use crate::config::LlmConfig;
use crate::error::{AutodocError, Result};
use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONNECTION_CHECK_PROMPT: &str = "Say 'hello' and nothing else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One turn of a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    choices: Vec<ReplyChoice>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Completion text with the metadata the server sent along.
#[derive(Debug)]
pub struct LlmResponse {
    pub content: String,
    pub finish_reason: Option<String>,
    /// `(prompt_tokens, completion_tokens)`, when reported.
    pub usage: Option<(u32, u32)>,
}

/// Turn a non-success reply into an error, preferring the server's own message.
fn rejection(status: StatusCode, body: &str) -> AutodocError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => AutodocError::LlmApi(format!("{} rejected the request: {}", status, envelope.error.message)),
        Err(_) => AutodocError::LlmApi(format!("{} from completion endpoint: {}", status, body.trim())),
    }
}

/// First choice of a successful reply. Null or absent content reads as "".
fn first_choice(body: &str) -> Result<LlmResponse> {
    let reply: ChatReply = serde_json::from_str(body)?;
    let usage = reply.usage.map(|u| (u.prompt_tokens, u.completion_tokens));
    let choice = reply
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AutodocError::LlmApi("completion reply had no choices".to_string()))?;

    Ok(LlmResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
        usage,
    })
}

/// Client for the configured completion model.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn build_request(&self, messages: &[Message]) -> Result<Request> {
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        let mut builder = self.client.post(self.endpoint()).json(&body);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }
        builder
            .build()
            .map_err(|e| AutodocError::LlmApi(format!("invalid completion request: {}", e)))
    }

    /// Send one chat request and return the first choice.
    pub async fn chat(&self, messages: &[Message]) -> Result<LlmResponse> {
        let request = self.build_request(messages)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| AutodocError::LlmApi(format!("request to {} failed: {}", self.endpoint(), e)))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        let reply = first_choice(&body)?;
        if let Some((prompt_tokens, completion_tokens)) = reply.usage {
            debug!(model = %self.config.model, prompt_tokens, completion_tokens, "completion finished");
        }
        Ok(reply)
    }

    /// A user prompt, optionally preceded by a system instruction.
    pub async fn complete(&self, system: Option<&str>, user: &str) -> Result<String> {
        let messages: Vec<Message> = system
            .map(Message::system)
            .into_iter()
            .chain(std::iter::once(Message::user(user)))
            .collect();
        Ok(self.chat(&messages).await?.content)
    }

    /// Ask the model to say hello; returns its reply when it does.
    pub async fn test_connection(&self) -> Result<String> {
        let reply = self.complete(None, CONNECTION_CHECK_PROMPT).await?;
        if reply.to_lowercase().contains("hello") {
            Ok(reply)
        } else {
            Err(AutodocError::LlmApi(format!("unexpected reply: {}", reply)))
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.complete(None, prompt).await
    }
}
