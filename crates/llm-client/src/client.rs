//! HTTP backend for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::types::{ChatOptions, Message};
use crate::ChatBackend;

/// Request timeout; completions for full document packs can run long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters of a failing response body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpChatClient {
    /// Build a client against `{base_url}/chat/completions`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatClient {
    async fn complete(&self, messages: &[Message], opts: &ChatOptions) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
            response_format: opts.json_mode.then(|| ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!(
            model = %self.model,
            json_mode = opts.json_mode,
            temperature = opts.temperature,
            "sending chat completion request"
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| LlmError::Transport(
            format!("unparseable completion response: {e}"),
        ))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(LlmError::Transport(
                "completion response contained no choices".to_string(),
            ));
        }

        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
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
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}
