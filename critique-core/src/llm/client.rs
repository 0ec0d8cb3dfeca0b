//! HTTP client for the chat-completions endpoint
//!
//! Transport failures (connection errors, timeouts, non-success statuses)
//! are retried a small fixed number of times with exponential backoff.
//! Exhausting the retries is the single terminal failure mode of a review.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::tools::ToolCall;
use crate::{Error, Result};

use super::protocol::{ChatMessage, ChatRequest, ChatResponse};

/// Transport attempts per model turn
const MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay, doubled per failed attempt
const BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Sampling temperature for reviews
const TEMPERATURE: f32 = 0.2;

/// What the model did with its turn
#[derive(Debug, Clone)]
pub enum ModelTurn {
    /// A final textual answer
    Answer(String),
    /// One or more requested tool invocations
    ToolCalls {
        /// The assistant message to append to the conversation verbatim
        assistant: ChatMessage,
        /// The parsed invocation requests, in issue order
        calls: Vec<ToolCall>,
    },
}

/// The seam between the orchestrator and the remote model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the conversation and tool declarations, get back the model's turn
    async fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ModelTurn>;
}

/// Production [`ModelClient`] over an OpenAI-compatible endpoint
pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for HttpModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpModelClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpModelClient {
    /// Create a client for the given endpoint and credential
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "Sending chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "Model endpoint returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        Ok(response.json::<ChatResponse>().await?)
    }

    /// Interpret the first choice as either a final answer or tool calls
    fn interpret(response: ChatResponse) -> Result<ModelTurn> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Protocol("Response contained no choices".to_string()))?;

        let message = choice.message;

        if message.tool_calls.is_empty() {
            let text = message
                .content
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "No review generated.".to_string());
            return Ok(ModelTurn::Answer(text));
        }

        let calls = message
            .tool_calls
            .iter()
            .map(|payload| ToolCall {
                id: payload.id.clone(),
                name: payload.function.name.clone(),
                // Malformed argument JSON degrades to an empty object; the
                // registry will report missing parameters to the model
                arguments: serde_json::from_str(&payload.function.arguments)
                    .unwrap_or_else(|_| Value::Object(Default::default())),
            })
            .collect();

        let assistant =
            ChatMessage::assistant_tool_calls(message.content.clone(), message.tool_calls);

        Ok(ModelTurn::ToolCalls { assistant, calls })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ModelTurn> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            temperature: TEMPERATURE,
        };

        let mut delay = BACKOFF_BASE;
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.send(&request).await {
                Ok(response) => return Self::interpret(response),
                // Protocol-shaped failures are not worth retrying
                Err(e @ Error::Protocol(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "Model request failed");
                    last_error = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(Error::Transport(format!(
            "Model unreachable after {} attempts: {}",
            MAX_ATTEMPTS,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string())
        )))
    }
}
