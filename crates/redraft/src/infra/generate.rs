//! Chat-completions transport for the generation stages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infra::config::Config;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Maximum length of response bodies echoed into error messages.
const MAX_ERROR_DETAIL_LEN: usize = 200;

/// A role-tagged message in a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Transport-level failure at either generation stage.
///
/// These abort the pipeline run at the point of failure and are surfaced
/// verbatim to the caller. There is deliberately no retry here.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation endpoint returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
    #[error("completion contained no message content")]
    EmptyCompletion,
}

/// The generation interface the pipeline talks to.
///
/// Implementations send the messages to a chat-style model and return the
/// first candidate response's text content. The pipeline treats this as an
/// opaque blocking call.
pub trait GenerationBackend {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, TransportError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    /// Null in some API responses, e.g. on refusals.
    #[serde(default)]
    content: Option<String>,
}

/// Blocking OpenAI-compatible chat-completions client.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpBackend {
    /// Build a client from the resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.defaults.endpoint.clone(),
            model: config.defaults.model.clone(),
            api_key: config.resolved_api_key(),
        })
    }
}

impl GenerationBackend for HttpBackend {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, TransportError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "sending generation request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: truncate_detail(&text),
            });
        }

        extract_content(&text)
    }
}

/// Pull the first choice's content out of a raw completion body.
fn extract_content(text: &str) -> Result<String, TransportError> {
    let parsed: ChatResponse = serde_json::from_str(text)
        .map_err(|err| TransportError::Malformed(format!("{err}: {}", truncate_detail(text))))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.is_empty() {
        return Err(TransportError::EmptyCompletion);
    }
    Ok(content)
}

fn truncate_detail(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_DETAIL_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_ERROR_DETAIL_LEN).collect();
        format!("{head}...")
    }
}
