//! Ollama Chat Backend
//!
//! Non-streaming calls to an Ollama server's `/api/chat` endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatBackend, ChatMessage};
use crate::error::CollaboratorError;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Blocking client for one model on one Ollama server.
#[derive(Debug)]
pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(
        host: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(host),
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatBackend for OllamaBackend {
    fn chat(&mut self, messages: &[ChatMessage]) -> Result<String, CollaboratorError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        tracing::trace!(model = %self.model, turns = messages.len(), "chat request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CollaboratorError::Backend(format!("{}: {}", status, body.trim())));
        }

        let body = response
            .text()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        parse_reply(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn chat_endpoint(host: &str) -> String {
    format!("{}/api/chat", host.trim_end_matches('/'))
}

fn parse_reply(body: &str) -> Result<String, CollaboratorError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
    parsed
        .message
        .map(|m| m.content)
        .ok_or_else(|| CollaboratorError::Malformed("response has no message".to_string()))
}
