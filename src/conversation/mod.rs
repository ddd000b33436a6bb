//! Conversation bridge to a local Ollama server
//!
//! Unmatched utterances fall back to a stateful chat exchange: the
//! bridge posts the rolling history plus the new user turn to
//! `/api/chat` and appends both sides of the exchange on success.
//! History grows unbounded for the life of the process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

/// Errors from the conversation bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("language model is unavailable: {0}")]
    ModelUnavailable(String),
}

/// Stateful conversational exchange; mocked in dispatcher tests
#[async_trait]
pub trait ConversationBridge: Send {
    /// Send one user turn and return the model's reply.
    ///
    /// On failure, history must be left untouched.
    async fn converse(&mut self, text: &str) -> Result<String, BridgeError>;
}

/// One turn of the conversation, in Ollama chat format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Ollama-backed conversation bridge
pub struct OllamaBridge {
    client: reqwest::Client,
    chat_url: String,
    probe_url: String,
    model: String,
    system_instruction: String,
    history: Vec<ChatMessage>,
}

impl OllamaBridge {
    pub fn new(config: &Config) -> Self {
        let base = config.ollama_url.trim_end_matches('/');
        Self {
            client: reqwest::Client::new(),
            chat_url: format!("{base}/api/chat"),
            probe_url: format!("{base}/api/tags"),
            model: config.ollama_model.clone(),
            system_instruction: config.language_instruction.clone(),
            history: Vec::new(),
        }
    }

    /// One-shot availability check, used at startup to decide whether
    /// the fallback path is offered at all
    pub async fn probe(&self) -> Result<(), BridgeError> {
        let response = self
            .client
            .get(&self.probe_url)
            .send()
            .await
            .map_err(|e| BridgeError::ModelUnavailable(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| BridgeError::ModelUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Number of stored turns (user and assistant counted separately)
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[async_trait]
impl ConversationBridge for OllamaBridge {
    async fn converse(&mut self, text: &str) -> Result<String, BridgeError> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::new("system", &self.system_instruction));
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::new("user", text));

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        debug!(turns = self.history.len(), "sending conversation turn");

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::ModelUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| BridgeError::ModelUnavailable(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::ModelUnavailable(e.to_string()))?;

        let reply = parsed.message.content.trim().to_string();

        // Only a successful exchange is recorded.
        self.history.push(ChatMessage::new("user", text));
        self.history.push(ChatMessage::new("assistant", &reply));

        Ok(reply)
    }
}
