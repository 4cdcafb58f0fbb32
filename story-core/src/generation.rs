//! The text-generation capability.
//!
//! Generation is an external collaborator behind the [`Generator`] trait:
//! a blocking round-trip from a role-tagged conversation to plain text.
//! [`ClaudeGenerator`] adapts the `claude` client to it.

use crate::history::{ChatMessage, Role};
use async_trait::async_trait;
use claude::{Claude, Message, Request};
use thiserror::Error;

/// Errors from a generation round-trip. All variants are treated as
/// transient by the writer's retry loops.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<claude::Error> for GenerationError {
    fn from(err: claude::Error) -> Self {
        match err {
            claude::Error::Api { status, message } => GenerationError::Api { status, message },
            claude::Error::Network(message) => GenerationError::Network(message),
            other => GenerationError::Provider(other.to_string()),
        }
    }
}

/// An opaque text-generation capability: `generate(messages) -> text`.
///
/// Implementations are process-wide shared, stateless after init, and may
/// fail transiently; retry policy belongs to the caller.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;
}

/// [`Generator`] backed by the Anthropic Messages API.
pub struct ClaudeGenerator {
    client: Claude,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl ClaudeGenerator {
    /// Wrap an existing client.
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            max_tokens: 4096,
            temperature: None,
        }
    }

    /// Create from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, claude::Error> {
        Ok(Self::new(Claude::from_env()?))
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl Generator for ClaudeGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        // System entries collapse into the request's system prompt; the
        // Messages API takes only user/assistant turns in the message list.
        let mut system = String::new();
        let mut chat = Vec::new();
        for message in messages {
            match message.role {
                Role::System => {
                    if !system.is_empty() {
                        system.push('\n');
                    }
                    system.push_str(&message.content);
                }
                Role::Human => chat.push(Message::user(&message.content)),
                Role::Assistant => chat.push(Message::assistant(&message.content)),
            }
        }

        let mut request = Request::new(chat).with_max_tokens(self.max_tokens);
        if !system.is_empty() {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.client.complete(request).await?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_error_mapping() {
        let err: GenerationError = claude::Error::Network("timed out".to_string()).into();
        assert!(matches!(err, GenerationError::Network(_)));

        let err: GenerationError = claude::Error::Api {
            status: 529,
            message: "overloaded".to_string(),
        }
        .into();
        assert!(matches!(err, GenerationError::Api { status: 529, .. }));

        let err: GenerationError = claude::Error::NoApiKey.into();
        assert!(matches!(err, GenerationError::Provider(_)));
    }
}
