//! Conversation transcript for one writer invocation.
//!
//! The writer's transcript must hold exactly
//! `[system, human, assistant]` before and after a revision round; the
//! transient revision request is removed by reconstruction, never by popping
//! individual entries, so role ordering can't be corrupted.

use std::fmt;
use thiserror::Error;

/// Role of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    Human,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::Human => write!(f, "human"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A role-tagged message.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Violations of the transcript shape invariant.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("conversation history holds {found} messages, expected {expected}")]
    Length { expected: usize, found: usize },

    #[error("conversation history role mismatch at position {position}: expected {expected}, found {found}")]
    RoleMismatch {
        position: usize,
        expected: Role,
        found: Role,
    },
}

/// The canonical post-expansion transcript shape.
const CANONICAL_SHAPE: [Role; 3] = [Role::System, Role::Human, Role::Assistant];

/// An ordered conversation transcript, scoped to one writer invocation.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The roles in order, for shape checks and diagnostics.
    pub fn roles(&self) -> Vec<Role> {
        self.messages.iter().map(|m| m.role).collect()
    }

    /// Assert the `[system, human, assistant]` shape.
    pub fn require_canonical(&self) -> Result<(), TranscriptError> {
        if self.messages.len() != CANONICAL_SHAPE.len() {
            return Err(TranscriptError::Length {
                expected: CANONICAL_SHAPE.len(),
                found: self.messages.len(),
            });
        }
        for (position, (message, expected)) in
            self.messages.iter().zip(CANONICAL_SHAPE).enumerate()
        {
            if message.role != expected {
                return Err(TranscriptError::RoleMismatch {
                    position,
                    expected,
                    found: message.role,
                });
            }
        }
        Ok(())
    }
}
