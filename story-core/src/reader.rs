//! The reader agent.
//!
//! Simulates a careful reader of the expanded story: one generation
//! round-trip per segment, parsed into a logical-consistency critique and a
//! character-growth critique. An empty section is a valid "no issue found"
//! signal, not an error.

use crate::extract::{extract_between, ExtractError};
use crate::generation::{GenerationError, Generator};
use crate::history::ChatMessage;
use crate::prompts::{
    reader_request_prompt, reader_system_prompt, CHARACTER_MARKER, END_MARKER, LOGICAL_MARKER,
};
use crate::state::StoryState;
use std::sync::Arc;
use thiserror::Error;

/// Errors from a critique round. Both are terminal for the current round:
/// a failed invocation means the reader never spoke, and a malformed reply
/// means the generation capability broke the marker protocol.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("critique generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("critique reply malformed: {0}")]
    Parse(#[from] ExtractError),
}

/// Reader feedback on one story segment.
#[derive(Debug, Clone, Default)]
pub struct Critique {
    /// Logical-consistency confusion and suggestions; empty when none.
    pub logical: String,

    /// Character-growth confusion and suggestions; empty when none.
    pub character_growth: String,
}

impl Critique {
    pub fn new(logical: impl Into<String>, character_growth: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            character_growth: character_growth.into(),
        }
    }

    /// True when the reader found nothing to flag.
    pub fn is_clean(&self) -> bool {
        self.logical.is_empty() && self.character_growth.is_empty()
    }
}

/// The reader agent.
pub struct StoryReader {
    generator: Arc<dyn Generator>,
}

impl StoryReader {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Read one segment and report critique. Invokes generation exactly once.
    pub async fn critique(
        &self,
        state: &StoryState,
        segment: &str,
    ) -> Result<Critique, ReaderError> {
        tracing::info!("reader is reading");

        let messages = [
            ChatMessage::system(reader_system_prompt(&state.meta)),
            ChatMessage::human(reader_request_prompt(&state.meta, segment)),
        ];
        let reply = self.generator.generate(&messages).await?;

        let logical = extract_between(&reply, LOGICAL_MARKER, CHARACTER_MARKER)?
            .trim()
            .to_string();
        let character_growth = extract_between(&reply, CHARACTER_MARKER, END_MARKER)?
            .trim()
            .to_string();

        Ok(Critique {
            logical,
            character_growth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_state, MockGenerator};

    #[tokio::test]
    async fn test_critique_parses_both_sections() {
        let generator = Arc::new(MockGenerator::new());
        generator.queue_text(
            "## logical detail confusion:\nThe cave appears out of nowhere.\n\
             ## character growth confusion:\nMira changes her mind too fast.\n## END",
        );

        let reader = StoryReader::new(generator);
        let critique = reader
            .critique(&sample_state(), "segment text")
            .await
            .unwrap();

        assert_eq!(critique.logical, "The cave appears out of nowhere.");
        assert_eq!(critique.character_growth, "Mira changes her mind too fast.");
        assert!(!critique.is_clean());
    }

    #[tokio::test]
    async fn test_empty_sections_mean_no_issue() {
        let generator = Arc::new(MockGenerator::new());
        generator.queue_text(
            "## logical detail confusion:\n\n## character growth confusion:\n\n## END",
        );

        let reader = StoryReader::new(generator);
        let critique = reader
            .critique(&sample_state(), "segment text")
            .await
            .unwrap();

        assert!(critique.is_clean());
    }

    #[tokio::test]
    async fn test_missing_marker_is_parse_error() {
        let generator = Arc::new(MockGenerator::new());
        generator.queue_text("no markers at all");

        let reader = StoryReader::new(generator);
        let err = reader
            .critique(&sample_state(), "segment text")
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::Parse(_)));
    }

    #[tokio::test]
    async fn test_generation_failure_is_terminal() {
        let generator = Arc::new(MockGenerator::new());
        generator.queue_error("backend down");

        let reader = StoryReader::new(generator);
        let err = reader
            .critique(&sample_state(), "segment text")
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::Generation(_)));
    }
}
