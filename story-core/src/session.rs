//! StorySession - the primary public API for story expansion.
//!
//! Wires the generation, embedding and memory collaborators to the pipeline
//! and runs it round by round over one `StoryState`.

use crate::embedding::Embedder;
use crate::generation::{ClaudeGenerator, Generator};
use crate::memory::MemoryStore;
use crate::pipeline::{
    calculate_similarity, clean_outline, generate_expansion, write_to_memory, PipelineError,
    StorySink,
};
use crate::state::StoryState;
use crate::writer::{StoryWriter, WriterError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("No API key configured - set ANTHROPIC_API_KEY environment variable")]
    NoApiKey,
}

/// Configuration for a story session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum character count per expanded segment.
    pub length: usize,

    /// Append-only file receiving every generated segment, when set.
    pub sink_path: Option<PathBuf>,

    /// Model override for the bundled Claude generator.
    pub model: Option<String>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            length: 800,
            sink_path: None,
            model: None,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub fn with_sink_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink_path = Some(path.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A story-expansion session.
///
/// Owns the collaborators; the caller owns the `StoryState` and threads it
/// through each round. Sessions are strictly sequential: one round fully
/// completes before the next starts.
pub struct StorySession {
    generator: Arc<dyn Generator>,
    embedder: Arc<dyn Embedder>,
    memory: Box<dyn MemoryStore>,
    sink: Option<StorySink>,
    length: usize,
}

impl StorySession {
    /// Create a session from explicit collaborators.
    pub fn new(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        memory: Box<dyn MemoryStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            generator,
            embedder,
            memory,
            sink: config.sink_path.as_ref().map(StorySink::new),
            length: config.length,
        }
    }

    /// Create a session backed by the Claude generator.
    ///
    /// Requires `ANTHROPIC_API_KEY` to be set.
    pub fn from_env(
        embedder: Arc<dyn Embedder>,
        memory: Box<dyn MemoryStore>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut client = claude::Claude::from_env().map_err(|_| SessionError::NoApiKey)?;
        if let Some(ref model) = config.model {
            client = client.with_model(model);
        }
        let generator: Arc<dyn Generator> = Arc::new(ClaudeGenerator::new(client));
        Ok(Self::new(generator, embedder, memory, config))
    }

    /// Run one full pipeline round:
    /// expand → similarity → cleanup → memory.
    ///
    /// Precondition: `state.recent_story` holds exactly two outlines (the
    /// previous round's and the current one). After the round it holds one;
    /// queue the next outline with [`StoryState::advance_outline`] before
    /// calling again.
    pub async fn run_round(&mut self, state: &mut StoryState) -> Result<String, SessionError> {
        if state.recent_story.len() != 2 {
            return Err(SessionError::Pipeline(PipelineError::OutlinePairRequired {
                found: state.recent_story.len(),
            }));
        }

        let text = generate_expansion(
            self.generator.clone(),
            state,
            self.length,
            self.sink.as_ref(),
        )
        .await?;
        calculate_similarity(self.embedder.as_ref(), state).await?;
        clean_outline(state);
        write_to_memory(self.memory.as_mut(), state).await?;

        Ok(text)
    }

    /// Dedupe and complete a finished story with one polish pass.
    pub async fn finish(&self, state: &StoryState, story: &str) -> Result<String, SessionError> {
        let writer = StoryWriter::new(self.generator.clone(), state, self.length);
        Ok(writer.polish(story).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::JsonMemoryStore;
    use crate::testing::{all_markers_reply, sample_state, MockEmbedder, MockGenerator};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("story-core-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_round_requires_outline_pair() {
        let generator = Arc::new(MockGenerator::new());
        let memory = Box::new(JsonMemoryStore::new(temp_path("session-pair")));
        let mut session = StorySession::new(
            generator,
            Arc::new(MockEmbedder),
            memory,
            SessionConfig::new(),
        );

        let mut state = sample_state();
        state.recent_story = vec!["only one".to_string()];
        let err = session.run_round(&mut state).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Pipeline(PipelineError::OutlinePairRequired { found: 1 })
        ));
    }

    #[tokio::test]
    async fn test_round_runs_all_stages() {
        let path = temp_path("session-round");
        let generator =
            Arc::new(MockGenerator::new().with_fallback(all_markers_reply(900)));
        let memory = Box::new(JsonMemoryStore::new(&path));
        let mut session = StorySession::new(
            generator,
            Arc::new(MockEmbedder),
            memory,
            SessionConfig::new(),
        );

        let mut state = sample_state();
        state.start_sign = false;
        let text = session.run_round(&mut state).await.unwrap();

        assert_eq!(text.chars().count(), 900);
        assert_eq!(state.total_story_length, 900);
        assert!(state.similarity.is_some());
        assert_eq!(state.recent_story.len(), 1);
        assert!(!state.start_sign);
        assert!(tokio::fs::try_exists(&path).await.unwrap());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
