//! Post-processing pipeline over the shared story state.
//!
//! A fixed four-stage sequence:
//! `generate_expansion` → `calculate_similarity` → `clean_outline` →
//! `write_to_memory`. Each stage fully completes, including its retries,
//! before the next begins; nothing runs concurrently.

use crate::embedding::{cosine_similarity, embed_one, Embedder, EmbeddingError};
use crate::generation::Generator;
use crate::interact::{interact, InteractError};
use crate::memory::{MemoryError, MemoryStore};
use crate::state::StoryState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Errors from pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("interaction failed: {0}")]
    Interact(#[from] InteractError),

    /// The round produced zero-length text. Fatal: the session must not
    /// silently proceed.
    #[error("the generated text is empty")]
    EmptyGeneration,

    /// `calculate_similarity` requires exactly two outlines in
    /// `recent_story`; running it after cleanup (or before the next outline
    /// is queued) violates that precondition.
    #[error("similarity requires exactly two outlines in recent_story, found {found}")]
    OutlinePairRequired { found: usize },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("sink error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only text sink for generated segments. Never reads or truncates
/// its target.
#[derive(Debug, Clone)]
pub struct StorySink {
    path: PathBuf,
}

impl StorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append text to the sink, creating the file if needed.
    pub async fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Stage 1: run the interaction controller and account for the new text.
///
/// The generated text is appended to the sink when one is configured;
/// either way it is returned for display.
pub async fn generate_expansion(
    generator: Arc<dyn Generator>,
    state: &mut StoryState,
    length: usize,
    sink: Option<&StorySink>,
) -> Result<String, PipelineError> {
    let text = interact(generator, state, length).await?;
    if text.is_empty() {
        return Err(PipelineError::EmptyGeneration);
    }

    state.total_story_length += text.chars().count();

    match sink {
        Some(sink) => {
            tracing::info!(path = %sink.path().display(), "appending story segment");
            sink.append(&text).await?;
        }
        None => tracing::info!(chars = text.chars().count(), "generated story segment"),
    }
    Ok(text)
}

/// Stage 2: embed the two most recent outlines and score their cosine
/// similarity.
///
/// Precondition: `state.recent_story` holds exactly two entries, the
/// previous round's outline and the current one. The caller guarantees this
/// before entering the stage.
pub async fn calculate_similarity(
    embedder: &dyn Embedder,
    state: &mut StoryState,
) -> Result<f32, PipelineError> {
    if state.recent_story.len() != 2 {
        return Err(PipelineError::OutlinePairRequired {
            found: state.recent_story.len(),
        });
    }

    // Single-item batches, embedded independently.
    let first = embed_one(embedder, &state.recent_story[0]).await?;
    let second = embed_one(embedder, &state.recent_story[1]).await?;

    let score = cosine_similarity(&first, &second);
    state.similarity = Some(score);
    tracing::info!(similarity = score, "scored outline similarity");
    Ok(score)
}

/// Stage 3: leave bootstrap for good and collapse `recent_story` to its
/// last entry. Idempotent.
pub fn clean_outline(state: &mut StoryState) {
    state.start_sign = false;
    if state.recent_story.len() > 1 {
        state.recent_story = state.recent_story.split_off(state.recent_story.len() - 1);
    }
}

/// Stage 4: hand the state to the memory collaborator, `store` then
/// `persist`. The state itself is left unchanged.
pub async fn write_to_memory(
    memory: &mut dyn MemoryStore,
    state: &StoryState,
) -> Result<(), PipelineError> {
    memory.store(state).await?;
    memory.persist(state).await?;
    Ok(())
}
