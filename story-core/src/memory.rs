//! Persistent memory for story state.
//!
//! The pipeline only guarantees it calls `store` then `persist`, in that
//! order; what the collaborator does with the snapshot is its business.
//! [`JsonMemoryStore`] is the bundled implementation: a versioned JSON
//! snapshot on disk.

use crate::state::StoryState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// The external memory collaborator.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Record the current state snapshot in working memory.
    async fn store(&mut self, state: &StoryState) -> Result<(), MemoryError>;

    /// Flush working memory to durable storage.
    async fn persist(&mut self, state: &StoryState) -> Result<(), MemoryError>;
}

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// A saved story snapshot with everything needed to resume the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStory {
    /// Snapshot format version for compatibility checking.
    pub version: u32,

    /// When the snapshot was taken.
    pub saved_at: String,

    /// The complete story state.
    pub state: StoryState,
}

impl SavedStory {
    /// Snapshot the given state now.
    pub fn new(state: StoryState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            state,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), MemoryError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SNAPSHOT_VERSION {
            return Err(MemoryError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// [`MemoryStore`] backed by a JSON snapshot file.
pub struct JsonMemoryStore {
    path: PathBuf,
    snapshot: Option<SavedStory>,
}

impl JsonMemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MemoryStore for JsonMemoryStore {
    async fn store(&mut self, state: &StoryState) -> Result<(), MemoryError> {
        self.snapshot = Some(SavedStory::new(state.clone()));
        Ok(())
    }

    async fn persist(&mut self, state: &StoryState) -> Result<(), MemoryError> {
        let snapshot = self
            .snapshot
            .get_or_insert_with(|| SavedStory::new(state.clone()));
        tracing::info!(path = %self.path.display(), "persisting story snapshot");
        snapshot.save_json(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_state;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("story-core-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_store_then_persist_round_trips() {
        let path = temp_path("round-trip");
        let mut memory = JsonMemoryStore::new(&path);

        let mut state = sample_state();
        state.total_story_length = 900;
        memory.store(&state).await.unwrap();
        memory.persist(&state).await.unwrap();

        let saved = SavedStory::load_json(&path).await.unwrap();
        assert_eq!(saved.version, SNAPSHOT_VERSION);
        assert_eq!(saved.state.total_story_length, 900);
        assert_eq!(saved.state.recent_story, state.recent_story);

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let path = temp_path("version");
        let mut saved = SavedStory::new(sample_state());
        saved.version = 99;
        let content = serde_json::to_string_pretty(&saved).unwrap();
        fs::write(&path, content).await.unwrap();

        let err = SavedStory::load_json(&path).await.unwrap_err();
        assert!(matches!(
            err,
            MemoryError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: 99
            }
        ));

        let _ = fs::remove_file(&path).await;
    }
}
