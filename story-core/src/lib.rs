//! Iterative story-expansion engine.
//!
//! This crate provides:
//! - A writer agent that expands plot outlines into prose, with length
//!   retries and outline re-synthesis
//! - A reader agent that critiques each segment for logical consistency and
//!   character growth
//! - An interaction controller running expand → critique → revise rounds
//! - A post-processing pipeline (expansion, outline similarity, cleanup,
//!   persistent memory) over a shared `StoryState`
//!
//! Text generation, embedding and memory are external collaborators behind
//! the `Generator`, `Embedder` and `MemoryStore` traits.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use story_core::{
//!     JsonMemoryStore, SessionConfig, StoryMeta, StorySession, StoryState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let meta = StoryMeta::new("fantasy", "Mira", "find the lost city", "English");
//!     let mut state = StoryState::new(meta, "Mira hears of the city", "Mira sets out");
//!
//!     let mut session = StorySession::from_env(
//!         Arc::new(my_embedder()),
//!         Box::new(JsonMemoryStore::new("story_memory.json")),
//!         SessionConfig::new().with_length(800),
//!     )?;
//!
//!     let text = session.run_round(&mut state).await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

pub mod embedding;
pub mod extract;
pub mod generation;
pub mod history;
pub mod interact;
pub mod memory;
pub mod pipeline;
pub mod prompts;
pub mod reader;
pub mod session;
pub mod state;
pub mod testing;
pub mod writer;

// Primary public API
pub use embedding::{cosine_similarity, Embedder, EmbeddingError};
pub use extract::{extract_between, ExtractError};
pub use generation::{ClaudeGenerator, GenerationError, Generator};
pub use history::{ChatMessage, Role, Transcript, TranscriptError};
pub use interact::{interact, InteractError};
pub use memory::{JsonMemoryStore, MemoryError, MemoryStore, SavedStory};
pub use pipeline::{
    calculate_similarity, clean_outline, generate_expansion, write_to_memory, PipelineError,
    StorySink,
};
pub use reader::{Critique, ReaderError, StoryReader};
pub use session::{SessionConfig, SessionError, StorySession};
pub use state::{StoryMeta, StoryState};
pub use writer::{StoryWriter, WriterError, MAX_GENERATION_ATTEMPTS};
