//! Run one bootstrap expansion round against the live API.
//!
//! Usage: `ANTHROPIC_API_KEY=... cargo run -p story-core --example expand_story`

use std::sync::Arc;

use story_core::testing::MockEmbedder;
use story_core::{
    JsonMemoryStore, SessionConfig, StoryMeta, StorySession, StoryState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let meta = StoryMeta::new(
        "high fantasy",
        "Mira",
        "find the lost city beneath the dunes",
        "English",
    );
    let mut state = StoryState::new(
        meta,
        "Mira hears a dying cartographer whisper of the lost city",
        "Mira bargains for a caravan berth and leaves the port at night",
    );

    // The embedding model is an external collaborator; the deterministic
    // test embedder keeps this example self-contained.
    let mut session = StorySession::from_env(
        Arc::new(MockEmbedder),
        Box::new(JsonMemoryStore::new("story_memory.json")),
        SessionConfig::new()
            .with_length(600)
            .with_sink_path("story.txt"),
    )?;

    println!("Expanding the opening rounds...");
    let text = session.run_round(&mut state).await?;

    println!("\n{text}\n");
    println!(
        "total {} characters, outline similarity {:?}",
        state.total_story_length, state.similarity
    );
    Ok(())
}
