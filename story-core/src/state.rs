//! Shared story state threaded through the expansion pipeline.
//!
//! One `StoryState` is created per session by the caller and passed `&mut`
//! through every stage: exclusive ownership, no ambient state. If sessions
//! are ever run side by side, each needs its own instance.

use serde::{Deserialize, Serialize};

/// Immutable session metadata describing the story being written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMeta {
    pub topic: String,
    pub main_character: String,
    pub main_goal: String,
    pub language: String,
}

impl StoryMeta {
    pub fn new(
        topic: impl Into<String>,
        main_character: impl Into<String>,
        main_goal: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            main_character: main_character.into(),
            main_goal: main_goal.into(),
            language: language.into(),
        }
    }
}

/// Mutable state for one story-expansion session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryState {
    /// Session metadata; never mutated after construction.
    pub meta: StoryMeta,

    /// At most two outlines. The first entry is the opening outline
    /// (meaningful only while `start_sign` holds); the last entry is the
    /// current outline consumed and refreshed by expansion rounds.
    pub recent_story: Vec<String>,

    /// True only before the first expansion call of the session; flipped to
    /// false exactly once, inside the two-round bootstrap.
    pub start_sign: bool,

    /// Running character count of everything generated so far.
    pub total_story_length: usize,

    /// Cosine similarity of the two most recent outline embeddings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

impl StoryState {
    /// Create the state for a fresh session from its opening and current
    /// outlines.
    pub fn new(
        meta: StoryMeta,
        opening_outline: impl Into<String>,
        current_outline: impl Into<String>,
    ) -> Self {
        Self {
            meta,
            recent_story: vec![opening_outline.into(), current_outline.into()],
            start_sign: true,
            total_story_length: 0,
            similarity: None,
        }
    }

    /// The outline driving the next expansion round.
    pub fn current_outline(&self) -> &str {
        self.recent_story.last().map(String::as_str).unwrap_or("")
    }

    /// The opening outline, available while the session is bootstrapping.
    pub fn opening_outline(&self) -> Option<&str> {
        if self.start_sign {
            self.recent_story.first().map(String::as_str)
        } else {
            None
        }
    }

    /// Queue the next outline for expansion, keeping the previous one around
    /// for the similarity stage. Any older entries are dropped so the
    /// two-outline bound holds.
    pub fn advance_outline(&mut self, outline: impl Into<String>) {
        if self.recent_story.len() > 1 {
            self.recent_story = self.recent_story.split_off(self.recent_story.len() - 1);
        }
        self.recent_story.push(outline.into());
    }
}
