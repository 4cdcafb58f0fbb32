//! Testing utilities for the story engine.
//!
//! `MockGenerator` and `MockEmbedder` stand in for the external
//! capabilities, enabling deterministic tests without API calls.

use crate::embedding::{Embedder, EmbeddingError};
use crate::generation::{GenerationError, Generator};
use crate::history::ChatMessage;
use crate::state::{StoryMeta, StoryState};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A generator that replays scripted replies in order.
///
/// When the script runs out, the fallback reply (if any) is returned for
/// every further call; otherwise calls fail with a transient error.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this reply whenever the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Queue a successful reply.
    pub fn queue_text(&self, text: impl Into<String>) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Ok(text.into()));
    }

    /// Queue a failed call.
    pub fn queue_error(&self, message: impl Into<String>) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Err(message.into()));
    }

    /// Number of generation calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().expect("script lock poisoned").pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::Provider(message)),
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => Err(GenerationError::Provider(
                    "no scripted reply remaining".to_string(),
                )),
            },
        }
    }
}

/// A deterministic embedder: a letter-frequency histogram, so identical
/// texts embed identically and unrelated texts diverge.
pub struct MockEmbedder;

#[async_trait]
impl Embedder for MockEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| letter_histogram(text)).collect())
    }
}

fn letter_histogram(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 26];
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() {
            vector[(c as u8 - b'a') as usize] += 1.0;
        }
    }
    vector
}

/// A fresh bootstrap-ready state with sample metadata and `"Outline A"` as
/// both outlines.
pub fn sample_state() -> StoryState {
    StoryState::new(
        StoryMeta::new("fantasy", "Mira", "find the lost city", "English"),
        "Outline A",
        "Outline A",
    )
}

/// A well-formed outline-refresh reply.
pub fn valid_refresh_reply(outline: &str) -> String {
    format!("## new_outline:\n{outline}\n## END")
}

/// A reply of exactly `length` characters that satisfies every parser in
/// one round: empty critique sections, a refreshed outline, and filler
/// padding to reach the requested length.
pub fn all_markers_reply(length: usize) -> String {
    let mut reply = String::from(
        "## logical detail confusion:\n\n## character growth confusion:\n\n## END\n\
         ## new_outline:\nOutline B\n## END\n",
    );
    let padding = length.saturating_sub(reply.chars().count());
    reply.extend(std::iter::repeat('x').take(padding));
    reply
}
