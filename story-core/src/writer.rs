//! The writer agent.
//!
//! Expands an outline into a prose segment of at least the configured
//! length, retrying on transient generation failures and length shortfalls,
//! then re-derives the outline from whatever details the expansion invented.
//! A revision entry point edits the previous segment per reader critique
//! while keeping the conversation transcript in its canonical shape.

use crate::extract::{extract_between, ExtractError};
use crate::generation::{GenerationError, Generator};
use crate::history::{ChatMessage, Transcript, TranscriptError};
use crate::prompts::{
    finish_story_prompt, outline_refresh_prompt, writer_initial_prompt, writer_revision_prompt,
    writer_system_prompt, END_MARKER, NEW_OUTLINE_MARKER, WHOLE_STORY_MARKER,
};
use crate::reader::Critique;
use crate::state::{StoryMeta, StoryState};
use std::sync::Arc;
use thiserror::Error;

/// Maximum generation attempts per call site.
pub const MAX_GENERATION_ATTEMPTS: usize = 4;

/// Errors from the writer agent.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("revision generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("reply malformed: {0}")]
    Parse(#[from] ExtractError),

    #[error("conversation history invariant violated: {0}")]
    History(#[from] TranscriptError),
}

/// The writer agent. Created fresh per controller invocation; its transcript
/// never outlives the call.
pub struct StoryWriter {
    generator: Arc<dyn Generator>,
    meta: StoryMeta,
    /// Opening outline, captured at construction while the session is
    /// bootstrapping. Not tracked across refreshes.
    opening_outline: Option<String>,
    /// Current outline; tracks refreshes so a following revision sees the
    /// re-derived outline.
    current_outline: String,
    /// Minimum segment length, in characters of the raw reply.
    length: usize,
    transcript: Transcript,
    text: String,
    warnings: Vec<String>,
}

impl StoryWriter {
    pub fn new(generator: Arc<dyn Generator>, state: &StoryState, length: usize) -> Self {
        Self {
            generator,
            meta: state.meta.clone(),
            opening_outline: if state.start_sign {
                state.recent_story.first().cloned()
            } else {
                None
            },
            current_outline: state.current_outline().to_string(),
            length,
            transcript: Transcript::new(),
            text: String::new(),
            warnings: Vec::new(),
        }
    }

    /// Warnings recorded by the retry loops, one per failed attempt.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The most recently generated segment.
    pub fn last_text(&self) -> &str {
        &self.text
    }

    /// The transcript, for shape inspection.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Expand the session's opening outline into the first segment.
    ///
    /// Returns `None` when all attempts are exhausted; the caller must abort
    /// the round and not advance state.
    pub async fn expand_opening(&mut self, state: &mut StoryState) -> Option<String> {
        tracing::info!("expanding opening segment");
        let outline = self.opening_outline().to_string();

        let text = self.generate_segment(&outline).await?;
        if let Some(new_outline) = self.refresh_outline(&outline, &text).await {
            if let Some(slot) = state.recent_story.first_mut() {
                *slot = new_outline;
            }
        }
        Some(text)
    }

    /// Expand the current outline into the next segment.
    ///
    /// Same retry and length contract as [`Self::expand_opening`]; on success
    /// the refreshed outline replaces the last `recent_story` entry.
    pub async fn expand_continuation(&mut self, state: &mut StoryState) -> Option<String> {
        tracing::info!("expanding continuation segment");
        let outline = self.current_outline.clone();

        let text = self.generate_segment(&outline).await?;
        if let Some(new_outline) = self.refresh_outline(&outline, &text).await {
            if let Some(slot) = state.recent_story.last_mut() {
                *slot = new_outline.clone();
            }
            self.current_outline = new_outline;
        }
        Some(text)
    }

    /// Rewrite the previous segment per reader critique.
    ///
    /// The transcript must hold exactly `[system, human, assistant]` on
    /// entry; the transient revision request is removed afterwards by
    /// rebuilding that shape around the new reply.
    pub async fn revise(
        &mut self,
        state: &StoryState,
        critique: &Critique,
    ) -> Result<String, WriterError> {
        tracing::info!("revising segment with reader feedback");
        self.transcript.require_canonical()?;

        let outline = if state.start_sign {
            self.opening_outline().to_string()
        } else {
            self.current_outline.clone()
        };

        // Re-seed so the initial messages reflect the outline as it stands
        // now, then append the transient revision request.
        self.rebuild_transcript(&outline);
        self.transcript.push(ChatMessage::human(writer_revision_prompt(
            &self.meta,
            &outline,
            &critique.logical,
            &critique.character_growth,
        )));

        let text = self
            .generator
            .generate(self.transcript.messages())
            .await?;
        self.text = text.clone();

        self.rebuild_transcript(&outline);
        self.transcript.require_canonical()?;
        Ok(text)
    }

    /// Callable dispatch: without critique, run the expansion appropriate to
    /// the session's start flag; with critique, run a revision.
    pub async fn step(
        &mut self,
        state: &mut StoryState,
        critique: Option<&Critique>,
    ) -> Result<Option<String>, WriterError> {
        match critique {
            None => {
                if state.start_sign {
                    Ok(self.expand_opening(state).await)
                } else {
                    Ok(self.expand_continuation(state).await)
                }
            }
            Some(critique) => self.revise(state, critique).await.map(Some),
        }
    }

    /// Dedupe repetition and complete a trailing unfinished sentence in a
    /// finished story.
    pub async fn polish(&self, story: &str) -> Result<String, WriterError> {
        let messages = [ChatMessage::human(finish_story_prompt(
            &self.meta.language,
            story,
        ))];
        let reply = self.generator.generate(&messages).await?;
        Ok(extract_between(&reply, WHOLE_STORY_MARKER, END_MARKER)?
            .trim()
            .to_string())
    }

    fn opening_outline(&self) -> &str {
        self.opening_outline
            .as_deref()
            .unwrap_or(&self.current_outline)
    }

    fn seed_transcript(&mut self, outline: &str) {
        self.transcript.clear();
        self.transcript
            .push(ChatMessage::system(writer_system_prompt(&self.meta, outline)));
        self.transcript.push(ChatMessage::human(writer_initial_prompt(
            &self.meta,
            outline,
            self.length,
        )));
    }

    fn rebuild_transcript(&mut self, outline: &str) {
        self.seed_transcript(outline);
        self.transcript.push(ChatMessage::assistant(self.text.clone()));
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Run the expansion retry loop against one outline. Generation failures
    /// and length shortfalls both count as failed attempts.
    async fn generate_segment(&mut self, outline: &str) -> Option<String> {
        self.seed_transcript(outline);

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            match self.generator.generate(self.transcript.messages()).await {
                Ok(text) if text.chars().count() >= self.length => {
                    self.transcript.push(ChatMessage::assistant(text.clone()));
                    self.text = text.clone();
                    return Some(text);
                }
                Ok(text) => self.warn(format!(
                    "expansion attempt {attempt}/{MAX_GENERATION_ATTEMPTS} returned {} characters, below the minimum {}",
                    text.chars().count(),
                    self.length,
                )),
                Err(err) => self.warn(format!(
                    "expansion attempt {attempt}/{MAX_GENERATION_ATTEMPTS} failed: {err}"
                )),
            }
        }

        tracing::warn!(
            "giving up on outline \"{}\" after {MAX_GENERATION_ATTEMPTS} attempts; try again later or switch models",
            outline_preview(outline),
        );
        None
    }

    /// Re-derive the outline from the expanded segment. Exhaustion is
    /// non-fatal: the stale outline stays in place.
    async fn refresh_outline(&self, outline: &str, story: &str) -> Option<String> {
        let messages = [ChatMessage::human(outline_refresh_prompt(
            &self.meta, outline, story,
        ))];

        for _ in 0..MAX_GENERATION_ATTEMPTS {
            match self.generator.generate(&messages).await {
                Ok(reply) => match extract_between(&reply, NEW_OUTLINE_MARKER, END_MARKER) {
                    Ok(new_outline) => return Some(new_outline.trim().to_string()),
                    Err(err) => tracing::debug!("outline refresh reply malformed: {err}"),
                },
                Err(err) => tracing::debug!("outline refresh failed: {err}"),
            }
        }

        tracing::debug!("keeping stale outline after {MAX_GENERATION_ATTEMPTS} refresh attempts");
        None
    }
}

fn outline_preview(outline: &str) -> &str {
    match outline.char_indices().nth(50) {
        Some((index, _)) => &outline[..index],
        None => outline,
    }
}
