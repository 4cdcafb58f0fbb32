//! The interaction controller.
//!
//! Drives writer/reader critique rounds over the shared story state. The
//! first call of a session bootstraps with two full rounds (opening plus
//! continuation) and flips the start flag; every later call runs a single
//! continuation round.

use crate::generation::Generator;
use crate::reader::{ReaderError, StoryReader};
use crate::state::StoryState;
use crate::writer::{StoryWriter, WriterError};
use std::sync::Arc;
use thiserror::Error;

/// Errors from an interaction round.
#[derive(Debug, Error)]
pub enum InteractError {
    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("segment unavailable: story generation exhausted its retries")]
    SegmentUnavailable,
}

/// Run one controller invocation of expand, critique, revise; twice for a
/// bootstrapping session, once otherwise. Returns the revised text; the
/// bootstrap returns both segments concatenated in order.
pub async fn interact(
    generator: Arc<dyn Generator>,
    state: &mut StoryState,
    length: usize,
) -> Result<String, InteractError> {
    let mut writer = StoryWriter::new(generator.clone(), state, length);
    let reader = StoryReader::new(generator);

    if state.start_sign {
        tracing::info!("bootstrapping session with two critique rounds");

        let opening = writer
            .expand_opening(state)
            .await
            .ok_or(InteractError::SegmentUnavailable)?;
        let critique = reader.critique(state, &opening).await?;
        let first = writer.revise(state, &critique).await?;

        // One-shot: the session leaves bootstrap exactly here.
        state.start_sign = false;

        let continuation = writer
            .expand_continuation(state)
            .await
            .ok_or(InteractError::SegmentUnavailable)?;
        let critique = reader.critique(state, &continuation).await?;
        let last = writer.revise(state, &critique).await?;

        Ok(format!("{first}{last}"))
    } else {
        let draft = writer
            .expand_continuation(state)
            .await
            .ok_or(InteractError::SegmentUnavailable)?;
        let critique = reader.critique(state, &draft).await?;
        let revised = writer.revise(state, &critique).await?;
        Ok(revised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{all_markers_reply, sample_state, MockGenerator};

    #[tokio::test]
    async fn test_bootstrap_runs_two_rounds_and_flips_start() {
        let reply = all_markers_reply(900);
        let generator = Arc::new(MockGenerator::new().with_fallback(reply.clone()));

        let mut state = sample_state();
        let text = interact(generator, &mut state, 800).await.unwrap();

        // Two revised segments, concatenated in order.
        assert_eq!(text, format!("{reply}{reply}"));
        assert!(!state.start_sign);
    }

    #[tokio::test]
    async fn test_steady_state_runs_one_round() {
        let reply = all_markers_reply(900);
        let generator = Arc::new(MockGenerator::new().with_fallback(reply.clone()));

        let mut state = sample_state();
        state.start_sign = false;
        let text = interact(generator, &mut state, 800).await.unwrap();

        assert_eq!(text, reply);
    }

    #[tokio::test]
    async fn test_exhausted_segment_aborts_round() {
        let generator = Arc::new(MockGenerator::new().with_fallback("0123456789"));

        let mut state = sample_state();
        state.start_sign = false;
        let err = interact(generator, &mut state, 800).await.unwrap_err();
        assert!(matches!(err, InteractError::SegmentUnavailable));
    }

    #[tokio::test]
    async fn test_malformed_critique_propagates() {
        let generator = Arc::new(MockGenerator::new());
        // Segment succeeds, refresh succeeds, critique reply lacks markers.
        generator.queue_text("x".repeat(900));
        generator.queue_text("## new_outline:\nOutline B\n## END");
        generator.queue_text("not a critique");

        let mut state = sample_state();
        state.start_sign = false;
        let err = interact(generator, &mut state, 800).await.unwrap_err();
        assert!(matches!(err, InteractError::Reader(ReaderError::Parse(_))));
    }
}
