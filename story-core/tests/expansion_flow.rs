//! End-to-end tests for the expansion pipeline, driven by the mock
//! capabilities. No API calls are made.

use std::path::PathBuf;
use std::sync::Arc;

use story_core::testing::{all_markers_reply, sample_state, MockEmbedder, MockGenerator};
use story_core::{
    calculate_similarity, clean_outline, generate_expansion, write_to_memory, JsonMemoryStore,
    SavedStory, SessionConfig, StorySession, StorySink, StoryWriter, MAX_GENERATION_ATTEMPTS,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("story-core-it-{}-{}", name, std::process::id()))
}

#[tokio::test]
async fn end_to_end_round_accounts_length_and_appends_to_sink() {
    let reply = all_markers_reply(900);
    let generator = Arc::new(MockGenerator::new().with_fallback(reply.clone()));

    let mut state = sample_state();
    state.start_sign = false;

    let sink_path = temp_path("sink");
    let sink = StorySink::new(&sink_path);

    let text = generate_expansion(generator, &mut state, 800, Some(&sink))
        .await
        .unwrap();

    assert_eq!(text, reply);
    assert_eq!(state.total_story_length, 900);

    let written = tokio::fs::read_to_string(&sink_path).await.unwrap();
    assert_eq!(written, reply);

    let _ = tokio::fs::remove_file(&sink_path).await;
}

#[tokio::test]
async fn sink_appends_without_truncating() {
    let sink_path = temp_path("append");
    tokio::fs::write(&sink_path, "existing content\n").await.unwrap();

    let sink = StorySink::new(&sink_path);
    sink.append("new segment").await.unwrap();

    let written = tokio::fs::read_to_string(&sink_path).await.unwrap();
    assert_eq!(written, "existing content\nnew segment");

    let _ = tokio::fs::remove_file(&sink_path).await;
}

#[tokio::test]
async fn bootstrap_generates_two_segments_and_flips_start() {
    let reply = all_markers_reply(900);
    let generator = Arc::new(MockGenerator::new().with_fallback(reply.clone()));

    let mut state = sample_state();
    assert!(state.start_sign);

    let text = generate_expansion(generator, &mut state, 800, None)
        .await
        .unwrap();

    assert_eq!(text.chars().count(), 1800);
    assert!(!state.start_sign);
    assert_eq!(state.total_story_length, 1800);
}

#[tokio::test]
async fn retry_exhaustion_returns_none_after_four_attempts() {
    // Ten characters, well under the 800 minimum, for every call.
    let generator = Arc::new(MockGenerator::new().with_fallback("0123456789"));

    let mut state = sample_state();
    state.start_sign = false;
    let mut writer = StoryWriter::new(generator.clone(), &state, 800);

    let result = writer.expand_continuation(&mut state).await;

    assert!(result.is_none());
    assert_eq!(generator.call_count(), MAX_GENERATION_ATTEMPTS);
    assert_eq!(writer.warnings().len(), MAX_GENERATION_ATTEMPTS);
}

#[tokio::test]
async fn similarity_of_identical_outlines_is_one() {
    let mut state = sample_state();
    assert_eq!(state.recent_story, vec!["Outline A", "Outline A"]);

    let score = calculate_similarity(&MockEmbedder, &mut state)
        .await
        .unwrap();

    assert!((score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn cleanup_twice_equals_cleanup_once() {
    let mut state = sample_state();

    clean_outline(&mut state);
    let once = state.recent_story.clone();
    assert_eq!(once.len(), 1);

    clean_outline(&mut state);
    assert_eq!(state.recent_story, once);
    assert!(!state.start_sign);
}

#[tokio::test]
async fn memory_receives_final_state() {
    let memory_path = temp_path("memory");
    let mut memory = JsonMemoryStore::new(&memory_path);

    let mut state = sample_state();
    state.total_story_length = 900;
    state.start_sign = false;

    write_to_memory(&mut memory, &state).await.unwrap();

    let saved = SavedStory::load_json(&memory_path).await.unwrap();
    assert_eq!(saved.state.total_story_length, 900);
    assert_eq!(saved.state.recent_story, state.recent_story);

    let _ = tokio::fs::remove_file(&memory_path).await;
}

#[tokio::test]
async fn session_rounds_accumulate_across_outlines() {
    let reply = all_markers_reply(900);
    let generator = Arc::new(MockGenerator::new().with_fallback(reply.clone()));

    let sink_path = temp_path("session-sink");
    let memory_path = temp_path("session-memory");

    let mut session = StorySession::new(
        generator,
        Arc::new(MockEmbedder),
        Box::new(JsonMemoryStore::new(&memory_path)),
        SessionConfig::new().with_length(800).with_sink_path(&sink_path),
    );

    let mut state = sample_state();
    state.start_sign = false;

    let first = session.run_round(&mut state).await.unwrap();
    assert_eq!(state.recent_story.len(), 1);

    state.advance_outline("Outline C");
    let second = session.run_round(&mut state).await.unwrap();

    assert_eq!(state.total_story_length, 1800);
    assert_eq!(state.recent_story.len(), 1);

    // The sink is append-only across rounds.
    let written = tokio::fs::read_to_string(&sink_path).await.unwrap();
    assert_eq!(written, format!("{first}{second}"));

    let _ = tokio::fs::remove_file(&sink_path).await;
    let _ = tokio::fs::remove_file(&memory_path).await;
}
