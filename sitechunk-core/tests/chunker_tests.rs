// Tests for boundary-aware chunking

use sitechunk_core::chunker::{
    Chunker, ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, MIN_CONTENT_LENGTH,
};
use sitechunk_core::error::CorpusError;

fn chunker(target: usize, overlap: usize) -> Chunker {
    Chunker::new(ChunkerConfig::new(target, overlap).unwrap())
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{:02}", i)).collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_default_config() {
    let config = ChunkerConfig::default();
    assert_eq!(config.target_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.overlap, DEFAULT_CHUNK_OVERLAP);
    assert_eq!(config.min_length, MIN_CONTENT_LENGTH);
}

#[test]
fn test_config_rejects_zero_size() {
    assert!(matches!(ChunkerConfig::new(0, 0), Err(CorpusError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_overlap_not_smaller_than_size() {
    assert!(matches!(ChunkerConfig::new(100, 100), Err(CorpusError::InvalidConfig(_))));
    assert!(ChunkerConfig::new(100, 99).is_ok());
}

// ============================================================================
// split() Tests
// ============================================================================

#[test]
fn test_short_text_is_one_segment() {
    let segments = chunker(500, 50).split("A single short paragraph.");
    assert_eq!(segments, vec!["A single short paragraph."]);
}

#[test]
fn test_empty_text_has_no_segments() {
    assert!(chunker(500, 50).split("").is_empty());
    assert!(chunker(500, 50).split("   \n\n  ").is_empty());
}

#[test]
fn test_paragraph_boundaries_are_preferred() {
    let first = "First paragraph talks about parking permits for residents.";
    let second = "Second paragraph covers the rules for visitors and guests.";
    let text = format!("{}\n\n{}", first, second);

    let segments = chunker(70, 0).split(&text);
    assert_eq!(segments, vec![first.to_string(), second.to_string()]);
}

#[test]
fn test_sentence_boundaries_inside_long_paragraph() {
    let text = "Pets are allowed on leash. Quiet hours start at ten. Bins go out on Monday.";
    let segments = chunker(30, 0).split(text);

    assert_eq!(
        segments,
        vec!["Pets are allowed on leash.", "Quiet hours start at ten.", "Bins go out on Monday."]
    );
}

#[test]
fn test_segments_never_exceed_target() {
    let text = words(200);
    for segment in chunker(40, 10).split(&text) {
        assert!(segment.chars().count() <= 40, "segment too long: {:?}", segment);
    }
}

#[test]
fn test_unbroken_text_falls_back_to_characters() {
    let text = "x".repeat(95);
    let segments = chunker(30, 0).split(&text);

    assert_eq!(segments.len(), 4);
    assert!(segments.iter().all(|s| s.chars().count() <= 30));
    assert_eq!(segments.concat(), text);
}

#[test]
fn test_consecutive_segments_overlap() {
    let text = words(60);
    let segments = chunker(40, 10).split(&text);
    assert!(segments.len() > 2);

    for pair in segments.windows(2) {
        let next_first = pair[1].split(' ').next().unwrap();
        assert!(
            pair[0].contains(next_first),
            "{:?} does not carry into {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_zero_overlap_does_not_repeat_text() {
    let text = words(60);
    let segments = chunker(40, 0).split(&text);
    let rejoined = segments.join(" ");
    assert_eq!(rejoined, text);
}

#[test]
fn test_lengths_count_characters_not_bytes() {
    // 10 four-byte characters fit in a 10-character target
    let text = "🦀".repeat(10);
    assert_eq!(chunker(10, 0).split(&text), vec![text.clone()]);
}

// ============================================================================
// chunk() Tests
// ============================================================================

#[test]
fn test_chunk_drops_short_boilerplate() {
    let text = "Home\n\nThis paragraph is long enough to keep around.";
    let segments = chunker(30, 0).chunk(text);

    assert!(segments.iter().all(|s| s.chars().count() >= MIN_CONTENT_LENGTH));
    assert!(!segments.iter().any(|s| s == "Home"));
}

#[test]
fn test_chunk_cleans_segments() {
    let text = "Residents\u{2019}   parking   permits\n are renewed yearly.";
    let segments = chunker(500, 50).chunk(text);
    assert_eq!(segments, vec!["Residents' parking permits are renewed yearly."]);
}

#[test]
fn test_chunk_respects_custom_min_length() {
    let config = ChunkerConfig::new(100, 0).unwrap().with_min_length(5);
    let segments = Chunker::new(config).chunk("Short");
    assert_eq!(segments, vec!["Short"]);
}
