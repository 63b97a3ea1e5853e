// Tests for content-addressed chunk ids and in-run deduplication

use sitechunk_core::dedup::{Admission, CHUNK_ID_PREFIX, DeduplicationState, chunk_id};
use sitechunk_core::model::ChunkRecord;

fn record(id: &str) -> ChunkRecord {
    ChunkRecord {
        chunk_id: id.to_string(),
        page_id: "page_0000abcd".to_string(),
        page_title: "Title".to_string(),
        page_name: "index".to_string(),
        section_label: "Auto".to_string(),
        raw_text: "Existing text in the corpus.".to_string(),
        source_markup: None,
        tags: Vec::new(),
    }
}

// ============================================================================
// chunk_id() Tests
// ============================================================================

#[test]
fn test_chunk_id_format() {
    let id = chunk_id("Building rules apply.");
    assert!(id.starts_with(CHUNK_ID_PREFIX));
    let digest = &id[CHUNK_ID_PREFIX.len()..];
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_chunk_id_ignores_case_punctuation_and_spacing() {
    let a = chunk_id("Building rules apply.");
    assert_eq!(a, chunk_id("building   rules apply"));
    assert_eq!(a, chunk_id("BUILDING -- RULES, apply!"));
    assert_eq!(a, chunk_id("\nBuilding\trules\napply\n"));
}

#[test]
fn test_chunk_id_distinguishes_content() {
    assert_ne!(chunk_id("Building rules apply."), chunk_id("Parking rules apply."));
}

#[test]
fn test_chunk_id_is_stable_across_calls() {
    assert_eq!(chunk_id("same text"), chunk_id("same text"));
}

// ============================================================================
// DeduplicationState Tests
// ============================================================================

#[test]
fn test_first_admission_then_skip() {
    let mut state = DeduplicationState::new();

    let first = state.admit("Building rules apply.");
    assert!(first.is_admitted());

    let second = state.admit("building   rules apply");
    assert_eq!(second, Admission::Skipped(first.chunk_id().to_string()));
    assert_eq!(state.len(), 1);
}

#[test]
fn test_separate_states_do_not_share_ids() {
    let mut a = DeduplicationState::new();
    let mut b = DeduplicationState::new();

    assert!(a.admit("Footer text shown on every page.").is_admitted());
    assert!(b.admit("Footer text shown on every page.").is_admitted());
}

#[test]
fn test_from_records_seeds_seen_ids() {
    let known = chunk_id("Existing text in the corpus.");
    let mut state = DeduplicationState::from_records(&[record(&known)]);

    assert!(state.contains(&known));
    assert!(!state.admit("existing text in the corpus").is_admitted());
    assert!(state.admit("Brand new paragraph of text.").is_admitted());
}

#[test]
fn test_empty_state() {
    let state = DeduplicationState::default();
    assert!(state.is_empty());
    assert_eq!(state.len(), 0);
}
