// Tests for corpus assembly

use sitechunk_core::assemble::{AcceptedChunk, CorpusAssembler};
use sitechunk_core::model::PageIdentity;
use sitechunk_core::tagging::Tagger;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns fixed tags and counts invocations.
#[derive(Default)]
struct CountingTagger {
    calls: AtomicUsize,
}

impl Tagger for CountingTagger {
    fn extract_tags(&self, _text: &str, max_tags: usize) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ["alpha", "beta", "gamma"]
            .iter()
            .take(max_tags)
            .map(|s| s.to_string())
            .collect()
    }
}

fn page(path: &str, name: &str, title: &str) -> PageIdentity {
    PageIdentity {
        source_path: path.to_string(),
        page_name: name.to_string(),
        page_title: title.to_string(),
    }
}

fn accepted(id: &str, path: &str, text: &str) -> AcceptedChunk {
    AcceptedChunk {
        chunk_id: id.to_string(),
        source_path: path.to_string(),
        section_label: "Auto".to_string(),
        text: text.to_string(),
        source_markup: None,
    }
}

// ============================================================================
// Tagging Contract Tests
// ============================================================================

#[test]
fn test_short_chunk_gets_no_tags_and_tagger_is_not_called() {
    let tagger = CountingTagger::default();
    let mut assembler = CorpusAssembler::new(&tagger);

    let pages = vec![page("https://example.com/", "index", "Home")];
    let records = assembler.assemble(&pages, &[accepted("chunk_a", "https://example.com/", "0123456789")]);

    assert_eq!(records.len(), 1);
    assert!(records[0].tags.is_empty());
    assert_eq!(tagger.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_long_chunk_is_tagged_with_max_tags() {
    let tagger = CountingTagger::default();
    let mut assembler = CorpusAssembler::new(&tagger).with_max_tags(2);

    let pages = vec![page("https://example.com/", "index", "Home")];
    let records = assembler.assemble(
        &pages,
        &[accepted("chunk_a", "https://example.com/", "Long enough text for the tagger.")],
    );

    assert_eq!(records[0].tags, vec!["alpha", "beta"]);
    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Page Identity Tests
// ============================================================================

#[test]
fn test_page_id_is_consistent_per_source_path() {
    let tagger = CountingTagger::default();
    let mut assembler = CorpusAssembler::new(&tagger);

    let pages = vec![
        page("https://example.com/a", "a", "Page A"),
        page("https://example.com/b", "b", "Page B"),
    ];
    let chunks = vec![
        accepted("chunk_1", "https://example.com/a", "First chunk from page A text."),
        accepted("chunk_2", "https://example.com/b", "First chunk from page B text."),
        accepted("chunk_3", "https://example.com/a", "Second chunk from page A text."),
    ];
    let records = assembler.assemble(&pages, &chunks);

    assert_eq!(records[0].page_id, records[2].page_id);
    assert_ne!(records[0].page_id, records[1].page_id);
    assert!(records[0].page_id.starts_with("page_"));
    assert_eq!(records[0].page_id.len(), "page_".len() + 8);
    assert_eq!(assembler.registry().len(), 2);
}

#[test]
fn test_page_ids_persist_across_assemble_calls() {
    let tagger = CountingTagger::default();
    let mut assembler = CorpusAssembler::new(&tagger);
    let pages = vec![page("https://example.com/a", "a", "Page A")];

    let first = assembler.assemble(&pages, &[accepted("chunk_1", "https://example.com/a", "Some text for page A here.")]);
    let second = assembler.assemble(&pages, &[accepted("chunk_2", "https://example.com/a", "More text for page A here.")]);

    assert_eq!(first[0].page_id, second[0].page_id);
}

#[test]
fn test_output_preserves_input_order_and_fields() {
    let tagger = CountingTagger::default();
    let mut assembler = CorpusAssembler::new(&tagger);

    let pages = vec![page("/docs/rules.html", "rules", "House Rules")];
    let mut chunk = accepted("chunk_z", "/docs/rules.html", "Quiet hours begin at ten at night.");
    chunk.section_label = "Noise".to_string();
    chunk.source_markup = Some("<p>Quiet hours begin at ten at night.</p>".to_string());
    let chunks = vec![chunk, accepted("chunk_a", "/docs/rules.html", "Bins are collected every Monday.")];

    let records = assembler.assemble(&pages, &chunks);

    let ids: Vec<&str> = records.iter().map(|r| r.chunk_id.as_str()).collect();
    assert_eq!(ids, vec!["chunk_z", "chunk_a"]);
    assert_eq!(records[0].page_title, "House Rules");
    assert_eq!(records[0].page_name, "rules");
    assert_eq!(records[0].section_label, "Noise");
    assert_eq!(
        records[0].source_markup.as_deref(),
        Some("<p>Quiet hours begin at ten at night.</p>")
    );
}

#[test]
fn test_unknown_page_falls_back_to_source_path() {
    let tagger = CountingTagger::default();
    let mut assembler = CorpusAssembler::new(&tagger);

    let records = assembler.assemble(&[], &[accepted("chunk_1", "orphan.txt", "Text without a page identity.")]);

    assert_eq!(records[0].page_name, "orphan.txt");
    assert_eq!(records[0].page_title, "orphan.txt");
}
