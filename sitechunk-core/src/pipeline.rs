use crate::assemble::{AcceptedChunk, CorpusAssembler, DEFAULT_MAX_TAGS};
use crate::chunker::{Chunker, ChunkerConfig};
use crate::dedup::{Admission, DeduplicationState};
use crate::error::Result;
use crate::model::{ChunkRecord, PageIdentity};
use crate::normalize::clean;
use crate::tagging::Tagger;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sitechunk_scanner::{DEFAULT_SECTION, Source, SourceDocument};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Options for one source-to-corpus run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunker: ChunkerConfig,
    pub max_tags: usize,
    /// Spinner to report phases on. `None` runs silently.
    pub progress: Option<ProgressBar>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            max_tags: DEFAULT_MAX_TAGS,
            progress: None,
        }
    }
}

impl PipelineOptions {
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_max_tags(mut self, max_tags: usize) -> Self {
        self.max_tags = max_tags;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub documents: usize,
    pub sections: usize,
    pub segments: usize,
    pub chunks_emitted: usize,
    pub duplicates_skipped: usize,
    pub failures: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<ChunkRecord>,
    pub stats: PipelineStats,
    /// Seen ids after this run, for chaining into the next one.
    pub dedup: DeduplicationState,
    pub failures: Vec<String>,
}

/// Spinner in the style used across the CLI.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message.into());
    pb
}

/// Extract from `source`, then chunk, deduplicate, tag and assemble.
/// A cancelled source still yields a corpus for what it produced.
pub async fn run_pipeline(
    source: &dyn Source,
    tagger: &dyn Tagger,
    dedup: DeduplicationState,
    options: &PipelineOptions,
    cancel: &CancellationToken,
) -> Result<PipelineOutput> {
    info!("Extracting documents from {}", source.describe());
    if let Some(ref pb) = options.progress {
        pb.set_message(format!("Extracting from {}...", source.describe()));
    }

    let outcome = source.extract(cancel).await?;

    if let Some(ref pb) = options.progress {
        pb.set_message(format!("Chunking {} documents...", outcome.documents.len()));
    }

    let mut output = process_documents(&outcome.documents, tagger, dedup, options);
    output.stats.failures = outcome.failures.len();
    output.stats.cancelled = outcome.cancelled;
    output.failures = outcome.failures;

    if let Some(ref pb) = options.progress {
        pb.finish_with_message(format!(
            "Done! {} chunks from {} documents",
            output.stats.chunks_emitted, output.stats.documents
        ));
    }

    info!(
        "Pipeline complete: {} chunks, {} duplicates skipped",
        output.stats.chunks_emitted, output.stats.duplicates_skipped
    );
    Ok(output)
}

/// The synchronous half of the pipeline, over already extracted documents.
pub fn process_documents(
    documents: &[SourceDocument],
    tagger: &dyn Tagger,
    mut dedup: DeduplicationState,
    options: &PipelineOptions,
) -> PipelineOutput {
    let chunker = Chunker::new(options.chunker);
    let mut stats = PipelineStats::default();
    let mut pages = Vec::with_capacity(documents.len());
    let mut accepted = Vec::new();

    for doc in documents {
        stats.documents += 1;
        pages.push(page_identity(doc));

        for section in &doc.sections {
            stats.sections += 1;

            let label = clean(&section.label);
            let label = if label.is_empty() {
                DEFAULT_SECTION.to_string()
            } else {
                label
            };

            let blocks: Vec<(String, Option<&str>)> = section
                .blocks
                .iter()
                .enumerate()
                .map(|(idx, block)| (clean(block), section.fragments.get(idx).map(String::as_str)))
                .filter(|(block, _)| !block.is_empty())
                .collect();
            let text = blocks
                .iter()
                .map(|(block, _)| block.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let mut locator = MarkupLocator::new(&blocks);

            for segment in chunker.chunk(&text) {
                stats.segments += 1;
                let source_markup = locator.markup_for(&segment);
                match dedup.admit(&segment) {
                    Admission::Admitted(chunk_id) => accepted.push(AcceptedChunk {
                        chunk_id,
                        source_path: doc.source_path.clone(),
                        section_label: label.clone(),
                        text: segment,
                        source_markup: source_markup.or_else(|| section.markup()),
                    }),
                    Admission::Skipped(chunk_id) => {
                        debug!("Skipping duplicate {} from {}", chunk_id, doc.source_path);
                        stats.duplicates_skipped += 1;
                    }
                }
            }
        }
    }

    let mut assembler = CorpusAssembler::new(tagger)
        .with_max_tags(options.max_tags)
        .with_min_length(options.chunker.min_length);
    let records = assembler.assemble(&pages, &accepted);
    stats.chunks_emitted = records.len();

    PipelineOutput {
        records,
        stats,
        dedup,
        failures: Vec::new(),
    }
}

/// Maps chunk text back to the HTML of the blocks it was cut from.
///
/// Chunks are cleaned, so every inter-block break collapses to one space. The
/// blocks are laid out the same way and each chunk is found after the start
/// of the previous one.
struct MarkupLocator<'a> {
    flat: String,
    spans: Vec<(usize, usize, Option<&'a str>)>,
    cursor: usize,
}

impl<'a> MarkupLocator<'a> {
    fn new(blocks: &[(String, Option<&'a str>)]) -> Self {
        let mut flat = String::new();
        let mut spans = Vec::with_capacity(blocks.len());
        for (text, fragment) in blocks {
            if !flat.is_empty() {
                flat.push(' ');
            }
            let start = flat.len();
            flat.push_str(text);
            spans.push((start, flat.len(), *fragment));
        }
        Self {
            flat,
            spans,
            cursor: 0,
        }
    }

    /// `None` when the chunk cannot be placed or no overlapping block has markup.
    fn markup_for(&mut self, segment: &str) -> Option<String> {
        let start = self.cursor + self.flat.get(self.cursor..)?.find(segment)?;
        let end = start + segment.len();
        self.cursor = start + segment.chars().next().map_or(1, char::len_utf8);

        let html: String = self
            .spans
            .iter()
            .filter(|(from, to, _)| *from < end && start < *to)
            .filter_map(|(_, _, fragment)| *fragment)
            .collect();
        (!html.is_empty()).then_some(html)
    }
}

fn page_identity(doc: &SourceDocument) -> PageIdentity {
    let page_title = doc
        .title
        .as_deref()
        .map(clean)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| doc.page_name.clone());

    PageIdentity {
        source_path: doc.source_path.clone(),
        page_name: doc.page_name.clone(),
        page_title,
    }
}

/// Text summary of a run, grouped by page in corpus order.
pub fn generate_corpus_report(stats: &PipelineStats, records: &[ChunkRecord]) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Generated: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("  Documents processed: {}\n", stats.documents));
    report.push_str(&format!("  Sections: {}\n", stats.sections));
    report.push_str(&format!("  Segments produced: {}\n", stats.segments));
    report.push_str(&format!("  Chunks emitted: {}\n", stats.chunks_emitted));
    report.push_str(&format!("  Duplicates skipped: {}\n", stats.duplicates_skipped));
    report.push_str(&format!("  Failures: {}\n", stats.failures));
    if stats.cancelled {
        report.push_str("  Run was cancelled, corpus is partial\n");
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // page_id -> index into `pages`, keeping first-seen order
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut pages: Vec<(&ChunkRecord, usize)> = Vec::new();
    for record in records {
        match index.get(record.page_id.as_str()) {
            Some(&i) => pages[i].1 += 1,
            None => {
                index.insert(record.page_id.as_str(), pages.len());
                pages.push((record, 1));
            }
        }
    }

    for (first, count) in pages {
        report.push_str(&format!("## {}\n", first.page_title));
        report.push_str(&format!(
            "  {} ({}) {} chunks\n\n",
            first.page_name, first.page_id, count
        ));
    }

    report
}
