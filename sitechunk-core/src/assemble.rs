use crate::chunker::MIN_CONTENT_LENGTH;
use crate::model::{ChunkRecord, PageIdentity, PageRegistry};
use crate::tagging::Tagger;
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_MAX_TAGS: usize = 5;

/// A chunk that survived deduplication, still detached from its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedChunk {
    pub chunk_id: String,
    pub source_path: String,
    pub section_label: String,
    pub text: String,
    pub source_markup: Option<String>,
}

/// Joins accepted chunks with page identity and tags. Keeps input order.
pub struct CorpusAssembler<'a> {
    tagger: &'a dyn Tagger,
    max_tags: usize,
    min_length: usize,
    registry: PageRegistry,
}

impl<'a> CorpusAssembler<'a> {
    pub fn new(tagger: &'a dyn Tagger) -> Self {
        Self {
            tagger,
            max_tags: DEFAULT_MAX_TAGS,
            min_length: MIN_CONTENT_LENGTH,
            registry: PageRegistry::new(),
        }
    }

    pub fn with_max_tags(mut self, max_tags: usize) -> Self {
        self.max_tags = max_tags;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn assemble(&mut self, pages: &[PageIdentity], chunks: &[AcceptedChunk]) -> Vec<ChunkRecord> {
        let mut by_path: HashMap<&str, &PageIdentity> = HashMap::new();
        for page in pages {
            by_path.entry(page.source_path.as_str()).or_insert(page);
        }

        chunks
            .iter()
            .map(|chunk| {
                let (page_name, page_title) = match by_path.get(chunk.source_path.as_str()) {
                    Some(page) => (page.page_name.clone(), page.page_title.clone()),
                    None => {
                        warn!("No page identity for {}", chunk.source_path);
                        (chunk.source_path.clone(), chunk.source_path.clone())
                    }
                };

                ChunkRecord {
                    chunk_id: chunk.chunk_id.clone(),
                    page_id: self.registry.page_id_for(&chunk.source_path),
                    page_title,
                    page_name,
                    section_label: chunk.section_label.clone(),
                    raw_text: chunk.text.clone(),
                    source_markup: chunk.source_markup.clone(),
                    tags: self.tags_for(&chunk.text),
                }
            })
            .collect()
    }

    /// Short chunks never reach the tagger.
    fn tags_for(&self, text: &str) -> Vec<String> {
        if text.chars().count() < self.min_length {
            return Vec::new();
        }
        self.tagger.extract_tags(text, self.max_tags)
    }
}
