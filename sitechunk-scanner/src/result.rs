use crate::extractor::ExtractedDocument;
use indexmap::IndexMap;
use std::time::Duration;
use url::Url;

/// One successfully fetched and extracted page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    /// Raw response text as fetched (lossy UTF-8 for binary formats).
    pub content: String,
    pub document: ExtractedDocument,
}

impl FetchedPage {
    pub fn new(url: Url, content: String, document: ExtractedDocument) -> Self {
        Self {
            url,
            status_code: 200,
            content_type: None,
            response_time: Duration::from_secs(0),
            content,
            document,
        }
    }

    pub fn links_found(&self) -> &[Url] {
        &self.document.links
    }
}

/// Everything a traversal accumulated, in fetch-completion order.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub pages: IndexMap<String, FetchedPage>,
    pub failed: Vec<String>,
    pub visited_count: usize,
    pub cancelled: bool,
}

impl CrawlOutcome {
    pub fn fetched_count(&self) -> usize {
        self.pages.len()
    }

    /// URL to raw fetched text.
    pub fn page_content(&self) -> IndexMap<String, String> {
        self.pages
            .iter()
            .map(|(url, page)| (url.clone(), page.content.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
