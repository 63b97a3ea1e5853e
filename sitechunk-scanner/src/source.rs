//! Content sources feeding the chunking pipeline: a live crawl or a directory on disk.

use crate::crawler::Crawler;
use crate::error::{Result, ScanError};
use crate::extractor::{self, ExtractedDocument, Section};
use crate::result::FetchedPage;
use crate::storage::page_file_stem;
use async_trait::async_trait;
use jwalk::WalkDir;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "htm", "pdf", "txt", "md"];

/// One extracted document with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// URL for crawled pages, filesystem path for local files.
    pub source_path: String,
    pub page_name: String,
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

impl SourceDocument {
    pub fn new(
        source_path: impl Into<String>,
        page_name: impl Into<String>,
        document: ExtractedDocument,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            page_name: page_name.into(),
            title: document.title,
            sections: document.sections,
        }
    }

    pub fn from_page(page: &FetchedPage) -> Self {
        Self::new(
            page.url.to_string(),
            page_file_stem(&page.url),
            page.document.clone(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceOutcome {
    pub documents: Vec<SourceDocument>,
    /// Locations that could not be read or fetched.
    pub failures: Vec<String>,
    pub cancelled: bool,
}

#[async_trait]
pub trait Source: Send + Sync {
    /// Human readable origin, used in logs and reports.
    fn describe(&self) -> String;

    async fn extract(&self, cancel: &CancellationToken) -> Result<SourceOutcome>;
}

/// Crawl a site from a seed URL.
pub struct WebSource {
    crawler: Crawler,
    seed: String,
}

impl WebSource {
    pub fn new(crawler: Crawler, seed: impl Into<String>) -> Self {
        Self {
            crawler,
            seed: seed.into(),
        }
    }

    pub fn crawler(&self) -> &Crawler {
        &self.crawler
    }
}

#[async_trait]
impl Source for WebSource {
    fn describe(&self) -> String {
        self.seed.clone()
    }

    async fn extract(&self, cancel: &CancellationToken) -> Result<SourceOutcome> {
        let outcome = self.crawler.crawl_until(&self.seed, cancel).await?;

        Ok(SourceOutcome {
            documents: outcome.pages.values().map(SourceDocument::from_page).collect(),
            failures: outcome.failed,
            cancelled: outcome.cancelled,
        })
    }
}

/// Every matching file under a directory, visited in sorted path order.
pub struct LocalSource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.into().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if !extensions.is_empty() {
            self.extensions = extensions;
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn discover(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort(true)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path())
            .filter(|path| {
                file_extension(path).is_some_and(|ext| extensions.iter().any(|e| *e == ext))
            })
            .collect()
    }
}

fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Extract one file by extension. `Ok(None)` means the format has no extractor.
pub async fn read_local_document(path: &Path) -> Result<Option<ExtractedDocument>> {
    let Some(ext) = file_extension(path) else {
        return Ok(None);
    };

    let document = match ext.as_str() {
        "html" | "htm" => {
            let bytes = tokio::fs::read(path).await?;
            extractor::extract_html(&String::from_utf8_lossy(&bytes), None)
        }
        "pdf" => {
            let bytes = tokio::fs::read(path).await?;
            tokio::task::spawn_blocking(move || extractor::extract_pdf(&bytes)).await??
        }
        "txt" | "md" => {
            let bytes = tokio::fs::read(path).await?;
            extractor::extract_plain_text(&String::from_utf8_lossy(&bytes))
        }
        _ => return Ok(None),
    };
    Ok(Some(document))
}

#[async_trait]
impl Source for LocalSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn extract(&self, cancel: &CancellationToken) -> Result<SourceOutcome> {
        if !tokio::fs::metadata(&self.root)
            .await
            .is_ok_and(|m| m.is_dir())
        {
            return Err(ScanError::InvalidSeed(format!(
                "{} is not a readable directory",
                self.root.display()
            )));
        }

        let root = self.root.clone();
        let extensions = self.extensions.clone();
        let paths = tokio::task::spawn_blocking(move || Self::discover(&root, &extensions)).await?;
        info!("Found {} files under {}", paths.len(), self.root.display());

        let mut outcome = SourceOutcome::default();
        for path in paths {
            if cancel.is_cancelled() {
                info!("Ingest cancelled after {} documents", outcome.documents.len());
                outcome.cancelled = true;
                break;
            }

            let page_name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            match read_local_document(&path).await {
                Ok(Some(document)) => {
                    debug!("Extracted {}", path.display());
                    outcome.documents.push(SourceDocument::new(
                        path.display().to_string(),
                        page_name,
                        document,
                    ));
                }
                Ok(None) => warn!("No extractor for {}, skipping", path.display()),
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    outcome.failures.push(path.display().to_string());
                }
            }
        }

        Ok(outcome)
    }
}
