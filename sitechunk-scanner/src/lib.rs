pub mod crawler;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod result;
pub mod source;
pub mod storage;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::ScanError;
pub use extractor::{ExtractedDocument, Section, DEFAULT_SECTION};
pub use fetcher::{FetchError, FetchOutcome, FetchedBody, Fetcher, HttpFetcher};
pub use result::{CrawlOutcome, FetchedPage};
pub use source::{LocalSource, Source, SourceDocument, SourceOutcome, WebSource};
