use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a single fetch produced nothing. Callers only branch on success vs failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("non-success status {0}")]
    Status(u16),
}

pub type FetchOutcome = std::result::Result<FetchedBody, FetchError>;

/// Broad classification of a fetched payload, used to pick an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Pdf,
    PlainText,
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub response_time: Duration,
}

impl FetchedBody {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            status_code: 200,
            content_type: content_type.map(|s| s.to_string()),
            bytes: bytes.into(),
            response_time: Duration::from_secs(0),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn kind(&self) -> ContentKind {
        match self.content_type.as_deref() {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                if ct.contains("text/html") || ct.contains("application/xhtml") {
                    ContentKind::Html
                } else if ct.contains("application/pdf") {
                    ContentKind::Pdf
                } else if ct.starts_with("text/") {
                    ContentKind::PlainText
                } else {
                    ContentKind::Unsupported
                }
            }
            // No header: sniff the magic bytes, otherwise assume markup
            None if self.bytes.starts_with(b"%PDF") => ContentKind::Pdf,
            None => ContentKind::Html,
        }
    }
}

/// A single bounded read of one URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Sitechunk/0.1 (https://github.com/trapdoorsec/sitechunk)")
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;

        Ok(FetchedBody {
            status_code: status.as_u16(),
            content_type,
            bytes: bytes.to_vec(),
            response_time: start.elapsed(),
        })
    }
}
