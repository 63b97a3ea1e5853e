//! On-disk copy of every fetched page, one file per URL path.

use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// File stem for a URL: path segments joined by `_`, root mapped to `index`.
pub fn page_file_stem(url: &Url) -> String {
    let path = url.path().trim_matches('/');
    if path.is_empty() {
        return "index".to_string();
    }

    path.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory exclusive to one crawl run. Cleared when opened.
///
/// File names ignore host and query, so distinct URLs can share a file. The
/// later page wins and the collision is logged.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
    written: Arc<Mutex<HashMap<PathBuf, String>>>,
    overwritten: Arc<Mutex<Vec<String>>>,
}

impl PageStore {
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if tokio::fs::try_exists(&dir).await? {
            info!("Clearing page directory {}", dir.display());
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            written: Arc::default(),
            overwritten: Arc::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, url: &Url, content: &str, extension: &str) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{}.{}", page_file_stem(url), extension));
        tokio::fs::write(&path, content).await?;
        debug!("Saved {} to {}", url, path.display());

        let previous = self.written.lock().await.insert(path.clone(), url.to_string());
        if let Some(previous) = previous
            && previous != url.as_str()
        {
            warn!("{} overwrote the saved copy of {} at {}", url, previous, path.display());
            self.overwritten.lock().await.push(previous);
        }
        Ok(path)
    }

    /// URLs whose saved copy was replaced by a later page with the same file name.
    pub async fn overwritten(&self) -> Vec<String> {
        self.overwritten.lock().await.clone()
    }
}
