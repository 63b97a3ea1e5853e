use crate::error::Result;
use crate::model::ChunkRecord;
use std::path::Path;
use tracing::info;

pub const CORPUS_FILE_NAME: &str = "corpus.json";

/// Write all records as one pretty-printed JSON array.
pub async fn write_corpus(path: &Path, records: &[ChunkRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    info!("Wrote {} chunks to {}", records.len(), path.display());
    Ok(())
}

pub async fn read_corpus(path: &Path) -> Result<Vec<ChunkRecord>> {
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}
