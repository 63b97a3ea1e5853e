use sitechunk_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CorpusError>;
