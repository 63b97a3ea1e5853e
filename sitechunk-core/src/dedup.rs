use crate::model::ChunkRecord;
use crate::normalize::normalize_for_hash;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

pub const CHUNK_ID_PREFIX: &str = "chunk_";

/// Content-addressed id: insensitive to case, punctuation and whitespace runs.
pub fn chunk_id(text: &str) -> String {
    let digest = Sha256::digest(normalize_for_hash(text).as_bytes());
    format!("{}{}", CHUNK_ID_PREFIX, hex::encode(digest))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(String),
    /// Already seen in this run (or in the seeded corpus).
    Skipped(String),
}

impl Admission {
    pub fn chunk_id(&self) -> &str {
        match self {
            Admission::Admitted(id) | Admission::Skipped(id) => id,
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

/// Seen chunk ids for one pipeline run. Passed in and handed back by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct DeduplicationState {
    seen: HashSet<String>,
}

impl DeduplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every chunk of an existing corpus as already emitted.
    pub fn from_records(records: &[ChunkRecord]) -> Self {
        Self {
            seen: records.iter().map(|r| r.chunk_id.clone()).collect(),
        }
    }

    pub fn admit(&mut self, text: &str) -> Admission {
        let id = chunk_id(text);
        if self.seen.insert(id.clone()) {
            Admission::Admitted(id)
        } else {
            Admission::Skipped(id)
        }
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.seen.contains(chunk_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
