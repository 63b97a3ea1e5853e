use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const PAGE_ID_PREFIX: &str = "page_";

/// Where a document came from and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    /// URL for crawled pages, filesystem path for local files.
    pub source_path: String,
    pub page_name: String,
    pub page_title: String,
}

/// One corpus entry. Field names on the wire are fixed for downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub page_id: String,
    pub page_title: String,
    pub page_name: String,
    #[serde(rename = "section_header")]
    pub section_label: String,
    #[serde(rename = "content")]
    pub raw_text: String,
    #[serde(
        rename = "content_html",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_markup: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn new_page_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", PAGE_ID_PREFIX, &id[..8])
}

/// Source path to page id. The first id handed out for a path is kept.
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    ids: HashMap<String, String>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_id_for(&mut self, source_path: &str) -> String {
        self.ids
            .entry(source_path.to_string())
            .or_insert_with(new_page_id)
            .clone()
    }

    pub fn get(&self, source_path: &str) -> Option<&str> {
        self.ids.get(source_path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
