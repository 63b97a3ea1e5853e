use crate::error::{CorpusError, Result};
use crate::normalize::clean;
use std::collections::VecDeque;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
/// Segments shorter than this are boilerplate and never become chunks.
pub const MIN_CONTENT_LENGTH: usize = 20;

/// Boundaries tried in order, coarsest first. The empty separator splits per character.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", ": ", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub target_size: usize,
    pub overlap: usize,
    pub min_length: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            min_length: MIN_CONTENT_LENGTH,
        }
    }
}

impl ChunkerConfig {
    pub fn new(target_size: usize, overlap: usize) -> Result<Self> {
        if target_size == 0 {
            return Err(CorpusError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= target_size {
            return Err(CorpusError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, target_size
            )));
        }
        Ok(Self {
            target_size,
            overlap,
            min_length: MIN_CONTENT_LENGTH,
        })
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Raw boundary-aware segments of at most `target_size` characters, with
    /// up to `overlap` characters repeated between neighbours.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    /// `split`, then clean each segment and drop the ones below `min_length`.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.split(text)
            .iter()
            .map(|segment| clean(segment))
            .filter(|segment| char_len(segment) >= self.config.min_length)
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(separator).collect()
        };

        let mut segments = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.config.target_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                segments.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                segments.push(piece.trim().to_string());
            } else {
                segments.extend(self.split_with(piece, finer));
            }
        }
        if !fitting.is_empty() {
            segments.extend(self.merge(&fitting));
        }
        segments
    }

    /// Greedily pack pieces up to the target, carrying a tail of whole pieces
    /// no longer than `overlap` into the next segment.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let ChunkerConfig {
            target_size,
            overlap,
            ..
        } = self.config;

        let mut segments = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > target_size && !window.is_empty() {
                push_segment(&mut segments, &window);
                while total > overlap || (total + len > target_size && total > 0) {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front);
                }
            }
            window.push_back(piece);
            total += len;
        }

        if !window.is_empty() {
            push_segment(&mut segments, &window);
        }
        segments
    }
}

fn push_segment(segments: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
}
