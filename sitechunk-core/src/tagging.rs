use std::collections::{HashMap, HashSet};

/// Keyword extraction for a single chunk. Built once and shared for the run.
pub trait Tagger: Send + Sync {
    fn extract_tags(&self, text: &str, max_tags: usize) -> Vec<String>;
}

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "having", "her", "here", "hers", "herself", "him", "himself", "his", "how", "into", "its",
    "itself", "just", "may", "more", "most", "must", "myself", "nor", "not", "now", "off", "once",
    "only", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "too", "under", "until", "very", "was",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

const MIN_WORD_LENGTH: usize = 3;

/// Frequency-ranked keywords with English stop-words removed.
#[derive(Debug, Clone)]
pub struct KeywordTagger {
    stop_words: HashSet<&'static str>,
}

impl Default for KeywordTagger {
    fn default() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }
}

impl KeywordTagger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tagger for KeywordTagger {
    fn extract_tags(&self, text: &str, max_tags: usize) -> Vec<String> {
        // word -> (count, first position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() >= MIN_WORD_LENGTH)
            .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
            .filter(|w| !self.stop_words.contains(w.as_str()));

        for (position, word) in words.enumerate() {
            counts.entry(word).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|(_, (a_count, a_pos)), (_, (b_count, b_pos))| {
            b_count.cmp(a_count).then(a_pos.cmp(b_pos))
        });

        ranked
            .into_iter()
            .take(max_tags)
            .map(|(word, _)| word)
            .collect()
    }
}
