//! Word frequencies over normalized lead text.

use std::collections::HashMap;

/// Caller-owned token counter. Tokens are whitespace-separated and
/// counted case-sensitively; nothing is shared between counters.
#[derive(Debug, Default, Clone)]
pub struct WordCounter {
    counts: HashMap<String, usize>,
    total: usize,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every token in `text`.
    pub fn record(&mut self, text: &str) {
        for word in text.split_whitespace() {
            *self.counts.entry(word.to_string()).or_insert(0) += 1;
            self.total += 1;
        }
    }

    /// Count of `word`, or `None` if it has not been seen since the last reset.
    pub fn count_of(&self, word: &str) -> Option<usize> {
        self.counts.get(word).copied()
    }

    /// Every word tied for the highest count, sorted.
    pub fn most_common(&self) -> Vec<&str> {
        let Some(&highest) = self.counts.values().max() else {
            return Vec::new();
        };
        let mut words: Vec<&str> = self
            .counts
            .iter()
            .filter(|(_, &count)| count == highest)
            .map(|(word, _)| word.as_str())
            .collect();
        words.sort_unstable();
        words
    }

    /// The `n` most frequent words, count descending then word ascending.
    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(word, &count)| (word.as_str(), count))
            .collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }

    /// Tokens recorded since the last reset.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn reset(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}
