// ============================================================
// Layer 3 — Token and Vocabulary Types
// ============================================================
// A token is a normalised string plus the rule that produced
// it. The kind matters only inside the pipeline (the token
// filter keys on it); the corpus stores the text alone.
//
// The vocabulary is derived from the persisted corpus and is
// read-only: evaluation terms for the external trainer are
// checked against it by exact string match.

use std::collections::HashMap;

/// Which rule produced a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Several surface words merged into one underscore-joined token
    Phrase,
    /// Canonical form of a guarded acronym
    Acronym,
    /// A purely alphabetic word
    Word,
    /// A numeric placeholder such as `x_percent`
    Numeric,
    /// Anything else: stray digits, leftover symbols. Never persisted.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Distinct corpus tokens with their frequencies.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    counts: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every token of every sequence
    pub fn from_sequences<I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[String]>,
    {
        let mut vocab = Self::new();
        for seq in sequences {
            vocab.observe(seq.as_ref());
        }
        vocab
    }

    pub fn observe(&mut self, tokens: &[String]) {
        for t in tokens {
            *self.counts.entry(t.clone()).or_insert(0) += 1;
        }
    }

    /// Drop tokens seen fewer than `min_count` times
    pub fn retain_min_count(&mut self, min_count: usize) {
        self.counts.retain(|_, c| *c >= min_count);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.counts.contains_key(token)
    }

    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries ordered by descending count, then token ascending
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> =
            self.counts.iter().map(|(t, c)| (t.as_str(), *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Terms that do not appear verbatim in the vocabulary
    pub fn missing<'a>(&self, terms: &'a [String]) -> Vec<&'a str> {
        terms
            .iter()
            .map(String::as_str)
            .filter(|t| !self.contains(t))
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn seq(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_counts_across_sequences() {
        let v = Vocabulary::from_sequences(vec![
            seq(&["inflation", "qe", "inflation"]),
            seq(&["qe", "x_percent"]),
        ]);
        assert_eq!(v.len(), 3);
        assert_eq!(v.count("inflation"), 2);
        assert_eq!(v.count("qe"), 2);
        assert_eq!(v.count("missing"), 0);
    }

    #[test]
    fn test_sorted_breaks_ties_alphabetically() {
        let v = Vocabulary::from_sequences(vec![seq(&["b", "a", "c", "c"])]);
        let sorted = v.sorted();
        assert_eq!(sorted, vec![("c", 2), ("a", 1), ("b", 1)]);
    }

    #[test]
    fn test_min_count_filter() {
        let mut v = Vocabulary::from_sequences(vec![seq(&["a", "a", "b"])]);
        v.retain_min_count(2);
        assert!(v.contains("a"));
        assert!(!v.contains("b"));
    }

    #[test]
    fn test_missing_terms_are_exact_match() {
        let v = Vocabulary::from_sequences(vec![seq(&["forward_guidance"])]);
        let terms = seq(&["forward_guidance", "Forward_Guidance", "forward guidance"]);
        assert_eq!(v.missing(&terms), vec!["Forward_Guidance", "forward guidance"]);
    }
}
