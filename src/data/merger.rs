// ============================================================
// Layer 4 — Phrase Merger
// ============================================================
// Joins fixed multi-word policy terms into single tokens so the
// embedding model sees "forward_guidance" as one unit instead of
// two unrelated words.
//
// The merge table maps a sequence of normalised words to one
// output token and is stored as a word-level trie. Merging scans
// left to right; at each position it follows the trie as far as
// the input allows and takes the LONGEST entry that ends on the
// way. Matches never overlap: after a merge the scan resumes
// right after the merged words.
//
// Example with entries "balance sheet" and "balance sheet runoff":
//   balance sheet runoff slowed → balance_sheet_runoff slowed
//   balance sheet policy        → balance_sheet policy
//
// Entries are immutable once built. Two entries with the same
// word sequence but different outputs are resolved by the
// configured ConflictPolicy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::acronyms::AcronymGuard;
use crate::domain::error::{CleanError, Result};
use crate::domain::token::{Token, TokenKind};

/// Built-in Fed merge table. A bare phrase merges to its words
/// joined by underscores; `words => output` names the output.
pub const FED_PHRASES: &[&str] = &[
    "asset purchases",
    "asset purchase program",
    "balance sheet",
    "balance sheet runoff",
    "discount window",
    "discount rate",
    "economic outlook",
    "federal funds",
    "federal funds rate",
    "fed funds rate => federal_funds_rate",
    "federal open market committee",
    "financial conditions",
    "financial stability",
    "forward guidance",
    "inflation expectations",
    "interest on reserve balances",
    "interest on excess reserves",
    "labor market",
    "labor force participation",
    "longer run",
    "maximum employment",
    "monetary policy",
    "mortgage backed securities",
    "open market operations",
    "overnight reverse repurchase agreement",
    "overnight reverse repurchase agreements => overnight_reverse_repurchase_agreement",
    "policy rate",
    "price stability",
    "primary credit",
    "quantitative easing",
    "quantitative tightening",
    "repurchase agreements",
    "reverse repo",
    "secondary credit",
    "standing repo facility",
    "swap lines",
    "target range",
    "term premium",
    "treasury securities",
    "unemployment rate",
    "yield curve",
];

/// How to resolve two entries with the same word sequence but
/// different outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Refuse to build the table
    #[default]
    Reject,
    /// The entry listed first wins
    KeepFirst,
    /// The entry listed last wins
    KeepLast,
}

/// One table entry: normalised surface words → merged token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEntry {
    pub words: Vec<String>,
    pub merged: String,
}

impl MergeEntry {
    /// Parse `"a b c"` or `"a b c => output"`. The words side must
    /// already be normalised (see Tokenizer::new, which normalises
    /// configured phrases before calling this).
    pub fn parse(spec: &str) -> Result<Self> {
        let (lhs, rhs) = match spec.split_once("=>") {
            Some((l, r)) => (l, Some(r.trim())),
            None => (spec, None),
        };
        let words: Vec<String> = lhs.split_whitespace().map(str::to_string).collect();
        if words.len() < 2 {
            return Err(CleanError::MergeTable(format!(
                "phrase '{spec}' needs at least two words"
            )));
        }
        let merged = rhs.map(str::to_string).unwrap_or_else(|| words.join("_"));
        let valid = merged.starts_with(|c: char| c.is_ascii_lowercase())
            && merged
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(CleanError::MergeTable(format!(
                "merged token '{merged}' must be lowercase [a-z0-9_]"
            )));
        }
        Ok(Self { words, merged })
    }
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<String, TrieNode>,
    merged: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    root: TrieNode,
    len: usize,
}

impl MergeTable {
    /// Build a table from entries.
    ///
    /// Entries that contain a guarded acronym are dropped with a
    /// warning: acronyms are never merged into anything.
    pub fn build(
        entries: impl IntoIterator<Item = MergeEntry>,
        policy: ConflictPolicy,
        guard: &AcronymGuard,
    ) -> Result<Self> {
        let mut table = Self::default();

        for entry in entries {
            if let Some(acronym) = entry.words.iter().find(|w| guard.is_acronym(w)) {
                tracing::warn!(
                    "Dropping merge entry '{}': contains acronym '{}'",
                    entry.words.join(" "),
                    acronym
                );
                continue;
            }

            let mut node = &mut table.root;
            for w in &entry.words {
                node = node.children.entry(w.clone()).or_default();
            }

            match (&node.merged, policy) {
                (None, _) => {
                    node.merged = Some(entry.merged);
                    table.len += 1;
                }
                (Some(existing), _) if *existing == entry.merged => {}
                (Some(existing), ConflictPolicy::Reject) => {
                    return Err(CleanError::MergeTable(format!(
                        "'{}' maps to both '{}' and '{}'",
                        entry.words.join(" "),
                        existing,
                        entry.merged
                    )));
                }
                (Some(_), ConflictPolicy::KeepFirst) => {}
                (Some(_), ConflictPolicy::KeepLast) => node.merged = Some(entry.merged),
            }
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Longest entry starting at `tokens[start]`: (word count, output)
    fn longest_match(&self, tokens: &[Token], start: usize) -> Option<(usize, &str)> {
        let mut node = &self.root;
        let mut best = None;

        for (offset, token) in tokens[start..].iter().enumerate() {
            match node.children.get(token.as_str()) {
                Some(next) => {
                    node = next;
                    if let Some(merged) = &node.merged {
                        best = Some((offset + 1, merged.as_str()));
                    }
                }
                None => break,
            }
        }

        best
    }
}

pub struct PhraseMerger {
    table: MergeTable,
}

impl PhraseMerger {
    pub fn new(table: MergeTable) -> Self {
        Self { table }
    }

    /// Greedy, leftmost-longest, non-overlapping merge.
    /// Merged tokens are tagged `TokenKind::Phrase`.
    pub fn merge(&self, tokens: Vec<Token>) -> Vec<Token> {
        if self.table.is_empty() {
            return tokens;
        }

        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0usize;

        while i < tokens.len() {
            match self.table.longest_match(&tokens, i) {
                Some((width, merged)) => {
                    out.push(Token::new(merged, TokenKind::Phrase));
                    i += width;
                }
                None => {
                    out.push(tokens[i].clone());
                    i += 1;
                }
            }
        }

        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> AcronymGuard {
        AcronymGuard::fed_default().unwrap()
    }

    fn merger(phrases: &[&str]) -> PhraseMerger {
        let entries = phrases.iter().map(|p| MergeEntry::parse(p).unwrap());
        PhraseMerger::new(MergeTable::build(entries, ConflictPolicy::Reject, &guard()).unwrap())
    }

    fn words(ws: &[&str]) -> Vec<Token> {
        ws.iter().map(|w| Token::new(*w, TokenKind::Word)).collect()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn test_two_word_merge() {
        let m = merger(&["asset purchases"]);
        let out = m.merge(words(&["asset", "purchases"]));
        assert_eq!(texts(&out), vec!["asset_purchases"]);
        assert_eq!(out[0].kind, TokenKind::Phrase);
    }

    #[test]
    fn test_merge_followed_by_plain_word() {
        let m = merger(&["forward guidance"]);
        let out = m.merge(words(&["forward", "guidance", "policy"]));
        assert_eq!(texts(&out), vec!["forward_guidance", "policy"]);
        assert_eq!(out[1].kind, TokenKind::Word);
    }

    #[test]
    fn test_longest_entry_wins_at_same_start() {
        let m = merger(&["balance sheet", "balance sheet runoff"]);
        let out = m.merge(words(&["balance", "sheet", "runoff", "slowed"]));
        assert_eq!(texts(&out), vec!["balance_sheet_runoff", "slowed"]);

        let out = m.merge(words(&["balance", "sheet", "policy"]));
        assert_eq!(texts(&out), vec!["balance_sheet", "policy"]);
    }

    #[test]
    fn test_falls_back_when_long_prefix_does_not_complete() {
        // "federal funds rate" is in the table but the input stops early
        let m = merger(&["federal funds", "federal funds rate"]);
        let out = m.merge(words(&["federal", "funds", "market"]));
        assert_eq!(texts(&out), vec!["federal_funds", "market"]);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let m = merger(&["open market", "market operations"]);
        let out = m.merge(words(&["open", "market", "operations"]));
        assert_eq!(texts(&out), vec!["open_market", "operations"]);
    }

    #[test]
    fn test_only_exact_matches_merge() {
        let m = merger(&["forward guidance"]);
        let out = m.merge(words(&["Forward", "guidance"]));
        assert_eq!(texts(&out), vec!["Forward", "guidance"]);
    }

    #[test]
    fn test_named_output() {
        let m = merger(&["fed funds rate => federal_funds_rate"]);
        let out = m.merge(words(&["fed", "funds", "rate"]));
        assert_eq!(texts(&out), vec!["federal_funds_rate"]);
    }

    #[test]
    fn test_conflict_policies() {
        let entries = || {
            vec![
                MergeEntry::parse("fed funds => fed_funds").unwrap(),
                MergeEntry::parse("fed funds => federal_funds").unwrap(),
            ]
        };
        let g = guard();
        assert!(MergeTable::build(entries(), ConflictPolicy::Reject, &g).is_err());

        let first = PhraseMerger::new(
            MergeTable::build(entries(), ConflictPolicy::KeepFirst, &g).unwrap(),
        );
        assert_eq!(texts(&first.merge(words(&["fed", "funds"]))), vec!["fed_funds"]);

        let last = PhraseMerger::new(
            MergeTable::build(entries(), ConflictPolicy::KeepLast, &g).unwrap(),
        );
        assert_eq!(texts(&last.merge(words(&["fed", "funds"]))), vec!["federal_funds"]);
    }

    #[test]
    fn test_identical_duplicates_are_not_conflicts() {
        let entries = vec![
            MergeEntry::parse("term premium").unwrap(),
            MergeEntry::parse("term premium").unwrap(),
        ];
        let table = MergeTable::build(entries, ConflictPolicy::Reject, &guard()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_entries_with_acronyms_are_dropped() {
        let entries = vec![
            MergeEntry::parse("qe program").unwrap(),
            MergeEntry::parse("yield curve").unwrap(),
        ];
        let table = MergeTable::build(entries, ConflictPolicy::Reject, &guard()).unwrap();
        assert_eq!(table.len(), 1);

        let m = PhraseMerger::new(table);
        let out = m.merge(words(&["qe", "program"]));
        assert_eq!(texts(&out), vec!["qe", "program"]);
    }

    #[test]
    fn test_parse_rejects_single_word_and_bad_output() {
        assert!(MergeEntry::parse("inflation").is_err());
        assert!(MergeEntry::parse("fed funds => Fed-Funds").is_err());
    }

    #[test]
    fn test_builtin_table_builds() {
        let entries = FED_PHRASES.iter().map(|p| MergeEntry::parse(p).unwrap());
        let table = MergeTable::build(entries, ConflictPolicy::Reject, &guard()).unwrap();
        assert_eq!(table.len(), FED_PHRASES.len());
    }
}
