// ============================================================
// Layer 4 — Paragraph Tokenizer
// ============================================================
// Runs one cleaned paragraph through the token pipeline:
//
//   CleanedParagraph
//       │  Normalizer      (acronym guard, lowercase, punctuation,
//       ▼                   numeric placeholders)
//   "the fomc kept forward guidance at x_percent"
//       │  split + classify
//       ▼
//   [the/Word, fomc/Acronym, kept/Word, forward/Word, ...]
//       │  PhraseMerger
//       ▼
//   [the, fomc, kept, forward_guidance/Phrase, at, x_percent]
//       │  TokenFilter
//       ▼
//   persisted token sequence
//
// The merge and acronym tables are built once here and only read
// afterwards.

use crate::data::acronyms::AcronymGuard;
use crate::data::filter::TokenFilter;
use crate::data::merger::{ConflictPolicy, MergeEntry, MergeTable, PhraseMerger, FED_PHRASES};
use crate::data::normalizer::Normalizer;
use crate::domain::document::CleanedParagraph;
use crate::domain::error::{CleanError, Result};
use crate::domain::token::Token;

/// Tokens of one paragraph plus any numeric fragments left ambiguous.
#[derive(Debug)]
pub struct TokenizedParagraph {
    pub position: usize,
    pub tokens: Vec<Token>,
    pub ambiguities: Vec<CleanError>,
}

pub struct Tokenizer {
    normalizer: Normalizer,
    merger: PhraseMerger,
}

impl Tokenizer {
    /// Build a tokenizer from an acronym guard and merge phrase specs
    /// (`"a b"` or `"a b => out"`). The word side of each spec is run
    /// through the normaliser first so it matches normalised text.
    pub fn new<'s>(
        guard: AcronymGuard,
        phrases: impl IntoIterator<Item = &'s str>,
        policy: ConflictPolicy,
    ) -> Result<Self> {
        let normalizer = Normalizer::new(guard);

        let entries = phrases
            .into_iter()
            .map(|spec| {
                let normalized = match spec.split_once("=>") {
                    Some((words, out)) => {
                        format!("{} => {}", normalizer.normalize(words), out.trim())
                    }
                    None => normalizer.normalize(spec),
                };
                MergeEntry::parse(&normalized)
            })
            .collect::<Result<Vec<_>>>()?;

        if normalizer.guard().is_empty() {
            tracing::warn!("Acronym table is empty; acronyms will be split like plain words");
        }
        let table = MergeTable::build(entries, policy, normalizer.guard())?;
        tracing::debug!(
            "Tokenizer ready: {} merge entries, {} acronyms",
            table.len(),
            normalizer.guard().len()
        );

        Ok(Self {
            normalizer,
            merger: PhraseMerger::new(table),
        })
    }

    /// Built-in Fed tables extended with `extra` phrases
    pub fn fed_default(extra: &[String], policy: ConflictPolicy) -> Result<Self> {
        let phrases = FED_PHRASES
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str));
        Self::new(AcronymGuard::fed_default()?, phrases, policy)
    }

    pub fn tokenize_paragraph(&self, paragraph: &CleanedParagraph) -> TokenizedParagraph {
        let (tokens, ambiguities) = self.tokenize_with_report(&paragraph.text);
        TokenizedParagraph {
            position: paragraph.position,
            tokens,
            ambiguities,
        }
    }

    fn tokenize_with_report(&self, text: &str) -> (Vec<Token>, Vec<CleanError>) {
        let filter = TokenFilter::new(self.normalizer.guard());

        // Normalized
        let normalized = self.normalizer.normalize(text);
        let ambiguities = self.normalizer.ambiguities(&normalized);

        let classified: Vec<Token> = normalized
            .split_whitespace()
            .map(|w| Token::new(w, filter.classify(w)))
            .collect();

        // Merged → Filtered
        let merged = self.merger.merge(classified);
        (filter.apply(merged), ambiguities)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{DocumentId, SourceType};
    use crate::domain::token::TokenKind;

    impl Tokenizer {
        fn tokenize(&self, text: &str) -> Vec<Token> {
            self.tokenize_with_report(text).0
        }
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::fed_default(&[], ConflictPolicy::Reject).unwrap()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn test_full_pipeline_on_fed_sentence() {
        let t = tokenizer();
        let tokens = t.tokenize(
            "The FOMC's forward guidance kept the federal funds rate 25 basis points \
             above 2 percent in 2015.",
        );
        assert_eq!(
            texts(&tokens),
            vec![
                "the",
                "fomc",
                "forward_guidance",
                "kept",
                "the",
                "federal_funds_rate",
                "x_basis_points",
                "above",
                "x_percent",
                "in"
            ]
        );
    }

    #[test]
    fn test_acronym_is_never_altered() {
        let t = tokenizer();
        let tokens = t.tokenize("QE");
        assert_eq!(texts(&tokens), vec!["qe"]);
        assert_eq!(tokens[0].kind, TokenKind::Acronym);
    }

    #[test]
    fn test_hyphenated_phrase_merges() {
        let t = tokenizer();
        let tokens = t.tokenize("purchases of mortgage-backed securities");
        assert_eq!(texts(&tokens), vec!["purchases", "of", "mortgage_backed_securities"]);
    }

    #[test]
    fn test_extra_phrases_are_normalised() {
        let t = Tokenizer::fed_default(&["Neutral Rate".to_string()], ConflictPolicy::Reject)
            .unwrap();
        let tokens = t.tokenize("the neutral rate");
        assert_eq!(texts(&tokens), vec!["the", "neutral_rate"]);
    }

    #[test]
    fn test_named_extra_phrase_keeps_output() {
        let t = Tokenizer::fed_default(
            &["Fed Funds => federal_funds".to_string()],
            ConflictPolicy::Reject,
        )
        .unwrap();
        assert_eq!(texts(&t.tokenize("Fed funds traded")), vec!["federal_funds", "traded"]);
    }

    #[test]
    fn test_conflicting_extra_phrase_is_rejected() {
        let extra = vec!["forward guidance => guidance_fwd".to_string()];
        assert!(Tokenizer::fed_default(&extra, ConflictPolicy::Reject).is_err());
        assert!(Tokenizer::fed_default(&extra, ConflictPolicy::KeepFirst).is_ok());
    }

    #[test]
    fn test_paragraph_keeps_position_and_reports_ambiguity() {
        let t = tokenizer();
        let p = CleanedParagraph::new(
            DocumentId::new(SourceType::Fomc, "minutes/x"),
            3,
            "A 25 basis move.",
        );
        let out = t.tokenize_paragraph(&p);
        assert_eq!(out.position, 3);
        assert_eq!(texts(&out.tokens), vec!["a", "basis", "move"]);
        assert_eq!(out.ambiguities.len(), 1);
    }

    #[test]
    fn test_punctuation_only_paragraph_yields_nothing() {
        assert!(tokenizer().tokenize(" -- ... 2014 ").is_empty());
    }
}
