// ============================================================
// Layer 4 — Token Filter
// ============================================================
// The last gate before persistence. Whatever passes here is the
// vocabulary surface that downstream evaluation terms are matched
// against, so the rules are deliberately narrow:
//
//   keep  merged phrases        forward_guidance
//   keep  guarded acronyms      qe, u_s, qe2
//   keep  alphabetic words      inflation
//   keep  numeric placeholders  x_percent
//   drop  everything else       2014, 3.5, stray_underscores, ""

use crate::data::acronyms::AcronymGuard;
use crate::data::normalizer::NUMERIC_PLACEHOLDERS;
use crate::domain::token::{Token, TokenKind};

pub struct TokenFilter<'a> {
    guard: &'a AcronymGuard,
}

impl<'a> TokenFilter<'a> {
    pub fn new(guard: &'a AcronymGuard) -> Self {
        Self { guard }
    }

    /// Classify a freshly split, normalised word.
    pub fn classify(&self, text: &str) -> TokenKind {
        if text.is_empty() {
            TokenKind::Other
        } else if self.guard.is_acronym(text) {
            TokenKind::Acronym
        } else if NUMERIC_PLACEHOLDERS.contains(&text) {
            TokenKind::Numeric
        } else if text.chars().all(char::is_alphabetic) {
            TokenKind::Word
        } else {
            TokenKind::Other
        }
    }

    pub fn keeps(&self, token: &Token) -> bool {
        !token.text.is_empty() && token.kind != TokenKind::Other
    }

    /// Drop every token that is not persistable
    pub fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter().filter(|t| self.keeps(t)).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let guard = AcronymGuard::fed_default().unwrap();
        let f = TokenFilter::new(&guard);
        assert_eq!(f.classify("inflation"), TokenKind::Word);
        assert_eq!(f.classify("qe"), TokenKind::Acronym);
        assert_eq!(f.classify("qe2"), TokenKind::Acronym);
        assert_eq!(f.classify("x_basis_points"), TokenKind::Numeric);
        assert_eq!(f.classify("2014"), TokenKind::Other);
        assert_eq!(f.classify("3.5"), TokenKind::Other);
        assert_eq!(f.classify("q4"), TokenKind::Other);
        assert_eq!(f.classify("made_up"), TokenKind::Other);
        assert_eq!(f.classify(""), TokenKind::Other);
    }

    #[test]
    fn test_apply_keeps_phrases_and_drops_other() {
        let guard = AcronymGuard::fed_default().unwrap();
        let f = TokenFilter::new(&guard);
        let tokens = vec![
            Token::new("forward_guidance", TokenKind::Phrase),
            Token::new("2014", TokenKind::Other),
            Token::new("qe", TokenKind::Acronym),
            Token::new("", TokenKind::Word),
            Token::new("x_percent", TokenKind::Numeric),
        ];
        let kept: Vec<String> = f.apply(tokens).into_iter().map(|t| t.text).collect();
        assert_eq!(kept, vec!["forward_guidance", "qe", "x_percent"]);
    }
}
