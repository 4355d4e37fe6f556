// ============================================================
// Layer 4 — Normalizer
// ============================================================
// Turns one paragraph into a canonical, space-separated string
// of lowercase words. Steps, always in this order:
//
//   0. Acronym guard     "QE" → "qe", "U.S." → "u_s"
//   a. Lowercase
//   b. Strip punctuation (underscores survive; "%" → "percent";
//      ".", "," and "/" survive only between two digits;
//      apostrophes are deleted, everything else becomes a space)
//   c. Percentages       "2.5 percent" → "x_percent"
//   d. Rate moves        "25 basis points" / "25bp" → "x_basis_points"
//                        "1 percentage point"      → "x_percentage_points"
//   e. Separators left without a digit on both sides by (c)/(d)
//      become spaces
//
// The guard runs a second time right after (b): stripping can
// expose a surface form that punctuation hid ("LSAP’s" typed
// with a stray apostrophe inside, "u.s." split across a tag).
//
// The output of normalize() is a fixed point: feeding it back in
// returns it unchanged. Numbers that only half-match a rate
// pattern ("25 basis" with no "points") are left alone and can be
// listed with ambiguities().

use std::sync::LazyLock;

use regex::Regex;

use crate::data::acronyms::AcronymGuard;
use crate::domain::error::CleanError;

pub const PERCENT_TOKEN: &str = "x_percent";
pub const BASIS_POINTS_TOKEN: &str = "x_basis_points";
pub const PERCENTAGE_POINTS_TOKEN: &str = "x_percentage_points";

/// Every placeholder the normaliser can emit
pub const NUMERIC_PLACEHOLDERS: &[&str] =
    &[PERCENT_TOKEN, BASIS_POINTS_TOKEN, PERCENTAGE_POINTS_TOKEN];

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:[.,/]\d+)*\s*(?:percent|per\s+cent)\b").unwrap()
});
static BASIS_POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:[.,/]\d+)*\s*(?:basis\s+points?|bps?)\b").unwrap()
});
static PERCENTAGE_POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:[.,/]\d+)*\s*percentage\s+points?\b").unwrap()
});
static AMBIGUOUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:[.,/]\d+)*\s*(?:basis|percentage)\b").unwrap()
});

#[derive(Debug, Clone)]
pub struct Normalizer {
    guard: AcronymGuard,
}

impl Normalizer {
    pub fn new(guard: AcronymGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &AcronymGuard {
        &self.guard
    }

    /// Normalise a paragraph. Idempotent.
    pub fn normalize(&self, text: &str) -> String {
        let guarded = self.guard.apply(text);
        let lowered = guarded.to_lowercase();
        let stripped = self.guard.apply(&strip_punctuation(&lowered));

        let with_percent = PERCENT_RE.replace_all(&stripped, " x_percent ");
        let with_bps = BASIS_POINTS_RE.replace_all(&with_percent, " x_basis_points ");
        let with_pp = PERCENTAGE_POINTS_RE.replace_all(&with_bps, " x_percentage_points ");

        // A rate match can start mid-number ("q4,2.5 percent" matches
        // from "2.5"), leaving its separator without a digit on one side
        drop_stray_separators(&with_pp)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Numeric fragments in already-normalised text that look like a
    /// rate move but did not complete the pattern.
    pub fn ambiguities(&self, normalized: &str) -> Vec<CleanError> {
        AMBIGUOUS_RE
            .find_iter(normalized)
            .map(|m| CleanError::NormalizationAmbiguity {
                fragment: m.as_str().to_string(),
            })
            .collect()
    }
}

/// Step (b). Expects lowercased input.
fn strip_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            c if c.is_alphanumeric() || c == '_' || c.is_whitespace() => out.push(c),
            '\'' | '\u{2019}' | '\u{2018}' => {}
            '%' => out.push_str(" percent "),
            '.' | ',' | '/' => out.push(if between_digits(&chars, i) { c } else { ' ' }),
            _ => out.push(' '),
        }
    }

    out
}

/// `.`, `,` and `/` that no longer sit between two digits become spaces
fn drop_stray_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| match c {
            '.' | ',' | '/' if !between_digits(&chars, i) => ' ',
            _ => c,
        })
        .collect()
}

fn between_digits(chars: &[char], i: usize) -> bool {
    let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
    let next_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
    prev_digit && next_digit
}
