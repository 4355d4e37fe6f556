// ============================================================
// Layer 4 — Acronym Guard
// ============================================================
// Fed prose is full of acronyms whose surface form would not
// survive normalisation intact: "U.S." loses its dots and
// splits in two, "S&P" splits on the ampersand, and "FOMC's"
// grows a suffix.
//
// The guard runs first inside the normaliser and rewrites every
// known surface form to its canonical token. Canonical tokens
// are lowercase ASCII letters, digits, and underscores, so no
// later step (lowercasing, punctuation stripping, merging) can
// change them. Matching is case-insensitive, longest surface
// first, and only at word boundaries; a trailing possessive
// ('s / ’s) is absorbed.

use std::collections::{HashMap, HashSet};

use regex::{Regex, RegexBuilder};

use crate::domain::error::{CleanError, Result};

/// Built-in acronym table: surface form → canonical token.
pub const FED_ACRONYMS: &[(&str, &str)] = &[
    ("FOMC", "fomc"),
    ("QE", "qe"),
    ("QE1", "qe1"),
    ("QE2", "qe2"),
    ("QE3", "qe3"),
    ("QT", "qt"),
    ("LSAP", "lsap"),
    ("LSAPs", "lsap"),
    ("MBS", "mbs"),
    ("GDP", "gdp"),
    ("PCE", "pce"),
    ("CPI", "cpi"),
    ("IOER", "ioer"),
    ("IORB", "iorb"),
    ("RRP", "rrp"),
    ("SOMA", "soma"),
    ("SRF", "srf"),
    ("FIMA", "fima"),
    ("TIPS", "tips"),
    ("SOFR", "sofr"),
    ("LIBOR", "libor"),
    ("ECB", "ecb"),
    ("TALF", "talf"),
    ("TARP", "tarp"),
    ("COVID-19", "covid"),
    ("U.S.", "u_s"),
    ("S&P", "s_and_p"),
];

#[derive(Debug, Clone)]
pub struct AcronymGuard {
    /// Lowercased, whitespace-collapsed surface → canonical
    surfaces: HashMap<String, String>,
    canonical: HashSet<String>,
    pattern: Regex,
}

impl AcronymGuard {
    /// Build a guard from (surface, canonical) pairs.
    ///
    /// Fails if a canonical form contains anything but `[a-z0-9_]`,
    /// since such a token could be altered by later steps.
    pub fn new(entries: &[(&str, &str)]) -> Result<Self> {
        let mut surfaces = HashMap::new();
        let mut canonical = HashSet::new();

        for (surface, canon) in entries {
            let valid = !canon.is_empty()
                && canon
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if !valid {
                return Err(CleanError::MergeTable(format!(
                    "acronym canonical form '{canon}' must be lowercase [a-z0-9_]"
                )));
            }
            surfaces.insert(surface_key(surface), canon.to_string());
            canonical.insert(canon.to_string());
        }

        // Longest surface first: regex alternation is leftmost-first,
        // so "QE2" must be tried before "QE" and "LSAPs" before "LSAP".
        let mut ordered: Vec<&str> = entries.iter().map(|(s, _)| *s).collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        ordered.dedup();

        let alternation = ordered
            .iter()
            .map(|s| {
                s.split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&format!("(?:{alternation})"))
            .case_insensitive(true)
            .build()
            .map_err(|e| CleanError::MergeTable(e.to_string()))?;

        Ok(Self {
            surfaces,
            canonical,
            pattern,
        })
    }

    /// The built-in Fed acronym table
    pub fn fed_default() -> Result<Self> {
        Self::new(FED_ACRONYMS)
    }

    /// True if `token` is the canonical form of a guarded acronym
    pub fn is_acronym(&self, token: &str) -> bool {
        self.canonical.contains(token)
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Rewrite every guarded surface form in `text` to its canonical
    /// token, padded with spaces so it stands as its own word.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut copied = 0usize;
        let mut pos = 0usize;

        while let Some(m) = self.pattern.find_at(text, pos) {
            let before_ok = text[..m.start()]
                .chars()
                .next_back()
                .map_or(true, |c| !is_word_char(c));
            let end = m.end() + possessive_len(&text[m.end()..]);
            let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));

            let canon = self.surfaces.get(&surface_key(m.as_str()));
            match canon {
                Some(canon) if before_ok && after_ok => {
                    out.push_str(&text[copied..m.start()]);
                    out.push(' ');
                    out.push_str(canon);
                    out.push(' ');
                    copied = end;
                    pos = end;
                }
                _ => {
                    // Step one char past the match start and retry
                    pos = m.start()
                        + text[m.start()..].chars().next().map_or(1, char::len_utf8);
                }
            }
            if pos >= text.len() {
                break;
            }
        }

        out.push_str(&text[copied..]);
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn surface_key(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Length in bytes of a possessive suffix at the start of `rest`, or 0
fn possessive_len(rest: &str) -> usize {
    for apostrophe in ["'", "\u{2019}"] {
        if let Some(after) = rest.strip_prefix(apostrophe) {
            if after.starts_with('s') || after.starts_with('S') {
                let candidate = apostrophe.len() + 1;
                let tail_ok = rest[candidate..]
                    .chars()
                    .next()
                    .map_or(true, |c| !is_word_char(c));
                if tail_ok {
                    return candidate;
                }
            }
        }
    }
    0
}
