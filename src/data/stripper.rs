// ============================================================
// Layer 4 — HTML / Boilerplate Stripper
// ============================================================
// Turns a downloaded Fed page into an ordered list of paragraph
// strings. federalreserve.gov pages wrap a small amount of prose
// in a lot of chrome: navigation, breadcrumbs, footers, "Back to
// top" links, footnote back-references, and (in FOMC minutes)
// long attendance rosters.
//
// Steps:
//   1. Parse the HTML and pick the main content node
//      (div#article, div#content, ... falling back to <body>)
//   2. Walk the node, skipping script/style/nav/footer/... and
//      starting a new line at every block-level element
//   3. Remove boilerplate phrases and artifact lines (rosters,
//      footnote markers, bare numbers, URLs, PDF links)
//        → this is the BASELINE
//   4. FOMC only: keep narrative lines, drop roster-like lines.
//      If that removes more than `guard` of the baseline's
//      characters, fall back to the baseline.
//   5. Drop lines shorter than the minimum paragraph length
//
// A page with nothing left is not an error: it yields an empty
// paragraph list and the caller logs a skip.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::data::preprocessor::Preprocessor;
use crate::data::profile::compute_removed_lines;

/// Main-content candidates, in priority order
const CONTENT_SELECTORS: &[&str] = &[
    "div#article",
    "div#content",
    "div.col-xs-12.col-sm-8",
    "main",
    "article",
    "div#contentwrapper",
];

/// Subtrees that never contribute text
const STRIP_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "form", "aside", "table", "noscript",
];

/// Elements that start a new line
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6",
    "tr", "section", "article", "main", "blockquote", "pre", "hr", "figure", "figcaption",
    "address",
];

const BOILERPLATE: &[&str] = &[
    "Board of Governors of the Federal Reserve System",
    "Back to top",
    "Return to text",
    "Skip to main content",
    "Accessibility",
    "Contact Us",
    "Last Update:",
    "Home |",
    "| Privacy",
];

/// Domain words that mark a line as worth keeping in FOMC mode
const NARRATIVE_KEYWORDS: &[&str] = &[
    // macro + policy
    "inflation", "policy", "rate", "funds", "market", "economic", "growth", "financial",
    "committee", "participants", "staff", "balance", "sheet", "reserve", "credit", "risk",
    "employment", "output", "gdp", "prices", "labor", "wage", "supply", "demand",
    "investment", "spending", "unemployment", "ioer", "iorb", "rrp", "soma", "runoff",
    "transmission", "forecast", "projection", "estimate", "assessment", "decision",
    "rationale", "tools",
    // facilities & operations
    "mbs", "mortgage-backed", "mortgage backed", "treasury", "treasuries", "qe", "qt",
    "quantitative easing", "quantitative tightening", "repo", "repurchase",
    "discount window", "primary credit", "secondary credit", "standing repo facility", "srf",
    "facility", "facilities", "swap", "fima", "liquidity", "open market", "desk",
];

static SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

static ARTIFACT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^PRESENT\s*:",
        r"^ATTENDEES?\s*:",
        r"^ATTENDING\s*:",
        r"^Attended.*session",
        r"^Return to text",
        r"^\d+\.\s*Return to text",
        r"^Footnote\s*\d+",
        r"^\d+$",
        r"^[a-z]\.$",
        r"^\(\d+\)$",
        r"^\([a-z]\)$",
        r"^[\s\-_=]+$",
        r"https?://",
        r"\bPDF\b",
        r"\.pdf\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

static VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(is|are|was|were|be|been|being|has|have|had|will|would|should|can|could|may|might|does|do|did|\w+ing|\w+ed)\b",
    )
    .unwrap()
});
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z']+").unwrap());

/// How aggressively to filter lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StripMode {
    /// Boilerplate and artifact removal only (speeches)
    Light,
    /// Narrative line filter on top of the baseline (FOMC).
    /// `guard: None` disables the fallback.
    Fomc { guard: Option<f64> },
}

/// Result of stripping one page.
#[derive(Debug, Clone, Default)]
pub struct StrippedDocument {
    pub title: Option<String>,

    /// Surviving paragraphs in document order
    pub paragraphs: Vec<String>,

    /// Every line dropped after text extraction, in order
    pub removed: Vec<String>,

    /// True if the FOMC filter exceeded the guard and was undone
    pub guard_fallback: bool,
}

impl StrippedDocument {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

pub struct HtmlStripper {
    min_paragraph_chars: usize,
    preprocessor: Preprocessor,
}

impl HtmlStripper {
    pub fn new(min_paragraph_chars: usize) -> Self {
        Self {
            min_paragraph_chars,
            preprocessor: Preprocessor::new(),
        }
    }

    /// Strip a page into paragraphs.
    pub fn strip(&self, html: &str, mode: StripMode) -> StrippedDocument {
        let doc = Html::parse_document(html);
        let title = self.title(&doc);
        let lines = self.extract_lines(&doc);
        let baseline = self.baseline(&lines);

        let (filtered, guard_fallback) = match mode {
            StripMode::Light => (baseline.clone(), false),
            StripMode::Fomc { guard } => {
                let strict = narrative_filter(&baseline);
                let ratio = removal_ratio(&baseline, &strict);
                match guard {
                    Some(g) if ratio > g => {
                        tracing::info!(
                            "[Guard] Fallback to light cleaning (removed {:.1}%, guard {:.0}%)",
                            ratio * 100.0,
                            g * 100.0
                        );
                        (baseline.clone(), true)
                    }
                    _ => (strict, false),
                }
            }
        };

        let paragraphs: Vec<String> = filtered
            .into_iter()
            .filter(|l| l.chars().count() >= self.min_paragraph_chars)
            .collect();
        let removed = compute_removed_lines(&lines, &paragraphs);

        StrippedDocument {
            title,
            paragraphs,
            removed,
            guard_fallback,
        }
    }

    /// Fraction of baseline characters the FOMC filter removes with
    /// no guard applied, clamped to [0, 1]. `None` when the page has
    /// no baseline text at all.
    pub fn removal_ratio(&self, html: &str) -> Option<f64> {
        let doc = Html::parse_document(html);
        let baseline = self.baseline(&self.extract_lines(&doc));
        if baseline.is_empty() {
            return None;
        }
        let strict = narrative_filter(&baseline);
        Some(removal_ratio(&baseline, &strict).clamp(0.0, 1.0))
    }

    fn title(&self, doc: &Html) -> Option<String> {
        let el = doc.select(&TITLE_SELECTOR).next()?;
        let text = self.preprocessor.clean_line(&el.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    }

    /// Visible text of the main node, one entry per block-level line
    fn extract_lines(&self, doc: &Html) -> Vec<String> {
        let main = SELECTORS
            .iter()
            .find_map(|sel| doc.select(sel).next())
            .or_else(|| doc.select(&BODY_SELECTOR).next())
            .unwrap_or_else(|| doc.root_element());

        let mut collector = LineCollector::default();
        walk(main, &mut collector);
        collector.finish();

        collector
            .lines
            .iter()
            .map(|l| self.preprocessor.clean_line(l))
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Boilerplate phrases out, artifact lines dropped
    fn baseline(&self, lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                let mut l = line.clone();
                for phrase in BOILERPLATE {
                    l = l.replace(phrase, " ");
                }
                self.preprocessor.clean_line(&l)
            })
            .filter(|l| !l.is_empty() && !is_artifact(l))
            .collect()
    }
}

#[derive(Default)]
struct LineCollector {
    lines: Vec<String>,
    current: String,
}

impl LineCollector {
    fn push_text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn break_line(&mut self) {
        if !self.current.trim().is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
    }

    fn finish(&mut self) {
        self.break_line();
    }
}

fn walk(element: ElementRef<'_>, out: &mut LineCollector) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_text(text),
            Node::Element(el) => {
                let name = el.name();
                if STRIP_TAGS.contains(&name) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.break_line();
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    walk(child_el, out);
                }
                if block {
                    out.break_line();
                }
            }
            // Comments, doctypes, processing instructions
            _ => {}
        }
    }
}

fn is_artifact(line: &str) -> bool {
    let trimmed = line.trim();
    ARTIFACT_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

fn word_count(line: &str) -> usize {
    WORD_RE.find_iter(line).count()
}

fn is_narrative(line: &str) -> bool {
    let low = line.to_lowercase();
    if NARRATIVE_KEYWORDS.iter().any(|k| low.contains(k)) {
        return true;
    }
    VERB_RE.is_match(line) && word_count(line) >= 6
}

/// Roster-like: many names separated by commas and no verb
fn is_garbage(line: &str) -> bool {
    if is_artifact(line) {
        return true;
    }
    word_count(line) >= 6 && line.matches(',').count() >= 3 && !VERB_RE.is_match(line)
}

fn narrative_filter(baseline: &[String]) -> Vec<String> {
    baseline
        .iter()
        .filter(|l| is_narrative(l) || !is_garbage(l))
        .cloned()
        .collect()
}

/// Characters of the newline-joined text, as the side log sees it
fn joined_len(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|l| l.chars().count()).sum();
    chars + lines.len().saturating_sub(1)
}

fn removal_ratio(baseline: &[String], kept: &[String]) -> f64 {
    let base = joined_len(baseline);
    if base == 0 {
        return 0.0;
    }
    1.0 - joined_len(kept) as f64 / base as f64
}
