// ============================================================
// Layer 2 — CleanUseCase
// ============================================================
// Orchestrates one cleaning run, single pass, one document at
// a time:
//
//   Step 1: List downloaded documents       (Layer 4 - data)
//   Step 2: Pick the FOMC removal guard     (Layer 4 - data)
//           --guard wins; otherwise profile every FOMC page
//   Step 3: For each document not yet in the corpus:
//
//     Raw ──strip──▶ Stripped ──normalise──▶ Normalized
//         ──merge──▶ Merged ──filter──▶ Filtered ──append──▶ Persisted
//
//           Any stage can end in Skipped instead: an unreadable
//           file, or no surviving paragraphs / tokens (Parse).
//           Skips are logged and counted, never fatal.
//
//   Step 4: Flush the corpus, log and save the run summary
//
// Each newly persisted document also gets its stripped text
// written under the text directory (see infra::text_store).
//
// Documents already present short-circuit straight to
// Persisted without being read, which makes re-runs cheap and
// keeps the corpus at one row per document id.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::loader::HtmlLoader;
use crate::data::profile::recommend_guard;
use crate::data::stripper::{HtmlStripper, StripMode};
use crate::data::tokenizer::Tokenizer;
use crate::domain::document::{CleanedParagraph, DocumentHandle, RawDocument, SourceType};
use crate::domain::error::CleanError;
use crate::domain::traits::{CorpusRecord, CorpusSink, DocumentSource};
use crate::infra::config::Config;
use crate::infra::corpus_store::CorpusStore;
use crate::infra::removed_log::RemovedLinesLog;
use crate::infra::text_store::CleanedTextStore;

pub const SUMMARY_FILE: &str = "clean_summary.json";

/// Which downloaded sources a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Fomc,
    Speeches,
}

impl Target {
    pub fn sources(&self) -> Vec<SourceType> {
        match self {
            Self::All => vec![SourceType::Fomc, SourceType::Speech],
            Self::Fomc => vec![SourceType::Fomc],
            Self::Speeches => vec![SourceType::Speech],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub target: Target,

    /// Write removed_lines.txt under the text directory
    pub save_removed: bool,

    /// Fixed FOMC removal guard; skips profiling
    pub guard: Option<f64>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            target: Target::All,
            save_removed: false,
            guard: None,
        }
    }
}

/// Counters for one run. Saved as clean_summary.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub seen: usize,
    pub persisted: usize,
    pub already_present: usize,
    pub skipped: usize,
    /// Characters of cleaned text in persisted documents
    pub chars: usize,
    pub tokens: usize,
    pub ambiguities: usize,
    /// FOMC pages whose narrative filter tripped the removal guard
    pub guard_fallbacks: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seen={} persisted={} already_present={} skipped={} chars={} tokens={} \
             ambiguities={} guard_fallbacks={}",
            self.seen,
            self.persisted,
            self.already_present,
            self.skipped,
            self.chars,
            self.tokens,
            self.ambiguities,
            self.guard_fallbacks
        )
    }
}

/// Side files written during a run. Both are optional.
#[derive(Default)]
pub struct SideOutputs {
    pub removed: Option<RemovedLinesLog>,
    pub text: Option<CleanedTextStore>,
}

/// Everything the pipeline produced for one document.
#[derive(Debug)]
pub struct ProcessedDocument {
    /// Surviving paragraphs, as written to the text file
    pub paragraphs: Vec<String>,
    /// Lines the stripper dropped, for the side log
    pub removed: Vec<String>,
    pub guard_fallback: bool,
    pub ambiguities: usize,
    /// `CleanError::Parse` when nothing persistable survived
    pub outcome: std::result::Result<CorpusRecord, CleanError>,
}

// ─── CleanUseCase ─────────────────────────────────────────────────────────────
pub struct CleanUseCase {
    config: Config,
    options: CleanOptions,
    stripper: HtmlStripper,
    tokenizer: Tokenizer,
}

impl CleanUseCase {
    /// Build the stripper and the token tables once for the run.
    pub fn new(config: Config, options: CleanOptions) -> Result<Self> {
        let cleaning = &config.cleaning;
        let tokenizer =
            Tokenizer::fed_default(&cleaning.extra_phrases, cleaning.conflict_policy)
                .context("Cannot build merge/acronym tables")?;
        let stripper = HtmlStripper::new(cleaning.min_paragraph_chars);

        Ok(Self {
            config,
            options,
            stripper,
            tokenizer,
        })
    }

    /// Run against the configured directories
    pub fn execute(&self) -> Result<RunSummary> {
        let paths = &self.config.paths;
        tracing::info!(
            "Cleaning {:?} from '{}' into '{}'",
            self.options.target,
            paths.downloads_dir.display(),
            paths.corpus_dir.display()
        );

        let source = HtmlLoader::new(&paths.downloads_dir, &self.options.target.sources());
        let mut store = CorpusStore::open(&paths.corpus_dir, self.config.cleaning.flush_every)
            .with_context(|| format!("Cannot open corpus '{}'", paths.corpus_dir.display()))?;
        let removed = if self.options.save_removed {
            Some(RemovedLinesLog::create(&paths.text_dir)?)
        } else {
            None
        };
        let outputs = SideOutputs {
            removed,
            text: Some(CleanedTextStore::new(&paths.text_dir)),
        };

        let summary = self.run(&source, &mut store, &outputs)?;

        if store.is_empty() {
            tracing::warn!("Corpus '{}' is still empty", paths.corpus_dir.display());
        } else {
            tracing::info!("Corpus now holds {} documents", store.len());
        }
        if let Some(log) = &outputs.removed {
            tracing::info!("Removed lines written to '{}'", log.path().display());
        }
        let summary_path = self.save_summary(&summary)?;
        tracing::info!("Run summary written to '{}'", summary_path.display());
        Ok(summary)
    }

    /// The per-document state machine over any source and sink.
    pub fn run<S, K>(
        &self,
        source: &S,
        sink: &mut K,
        outputs: &SideOutputs,
    ) -> Result<RunSummary>
    where
        S: DocumentSource,
        K: CorpusSink,
    {
        // ── Step 1: List ─────────────────────────────────────────────────────
        let handles = source.list()?;
        tracing::info!("Listed {} documents", handles.len());

        // ── Step 2: Removal guard ────────────────────────────────────────────
        let guard = if handles.iter().any(|h| h.source == SourceType::Fomc) {
            Some(self.removal_guard(source, &handles))
        } else {
            None
        };

        // ── Step 3: Documents ────────────────────────────────────────────────
        let mut summary = RunSummary::default();
        for handle in &handles {
            summary.seen += 1;

            if sink.contains(&handle.id) {
                tracing::debug!("Already persisted: {}", handle.id);
                summary.already_present += 1;
                continue;
            }

            let raw = match source.read(handle) {
                Ok(raw) => raw,
                Err(e) => {
                    self.skip(&mut summary, handle, &format!("unreadable: {e:#}"));
                    continue;
                }
            };

            let mode = match raw.source {
                SourceType::Fomc => StripMode::Fomc { guard },
                SourceType::Speech => StripMode::Light,
            };
            let processed = self.process(&raw, mode);
            summary.ambiguities += processed.ambiguities;
            if processed.guard_fallback {
                summary.guard_fallbacks += 1;
            }

            if let Some(log) = &outputs.removed {
                log.record(&raw.path, &processed.removed)?;
            }

            match processed.outcome {
                Ok(record) => {
                    let tokens = record.tokens.len();
                    if sink.append(record)? {
                        tracing::debug!("Persisted {} ({} tokens)", handle.id, tokens);
                        if let Some(text) = &outputs.text {
                            text.write(raw.source, &raw.id, &processed.paragraphs)?;
                        }
                        summary.persisted += 1;
                        summary.chars += text_chars(&processed.paragraphs);
                        summary.tokens += tokens;
                    } else {
                        summary.already_present += 1;
                    }
                }
                Err(e) => self.skip(&mut summary, handle, &e),
            }
        }

        // ── Step 4: Flush ────────────────────────────────────────────────────
        sink.flush()?;
        tracing::info!("Clean run finished: {}", summary);
        Ok(summary)
    }

    /// Raw → Persisted-ready record, or the reason it was skipped.
    /// Pure: the same document and mode always give the same tokens.
    pub fn process(&self, raw: &RawDocument, mode: StripMode) -> ProcessedDocument {
        // Stripped
        let stripped = self.stripper.strip(&raw.html, mode);
        if stripped.is_empty() {
            return ProcessedDocument {
                paragraphs: Vec::new(),
                removed: stripped.removed,
                guard_fallback: stripped.guard_fallback,
                ambiguities: 0,
                outcome: Err(CleanError::Parse("no paragraphs after stripping".into())),
            };
        }

        // Normalized → Merged → Filtered
        let mut tokens = Vec::new();
        let mut ambiguities = 0;
        for (position, text) in stripped.paragraphs.iter().enumerate() {
            let paragraph = CleanedParagraph::new(raw.id.clone(), position, text.as_str());
            let out = self.tokenizer.tokenize_paragraph(&paragraph);
            for a in &out.ambiguities {
                tracing::debug!("{}: paragraph {}: {}", paragraph.document_id, out.position, a);
            }
            ambiguities += out.ambiguities.len();
            tokens.extend(out.tokens.into_iter().map(|t| t.text));
        }

        let outcome = if tokens.is_empty() {
            Err(CleanError::Parse("no tokens after filtering".into()))
        } else {
            let meta = &raw.metadata;
            Ok(CorpusRecord {
                document_id: raw.id.clone(),
                date: meta.date_iso(),
                source_type: raw.source.as_str().to_string(),
                doc_kind: meta.doc_kind.clone(),
                speaker: meta.speaker.clone(),
                title: stripped.title.clone().or_else(|| meta.title.clone()),
                paragraph_count: stripped.paragraphs.len() as u32,
                tokens,
            })
        };

        ProcessedDocument {
            paragraphs: stripped.paragraphs,
            removed: stripped.removed,
            guard_fallback: stripped.guard_fallback,
            ambiguities,
            outcome,
        }
    }

    fn removal_guard<S: DocumentSource>(&self, source: &S, handles: &[DocumentHandle]) -> f64 {
        if let Some(guard) = self.options.guard {
            tracing::info!("Using removal guard {:.0}% from the command line", guard * 100.0);
            return guard;
        }

        // Unreadable pages are reported again (and skipped) in the main pass
        let ratios: Vec<f64> = handles
            .iter()
            .filter(|h| h.source == SourceType::Fomc)
            .filter_map(|h| source.read(h).ok())
            .filter_map(|raw| self.stripper.removal_ratio(&raw.html))
            .collect();

        let c = &self.config.cleaning;
        recommend_guard(&ratios, c.removal_guard, c.min_guard, c.max_guard)
    }

    fn skip(&self, summary: &mut RunSummary, handle: &DocumentHandle, reason: &dyn fmt::Display) {
        tracing::warn!("Skipping {} ({}): {}", handle.id, handle.path.display(), reason);
        summary.skipped += 1;
    }

    fn save_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let dir = &self.config.paths.text_dir;
        fs::create_dir_all(dir).with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(path)
    }
}

/// Length of the cleaned text as written: paragraphs joined by newlines
fn text_chars(paragraphs: &[String]) -> usize {
    let chars: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
    chars + paragraphs.len().saturating_sub(1)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    use crate::domain::document::{DocumentId, DocumentMetadata};
    use crate::infra::corpus_store::read_dir_records;
    use tempfile::TempDir;

    const MINUTES: &str = "<html><head><title>Minutes</title></head><body>\
        <div id=\"article\">\
        <p>PRESENT: Janet Yellen, Chair</p>\
        <p>The Committee reduced its asset purchases by $10 billion.</p>\
        <p>Inflation ran below 2 percent; the federal funds rate stayed near zero.</p>\
        </div></body></html>";

    const SPEECH: &str = "<html><body><div id=\"content\">\
        <p>Forward guidance has become a central tool of QE policy.</p>\
        <p>Back to top</p></div></body></html>";

    const BOILERPLATE_ONLY: &str =
        "<html><body><p>Back to top</p><p>Skip to main content</p></body></html>";

    struct MemorySource {
        docs: Vec<(DocumentHandle, Option<String>)>,
    }

    impl MemorySource {
        fn new(docs: &[(SourceType, &str, Option<&str>)]) -> Self {
            let docs = docs
                .iter()
                .map(|(source, stem, html)| {
                    let handle = DocumentHandle {
                        id: DocumentId::new(*source, stem),
                        source: *source,
                        path: PathBuf::from(format!("{stem}.htm")),
                        metadata: DocumentMetadata::default(),
                    };
                    (handle, html.map(str::to_string))
                })
                .collect();
            Self { docs }
        }
    }

    impl DocumentSource for MemorySource {
        fn list(&self) -> Result<Vec<DocumentHandle>> {
            Ok(self.docs.iter().map(|(h, _)| h.clone()).collect())
        }

        fn read(&self, handle: &DocumentHandle) -> Result<RawDocument> {
            let (_, html) = self
                .docs
                .iter()
                .find(|(h, _)| h.id == handle.id)
                .ok_or_else(|| anyhow::anyhow!("unknown document"))?;
            let html = html.clone().ok_or_else(|| anyhow::anyhow!("permission denied"))?;
            Ok(RawDocument::from_handle(handle.clone(), html))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Vec<CorpusRecord>,
        ids: HashSet<DocumentId>,
        flushes: usize,
    }

    impl CorpusSink for MemorySink {
        fn contains(&self, id: &DocumentId) -> bool {
            self.ids.contains(id)
        }

        fn append(&mut self, record: CorpusRecord) -> Result<bool> {
            if !self.ids.insert(record.document_id.clone()) {
                return Ok(false);
            }
            self.records.push(record);
            Ok(true)
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn use_case(options: CleanOptions) -> CleanUseCase {
        CleanUseCase::new(Config::default(), options).unwrap()
    }

    #[test]
    fn test_persists_tokens_in_paragraph_order() {
        let source = MemorySource::new(&[(SourceType::Fomc, "minutes/m1", Some(MINUTES))]);
        let mut sink = MemorySink::default();
        let summary = use_case(CleanOptions::default())
            .run(&source, &mut sink, &SideOutputs::default())
            .unwrap();

        assert_eq!(summary.persisted, 1);
        assert_eq!(sink.flushes, 1);
        let record = &sink.records[0];
        assert_eq!(record.document_id.as_str(), "fomc/minutes/m1");
        assert_eq!(record.title.as_deref(), Some("Minutes"));
        assert_eq!(record.paragraph_count, 2);
        assert_eq!(
            record.tokens,
            vec![
                "the", "committee", "reduced", "its", "asset_purchases", "by", "billion",
                "inflation", "ran", "below", "x_percent", "the", "federal_funds_rate",
                "stayed", "near", "zero",
            ]
        );
        assert_eq!(summary.tokens, record.tokens.len());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let source = MemorySource::new(&[
            (SourceType::Fomc, "minutes/m1", Some(MINUTES)),
            (SourceType::Speech, "Powell/s1", Some(SPEECH)),
        ]);
        let mut sink = MemorySink::default();
        let uc = use_case(CleanOptions::default());

        let first = uc.run(&source, &mut sink, &SideOutputs::default()).unwrap();
        let second = uc.run(&source, &mut sink, &SideOutputs::default()).unwrap();

        assert_eq!(first.persisted, 2);
        assert_eq!(second.persisted, 0);
        assert_eq!(second.already_present, 2);
        assert_eq!(sink.records.len(), 2);
    }

    #[test]
    fn test_boilerplate_only_document_is_skipped() {
        let source = MemorySource::new(&[(SourceType::Speech, "Powell/empty", Some(BOILERPLATE_ONLY))]);
        let mut sink = MemorySink::default();
        let summary = use_case(CleanOptions::default())
            .run(&source, &mut sink, &SideOutputs::default())
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.tokens, 0);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_unreadable_document_does_not_abort_batch() {
        let source = MemorySource::new(&[
            (SourceType::Speech, "Powell/broken", None),
            (SourceType::Speech, "Powell/s1", Some(SPEECH)),
        ]);
        let mut sink = MemorySink::default();
        let summary = use_case(CleanOptions::default())
            .run(&source, &mut sink, &SideOutputs::default())
            .unwrap();

        assert_eq!(summary.seen, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.persisted, 1);
    }

    #[test]
    fn test_reprocessing_matches_persisted_tokens() {
        let source = MemorySource::new(&[(SourceType::Speech, "Powell/s1", Some(SPEECH))]);
        let mut sink = MemorySink::default();
        let uc = use_case(CleanOptions::default());
        uc.run(&source, &mut sink, &SideOutputs::default()).unwrap();

        let handle = &source.list().unwrap()[0];
        let raw = source.read(handle).unwrap();
        let again = uc.process(&raw, StripMode::Light).outcome.unwrap();
        assert_eq!(again.tokens, sink.records[0].tokens);
        assert_eq!(
            again.tokens,
            vec!["forward_guidance", "has", "become", "a", "central", "tool", "of", "qe", "policy"]
        );
    }

    #[test]
    fn test_digits_only_paragraphs_give_no_tokens() {
        let html = "<body><p>2014 2015 2016 2017 2018 2019 2020</p></body>";
        let source = MemorySource::new(&[(SourceType::Speech, "x/years", Some(html))]);
        let uc = use_case(CleanOptions::default());
        let raw = source.read(&source.list().unwrap()[0]).unwrap();
        let processed = uc.process(&raw, StripMode::Light);
        assert!(matches!(processed.outcome, Err(CleanError::Parse(_))));
    }

    #[test]
    fn test_guard_fallback_is_counted() {
        let html = "<body>\
            <p>Smith, Jones, Brown, Green, White, Black, Gray</p>\
            <p>The Committee decided to reduce asset purchases.</p></body>";
        let source = MemorySource::new(&[(SourceType::Fomc, "minutes/roster", Some(html))]);
        let mut sink = MemorySink::default();
        let options = CleanOptions {
            guard: Some(0.1),
            ..Default::default()
        };
        let summary = use_case(options)
            .run(&source, &mut sink, &SideOutputs::default())
            .unwrap();

        assert_eq!(summary.guard_fallbacks, 1);
        assert_eq!(sink.records[0].paragraph_count, 2);
        assert_eq!(sink.records[0].tokens[0], "smith");
    }

    #[test]
    fn test_cleaned_text_written_for_persisted_documents_only() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new(&[
            (SourceType::Speech, "Powell/s1", Some(SPEECH)),
            (SourceType::Speech, "Powell/empty", Some(BOILERPLATE_ONLY)),
        ]);
        let mut sink = MemorySink::default();
        let outputs = SideOutputs {
            removed: None,
            text: Some(CleanedTextStore::new(dir.path())),
        };
        let summary = use_case(CleanOptions::default())
            .run(&source, &mut sink, &outputs)
            .unwrap();

        let text = "Forward guidance has become a central tool of QE policy.";
        let written = fs::read_to_string(dir.path().join("speeches/Powell/s1.txt")).unwrap();
        assert_eq!(written, text);
        assert!(!dir.path().join("speeches/Powell/empty.txt").exists());
        assert_eq!(summary.chars, text.chars().count());
    }

    #[test]
    fn test_text_chars_counts_joining_newlines() {
        let paragraphs = vec!["abc".to_string(), "de".to_string()];
        assert_eq!(text_chars(&paragraphs), 6);
        assert_eq!(text_chars(&[]), 0);
    }

    #[test]
    fn test_target_sources() {
        assert_eq!(Target::All.sources(), vec![SourceType::Fomc, SourceType::Speech]);
        assert_eq!(Target::Speeches.sources(), vec![SourceType::Speech]);
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_execute_writes_corpus_summary_and_removed_log() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.downloads_dir = dir.path().join("downloads");
        config.paths.text_dir = dir.path().join("text");
        config.paths.corpus_dir = dir.path().join("corpus");

        write(&config.paths.downloads_dir, "fomc/minutes/fomcminutes20140129.htm", MINUTES);
        write(&config.paths.downloads_dir, "speeches/Powell/2019-05-20-s.htm", SPEECH);

        let options = CleanOptions {
            save_removed: true,
            guard: Some(0.5),
            ..Default::default()
        };
        let summary = CleanUseCase::new(config.clone(), options)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(summary.persisted, 2);

        let records = read_dir_records(&config.paths.corpus_dir).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date.as_deref(), Some("2014-01-29"));
        assert_eq!(records[0].doc_kind.as_deref(), Some("minutes"));
        assert_eq!(records[1].speaker.as_deref(), Some("Powell"));

        let removed = fs::read_to_string(config.paths.text_dir.join("removed_lines.txt")).unwrap();
        assert!(removed.contains("PRESENT: Janet Yellen, Chair"));

        let minutes_text = fs::read_to_string(
            config.paths.text_dir.join("fomc/minutes/fomcminutes20140129.txt"),
        )
        .unwrap();
        assert_eq!(
            minutes_text,
            "The Committee reduced its asset purchases by $10 billion.\n\
             Inflation ran below 2 percent; the federal funds rate stayed near zero."
        );
        assert!(config.paths.text_dir.join("speeches/Powell/2019-05-20-s.txt").exists());

        let json = fs::read_to_string(config.paths.text_dir.join(SUMMARY_FILE)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["persisted"], 2);
        assert_eq!(parsed["chars"], summary.chars);
    }
}
