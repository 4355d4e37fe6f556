// ============================================================
// Layer 2 — VocabUseCase
// ============================================================
// Reads the persisted corpus back and answers the question the
// Word2Vec evaluation cares about: which anchor terms will the
// model actually have vectors for?
//
//   Step 1: Read every part of the corpus   (Layer 6 - infra)
//   Step 2: Count token frequencies         (Layer 3 - domain)
//   Step 3: Apply min_count, write vocab.txt
//   Step 4: Check evaluation terms, exact match only
//
// vocab.txt is `token<TAB>count`, most frequent first, ties
// broken alphabetically so the file is stable across runs.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::token::Vocabulary;
use crate::infra::config::Config;
use crate::infra::corpus_store::read_dir_records;

pub const VOCAB_FILE: &str = "vocab.txt";

#[derive(Debug, Clone, Default)]
pub struct VocabOptions {
    /// Tokens seen fewer times are left out (Word2Vec's minCount)
    pub min_count: usize,

    /// One evaluation term per line
    pub terms: Option<PathBuf>,

    /// Defaults to vocab.txt next to the corpus directory
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabReport {
    pub documents: usize,
    pub distinct: usize,
    pub output: PathBuf,
    pub missing_terms: Vec<String>,
}

pub struct VocabUseCase {
    config: Config,
    options: VocabOptions,
}

impl VocabUseCase {
    pub fn new(config: Config, options: VocabOptions) -> Self {
        Self { config, options }
    }

    pub fn execute(&self) -> Result<VocabReport> {
        let corpus_dir = &self.config.paths.corpus_dir;

        // ── Step 1: Read the corpus ──────────────────────────────────────────
        let records = read_dir_records(corpus_dir)
            .with_context(|| format!("Cannot read corpus '{}'", corpus_dir.display()))?;
        if records.is_empty() {
            tracing::warn!("Corpus '{}' is empty; run `clean` first", corpus_dir.display());
        }

        // ── Step 2: Count ────────────────────────────────────────────────────
        let mut vocab = Vocabulary::from_sequences(records.iter().map(|r| r.tokens.as_slice()));

        // ── Step 3: min_count + vocab.txt ────────────────────────────────────
        if self.options.min_count > 1 {
            vocab.retain_min_count(self.options.min_count);
            if vocab.is_empty() {
                tracing::warn!("No token reaches min_count {}", self.options.min_count);
            }
        }
        let output = self.output_path();
        write_vocab(&vocab, &output)?;
        tracing::info!(
            "Vocabulary: {} distinct tokens from {} documents → '{}'",
            vocab.len(),
            records.len(),
            output.display()
        );

        // ── Step 4: Evaluation terms ─────────────────────────────────────────
        let missing_terms = match &self.options.terms {
            Some(path) => {
                let terms = read_terms(path)?;
                let missing: Vec<String> =
                    vocab.missing(&terms).into_iter().map(str::to_string).collect();
                for term in &terms {
                    match vocab.count(term) {
                        0 => tracing::warn!("Evaluation term missing from vocabulary: {term}"),
                        n => tracing::debug!("Evaluation term {term}: {n} occurrences"),
                    }
                }
                tracing::info!("{}/{} evaluation terms present", terms.len() - missing.len(), terms.len());
                missing
            }
            None => Vec::new(),
        };

        Ok(VocabReport {
            documents: records.len(),
            distinct: vocab.len(),
            output,
            missing_terms,
        })
    }

    fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.options.output {
            return path.clone();
        }
        let corpus_dir = &self.config.paths.corpus_dir;
        corpus_dir
            .parent()
            .map_or_else(|| PathBuf::from(VOCAB_FILE), |p| p.join(VOCAB_FILE))
    }
}

fn write_vocab(vocab: &Vocabulary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    for (token, count) in vocab.sorted() {
        writeln!(f, "{token}\t{count}")?;
    }
    Ok(())
}

/// Non-empty trimmed lines; `#` starts a comment line
fn read_terms(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read terms file '{}'", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::DocumentId;
    use crate::domain::traits::{CorpusRecord, CorpusSink};
    use crate::infra::corpus_store::CorpusStore;
    use tempfile::TempDir;

    fn seed(corpus_dir: &Path, docs: &[(&str, &[&str])]) {
        let mut store = CorpusStore::open(corpus_dir, 32).unwrap();
        for (id, tokens) in docs {
            store
                .append(CorpusRecord {
                    document_id: DocumentId::from_stored(*id),
                    date: None,
                    source_type: "fomc".into(),
                    doc_kind: None,
                    speaker: None,
                    title: None,
                    paragraph_count: 1,
                    tokens: tokens.iter().map(|t| t.to_string()).collect(),
                })
                .unwrap();
        }
        store.flush().unwrap();
    }

    fn config(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.corpus_dir = root.join("corpus");
        config
    }

    #[test]
    fn test_vocab_file_is_sorted_and_placed_next_to_corpus() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        seed(
            &config.paths.corpus_dir,
            &[
                ("fomc/a", &["qe", "inflation", "qe"]),
                ("fomc/b", &["inflation", "qe", "balance_sheet"]),
            ],
        );

        let report = VocabUseCase::new(config, VocabOptions::default()).execute().unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.distinct, 3);
        assert_eq!(report.output, dir.path().join(VOCAB_FILE));

        let text = fs::read_to_string(&report.output).unwrap();
        assert_eq!(text, "qe\t3\ninflation\t2\nbalance_sheet\t1\n");
    }

    #[test]
    fn test_min_count_and_missing_terms() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        seed(&config.paths.corpus_dir, &[("fomc/a", &["qe", "qe", "taper"])]);

        let terms = dir.path().join("terms.txt");
        fs::write(&terms, "# anchors\nqe\n\ntaper\nforward_guidance\n").unwrap();
        let options = VocabOptions {
            min_count: 2,
            terms: Some(terms),
            output: Some(dir.path().join("out/v.txt")),
        };

        let report = VocabUseCase::new(config, options).execute().unwrap();
        assert_eq!(report.distinct, 1);
        assert_eq!(report.missing_terms, vec!["taper", "forward_guidance"]);
        assert_eq!(fs::read_to_string(dir.path().join("out/v.txt")).unwrap(), "qe\t2\n");
    }

    #[test]
    fn test_empty_corpus_gives_empty_vocab() {
        let dir = TempDir::new().unwrap();
        let report = VocabUseCase::new(config(dir.path()), VocabOptions::default())
            .execute()
            .unwrap();
        assert_eq!(report.distinct, 0);
        assert_eq!(fs::read_to_string(report.output).unwrap(), "");
    }
}
