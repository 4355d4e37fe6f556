// ============================================================
// Layer 6 — Configuration
// ============================================================
// config.yaml holds the directory layout and cleaning knobs.
// Every field is optional; anything missing takes its default,
// and a missing file means "all defaults" (with a warning).
//
// Example:
//   paths:
//     downloads_dir: data/fed_downloads
//     text_dir: data/fed_text
//     corpus_dir: data/fed_corpus
//   cleaning:
//     removal_guard: 0.4
//     min_guard: 0.3
//     max_guard: 0.6
//     min_paragraph_chars: 20
//     flush_every: 32
//     conflict_policy: reject
//     extra_phrases: ["term premium"]

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::merger::ConflictPolicy;
use crate::domain::error::{CleanError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub cleaning: CleaningConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the downloader left fomc/ and speeches/
    pub downloads_dir: PathBuf,

    /// Side outputs: removed-lines log, run summary
    pub text_dir: PathBuf,

    /// Parquet part directory
    pub corpus_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("data/fed_downloads"),
            text_dir: PathBuf::from("data/fed_text"),
            corpus_dir: PathBuf::from("data/fed_corpus"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Guard used when profiling yields no ratios
    pub removal_guard: f64,
    pub min_guard: f64,
    pub max_guard: f64,

    /// Shorter stripped lines are dropped
    pub min_paragraph_chars: usize,

    /// Documents per Parquet part
    pub flush_every: usize,

    pub conflict_policy: ConflictPolicy,

    /// Added to the built-in merge table ("a b" or "a b => a_b")
    pub extra_phrases: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            removal_guard: 0.4,
            min_guard: 0.3,
            max_guard: 0.6,
            min_paragraph_chars: 20,
            flush_every: 32,
            conflict_policy: ConflictPolicy::Reject,
            extra_phrases: Vec::new(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file '{}' not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        tracing::debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    /// Write as YAML. Refuses to replace an existing file unless `force`.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(CleanError::Config(format!(
                "'{}' already exists (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.cleaning;
        for (name, v) in [
            ("removal_guard", c.removal_guard),
            ("min_guard", c.min_guard),
            ("max_guard", c.max_guard),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(CleanError::Config(format!(
                    "cleaning.{name} must be within [0, 1], got {v}"
                )));
            }
        }
        if c.min_guard > c.max_guard {
            return Err(CleanError::Config(format!(
                "cleaning.min_guard ({}) exceeds cleaning.max_guard ({})",
                c.min_guard, c.max_guard
            )));
        }
        if c.flush_every == 0 {
            return Err(CleanError::Config("cleaning.flush_every must be at least 1".into()));
        }
        Ok(())
    }
}
