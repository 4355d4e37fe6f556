// ============================================================
// Layer 6 — Removed-Lines Log
// ============================================================
// Optional side log of everything the stripper dropped, so the
// boilerplate and roster rules can be audited by eye.
//
// Output file: <text_dir>/removed_lines.txt
//
// Example:
//   === File: data/fed_downloads/fomc/minutes/fomcminutes20140129.htm
//   PRESENT: Janet Yellen, Chair
//   Smith, Jones, Brown, Green, White, Black, Gray
//
//   === File: ...
//
// The file is truncated when the logger is created and appended
// to block by block during the run.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const REMOVED_LINES_FILE: &str = "removed_lines.txt";

pub struct RemovedLinesLog {
    path: PathBuf,
}

impl RemovedLinesLog {
    /// Start a fresh log in `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(REMOVED_LINES_FILE);
        File::create(&path).with_context(|| format!("Cannot create '{}'", path.display()))?;
        tracing::debug!("Created removed-lines log: '{}'", path.display());
        Ok(Self { path })
    }

    /// Append one block. Documents with nothing removed write nothing.
    pub fn record(&self, source: &Path, lines: &[String]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;

        writeln!(f, "=== File: {}", source.display())?;
        for line in lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
