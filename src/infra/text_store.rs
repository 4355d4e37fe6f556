// ============================================================
// Layer 6 — Cleaned Text Files
// ============================================================
// Plain-text copy of what survived stripping, one paragraph per
// line, laid out like the downloads directory:
//
//   <text_dir>/fomc/minutes/fomcminutes20140129.txt
//   <text_dir>/speeches/Powell/2019-05-20-powell20190520a.txt
//
// Written once per newly persisted document. Tokens live only in
// the corpus; these files are for reading and diffing.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::document::{DocumentId, SourceType};

pub struct CleanedTextStore {
    root: PathBuf,
}

impl CleanedTextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<source dir>/<relative stem>.txt`
    pub fn path_for(&self, source: SourceType, id: &DocumentId) -> PathBuf {
        let mut path = self.root.join(source.dir_name());
        let mut parts = id.relative_stem().split('/').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                path.push(part);
            } else {
                // stems may contain dots
                path.push(format!("{part}.txt"));
            }
        }
        path
    }

    /// Write (or overwrite) the text for one document.
    pub fn write(
        &self,
        source: SourceType,
        id: &DocumentId,
        paragraphs: &[String],
    ) -> Result<PathBuf> {
        let path = self.path_for(source, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        fs::write(&path, paragraphs.join("\n"))
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(path)
    }
}
