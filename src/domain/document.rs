// ============================================================
// Layer 3 — Document Domain Types
// ============================================================
// A RawDocument is what the downloader left on disk: the HTML
// plus whatever we can tell about it from its location.
// A CleanedParagraph is one unit of text that survived the
// stripper, tied back to its document and position.
//
// Identifiers are derived from the relative path under the
// downloads directory, so re-running over the same files always
// yields the same ids. The corpus writer relies on that.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Which family of Fed publication a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// FOMC statements, minutes, and press conference transcripts
    Fomc,
    /// Chair speeches
    Speech,
}

impl SourceType {
    /// Stable lowercase label used in ids and in the corpus table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fomc => "fomc",
            Self::Speech => "speech",
        }
    }

    /// Directory name the downloader stores this source under
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Fomc => "fomc",
            Self::Speech => "speeches",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable document identifier: `<source_type>/<relative path without extension>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    /// Build an id from a source type and a `/`-separated relative stem.
    ///
    /// Example:
    ///   DocumentId::new(SourceType::Fomc, "minutes/January-28-29-fomcminutes20140129")
    ///   → "fomc/minutes/January-28-29-fomcminutes20140129"
    pub fn new(source: SourceType, relative_stem: &str) -> Self {
        let stem = relative_stem.replace('\\', "/");
        Self(format!("{}/{}", source.as_str(), stem.trim_matches('/')))
    }

    /// Wrap an id read back from the corpus store
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its `<source_type>/` prefix
    pub fn relative_stem(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(_, rest)| rest)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What we know about a document besides its text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Publication or meeting date, when the file name carries one
    pub date: Option<NaiveDate>,

    /// statement / minutes / press_conference (FOMC only)
    pub doc_kind: Option<String>,

    /// Speaker surname (speeches only)
    pub speaker: Option<String>,

    /// Contents of the HTML <title>, filled in by the stripper
    pub title: Option<String>,
}

impl DocumentMetadata {
    /// ISO `YYYY-MM-DD` rendering of the date, if known
    pub fn date_iso(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Lightweight pointer to a document on disk.
///
/// The pipeline lists handles first and only reads the HTML of
/// documents that are not already in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub id: DocumentId,
    pub source: SourceType,
    pub path: PathBuf,
    pub metadata: DocumentMetadata,
}

/// A raw document loaded from disk. Immutable once created.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: DocumentId,
    pub source: SourceType,
    pub path: PathBuf,
    pub metadata: DocumentMetadata,

    /// The HTML exactly as downloaded (lossily decoded to UTF-8)
    pub html: String,
}

impl RawDocument {
    /// Attach content to a handle
    pub fn from_handle(handle: DocumentHandle, html: impl Into<String>) -> Self {
        Self {
            id: handle.id,
            source: handle.source,
            path: handle.path,
            metadata: handle.metadata,
            html: html.into(),
        }
    }
}

/// One paragraph that survived boilerplate removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedParagraph {
    pub document_id: DocumentId,

    /// 0-based position in document order
    pub position: usize,

    pub text: String,
}

impl CleanedParagraph {
    pub fn new(document_id: DocumentId, position: usize, text: impl Into<String>) -> Self {
        Self {
            document_id,
            position,
            text: text.into(),
        }
    }
}
