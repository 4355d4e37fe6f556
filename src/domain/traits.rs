// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The clean use case only talks to its input and output through
// these two traits:
//   - HtmlLoader   implements DocumentSource (files on disk)
//   - CorpusStore  implements CorpusSink     (Parquet parts)
//
// Tests plug in in-memory versions of both, so the pipeline's
// state machine can be exercised without touching the disk.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::document::{DocumentHandle, DocumentId, RawDocument};

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Anything that can enumerate raw documents and read them one at a time.
pub trait DocumentSource {
    /// List every available document in a stable order.
    /// Cheap: no document content is read here.
    fn list(&self) -> Result<Vec<DocumentHandle>>;

    /// Read the content behind a handle
    fn read(&self, handle: &DocumentHandle) -> Result<RawDocument>;
}

// ─── CorpusSink ───────────────────────────────────────────────────────────────
/// One persisted corpus row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRecord {
    pub document_id: DocumentId,
    pub date: Option<String>,
    pub source_type: String,
    pub doc_kind: Option<String>,
    pub speaker: Option<String>,
    pub title: Option<String>,
    pub paragraph_count: u32,
    pub tokens: Vec<String>,
}

/// Append-only destination for corpus records.
pub trait CorpusSink {
    /// True if a record with this id was already persisted (or buffered)
    fn contains(&self, id: &DocumentId) -> bool;

    /// Append a record. Returns `false` and writes nothing when the
    /// document id is already present.
    fn append(&mut self, record: CorpusRecord) -> Result<bool>;

    /// Make every appended record durable
    fn flush(&mut self) -> Result<()>;
}
