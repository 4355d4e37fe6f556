// ============================================================
// Layer 6 — Corpus Store (Parquet)
// ============================================================
// The corpus is one logical table spread over part files:
//
//   data/fed_corpus/
//     part-00000.parquet
//     part-00001.parquet
//     ...
//
// Spark reads the directory as a single DataFrame. Parts are
// never rewritten: new documents always go into a new part, so
// an interrupted run leaves every earlier part intact.
//
// Schema (one row per document):
//   document_id      utf8          not null
//   date             utf8          nullable   YYYY-MM-DD
//   source_type      utf8          not null   fomc | speech
//   doc_kind         utf8          nullable
//   speaker          utf8          nullable
//   title            utf8          nullable
//   paragraph_count  uint32        not null
//   token_count      uint32        not null
//   tokens           list<utf8>    not null
//
// Write path: buffer → RecordBatch → ArrowWriter on a hidden
// temp file → rename to part-NNNNN.parquet. Spark skips files
// starting with '.', so a half-written part is never read.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, ListBuilder, StringArray, StringBuilder, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, UInt32Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::domain::document::DocumentId;
use crate::domain::error::{CleanError, Result};
use crate::domain::traits::{CorpusRecord, CorpusSink};

const PART_PREFIX: &str = "part-";
const PART_SUFFIX: &str = ".parquet";
const TMP_SUFFIX: &str = ".tmp";

pub fn corpus_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("document_id", DataType::Utf8, false),
        Field::new("date", DataType::Utf8, true),
        Field::new("source_type", DataType::Utf8, false),
        Field::new("doc_kind", DataType::Utf8, true),
        Field::new("speaker", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("paragraph_count", DataType::UInt32, false),
        Field::new("token_count", DataType::UInt32, false),
        Field::new(
            "tokens",
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            false,
        ),
    ]))
}

/// Append-only Parquet corpus keyed by document id.
pub struct CorpusStore {
    dir: PathBuf,
    schema: SchemaRef,
    flush_every: usize,

    /// Ids persisted in earlier parts or waiting in `pending`
    known: HashSet<DocumentId>,
    pending: Vec<CorpusRecord>,
    next_part: usize,
}

impl CorpusStore {
    /// Open (or create) the store at `dir` and index the ids it
    /// already holds.
    pub fn open(dir: impl Into<PathBuf>, flush_every: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        remove_stale_temp_files(&dir)?;

        let parts = part_files(&dir)?;
        let next_part = parts
            .iter()
            .filter_map(|p| part_index(p))
            .max()
            .map_or(0, |i| i + 1);

        let mut known = HashSet::new();
        for part in &parts {
            for id in read_ids(part)? {
                known.insert(id);
            }
        }

        tracing::info!(
            "Opened corpus '{}': {} parts, {} documents",
            dir.display(),
            parts.len(),
            known.len()
        );

        Ok(Self {
            dir,
            schema: corpus_schema(),
            flush_every: flush_every.max(1),
            known,
            pending: Vec::new(),
            next_part,
        })
    }

    /// Number of distinct documents, persisted or pending
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    fn write_part(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = to_batch(&self.schema, &self.pending)?;
        let name = format!("{PART_PREFIX}{:05}{PART_SUFFIX}", self.next_part);
        let final_path = self.dir.join(&name);
        let tmp_path = self.dir.join(format!(".{name}{TMP_SUFFIX}"));

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let file = File::create(&tmp_path)?;
        let mut writer = ArrowWriter::try_new(file, self.schema.clone(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        fs::rename(&tmp_path, &final_path)?;

        tracing::info!(
            "Wrote {} ({} documents)",
            final_path.display(),
            self.pending.len()
        );
        self.pending.clear();
        self.next_part += 1;
        Ok(())
    }
}

impl CorpusSink for CorpusStore {
    fn contains(&self, id: &DocumentId) -> bool {
        self.known.contains(id)
    }

    fn append(&mut self, record: CorpusRecord) -> anyhow::Result<bool> {
        if !self.known.insert(record.document_id.clone()) {
            return Ok(false);
        }
        self.pending.push(record);
        if self.pending.len() >= self.flush_every {
            self.write_part()?;
        }
        Ok(true)
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.write_part()?;
        Ok(())
    }
}

/// Read every record from a corpus directory. A missing directory
/// is an empty corpus.
pub fn read_dir_records(dir: &Path) -> Result<Vec<CorpusRecord>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut records = Vec::new();
    for part in part_files(dir)? {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&part)?)?.build()?;
        for batch in reader {
            records.extend(from_batch(&batch?)?);
        }
    }
    Ok(records)
}

fn to_batch(schema: &SchemaRef, records: &[CorpusRecord]) -> Result<RecordBatch> {
    let ids = StringArray::from_iter_values(records.iter().map(|r| r.document_id.as_str()));
    let dates: StringArray = records.iter().map(|r| r.date.as_deref()).collect();
    let sources = StringArray::from_iter_values(records.iter().map(|r| r.source_type.as_str()));
    let kinds: StringArray = records.iter().map(|r| r.doc_kind.as_deref()).collect();
    let speakers: StringArray = records.iter().map(|r| r.speaker.as_deref()).collect();
    let titles: StringArray = records.iter().map(|r| r.title.as_deref()).collect();
    let paragraphs = UInt32Array::from_iter_values(records.iter().map(|r| r.paragraph_count));
    let counts = UInt32Array::from_iter_values(records.iter().map(|r| r.tokens.len() as u32));

    let mut tokens = ListBuilder::new(StringBuilder::new());
    for r in records {
        for t in &r.tokens {
            tokens.values().append_value(t);
        }
        tokens.append(true);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(ids),
        Arc::new(dates),
        Arc::new(sources),
        Arc::new(kinds),
        Arc::new(speakers),
        Arc::new(titles),
        Arc::new(paragraphs),
        Arc::new(counts),
        Arc::new(tokens.finish()),
    ];
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

fn from_batch(batch: &RecordBatch) -> Result<Vec<CorpusRecord>> {
    let ids = string_column(batch, "document_id")?;
    let dates = string_column(batch, "date")?;
    let sources = string_column(batch, "source_type")?;
    let kinds = string_column(batch, "doc_kind")?;
    let speakers = string_column(batch, "speaker")?;
    let titles = string_column(batch, "title")?;
    let paragraphs = batch
        .column_by_name("paragraph_count")
        .and_then(|c| c.as_primitive_opt::<UInt32Type>())
        .ok_or_else(|| column_error("paragraph_count"))?;
    let tokens = batch
        .column_by_name("tokens")
        .and_then(|c| c.as_list_opt::<i32>())
        .ok_or_else(|| column_error("tokens"))?;

    let optional = |col: &StringArray, i: usize| (!col.is_null(i)).then(|| col.value(i).to_string());

    let mut records = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let list = tokens.value(i);
        let words = list
            .as_string_opt::<i32>()
            .ok_or_else(|| column_error("tokens.item"))?;

        records.push(CorpusRecord {
            document_id: DocumentId::from_stored(ids.value(i)),
            date: optional(dates, i),
            source_type: sources.value(i).to_string(),
            doc_kind: optional(kinds, i),
            speaker: optional(speakers, i),
            title: optional(titles, i),
            paragraph_count: paragraphs.value(i),
            tokens: words.iter().flatten().map(str::to_string).collect(),
        });
    }
    Ok(records)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_string_opt::<i32>())
        .ok_or_else(|| column_error(name))
}

fn column_error(name: &str) -> CleanError {
    CleanError::Corpus(format!("column '{name}' is missing or has the wrong type"))
}

/// Only the document_id column is decoded
fn read_ids(part: &Path) -> Result<Vec<DocumentId>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(part)?)?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), [0]);
    let reader = builder.with_projection(mask).build()?;

    let mut ids = Vec::new();
    for batch in reader {
        let batch = batch?;
        let col = string_column(&batch, "document_id")?;
        ids.extend(col.iter().flatten().map(DocumentId::from_stored));
    }
    Ok(ids)
}

fn part_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut parts: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| part_index(p).is_some())
        .collect();
    parts.sort();
    Ok(parts)
}

/// `part-00012.parquet` → 12
fn part_index(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_SUFFIX)?
        .parse()
        .ok()
}

/// A crash between create and rename leaves a hidden temp file behind
fn remove_stale_temp_files(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let stale = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.') && n.ends_with(TMP_SUFFIX));
        if stale {
            tracing::warn!("Removing incomplete part '{}'", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
