// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the disk outside of reading the
// downloaded HTML:
//
//   config.rs        — config.yaml loading, defaults, `init`
//
//   corpus_store.rs  — the Parquet part directory the trainer
//                      reads; append-only, keyed by document id
//
//   removed_log.rs   — optional audit log of dropped lines
//
//   text_store.rs    — per-document cleaned text files
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// YAML configuration
pub mod config;

/// Parquet corpus writer and reader
pub mod corpus_store;

/// removed_lines.txt side log
pub mod removed_log;

/// <text_dir>/{fomc,speeches}/…/*.txt
pub mod text_store;
