// ============================================================
// Layer 4 — Text Pipeline
// ============================================================
// Everything between a downloaded HTML page and the token
// sequence that gets persisted.
//
// The pipeline flows in this order:
//
//   downloads/{fomc,speeches}/**.htm
//       │
//       ▼
//   HtmlLoader        → lists files, reads raw HTML
//       │
//       ▼
//   HtmlStripper      → main content, boilerplate out, paragraphs
//       │
//       ▼
//   Normalizer        → acronym guard, lowercase, punctuation,
//       │               numeric placeholders
//       ▼
//   PhraseMerger      → multi-word terms become one token
//       │
//       ▼
//   TokenFilter       → only persistable tokens remain
//
// Each module is responsible for exactly one step.

/// Lists and reads downloaded HTML files
pub mod loader;

/// Whitespace and invisible-character cleanup
pub mod preprocessor;

/// HTML to paragraphs, boilerplate and roster removal
pub mod stripper;

/// Removal-ratio statistics and guard recommendation
pub mod profile;

/// Acronym surface forms to canonical tokens
pub mod acronyms;

/// Lowercasing, punctuation, numeric placeholders
pub mod normalizer;

/// Word-trie phrase merging
pub mod merger;

/// Keeps only persistable tokens
pub mod filter;

/// Composes normaliser, merger, and filter per paragraph
pub mod tokenizer;
