// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that describe the
// corpus: what a raw Fed document is, what a cleaned paragraph
// is, what a token is, and what can go wrong along the way.
//
// Rules for this layer:
//   - NO HTML parsing here
//   - NO file I/O or Parquet code
//   - Only plain Rust types and the traits other layers implement
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Raw documents, identifiers, and cleaned paragraphs
pub mod document;

// Tokens, token kinds, and the corpus vocabulary
pub mod token;

// Error kinds raised inside the cleaning core
pub mod error;

// Seams between the pipeline and its input/output
pub mod traits;
