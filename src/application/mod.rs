// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (building the corpus or inspecting it).
//
// Rules for this layer:
//   - No parsing or token rules here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// HTML → Parquet corpus
pub mod clean_use_case;

// Corpus → vocab.txt + evaluation-term check
pub mod vocab_use_case;
