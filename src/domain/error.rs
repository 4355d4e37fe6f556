//! Error kinds raised inside the cleaning core.
//!
//! None of these abort a batch on their own: the clean use case
//! turns per-document errors into logged skips. Only `Corpus`,
//! `Config` and `Io` errors coming from the store or the config
//! file propagate to the CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    /// Document has no recoverable text after stripping
    #[error("no recoverable text: {0}")]
    Parse(String),

    /// A numeric pattern only partially matched and was left as-is
    #[error("ambiguous numeric pattern '{fragment}' left unnormalised")]
    NormalizationAmbiguity { fragment: String },

    /// The merge or acronym table could not be built
    #[error("merge table error: {0}")]
    MergeTable(String),

    /// Columnar corpus read/write failure
    #[error("corpus store error: {0}")]
    Corpus(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<parquet::errors::ParquetError> for CleanError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        Self::Corpus(e.to_string())
    }
}

impl From<arrow::error::ArrowError> for CleanError {
    fn from(e: arrow::error::ArrowError) -> Self {
        Self::Corpus(e.to_string())
    }
}

impl From<serde_yaml::Error> for CleanError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;
