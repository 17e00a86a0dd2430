//! Error types for the engine library.

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by indexing and searching.
///
/// An unreadable document during a build is not represented here: it is
/// logged and skipped locally, and the document still counts toward the
/// collection size. An empty ranked result is not an error either.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid or missing collection directory, index directory or
    /// stopwords path. Raised before any indexing or searching I/O.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A line of the on-disk index failed the grammar. The whole load
    /// aborts; a partial index is never usable.
    #[error("malformed index line {line_no}: {line}")]
    IndexFormat { line_no: usize, line: String },

    /// Failure writing the index file or the stopwords copy.
    #[error("failed to persist index at {}: {source}", path.display())]
    IndexPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
