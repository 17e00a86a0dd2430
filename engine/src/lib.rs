pub mod builder;
pub mod error;
pub mod feedback;
pub mod loader;
pub mod phrase;
pub mod postings;
pub mod search;
pub mod stopwords;
pub mod tokenizer;

pub use error::EngineError;

/// Index file name inside the index directory.
pub const INDEX_FILE: &str = "index.txt";
/// Stopword copy kept alongside the index so a search-only session
/// does not need the original stopwords path.
pub const STOPWORDS_FILE: &str = "stopwords.txt";

pub type Result<T> = std::result::Result<T, EngineError>;
