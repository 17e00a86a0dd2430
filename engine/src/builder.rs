//! Index construction over a flat document collection.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rust_stemmers::{Algorithm, Stemmer};
use walkdir::WalkDir;

use crate::error::EngineError;
use crate::postings::PostingsList;
use crate::stopwords::Stopwords;
use crate::tokenizer::{is_numeric, Tokenizer};
use crate::{Result, INDEX_FILE, STOPWORDS_FILE};

/// Summary of one build pass, for caller-side reporting.
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
    /// Documents actually tokenized. Unreadable documents are skipped
    /// but still count toward the collection size used for idf.
    pub documents: u64,
    pub terms: usize,
}

/// Build a fresh index over the regular files of `collection_dir` and
/// persist it under `index_dir`, replacing any prior index there.
///
/// Two passes over the same directory: the first counts regular files
/// so idf can be recomputed incrementally during the second. File order
/// is whatever the directory listing yields; it affects the order of
/// persisted lines and intermediate idf values, never final ones.
pub fn build(
    collection_dir: &Path,
    index_dir: &Path,
    stopwords_path: &Path,
) -> Result<BuildStats> {
    if !collection_dir.is_dir() {
        return Err(EngineError::Config(format!(
            "invalid collection path {}",
            collection_dir.display()
        )));
    }
    let stopwords = Stopwords::load(stopwords_path)?;
    tracing::info!(words = stopwords.len(), "stopwords loaded");

    let total_docs = list_documents(collection_dir).count() as u64;
    tracing::info!(total_docs, "counted collection");

    let stemmer = Stemmer::create(Algorithm::English);
    let mut index: HashMap<String, PostingsList> = HashMap::new();
    let mut documents = 0u64;
    for entry in list_documents(collection_dir) {
        // The field delimiter cannot appear in a document id.
        let doc_id = entry.file_name().to_string_lossy().replace(',', "");
        let file = match File::open(entry.path()) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(document = %doc_id, %err, "unable to read document, skipping");
                continue;
            }
        };
        documents += 1;
        let tokens = Tokenizer::new(BufReader::new(file))
            .with_filter(|t| t.len() > 1)
            .with_filter(|t| !stopwords.contains(t))
            .with_filter(|t| !is_numeric(t));
        // One shared position counter per document, advanced only when
        // a term is actually recorded.
        let mut position = 0u32;
        for token in tokens {
            let term = stemmer.stem(&token.to_lowercase()).to_string();
            if is_numeric(&term) {
                continue;
            }
            index
                .entry(term)
                .or_default()
                .record(&doc_id, total_docs, position);
            position += 1;
        }
    }

    persist(index_dir, &index)?;
    copy_stopwords(index_dir, stopwords_path)?;
    tracing::info!(documents, terms = index.len(), "index build complete");
    Ok(BuildStats {
        documents,
        terms: index.len(),
    })
}

/// Flat, non-recursive listing of the regular files in a directory.
fn list_documents(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> + '_ {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
}

fn persist(index_dir: &Path, index: &HashMap<String, PostingsList>) -> Result<()> {
    fs::create_dir_all(index_dir).map_err(|source| persist_error(index_dir, source))?;
    let path = index_dir.join(INDEX_FILE);
    let file = File::create(&path).map_err(|source| persist_error(&path, source))?;
    let mut writer = BufWriter::new(file);
    for (term, postings) in index {
        writeln!(writer, "{term},{postings}").map_err(|source| persist_error(&path, source))?;
    }
    writer.flush().map_err(|source| persist_error(&path, source))
}

/// Keep the stopwords next to the index so a later search-only session
/// does not need the original path.
fn copy_stopwords(index_dir: &Path, stopwords_path: &Path) -> Result<()> {
    let target = index_dir.join(STOPWORDS_FILE);
    fs::copy(stopwords_path, &target)
        .map(|_| ())
        .map_err(|source| persist_error(&target, source))
}

fn persist_error(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::IndexPersist {
        path: path.to_path_buf(),
        source,
    }
}
