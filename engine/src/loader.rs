//! Index loading and per-document vector normalization.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::EngineError;
use crate::postings::{self, PostingsList};
use crate::{Result, INDEX_FILE};

/// Immutable in-memory image of one on-disk index, plus the per-document
/// weight vectors and Euclidean lengths derived from it.
///
/// Lengths are necessarily computed in two phases: index lines are
/// ordered by term, not by document, so a document's sum of squared
/// `wf*idf` weights is only complete once the whole file is consumed.
#[derive(Debug, Default)]
pub struct LoadedIndex {
    terms: HashMap<String, PostingsList>,
    vector_lengths: HashMap<String, f64>,
    document_vectors: HashMap<String, HashMap<String, f64>>,
}

impl LoadedIndex {
    /// Parse `index.txt` under `index_dir`. Any line failing the grammar
    /// aborts the whole load; this engine does not tolerate partial or
    /// corrupt indexes.
    pub fn load(index_dir: &Path) -> Result<Self> {
        let path = index_dir.join(INDEX_FILE);
        let file = File::open(&path).map_err(|_| {
            EngineError::Config(format!("unable to open index file {}", path.display()))
        })?;
        let reader = BufReader::new(file);

        let mut loaded = Self::default();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let (term, list) = postings::parse_line(line_no + 1, &line)?;
            loaded.absorb(term, list);
        }
        for length in loaded.vector_lengths.values_mut() {
            *length = length.sqrt();
        }
        tracing::debug!(
            terms = loaded.terms.len(),
            documents = loaded.vector_lengths.len(),
            "index loaded"
        );
        Ok(loaded)
    }

    fn absorb(&mut self, term: String, list: PostingsList) {
        let idf = list.idf();
        for (doc_id, posting) in list.entries() {
            let wf = 1.0 + f64::from(posting.tf).ln();
            let weight = wf * idf;
            *self.vector_lengths.entry(doc_id.to_string()).or_default() += weight * weight;
            self.document_vectors
                .entry(doc_id.to_string())
                .or_default()
                .insert(term.clone(), weight);
        }
        self.terms.insert(term, list);
    }

    pub fn postings(&self, term: &str) -> Option<&PostingsList> {
        self.terms.get(term)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Number of distinct documents seen across the whole index.
    pub fn doc_count(&self) -> usize {
        self.vector_lengths.len()
    }

    pub fn vector_length(&self, doc_id: &str) -> Option<f64> {
        self.vector_lengths.get(doc_id).copied()
    }

    pub fn vector_lengths(&self) -> impl Iterator<Item = (&str, f64)> {
        self.vector_lengths
            .iter()
            .map(|(doc, &length)| (doc.as_str(), length))
    }

    pub fn document_vectors(&self) -> &HashMap<String, HashMap<String, f64>> {
        &self.document_vectors
    }
}
