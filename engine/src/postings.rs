//! Positional postings and their on-disk text representation.
//!
//! One [`PostingsList`] records, for a single term, which documents
//! contain it, the per-document term frequency, the positions at which
//! it occurred and the term's idf. The idf is always derived, never set:
//! it is recomputed on every occurrence as `ln(N / (df + 1))` rounded to
//! three decimals, where the `df + 1` smoothing leaves headroom for
//! query terms that never appear in the index.
//!
//! On disk each term occupies one line:
//!
//! ```text
//! term,doc1,tf1:pos1;pos2;...,doc2,tf2:...,idf
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

use crate::error::EngineError;

lazy_static! {
    static ref LINE_FORMAT: Regex =
        Regex::new(r"^[^,]+,(?:[^,]+,\d+:[;0-9]*,)+(?:-?\d+\.)?\d+$").expect("valid regex");
    static ref ENTRY_FORMAT: Regex = Regex::new(r"^\d+:\d+(?:;\d+)*$").expect("valid regex");
}

/// Occurrence record for one (term, document) pair. Positions are
/// strictly increasing by construction and never resorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    pub tf: u32,
    pub positions: Vec<u32>,
}

/// All occurrences of one term across the collection.
#[derive(Debug, Clone, Default)]
pub struct PostingsList {
    entries: HashMap<String, Posting>,
    idf: f64,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl PostingsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of the term in `doc_id` at `position`,
    /// then recompute the idf from the instantaneous document frequency.
    /// `total_docs` is the collection size for the current run.
    pub fn record(&mut self, doc_id: &str, total_docs: u64, position: u32) {
        let posting = self.entries.entry(doc_id.to_string()).or_default();
        posting.tf += 1;
        posting.positions.push(position);
        self.idf = round3((total_docs as f64 / (self.entries.len() + 1) as f64).ln());
    }

    pub fn idf(&self) -> f64 {
        self.idf
    }

    /// Term frequency in `doc_id`, 0 when the document is absent.
    pub fn tf(&self, doc_id: &str) -> u32 {
        self.entries.get(doc_id).map_or(0, |p| p.tf)
    }

    pub fn positions(&self, doc_id: &str) -> Option<&[u32]> {
        self.entries.get(doc_id).map(|p| p.positions.as_slice())
    }

    /// Number of distinct documents containing the term.
    pub fn doc_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Posting)> {
        self.entries.iter().map(|(doc, posting)| (doc.as_str(), posting))
    }
}

/// Parse one on-disk index line into its term and postings.
///
/// The full line is validated against the grammar first; any deviation
/// is an [`EngineError::IndexFormat`], which aborts the whole load.
pub fn parse_line(line_no: usize, line: &str) -> crate::Result<(String, PostingsList)> {
    if !LINE_FORMAT.is_match(line) {
        return Err(malformed(line_no, line));
    }
    let fields: Vec<&str> = line.split(',').collect();
    let term = fields[0].to_string();
    let mut entries = HashMap::new();
    let mut i = 1;
    // The grammar guarantees (doc, tf:positions) pairs between the term
    // and the trailing idf field.
    while i < fields.len() - 1 {
        let posting = parse_posting(line_no, line, fields[i + 1])?;
        entries.insert(fields[i].to_string(), posting);
        i += 2;
    }
    let idf: f64 = fields[fields.len() - 1]
        .parse()
        .map_err(|_| malformed(line_no, line))?;
    Ok((term, PostingsList { entries, idf }))
}

fn parse_posting(line_no: usize, line: &str, field: &str) -> crate::Result<Posting> {
    if !ENTRY_FORMAT.is_match(field) {
        return Err(malformed(line_no, line));
    }
    let (tf, positions) = field.split_once(':').ok_or_else(|| malformed(line_no, line))?;
    let tf: u32 = tf.parse().map_err(|_| malformed(line_no, line))?;
    let positions = positions
        .split(';')
        .map(str::parse)
        .collect::<Result<Vec<u32>, _>>()
        .map_err(|_| malformed(line_no, line))?;
    Ok(Posting { tf, positions })
}

fn malformed(line_no: usize, line: &str) -> EngineError {
    EngineError::IndexFormat {
        line_no,
        line: line.to_string(),
    }
}

impl fmt::Display for PostingsList {
    /// Renders everything after the leading `term,` of an index line;
    /// the index writer prepends the term itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (doc_id, posting) in &self.entries {
            let joined = posting
                .positions
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(";");
            write!(f, "{},{}:{},", doc_id, posting.tf, joined)?;
        }
        write!(f, "{}", self.idf)
    }
}
