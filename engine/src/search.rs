//! Query vectorization and cosine ranking.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::feedback::{self, PSEUDO_RF_ITER};
use crate::loader::LoadedIndex;
use crate::phrase;
use crate::postings::PostingsList;
use crate::stopwords::Stopwords;
use crate::tokenizer::{is_numeric, Tokenizer};

lazy_static! {
    /// Query vector keys holding whitespace are phrase keys, resolved
    /// against positional postings instead of looked up directly.
    static ref PHRASAL: Regex = Regex::new(r"\A\S+(?:\s\S+)+\z").expect("valid regex");
}

/// One ranked document with its cosine score, rounded to three decimals
/// with ceiling rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub doc_id: String,
    pub score: f64,
}

/// Read-only searcher over one loaded index snapshot. Queries share no
/// state, so one searcher can serve any number of them.
pub struct Searcher<'a> {
    index: &'a LoadedIndex,
    stopwords: &'a Stopwords,
    stemmer: Stemmer,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a LoadedIndex, stopwords: &'a Stopwords) -> Self {
        Self {
            index,
            stopwords,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Rank documents against `query` by cosine similarity, optionally
    /// refining the query vector with pseudo relevance feedback between
    /// rounds. An empty result is "nothing found", not an error.
    pub fn search(&self, query: &str, top_n: usize, use_feedback: bool) -> Vec<Ranked> {
        let total_docs = self.index.doc_count() as f64;

        // Per-term query frequency and first-seen order.
        let mut tfs: HashMap<String, u32> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let tokens = Tokenizer::new(query.as_bytes())
            .with_filter(|t| t.len() > 1)
            .with_filter(|t| !self.stopwords.contains(t))
            .with_filter(|t| !is_numeric(t));
        for token in tokens {
            let term = self.stemmer.stem(&token.to_lowercase()).to_string();
            if is_numeric(&term) {
                continue;
            }
            let tf = tfs.entry(term.clone()).or_insert(0);
            if *tf == 0 {
                order.push(term);
            }
            *tf += 1;
        }

        let mut query_vector: HashMap<String, f64> = HashMap::new();
        for (term, &tf) in &tfs {
            let wf = 1.0 + f64::from(tf).ln();
            // Unseen terms fall back to ln(N) smoothing.
            let idf = self
                .index
                .postings(term)
                .map_or(total_docs.ln(), PostingsList::idf);
            query_vector.insert(term.clone(), wf * idf);
        }
        if order.len() > 1 {
            let joined = order.join(" ");
            if let Some(list) = self.phrase_postings(&joined) {
                // Implicit query-side phrase tf of 1.
                query_vector.insert(joined, list.idf());
            }
        }

        let rounds = if use_feedback { PSEUDO_RF_ITER } else { 1 };
        let mut ranks: HashMap<String, f64> = HashMap::new();
        for round in 0..rounds {
            ranks = self.rank(&query_vector);
            if ranks.is_empty() {
                return Vec::new();
            }
            if round + 1 < rounds {
                let ordered = sort_descending(&ranks);
                feedback::apply(&mut query_vector, self.index.document_vectors(), &ordered);
            }
        }

        let mut ordered = sort_descending(&ranks);
        ordered.retain(|(_, score)| *score > 0.0);
        ordered.truncate(top_n);
        ordered
            .into_iter()
            .map(|(doc_id, score)| Ranked {
                doc_id,
                score: ceil3(score),
            })
            .collect()
    }

    /// One ranking round: cosine of the query vector against every
    /// document with a known vector length. Only strictly positive dot
    /// products enter the rank map.
    fn rank(&self, query_vector: &HashMap<String, f64>) -> HashMap<String, f64> {
        let query_length = query_vector
            .values()
            .map(|weight| weight * weight)
            .sum::<f64>()
            .sqrt();
        let mut ranks = HashMap::new();
        for (doc_id, doc_length) in self.index.vector_lengths() {
            let mut dot = 0.0;
            for (key, &wq) in query_vector {
                // Phrase keys are re-resolved on demand, never cached.
                let list: Cow<'_, PostingsList> = if PHRASAL.is_match(key) {
                    match self.phrase_postings(key) {
                        Some(list) => Cow::Owned(list),
                        None => continue,
                    }
                } else {
                    match self.index.postings(key) {
                        Some(list) => Cow::Borrowed(list),
                        None => continue,
                    }
                };
                let tf = list.tf(doc_id);
                if tf != 0 {
                    let wf = 1.0 + f64::from(tf).ln();
                    dot += wf * list.idf() * wq;
                }
            }
            if dot > 0.0 {
                ranks.insert(doc_id.to_string(), dot / (query_length * doc_length));
            }
        }
        ranks
    }

    /// Resolve a space-joined term sequence against the index, dropping
    /// terms the index does not know. Returns `None` when nothing in the
    /// phrase is indexed.
    fn phrase_postings(&self, key: &str) -> Option<PostingsList> {
        let lists: Vec<&PostingsList> = key
            .split(' ')
            .filter_map(|term| self.index.postings(term))
            .collect();
        if lists.is_empty() {
            return None;
        }
        Some(phrase::resolve(self.index.doc_count() as u64, &lists))
    }
}

fn sort_descending(ranks: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut ordered: Vec<(String, f64)> = ranks
        .iter()
        .map(|(doc, &score)| (doc.clone(), score))
        .collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ordered
}

/// Round up at the third decimal, matching the reported score format.
fn ceil3(value: f64) -> f64 {
    (value * 1000.0).ceil() / 1000.0
}
