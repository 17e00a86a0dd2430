//! Phrase resolution over positional postings.
//!
//! An ordered list of terms is approximated as "occurring as an ordered,
//! non-overlapping sequence" by intersecting consecutive postings lists
//! on document id and greedily matching positions forward. The result is
//! a synthetic postings list used only for query-side phrase idf and
//! per-document phrase tf; it is never persisted.

use crate::postings::PostingsList;

/// Fold the given postings lists pairwise, left to right.
///
/// Callers drop terms absent from the index before resolving, so a
/// single surviving list is returned unchanged. An empty slice yields
/// an empty list.
pub fn resolve(total_docs: u64, lists: &[&PostingsList]) -> PostingsList {
    let Some((first, rest)) = lists.split_first() else {
        return PostingsList::new();
    };
    let mut merged = (*first).clone();
    for next in rest {
        merged = merge_pair(&merged, next, total_docs);
    }
    merged
}

/// Merge two postings lists into the positions at which `first` starts
/// an adjacent-in-order pair with `second`.
///
/// For each position `p1` of the first operand, the first position
/// `p2 > p1` of the second operand that has not been claimed yet
/// (`p2 > last`) records `p1` and advances the cursor. The cursor never
/// rewinds across `p1` iterations: this is a greedy forward match, not a
/// full ordered-subsequence search.
fn merge_pair(first: &PostingsList, second: &PostingsList, total_docs: u64) -> PostingsList {
    let mut result = PostingsList::new();
    for (doc_id, posting) in first.entries() {
        let Some(follow) = second.positions(doc_id) else {
            continue;
        };
        let mut last = 0u32;
        for &p1 in &posting.positions {
            if let Some(&p2) = follow.iter().find(|&&p2| p2 > p1 && p2 > last) {
                result.record(doc_id, total_docs, p1);
                last = p2;
            }
        }
    }
    result
}
