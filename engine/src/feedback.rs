//! Rocchio pseudo relevance feedback.

use std::collections::HashMap;

/// Ranking rounds when feedback is enabled.
pub const PSEUDO_RF_ITER: usize = 2;
/// Top-k ranked documents treated as relevant.
pub const PSEUDO_RF_K: usize = 5;
pub const PSEUDO_RF_ALPHA: f64 = 1.0;
pub const PSEUDO_RF_BETA: f64 = 0.7;
pub const PSEUDO_RF_GAMMA: f64 = 0.25;

/// Adjust the query vector in place from one round's ranking.
///
/// `ranked` must be sorted descending by score. The top-k ranked
/// documents are treated as relevant and the remaining ranked documents
/// as irrelevant, while the irrelevant denominator is the number of all
/// documents with a vector minus k. When that denominator is not
/// positive (collection no larger than k) the irrelevant contribution
/// is skipped entirely.
pub fn apply(
    query: &mut HashMap<String, f64>,
    documents: &HashMap<String, HashMap<String, f64>>,
    ranked: &[(String, f64)],
) {
    let k = ranked.len().min(PSEUDO_RF_K);
    if k == 0 {
        return;
    }
    let ik = documents.len() as i64 - k as i64;

    let mut relevant: HashMap<&str, f64> = HashMap::new();
    let mut irrelevant: HashMap<&str, f64> = HashMap::new();
    for (i, (doc_id, _)) in ranked.iter().enumerate() {
        let Some(vector) = documents.get(doc_id) else {
            continue;
        };
        let sums = if i < k { &mut relevant } else { &mut irrelevant };
        for (term, weight) in vector {
            *sums.entry(term).or_default() += weight;
        }
    }

    for (term, sum) in relevant {
        let contribution = sum * PSEUDO_RF_BETA / k as f64;
        let updated = query
            .get(term)
            .map_or(contribution, |old| PSEUDO_RF_ALPHA * old + contribution);
        query.insert(term.to_string(), updated);
    }
    if ik > 0 {
        for (term, sum) in irrelevant {
            let contribution = sum * PSEUDO_RF_GAMMA / ik as f64;
            let updated = query
                .get(term)
                .map_or(-contribution, |old| PSEUDO_RF_ALPHA * old - contribution);
            query.insert(term.to_string(), updated);
        }
    }
}
