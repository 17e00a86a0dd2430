use engine::builder;
use engine::loader::LoadedIndex;
use engine::search::Searcher;
use engine::stopwords::Stopwords;
use engine::{EngineError, INDEX_FILE, STOPWORDS_FILE};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_collection(dir: &Path, docs: &[(&str, &str)]) {
    for (name, body) in docs {
        fs::write(dir.join(name), body).unwrap();
    }
}

/// Four-document fixture. With only two documents every single-document
/// term gets idf = ln(2/2) = 0 under the df+1 smoothing and no query
/// can score, so two filler documents keep the idfs positive.
fn build_fixture(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let collection = root.join("collection");
    let index_dir = root.join("index");
    fs::create_dir(&collection).unwrap();
    write_collection(
        &collection,
        &[
            ("a.txt", "the cat sat on the mat"),
            ("b.txt", "the dog sat on the log"),
            ("c.txt", "birds nap under trees"),
            ("d.txt", "rivers flow toward deltas"),
        ],
    );
    let stopwords = root.join("stopwords.txt");
    fs::write(&stopwords, "the\non\n").unwrap();
    builder::build(&collection, &index_dir, &stopwords).unwrap();
    (index_dir, stopwords)
}

#[test]
fn build_writes_index_and_stopword_copy() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    assert!(index_dir.join(INDEX_FILE).is_file());
    assert_eq!(
        fs::read_to_string(index_dir.join(STOPWORDS_FILE)).unwrap(),
        "the\non\n"
    );
}

#[test]
fn build_rejects_missing_collection() {
    let tmp = tempdir().unwrap();
    let stopwords = tmp.path().join("stopwords.txt");
    fs::write(&stopwords, "the\n").unwrap();
    let err = builder::build(
        &tmp.path().join("no-such-dir"),
        &tmp.path().join("index"),
        &stopwords,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn positions_share_one_counter_per_document() {
    let tmp = tempdir().unwrap();
    let collection = tmp.path().join("collection");
    fs::create_dir(&collection).unwrap();
    write_collection(&collection, &[("doc.txt", "cat dog cat dog")]);
    let stopwords = tmp.path().join("stopwords.txt");
    fs::write(&stopwords, "").unwrap();
    builder::build(&collection, &tmp.path().join("index"), &stopwords).unwrap();

    let index = LoadedIndex::load(&tmp.path().join("index")).unwrap();
    assert_eq!(
        index.postings("cat").unwrap().positions("doc.txt"),
        Some(&[0, 2][..])
    );
    assert_eq!(
        index.postings("dog").unwrap().positions("doc.txt"),
        Some(&[1, 3][..])
    );
}

#[test]
fn stopwords_numerics_and_short_tokens_consume_no_position() {
    let tmp = tempdir().unwrap();
    let collection = tmp.path().join("collection");
    fs::create_dir(&collection).unwrap();
    write_collection(&collection, &[("doc.txt", "the 42 cat x 10-10 mat")]);
    let stopwords = tmp.path().join("stopwords.txt");
    fs::write(&stopwords, "the\n").unwrap();
    builder::build(&collection, &tmp.path().join("index"), &stopwords).unwrap();

    let index = LoadedIndex::load(&tmp.path().join("index")).unwrap();
    assert_eq!(
        index.postings("cat").unwrap().positions("doc.txt"),
        Some(&[0][..])
    );
    assert_eq!(
        index.postings("mat").unwrap().positions("doc.txt"),
        Some(&[1][..])
    );
    assert!(index.postings("42").is_none());
    assert!(index.postings("x").is_none());
}

#[test]
fn load_reproduces_tf_positions_and_idf() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let index = LoadedIndex::load(&index_dir).unwrap();

    assert_eq!(index.doc_count(), 4);
    let cat = index.postings("cat").unwrap();
    assert_eq!(cat.tf("a.txt"), 1);
    assert_eq!(cat.positions("a.txt"), Some(&[0][..]));
    // df = 1 of N = 4: ln(4/2) rounded to three decimals.
    assert_eq!(cat.idf(), 0.693);

    let sat = index.postings("sat").unwrap();
    assert_eq!(sat.tf("a.txt"), 1);
    assert_eq!(sat.tf("b.txt"), 1);
    assert_eq!(sat.idf(), 0.288);

    // a.txt holds cat, sat, mat each once: length is the norm of the
    // three wf*idf weights with wf = 1.
    let expected = (0.693f64.powi(2) + 0.288f64.powi(2) + 0.693f64.powi(2)).sqrt();
    let length = index.vector_length("a.txt").unwrap();
    assert!((length - expected).abs() < 1e-9);
}

#[test]
fn rebuilding_replaces_the_previous_index() {
    let tmp = tempdir().unwrap();
    let (index_dir, stopwords) = build_fixture(tmp.path());
    let replacement = tmp.path().join("replacement");
    fs::create_dir(&replacement).unwrap();
    write_collection(&replacement, &[("only.txt", "quartz crystals")]);
    builder::build(&replacement, &index_dir, &stopwords).unwrap();

    let index = LoadedIndex::load(&index_dir).unwrap();
    assert_eq!(index.doc_count(), 1);
    assert!(index.postings("cat").is_none());
    assert!(index.postings("quartz").is_some());
}

#[test]
fn search_finds_single_matching_document() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    let results = searcher.search("cat", 10, false);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, "a.txt");
    assert!(results[0].score > 0.0);
    assert!(results[0].score <= 1.001);
}

#[test]
fn search_ties_shared_terms_across_documents() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    // Both documents carry "sat" with the same tf and profile.
    let results = searcher.search("sat", 10, false);
    assert_eq!(results.len(), 2);
    let mut docs: Vec<&str> = results.iter().map(|r| r.doc_id.as_str()).collect();
    docs.sort();
    assert_eq!(docs, vec!["a.txt", "b.txt"]);
    assert_eq!(results[0].score, results[1].score);
    assert!(results[0].score > 0.0);
}

#[test]
fn search_for_absent_term_finds_nothing() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    assert!(searcher.search("giraffe", 10, false).is_empty());
}

#[test]
fn phrase_query_favors_the_adjacent_document() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    // "cat sat" is adjacent in a.txt only; b.txt still scores through
    // the shared "sat" term, but well below.
    let results = searcher.search("cat sat", 10, false);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].doc_id, "a.txt");
    assert_eq!(results[1].doc_id, "b.txt");
    assert!(results[0].score > results[1].score);
    assert!((results[0].score - 1.0).abs() < 0.002);
}

#[test]
fn top_n_truncates_the_ranking() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    let results = searcher.search("cat sat", 1, false);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, "a.txt");
}

#[test]
fn feedback_pulls_in_co_occurring_documents() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    // Without feedback "cat" matches only a.txt; with it, the adjusted
    // query picks up "sat" from the relevant document and reaches b.txt.
    let plain = searcher.search("cat", 10, false);
    assert_eq!(plain.len(), 1);

    let refined = searcher.search("cat", 10, true);
    assert_eq!(refined[0].doc_id, "a.txt");
    assert_eq!(refined.len(), 2);
    assert_eq!(refined[1].doc_id, "b.txt");
    assert!(refined[0].score > refined[1].score);
}

#[test]
fn disabled_feedback_matches_the_first_ranking_round() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    // Feedback changes this query's outcome, so the plain search must
    // reproduce the untouched first round: a.txt alone, at the cosine
    // the loaded idfs give it (0.693 for cat and mat, 0.288 for sat,
    // which works out to 0.679 after ceiling rounding).
    let plain = searcher.search("cat", 10, false);
    assert_eq!(plain.len(), 1);
    assert_eq!(plain[0].doc_id, "a.txt");
    assert_eq!(plain[0].score, 0.679);

    let refined = searcher.search("cat", 10, true);
    assert_ne!(refined.len(), plain.len());
    assert_eq!(refined[0].doc_id, "a.txt");
}

#[test]
fn phrase_with_unindexed_term_degrades_to_surviving_terms() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    // "zzz" appears in no document, so the phrase entry must resolve as
    // if the query were "cat sat", keeping a.txt's adjacency bonus.
    let results = searcher.search("cat zzz sat", 10, false);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].doc_id, "a.txt");
    assert_eq!(results[1].doc_id, "b.txt");
    // The phrase contribution keeps the gap wide; without it the lead
    // from the cat and sat terms alone stays under 7x.
    assert!(results[0].score > results[1].score * 10.0);
}

#[cfg(unix)]
#[test]
fn unreadable_document_still_counts_toward_collection_size() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let collection = tmp.path().join("collection");
    fs::create_dir(&collection).unwrap();
    write_collection(&collection, &[("readable.txt", "cat mat")]);
    let blocked = collection.join("blocked.txt");
    fs::write(&blocked, "dog log").unwrap();
    let mut perms = fs::metadata(&blocked).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&blocked, perms).unwrap();
    if fs::File::open(&blocked).is_ok() {
        // Mode bits are not enforced for root; nothing to observe.
        return;
    }

    let stopwords = tmp.path().join("stopwords.txt");
    fs::write(&stopwords, "").unwrap();
    let index_dir = tmp.path().join("index");
    let stats = builder::build(&collection, &index_dir, &stopwords).unwrap();
    assert_eq!(stats.documents, 1);

    // The skipped document still inflates the idf denominator:
    // N = 2, so idf(cat) = ln(2/2) = 0 rather than ln(1/2).
    let index = LoadedIndex::load(&index_dir).unwrap();
    assert_eq!(index.doc_count(), 1);
    assert_eq!(index.postings("cat").unwrap().idf(), 0.0);
}

#[test]
fn feedback_on_an_empty_result_is_nothing_found() {
    let tmp = tempdir().unwrap();
    let (index_dir, _) = build_fixture(tmp.path());
    let stopwords = Stopwords::load(&index_dir.join(STOPWORDS_FILE)).unwrap();
    let index = LoadedIndex::load(&index_dir).unwrap();
    let searcher = Searcher::new(&index, &stopwords);

    assert!(searcher.search("giraffe", 10, true).is_empty());
}

#[test]
fn malformed_index_line_aborts_the_load() {
    let tmp = tempdir().unwrap();
    let index_dir = tmp.path().join("index");
    fs::create_dir(&index_dir).unwrap();
    fs::write(index_dir.join(INDEX_FILE), "foo,bar\n").unwrap();

    let err = LoadedIndex::load(&index_dir).unwrap_err();
    assert!(matches!(err, EngineError::IndexFormat { line_no: 1, .. }));
}

#[test]
fn missing_index_file_is_a_config_error() {
    let tmp = tempdir().unwrap();
    let err = LoadedIndex::load(tmp.path()).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}
