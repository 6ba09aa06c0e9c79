//! Writer/reader lifecycle: commits, deletes, updates, locking, durability

use std::sync::Arc;

use lanternfish::{
    Document, FieldOptions, FieldValue, FsDirectory, IndexConfig, IndexReader, IndexWriter,
    OpenMode, RamDirectory, SearchError, StandardTokenizer, Term, TermQuery, TokenizerRef,
};

fn tokenizer() -> TokenizerRef {
    Arc::new(StandardTokenizer::default())
}

fn config(mode: OpenMode) -> IndexConfig {
    IndexConfig {
        mode,
        ..IndexConfig::default()
    }
}

fn article(id: i64, title: &str, content: &str) -> Document {
    let mut doc = Document::new();
    doc.add_i64("id", id)
        .add_text("title", title)
        .add_text("content", content);
    doc
}

fn search_id(searcher: &lanternfish::Searcher, id: i64) -> Vec<i64> {
    let query = TermQuery::new(Term::from_i64("id", id));
    let top = searcher.search(&query, 10).unwrap();
    top.hits
        .iter()
        .map(|hit| {
            searcher
                .document(hit.addr)
                .unwrap()
                .get_i64("id")
                .unwrap()
        })
        .collect()
}

#[test]
fn added_then_committed_document_is_found_by_its_id() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    for i in 1..=5 {
        writer.add_document(&article(i, "title", "content body")).unwrap();
    }
    writer.commit().unwrap();

    let reader = IndexReader::open(dir.as_ref()).unwrap();
    let searcher = reader.searcher();
    for i in 1..=5 {
        assert_eq!(search_id(&searcher, i), vec![i]);
    }
    assert_eq!(search_id(&searcher, 99), Vec::<i64>::new());
}

#[test]
fn uncommitted_documents_stay_invisible() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();
    writer.commit().unwrap();

    writer.add_document(&article(1, "pending", "pending")).unwrap();

    let reader = IndexReader::open(dir.as_ref()).unwrap();
    assert_eq!(reader.num_docs(), 0);

    writer.commit().unwrap();
    // The old snapshot still sees nothing; a new one sees the doc
    assert_eq!(reader.num_docs(), 0);
    assert_eq!(IndexReader::open(dir.as_ref()).unwrap().num_docs(), 1);
}

#[test]
fn deleted_document_disappears_and_lookup_fails() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    writer.add_document(&article(1, "one", "alpha")).unwrap();
    writer.add_document(&article(2, "two", "beta")).unwrap();
    writer.commit().unwrap();

    let before = IndexReader::open(dir.as_ref()).unwrap();
    let hit_addr = {
        let searcher = before.searcher();
        let top = searcher
            .search(&TermQuery::new(Term::from_i64("id", 1)), 1)
            .unwrap();
        top.hits[0].addr
    };

    writer.delete_documents(&Term::from_i64("id", 1)).unwrap();
    writer.commit().unwrap();

    let after = IndexReader::open(dir.as_ref()).unwrap();
    let searcher = after.searcher();
    assert_eq!(search_id(&searcher, 1), Vec::<i64>::new());
    assert_eq!(search_id(&searcher, 2), vec![2]);

    let err = searcher.document(hit_addr).unwrap_err();
    assert!(matches!(err, SearchError::DocumentNotFound { .. }));
}

#[test]
fn delete_with_no_match_is_a_silent_noop() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    writer.add_document(&article(1, "one", "alpha")).unwrap();
    writer.commit().unwrap();

    writer.delete_documents(&Term::from_i64("id", 42)).unwrap();
    writer.commit().unwrap();

    let reader = IndexReader::open(dir.as_ref()).unwrap();
    assert_eq!(reader.num_docs(), 1);
}

#[test]
fn update_swaps_old_for_new_in_one_commit() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    writer.add_document(&article(1, "old title", "old content")).unwrap();
    writer.commit().unwrap();

    writer
        .update_document(&Term::from_i64("id", 1), &article(1, "new title", "new content"))
        .unwrap();

    // Before the commit, the old version is still fully present
    {
        let searcher = IndexReader::open(dir.as_ref()).unwrap().searcher();
        let ids = search_id(&searcher, 1);
        assert_eq!(ids, vec![1]);
        let top = searcher
            .search(&TermQuery::new(Term::from_i64("id", 1)), 1)
            .unwrap();
        let stored = searcher.document(top.hits[0].addr).unwrap();
        assert_eq!(stored.get_text("title"), Some("old title"));
    }

    writer.commit().unwrap();

    // After the commit, exactly the new version is present
    let searcher = IndexReader::open(dir.as_ref()).unwrap().searcher();
    let top = searcher
        .search(&TermQuery::new(Term::from_i64("id", 1)), 10)
        .unwrap();
    assert_eq!(top.len(), 1);
    let stored = searcher.document(top.hits[0].addr).unwrap();
    assert_eq!(stored.get_text("title"), Some("new title"));
}

#[test]
fn staged_update_is_atomic_across_the_commit_boundary() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    writer.add_document(&article(1, "durable", "durable")).unwrap();
    writer.commit().unwrap();

    writer
        .update_document(&Term::from_i64("id", 1), &article(1, "replacement", "replacement"))
        .unwrap();

    // Before the commit the old version is fully present, never neither
    let searcher = IndexReader::open(dir.as_ref()).unwrap().searcher();
    let top = searcher
        .search(&TermQuery::new(Term::from_i64("id", 1)), 10)
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(
        searcher.document(top.hits[0].addr).unwrap().get_text("title"),
        Some("durable")
    );

    writer.commit().unwrap();

    let searcher = IndexReader::open(dir.as_ref()).unwrap().searcher();
    let top = searcher
        .search(&TermQuery::new(Term::from_i64("id", 1)), 10)
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(
        searcher.document(top.hits[0].addr).unwrap().get_text("title"),
        Some("replacement")
    );
}

#[test]
fn second_concurrent_writer_fails_with_lock_conflict() {
    let dir = Arc::new(RamDirectory::new());
    let mut first = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    let err =
        IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::CreateOrAppend)).unwrap_err();
    assert!(matches!(err, SearchError::LockConflict(_)));

    // The first writer is unaffected
    first.add_document(&article(1, "still", "works")).unwrap();
    first.commit().unwrap();
    first.close().unwrap();

    // Lock released: a new writer can open
    IndexWriter::open(dir, tokenizer(), config(OpenMode::CreateOrAppend)).unwrap();
}

#[test]
fn on_disk_roundtrip_preserves_field_values() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = Arc::new(FsDirectory::open(tmp.path()).unwrap());

    {
        let mut writer =
            IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();
        let mut doc = Document::new();
        doc.add_i64("id", 7)
            .add_text("title", "Chinese Analyzer")
            .add_text("content", "a dedicated word segmenter");
        doc.add_f64("rating", 4.5);
        writer.add_document(&doc).unwrap();
        writer.commit().unwrap();
        writer.close().unwrap();
    }

    // Fresh process view: reopen from disk alone
    let dir = Arc::new(FsDirectory::open(tmp.path()).unwrap());
    let reader = IndexReader::open(dir.as_ref()).unwrap();
    let searcher = reader.searcher();

    let top = searcher
        .search(&TermQuery::new(Term::from_i64("id", 7)), 1)
        .unwrap();
    assert_eq!(top.len(), 1);

    let stored = searcher.document(top.hits[0].addr).unwrap();
    assert_eq!(stored.get_i64("id"), Some(7));
    assert_eq!(stored.get_text("title"), Some("Chinese Analyzer"));
    assert_eq!(stored.get_text("content"), Some("a dedicated word segmenter"));
    assert_eq!(
        stored.get("rating").and_then(|v| v.as_f64()),
        Some(4.5)
    );
}

#[test]
fn append_mode_requires_an_existing_index() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = Arc::new(FsDirectory::open(tmp.path()).unwrap());

    let err = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Append)).unwrap_err();
    assert!(err.is_storage());

    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();
    writer.commit().unwrap();
    writer.close().unwrap();

    IndexWriter::open(dir, tokenizer(), config(OpenMode::Append)).unwrap();
}

#[test]
fn create_mode_discards_previous_contents() {
    let dir = Arc::new(RamDirectory::new());
    {
        let mut writer =
            IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();
        writer.add_document(&article(1, "old", "old")).unwrap();
        writer.commit().unwrap();
    }
    {
        let mut writer =
            IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();
        writer.commit().unwrap();
    }

    let reader = IndexReader::open(dir.as_ref()).unwrap();
    assert_eq!(reader.num_docs(), 0);
}

#[test]
fn merge_keeps_documents_and_drops_tombstones() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    for i in 1..=4 {
        writer.add_document(&article(i, "batch", "shared words")).unwrap();
        writer.commit().unwrap();
    }
    writer.delete_documents(&Term::from_i64("id", 3)).unwrap();
    writer.commit().unwrap();

    writer.force_merge().unwrap();
    writer.close().unwrap();

    let reader = IndexReader::open(dir.as_ref()).unwrap();
    assert_eq!(reader.snapshot().segment_count(), 1);
    assert_eq!(reader.num_docs(), 3);
    // After compaction there is no tombstone overhead left
    assert_eq!(reader.max_doc(), 3);

    let searcher = reader.searcher();
    assert_eq!(search_id(&searcher, 1), vec![1]);
    assert_eq!(search_id(&searcher, 3), Vec::<i64>::new());
    assert_eq!(search_id(&searcher, 4), vec![4]);
}

#[test]
fn close_discards_buffered_documents() {
    let dir = Arc::new(RamDirectory::new());
    {
        let mut writer =
            IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();
        writer.commit().unwrap();
        writer.add_document(&article(1, "never", "committed")).unwrap();
        writer.close().unwrap();
    }

    let reader = IndexReader::open(dir.as_ref()).unwrap();
    assert_eq!(reader.num_docs(), 0);
}

#[test]
fn stored_only_fields_are_not_searchable_but_retrievable() {
    let dir = Arc::new(RamDirectory::new());
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config(OpenMode::Create)).unwrap();

    let mut doc = Document::new();
    doc.add_i64("id", 1);
    doc.add_field(
        "note",
        FieldValue::Text("display only".to_string()),
        FieldOptions::STORED,
    );
    writer.add_document(&doc).unwrap();
    writer.commit().unwrap();

    let searcher = IndexReader::open(dir.as_ref()).unwrap().searcher();

    let none = searcher
        .search(&TermQuery::text("note", "display"), 10)
        .unwrap();
    assert!(none.is_empty());

    let top = searcher
        .search(&TermQuery::new(Term::from_i64("id", 1)), 1)
        .unwrap();
    let stored = searcher.document(top.hits[0].addr).unwrap();
    assert_eq!(stored.get_text("note"), Some("display only"));
}
