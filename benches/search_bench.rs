use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lanternfish::{
    BooleanQuery, Document, IndexConfig, IndexReader, IndexWriter, OpenMode, PrefixQuery,
    RamDirectory, Searcher, StandardTokenizer, TermQuery, TokenizerRef, WildcardQuery,
};

const WORDS: &[&str] = &[
    "rust", "search", "index", "segment", "posting", "query", "engine", "token", "merge",
    "commit", "snapshot", "field", "document", "wildcard", "prefix", "boolean",
];

fn tokenizer() -> TokenizerRef {
    Arc::new(StandardTokenizer::default())
}

fn build_searcher(doc_count: usize) -> Searcher {
    let dir = Arc::new(RamDirectory::new());
    let config = IndexConfig {
        mode: OpenMode::Create,
        ..IndexConfig::default()
    };
    let mut writer = IndexWriter::open(dir.clone(), tokenizer(), config).unwrap();

    for i in 0..doc_count {
        let mut content = String::new();
        for j in 0..12 {
            content.push_str(WORDS[(i * 7 + j * 3) % WORDS.len()]);
            content.push(' ');
        }
        let mut doc = Document::new();
        doc.add_i64("id", i as i64).add_text("content", &content);
        writer.add_document(&doc).unwrap();

        if i % 2_000 == 1_999 {
            writer.commit().unwrap();
        }
    }
    writer.commit().unwrap();

    IndexReader::open(dir.as_ref()).unwrap().searcher()
}

fn bench_queries(c: &mut Criterion) {
    let searcher = build_searcher(10_000);

    c.bench_function("term_query_10k_docs", |b| {
        let query = TermQuery::text("content", "rust");
        b.iter(|| black_box(searcher.search(&query, 10).unwrap()))
    });

    c.bench_function("boolean_must_two_terms_10k_docs", |b| {
        let query = BooleanQuery::new()
            .must(TermQuery::text("content", "rust"))
            .must(TermQuery::text("content", "index"));
        b.iter(|| black_box(searcher.search(&query, 10).unwrap()))
    });

    c.bench_function("prefix_query_10k_docs", |b| {
        let query = PrefixQuery::new("content", "se");
        b.iter(|| black_box(searcher.search(&query, 10).unwrap()))
    });

    c.bench_function("wildcard_query_10k_docs", |b| {
        let query = WildcardQuery::new("content", "*dex");
        b.iter(|| black_box(searcher.search(&query, 10).unwrap()))
    });
}

fn bench_indexing(c: &mut Criterion) {
    c.bench_function("index_and_commit_1k_docs", |b| {
        b.iter(|| black_box(build_searcher(1_000)))
    });
}

criterion_group!(benches, bench_queries, bench_indexing);
criterion_main!(benches);
