//! lanternfish: an embedded, single-writer inverted-index search engine
//!
//! Documents go in through an [`IndexWriter`], which tokenizes indexed
//! fields, buffers postings, and turns each commit into an immutable
//! segment. An [`IndexReader`] opens a snapshot of committed segments and
//! hands out [`Searcher`]s that evaluate term, prefix, wildcard, and
//! boolean query trees, ranked by TF with length normalization or an
//! explicit sort.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lanternfish::{
//!     Document, FsDirectory, IndexConfig, IndexReader, IndexWriter, QueryParser,
//!     StandardTokenizer,
//! };
//!
//! # fn main() -> lanternfish::Result<()> {
//! let dir = Arc::new(FsDirectory::open("./index")?);
//! let tokenizer = Arc::new(StandardTokenizer::default());
//! let config = IndexConfig::default();
//!
//! let mut writer = IndexWriter::open(dir.clone(), tokenizer.clone(), config.clone())?;
//! let mut doc = Document::new();
//! doc.add_i64("id", 1)
//!     .add_text("title", "Standard Analyzer")
//!     .add_text("content", "an embedded search engine");
//! writer.add_document(&doc)?;
//! writer.commit()?;
//!
//! let reader = IndexReader::open(dir.as_ref())?;
//! let searcher = reader.searcher();
//! let parser = QueryParser::new(config.default_search_fields.clone(), tokenizer);
//! let query = parser.parse("embedded engine")?;
//! let top = searcher.search(query.as_ref(), 10)?;
//! for hit in &top.hits {
//!     let stored = searcher.document(hit.addr)?;
//!     println!("{:?}", stored.get_text("title"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod document;
pub mod error;
pub mod highlight;
pub mod index;
pub mod query;
pub mod segment;
pub mod tokenizer;

pub use config::{BufferConfig, IndexConfig, OpenMode, TokenizerConfig};
pub use directory::{Directory, DirectoryRef, FsDirectory, RamDirectory};
pub use document::{Document, Field, FieldOptions, FieldValue, Term};
pub use error::{Result, SearchError};
pub use highlight::Highlighter;
pub use index::{IndexReader, IndexWriter, SearchHit, SearchOptions, Searcher, TopDocs};
pub use query::{
    BooleanQuery, Occur, PrefixQuery, Query, QueryParser, Sort, SortField, SortOrder, TermQuery,
    WildcardQuery,
};
pub use segment::{DocAddress, StoredDocument};
pub use tokenizer::{StandardTokenizer, Token, Tokenizer, TokenizerRef};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
