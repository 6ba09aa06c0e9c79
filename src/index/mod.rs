//! Index writer, reader, and searcher
//!
//! One writer mutates an index location at a time, guarded by the directory
//! lock. Any number of readers open snapshots of committed segments; a
//! snapshot never observes uncommitted writes and never blocks the writer.

mod reader;
mod searcher;
mod writer;

pub use reader::{IndexReader, Snapshot};
pub use searcher::{SearchHit, SearchOptions, Searcher, TopDocs};
pub use writer::IndexWriter;
