//! Index reader and snapshots

use std::sync::Arc;

use tracing::debug;

use crate::directory::Directory;
use crate::error::{Result, SearchError};
use crate::segment::{store, IndexStatistics, SegmentReader};

use super::searcher::Searcher;

/// Immutable view over a fixed set of committed segments
///
/// Created at reader-open time and never mutated. Segment readers are
/// reference-counted, so a snapshot stays usable even after a merge removes
/// its segment files from the directory.
pub struct Snapshot {
    pub(crate) segments: Vec<Arc<SegmentReader>>,
    pub(crate) stats: IndexStatistics,
    generation: u64,
}

impl Snapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Live documents across all segments
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.live_doc_count() as u64).sum()
    }

    /// All documents including tombstoned ones
    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count() as u64).sum()
    }
}

/// Read access to a committed index
pub struct IndexReader {
    snapshot: Arc<Snapshot>,
}

impl std::fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexReader")
            .field("segments", &self.snapshot.segments.len())
            .field("generation", &self.snapshot.generation)
            .finish()
    }
}

impl IndexReader {
    /// Open the current committed state of the index.
    ///
    /// Fails with a storage error when no commit has ever happened at this
    /// location.
    pub fn open(dir: &dyn Directory) -> Result<Self> {
        let manifest = store::load_manifest(dir)?.ok_or_else(|| {
            SearchError::Storage("no committed index at location".to_string())
        })?;

        let mut segments = Vec::with_capacity(manifest.segment_count());
        for entry in &manifest.segments {
            segments.push(Arc::new(store::read_segment(dir, entry)?));
        }

        let stats = IndexStatistics::from_segments(segments.iter().map(|s| s.stats()));

        debug!(
            segments = segments.len(),
            generation = manifest.generation,
            "opened index reader"
        );

        Ok(Self {
            snapshot: Arc::new(Snapshot {
                segments,
                stats,
                generation: manifest.generation,
            }),
        })
    }

    /// A searcher over this reader's snapshot. Searchers are cheap to
    /// create and safe to use from multiple threads.
    pub fn searcher(&self) -> Searcher {
        Searcher::new(self.snapshot.clone())
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn num_docs(&self) -> u64 {
        self.snapshot.num_docs()
    }

    pub fn max_doc(&self) -> u64 {
        self.snapshot.max_doc()
    }

    /// Release the snapshot. Dropping the reader has the same effect; the
    /// underlying segments are reclaimed once the last searcher is gone.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexConfig, OpenMode, TokenizerConfig};
    use crate::directory::RamDirectory;
    use crate::document::Document;
    use crate::index::IndexWriter;
    use crate::tokenizer::StandardTokenizer;

    #[test]
    fn test_open_without_commit_fails() {
        let dir = RamDirectory::new();
        let err = IndexReader::open(&dir).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_snapshot_is_pinned_at_open() {
        let dir = RamDirectory::new();
        let tokenizer = Arc::new(StandardTokenizer::new(&TokenizerConfig::default()));
        let config = IndexConfig {
            mode: OpenMode::Create,
            ..IndexConfig::default()
        };

        let mut writer =
            IndexWriter::open(Arc::new(dir.clone()), tokenizer, config).unwrap();
        let mut doc = Document::new();
        doc.add_text("content", "committed");
        writer.add_document(&doc).unwrap();
        writer.commit().unwrap();

        let reader = IndexReader::open(&dir).unwrap();
        assert_eq!(reader.num_docs(), 1);
        let generation = reader.snapshot().generation();

        // A later commit is invisible to the already-open reader
        let mut doc = Document::new();
        doc.add_text("content", "later");
        writer.add_document(&doc).unwrap();
        writer.commit().unwrap();

        assert_eq!(reader.num_docs(), 1);
        assert_eq!(reader.snapshot().generation(), generation);

        // A fresh reader sees both
        let fresh = IndexReader::open(&dir).unwrap();
        assert_eq!(fresh.num_docs(), 2);
    }
}
