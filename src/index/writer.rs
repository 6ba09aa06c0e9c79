//! Index writer
//!
//! The writer owns the directory lock, the write buffer, and the manifest.
//! `commit` is the only operation that changes what later-opened readers
//! see: it flushes the buffer into a new immutable segment, turns staged
//! deletes into tombstones on existing segments, and publishes the new
//! manifest through an atomic rename. A failed commit leaves the previous
//! manifest live and keeps the buffer and staged deletes for a retry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{IndexConfig, OpenMode};
use crate::directory::{DirLock, DirectoryRef};
use crate::document::{Document, Term};
use crate::error::{Result, SearchError};
use crate::segment::{
    store, Manifest, SegmentId, SegmentMerger, SegmentReader, SegmentWriter, WriteBuffer,
};
use crate::tokenizer::TokenizerRef;

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("segments", &self.segments.len())
            .field("pending_deletes", &self.pending_deletes.len())
            .field("pending_delete_all", &self.pending_delete_all)
            .finish()
    }
}

/// Single writer for one index location
pub struct IndexWriter {
    dir: DirectoryRef,
    tokenizer: TokenizerRef,
    config: IndexConfig,
    manifest: Manifest,
    segments: Vec<Arc<SegmentReader>>,
    buffer: WriteBuffer,
    /// Delete terms staged for committed segments
    pending_deletes: Vec<Term>,
    /// Staged wipe of every committed segment
    pending_delete_all: bool,
    _lock: DirLock,
}

impl IndexWriter {
    /// Open a writer on a directory, acquiring the exclusive write lock.
    ///
    /// Fails with `LockConflict` when another writer is open on the same
    /// location, and with a storage error when `Append` is requested on a
    /// location that holds no committed index.
    pub fn open(dir: DirectoryRef, tokenizer: TokenizerRef, config: IndexConfig) -> Result<Self> {
        let lock = dir.acquire_lock()?;

        let manifest = match config.mode {
            OpenMode::Create => {
                // Drop whatever is there and start over
                for name in dir.list()? {
                    dir.delete(&name)?;
                }
                Manifest::new()
            }
            OpenMode::CreateOrAppend => store::load_manifest(dir.as_ref())?.unwrap_or_default(),
            OpenMode::Append => store::load_manifest(dir.as_ref())?.ok_or_else(|| {
                SearchError::Storage("cannot append: no committed index at location".to_string())
            })?,
        };

        let mut segments = Vec::with_capacity(manifest.segment_count());
        for entry in &manifest.segments {
            segments.push(Arc::new(store::read_segment(dir.as_ref(), entry)?));
        }

        info!(
            segments = segments.len(),
            generation = manifest.generation,
            "opened index writer"
        );

        Ok(Self {
            dir,
            tokenizer,
            config,
            manifest,
            segments,
            buffer: WriteBuffer::new(),
            pending_deletes: Vec::new(),
            pending_delete_all: false,
            _lock: lock,
        })
    }

    /// Tokenize and buffer a document. Invisible to readers until `commit`.
    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        self.buffer.add_document(doc, self.tokenizer.as_ref())?;
        Ok(())
    }

    /// Stage deletion of every live document whose field value matches the
    /// term exactly. Buffered documents are marked immediately; committed
    /// segments get tombstones at the next commit. No-op when nothing
    /// matches.
    pub fn delete_documents(&mut self, term: &Term) -> Result<()> {
        self.buffer.delete_by_key(&term.dict_key());
        self.pending_deletes.push(term.clone());
        Ok(())
    }

    /// Delete-then-add as one staged unit: both sides of the update become
    /// visible in the same commit, or neither does.
    pub fn update_document(&mut self, term: &Term, doc: &Document) -> Result<()> {
        self.delete_documents(term)?;
        self.add_document(doc)
    }

    /// Stage removal of every document, buffered and committed alike.
    pub fn delete_all(&mut self) -> Result<()> {
        self.buffer.clear();
        self.pending_deletes.clear();
        self.pending_delete_all = true;
        Ok(())
    }

    /// Number of buffered (uncommitted) documents.
    pub fn buffered_docs(&self) -> u32 {
        self.buffer.doc_count()
    }

    /// True when the buffer has outgrown the configured thresholds.
    pub fn should_commit(&self) -> bool {
        self.buffer.should_flush(&self.config.buffer)
    }

    /// Flush buffered documents and staged deletes into a new committed
    /// state, durable once this returns.
    pub fn commit(&mut self) -> Result<()> {
        let mut new_manifest = self.manifest.clone();
        let mut new_segment = None;
        let mut wiped_ids: Vec<SegmentId> = Vec::new();

        if self.pending_delete_all {
            wiped_ids = new_manifest.segments.iter().map(|e| e.meta.id).collect();
            for id in &wiped_ids {
                new_manifest.remove_segment(*id);
            }
        }

        // Resolve staged delete terms into per-segment tombstones
        let mut tombstones: HashMap<SegmentId, Vec<u32>> = HashMap::new();
        if !self.pending_delete_all {
            for term in &self.pending_deletes {
                let key = term.dict_key();
                for segment in &self.segments {
                    if let Some(iter) = segment.get_postings(&key)? {
                        for posting in iter {
                            if !segment.is_deleted(posting.docno) {
                                tombstones
                                    .entry(segment.id())
                                    .or_default()
                                    .push(posting.docno.as_u32());
                            }
                        }
                    }
                }
            }
        }

        for (segment_id, docnos) in &tombstones {
            new_manifest.add_tombstones(*segment_id, docnos)?;
        }

        // Flush the buffer into a new segment, unless every buffered doc
        // was deleted again before the commit
        if self.buffer.live_doc_count() > 0 {
            let segment_id = new_manifest.allocate_segment_id();
            let result = SegmentWriter::new(segment_id).write_from_buffer(&self.buffer)?;
            let checksum = result.checksum();

            if let Err(e) = store::write_segment(self.dir.as_ref(), &result) {
                // Never leave a half-written segment behind
                let _ = store::delete_segment(self.dir.as_ref(), segment_id);
                return Err(e);
            }

            new_manifest.add_segment(result.reader.meta().clone(), checksum);
            new_segment = Some((segment_id, Arc::new(result.reader)));
        }

        // The manifest rename is the commit point
        if let Err(e) = store::save_manifest(self.dir.as_ref(), &new_manifest) {
            if let Some((segment_id, _)) = new_segment {
                let _ = store::delete_segment(self.dir.as_ref(), segment_id);
            }
            return Err(e);
        }

        // Committed: reclaim wiped segments and refresh in-memory readers
        for id in wiped_ids {
            if let Err(e) = store::delete_segment(self.dir.as_ref(), id) {
                warn!(segment = %id, error = %e, "failed to remove wiped segment files");
            }
        }

        let mut segments = Vec::with_capacity(new_manifest.segment_count());
        for entry in &new_manifest.segments {
            if let Some((id, reader)) = &new_segment {
                if *id == entry.meta.id {
                    segments.push(reader.clone());
                    continue;
                }
            }
            // Readers whose tombstone set is unchanged can be reused
            let existing = self.segments.iter().find(|s| {
                s.id() == entry.meta.id && s.tombstones().len() == entry.tombstones.len() as u64
            });
            match existing {
                Some(reader) => segments.push(reader.clone()),
                None => segments.push(Arc::new(store::read_segment(self.dir.as_ref(), entry)?)),
            }
        }

        info!(
            generation = new_manifest.generation,
            segments = segments.len(),
            "committed"
        );

        self.manifest = new_manifest;
        self.segments = segments;
        self.buffer.clear();
        self.pending_deletes.clear();
        self.pending_delete_all = false;
        Ok(())
    }

    /// Compact all committed segments into one.
    ///
    /// Commits pending changes first. Tombstoned documents are dropped
    /// physically; the set of live documents is unchanged.
    pub fn force_merge(&mut self) -> Result<()> {
        self.commit()?;

        if self.segments.len() <= 1 {
            return Ok(());
        }

        let mut new_manifest = self.manifest.clone();
        let segment_id = new_manifest.allocate_segment_id();

        let readers: Vec<&SegmentReader> = self.segments.iter().map(|s| s.as_ref()).collect();
        let result = SegmentMerger::new(segment_id).merge(&readers)?;
        let checksum = result.checksum();

        if let Err(e) = store::write_segment(self.dir.as_ref(), &result) {
            let _ = store::delete_segment(self.dir.as_ref(), segment_id);
            return Err(e);
        }

        let old_ids: Vec<SegmentId> = self.segments.iter().map(|s| s.id()).collect();
        for id in &old_ids {
            new_manifest.remove_segment(*id);
        }
        new_manifest.add_segment(result.reader.meta().clone(), checksum);

        if let Err(e) = store::save_manifest(self.dir.as_ref(), &new_manifest) {
            let _ = store::delete_segment(self.dir.as_ref(), segment_id);
            return Err(e);
        }

        for id in old_ids {
            if let Err(e) = store::delete_segment(self.dir.as_ref(), id) {
                warn!(segment = %id, error = %e, "failed to remove merged segment files");
            }
        }

        debug!(segment = %segment_id, "merged segments");

        self.manifest = new_manifest;
        self.segments = vec![Arc::new(result.reader)];
        Ok(())
    }

    /// Committed segment count.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Discard buffered uncommitted documents and release the lock.
    /// Dropping the writer has the same effect.
    pub fn close(self) -> Result<()> {
        if self.buffer.doc_count() > 0 {
            debug!(
                discarded = self.buffer.doc_count(),
                "closing writer with uncommitted documents"
            );
        }
        Ok(())
    }
}
