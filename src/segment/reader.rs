//! Immutable segment reader
//!
//! A committed segment is never mutated in place; deletions arrive as
//! tombstones recorded next to the segment in the manifest and are applied
//! at read time.

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::docvalues::{DocValues, SortValue};
use super::postings::{PostingIterator, PostingsReader};
use super::statistics::SegmentStatistics;
use super::stored::{StoredDocument, StoredReader};
use super::term_dict::TermDictionary;
use super::types::{DocNo, PostingListMeta, SegmentId};

/// Segment metadata recorded in the manifest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: SegmentId,
    /// Number of documents written into the segment
    pub doc_count: u32,
    /// Total size of all segment artifacts in bytes
    pub size_bytes: u64,
    /// Creation timestamp (Unix seconds)
    pub created_at: u64,
}

impl std::fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentReader")
            .field("doc_count", &self.meta.doc_count)
            .field("size_bytes", &self.meta.size_bytes)
            .finish()
    }
}

/// Read access to one immutable segment
pub struct SegmentReader {
    meta: SegmentMeta,
    terms: TermDictionary,
    postings: PostingsReader,
    docvalues: DocValues,
    stats: SegmentStatistics,
    stored: StoredReader,
    /// Docnos deleted after this segment was committed
    tombstones: RoaringBitmap,
}

impl SegmentReader {
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        meta: SegmentMeta,
        terms: TermDictionary,
        postings: PostingsReader,
        docvalues: DocValues,
        stats: SegmentStatistics,
        stored: StoredReader,
        tombstones: RoaringBitmap,
    ) -> Self {
        Self {
            meta,
            terms,
            postings,
            docvalues,
            stats,
            stored,
            tombstones,
        }
    }

    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    pub fn terms(&self) -> &TermDictionary {
        &self.terms
    }

    pub fn get_posting_meta(&self, key: &str) -> Option<&PostingListMeta> {
        self.terms.get(key)
    }

    /// Posting iterator for a dictionary key, if the key exists
    pub fn get_postings(&self, key: &str) -> Result<Option<PostingIterator<'_>>> {
        match self.terms.get(key) {
            Some(meta) => Ok(Some(self.postings.get_postings(meta)?)),
            None => Ok(None),
        }
    }

    /// Posting iterator for already-resolved metadata (dictionary scans)
    pub fn postings_for(&self, meta: &PostingListMeta) -> Result<PostingIterator<'_>> {
        Ok(self.postings.get_postings(meta)?)
    }

    pub fn doc_frequency(&self, key: &str) -> u32 {
        self.terms.get(key).map(|m| m.doc_frequency).unwrap_or(0)
    }

    pub fn is_deleted(&self, docno: DocNo) -> bool {
        self.tombstones.contains(docno.as_u32())
    }

    pub fn is_live(&self, docno: DocNo) -> bool {
        docno.as_u32() < self.meta.doc_count && !self.is_deleted(docno)
    }

    pub fn tombstones(&self) -> &RoaringBitmap {
        &self.tombstones
    }

    pub fn doc_count(&self) -> u32 {
        self.meta.doc_count
    }

    pub fn live_doc_count(&self) -> u32 {
        self.meta.doc_count - self.tombstones.len() as u32
    }

    pub fn stats(&self) -> &SegmentStatistics {
        &self.stats
    }

    pub fn doc_length(&self, docno: DocNo) -> Option<u32> {
        self.stats.get_doc_length(docno)
    }

    pub fn docvalues(&self) -> &DocValues {
        &self.docvalues
    }

    pub fn sort_value(&self, field: &str, docno: DocNo) -> Option<&SortValue> {
        self.docvalues.get(field, docno)
    }

    /// Stored fields for a docno. `None` when the docno is out of range;
    /// tombstone checks are the caller's concern.
    pub fn stored(&self, docno: DocNo) -> Option<Result<StoredDocument>> {
        self.stored.get(docno)
    }

    /// Live docnos in ascending order
    pub fn live_docnos(&self) -> impl Iterator<Item = DocNo> + '_ {
        (0..self.meta.doc_count)
            .map(DocNo::new)
            .filter(move |d| !self.is_deleted(*d))
    }
}
