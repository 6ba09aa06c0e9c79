//! Core types for the segment-based index

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment identifier (monotonically increasing per index)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document number within a segment (0..max_doc)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Global document identity: (segment, local doc number)
///
/// Stable within one committed snapshot; not guaranteed stable across merges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocAddress {
    pub segment: SegmentId,
    pub doc: DocNo,
}

impl DocAddress {
    pub fn new(segment: SegmentId, doc: DocNo) -> Self {
        Self { segment, doc }
    }
}

impl fmt::Display for DocAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment.0, self.doc.0)
    }
}

/// A single posting entry within a posting list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Dense document number within the segment
    pub docno: DocNo,
    /// Term frequency in this document
    pub term_frequency: u32,
    /// Token positions within the field
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(docno: DocNo, term_frequency: u32) -> Self {
        Self {
            docno,
            term_frequency,
            positions: Vec::new(),
        }
    }

    pub fn with_positions(docno: DocNo, term_frequency: u32, positions: Vec<u32>) -> Self {
        Self {
            docno,
            term_frequency,
            positions,
        }
    }
}

/// Fixed block size for posting list storage
pub const BLOCK_SIZE: usize = 128;

/// A block of postings under construction
#[derive(Clone, Debug, Default)]
pub struct PostingBlock {
    pub postings: Vec<Posting>,
    /// Maximum document number in this block (skip data)
    pub max_docno: DocNo,
}

impl PostingBlock {
    pub fn new() -> Self {
        Self {
            postings: Vec::with_capacity(BLOCK_SIZE),
            max_docno: DocNo(0),
        }
    }

    pub fn is_full(&self) -> bool {
        self.postings.len() >= BLOCK_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn push(&mut self, posting: Posting) {
        if posting.docno > self.max_docno {
            self.max_docno = posting.docno;
        }
        self.postings.push(posting);
    }
}

/// Posting list metadata stored in the term dictionary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostingListMeta {
    /// Offset in the postings file
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
    /// Number of documents containing this term
    pub doc_frequency: u32,
    /// Total term frequency across all documents
    pub total_term_frequency: u64,
}
