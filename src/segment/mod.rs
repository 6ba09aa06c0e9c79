//! Segment-based inverted index
//!
//! The index is the union of immutable segments minus tombstones. A commit
//! turns the write buffer into a new segment; merges compact segments into
//! fewer ones. Within a segment, postings are docno-ordered and the term
//! dictionary is ordered lexicographically on (field, token).

pub mod buffer;
pub mod docvalues;
pub mod manifest;
pub mod merge;
pub mod postings;
pub mod reader;
pub mod statistics;
pub mod store;
pub mod stored;
pub mod term_dict;
pub mod types;
pub mod writer;

pub use buffer::WriteBuffer;
pub use docvalues::{DocValues, SortValue};
pub use manifest::{Manifest, ManifestEntry};
pub use merge::SegmentMerger;
pub use reader::{SegmentMeta, SegmentReader};
pub use statistics::{IndexStatistics, ScoreParams, SegmentStatistics};
pub use stored::StoredDocument;
pub use term_dict::{TermDictionary, TermDictionaryBuilder};
pub use types::{DocAddress, DocNo, Posting, PostingListMeta, SegmentId};
pub use writer::{SegmentWriteResult, SegmentWriter};
