//! Segment writer
//!
//! Folds a drained write buffer into the immutable artifacts of a new
//! segment: postings, term dictionary, statistics, sort columns, and the
//! stored-fields blob. Buffer-local deletes are dropped here, so a fresh
//! segment starts with an empty tombstone set.

use std::collections::HashMap;

use crc32fast::Hasher;
use roaring::RoaringBitmap;

use crate::error::Result;

use super::buffer::WriteBuffer;
use super::docvalues::DocValues;
use super::postings::{PostingsReader, PostingsWriter};
use super::reader::{SegmentMeta, SegmentReader};
use super::statistics::SegmentStatistics;
use super::stored::{StoredReader, StoredWriter};
use super::term_dict::{TermDictionary, TermDictionaryBuilder};
use super::types::{DocNo, Posting, PostingListMeta, SegmentId};

/// All artifacts of a freshly written segment
pub struct SegmentWriteResult {
    pub reader: SegmentReader,
    pub postings_data: Vec<u8>,
    pub fst_data: Vec<u8>,
    pub term_metadata: Vec<PostingListMeta>,
    pub stats_data: Vec<u8>,
    pub docvalues_data: Vec<u8>,
    pub stored_data: Vec<u8>,
}

impl SegmentWriteResult {
    /// Checksum over all persisted artifacts.
    ///
    /// Recorded in the manifest and verified when the segment is reopened;
    /// a mismatch is reported as a corrupt segment.
    pub fn checksum(&self) -> u64 {
        let mut hasher = Hasher::new();
        hasher.update(&self.postings_data);
        hasher.update(&self.fst_data);
        let term_meta_bytes = bincode::serialize(&self.term_metadata).unwrap_or_default();
        hasher.update(&term_meta_bytes);
        hasher.update(&self.stats_data);
        hasher.update(&self.docvalues_data);
        hasher.update(&self.stored_data);
        hasher.finalize() as u64
    }
}

/// Assemble the serialized artifacts plus an in-memory reader.
pub(crate) fn assemble(
    segment_id: SegmentId,
    postings_writer: PostingsWriter,
    term_builder: TermDictionaryBuilder,
    stats: SegmentStatistics,
    docvalues: DocValues,
    stored_writer: StoredWriter,
) -> Result<SegmentWriteResult> {
    let doc_count = stats.doc_count;
    let postings_data = postings_writer.into_data();
    let term_dict = term_builder.build()?;

    let fst_data = term_dict.fst_bytes().to_vec();
    let term_metadata = term_dict.metadata().to_vec();
    let stats_data = bincode::serialize(&stats)?;
    let docvalues_data = bincode::serialize(&docvalues)?;
    let stored_data = stored_writer.serialize()?;

    let size_bytes = (postings_data.len()
        + fst_data.len()
        + stats_data.len()
        + docvalues_data.len()
        + stored_data.len()) as u64;

    let meta = SegmentMeta {
        id: segment_id,
        doc_count,
        size_bytes,
        created_at: current_timestamp(),
    };

    let reader = SegmentReader::from_parts(
        meta,
        term_dict,
        PostingsReader::new(postings_data.clone()),
        docvalues,
        stats,
        StoredReader::from_bytes(&stored_data)?,
        RoaringBitmap::new(),
    );

    Ok(SegmentWriteResult {
        reader,
        postings_data,
        fst_data,
        term_metadata,
        stats_data,
        docvalues_data,
        stored_data,
    })
}

/// Writes new segments from buffered documents
pub struct SegmentWriter {
    segment_id: SegmentId,
}

impl SegmentWriter {
    pub fn new(segment_id: SegmentId) -> Self {
        Self { segment_id }
    }

    /// Write a segment from a buffer, dropping buffer-local deletes.
    pub fn write_from_buffer(&self, buffer: &WriteBuffer) -> Result<SegmentWriteResult> {
        let keep = buffer.live_docnos();
        let remap: HashMap<u32, u32> = keep
            .iter()
            .enumerate()
            .map(|(new, old)| (old.as_u32(), new as u32))
            .collect();

        // Terms sorted for the FST builder
        let mut terms: Vec<&String> = buffer.all_postings().keys().collect();
        terms.sort();

        let mut postings_writer = PostingsWriter::new();
        let mut term_builder = TermDictionaryBuilder::with_capacity(terms.len());

        for term in terms {
            let postings = &buffer.all_postings()[term];
            postings_writer.start_posting_list();

            let mut doc_frequency = 0u32;
            let mut total_term_frequency = 0u64;

            // Buffer postings are old-docno ordered; the remap preserves
            // order because live docnos renumber monotonically.
            for posting in postings {
                if let Some(&new_docno) = remap.get(&posting.docno.as_u32()) {
                    postings_writer.add_posting(Posting::with_positions(
                        DocNo::new(new_docno),
                        posting.term_frequency,
                        posting.positions.clone(),
                    ));
                    doc_frequency += 1;
                    total_term_frequency += posting.term_frequency as u64;
                }
            }

            if doc_frequency > 0 {
                let meta =
                    postings_writer.finish_posting_list(doc_frequency, total_term_frequency);
                term_builder.add(term.clone(), meta);
            }
        }

        let doc_lengths: Vec<u32> = keep
            .iter()
            .filter_map(|d| buffer.stats().get_doc_length(*d))
            .collect();
        let stats = SegmentStatistics::from_doc_lengths(doc_lengths);

        let docvalues = buffer.docvalues_builder().clone().build_remapped(&keep);

        let mut stored_writer = StoredWriter::new();
        for docno in &keep {
            if let Some(stored) = buffer.stored(*docno) {
                stored_writer.add(stored)?;
            }
        }

        assemble(
            self.segment_id,
            postings_writer,
            term_builder,
            stats,
            docvalues,
            stored_writer,
        )
    }
}

/// Current Unix timestamp in seconds
pub(crate) fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::document::{dict_key, Document, Term};
    use crate::tokenizer::StandardTokenizer;

    fn tokenizer() -> StandardTokenizer {
        StandardTokenizer::new(&TokenizerConfig::default())
    }

    fn doc(id: i64, content: &str) -> Document {
        let mut d = Document::new();
        d.add_i64("id", id).add_text("content", content);
        d
    }

    #[test]
    fn test_write_from_buffer() {
        let mut buffer = WriteBuffer::new();
        let t = tokenizer();

        buffer.add_document(&doc(1, "hello world hello"), &t).unwrap();
        buffer.add_document(&doc(2, "hello rust"), &t).unwrap();
        buffer.add_document(&doc(3, "world rust rust"), &t).unwrap();

        let writer = SegmentWriter::new(SegmentId::new(1));
        let result = writer.write_from_buffer(&buffer).unwrap();

        assert_eq!(result.reader.doc_count(), 3);
        assert_eq!(result.reader.doc_frequency(&dict_key("content", "hello")), 2);
        assert_eq!(result.reader.doc_frequency(&dict_key("content", "world")), 2);
        assert_eq!(result.reader.doc_frequency(&dict_key("content", "rust")), 2);

        // Stored fields come back in docno order
        let stored = result.reader.stored(DocNo(1)).unwrap().unwrap();
        assert_eq!(stored.get_i64("id"), Some(2));
    }

    #[test]
    fn test_write_drops_buffer_deletes_and_renumbers() {
        let mut buffer = WriteBuffer::new();
        let t = tokenizer();

        buffer.add_document(&doc(1, "alpha common"), &t).unwrap();
        buffer.add_document(&doc(2, "beta common"), &t).unwrap();
        buffer.add_document(&doc(3, "gamma common"), &t).unwrap();
        buffer.delete_by_key(&Term::from_i64("id", 2).dict_key());

        let writer = SegmentWriter::new(SegmentId::new(1));
        let result = writer.write_from_buffer(&buffer).unwrap();

        // Deleted doc is physically gone
        assert_eq!(result.reader.doc_count(), 2);
        assert_eq!(result.reader.doc_frequency(&dict_key("content", "common")), 2);
        assert_eq!(result.reader.doc_frequency(&dict_key("content", "beta")), 0);

        // Docnos are dense after the drop
        let postings: Vec<_> = result
            .reader
            .get_postings(&dict_key("content", "gamma"))
            .unwrap()
            .unwrap()
            .collect();
        assert_eq!(postings[0].docno, DocNo(1));

        let stored = result.reader.stored(DocNo(1)).unwrap().unwrap();
        assert_eq!(stored.get_i64("id"), Some(3));
    }

    #[test]
    fn test_checksum_is_stable_and_content_sensitive() {
        let mut buffer = WriteBuffer::new();
        let t = tokenizer();
        buffer.add_document(&doc(1, "hello"), &t).unwrap();

        let writer = SegmentWriter::new(SegmentId::new(1));
        let a = writer.write_from_buffer(&buffer).unwrap();
        let b = writer.write_from_buffer(&buffer).unwrap();
        assert_eq!(a.checksum(), b.checksum());

        buffer.add_document(&doc(2, "world"), &t).unwrap();
        let c = writer.write_from_buffer(&buffer).unwrap();
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_positions_survive_segment_write() {
        let mut buffer = WriteBuffer::new();
        let t = tokenizer();
        buffer.add_document(&doc(1, "one two one"), &t).unwrap();

        let writer = SegmentWriter::new(SegmentId::new(7));
        let result = writer.write_from_buffer(&buffer).unwrap();

        let postings: Vec<_> = result
            .reader
            .get_postings(&dict_key("content", "one"))
            .unwrap()
            .unwrap()
            .collect();
        assert_eq!(postings[0].positions, vec![0, 2]);
    }
}
