//! Segment compaction
//!
//! Merges a set of live segments into one, dropping tombstoned documents and
//! renumbering docnos densely. A merge changes nothing observable except the
//! segment count: the same live documents come out the other side.

use std::collections::{BTreeSet, HashMap};

use crate::error::Result;

use super::docvalues::{DocValues, SortColumn};
use super::postings::PostingsWriter;
use super::reader::SegmentReader;
use super::stored::StoredWriter;
use super::statistics::SegmentStatistics;
use super::term_dict::TermDictionaryBuilder;
use super::types::{DocNo, Posting, SegmentId};
use super::writer::{assemble, SegmentWriteResult};

/// Merges segments into a single replacement segment
pub struct SegmentMerger {
    segment_id: SegmentId,
}

impl SegmentMerger {
    pub fn new(segment_id: SegmentId) -> Self {
        Self { segment_id }
    }

    pub fn merge(&self, segments: &[&SegmentReader]) -> Result<SegmentWriteResult> {
        // New docnos: live docs of each segment, in segment order
        let mut remaps: Vec<HashMap<u32, u32>> = Vec::with_capacity(segments.len());
        let mut doc_lengths: Vec<u32> = Vec::new();
        let mut next_docno = 0u32;

        for segment in segments {
            let mut remap = HashMap::new();
            for old in segment.live_docnos() {
                remap.insert(old.as_u32(), next_docno);
                doc_lengths.push(segment.doc_length(old).unwrap_or(0));
                next_docno += 1;
            }
            remaps.push(remap);
        }

        // Union of all dictionary keys
        let mut all_terms: BTreeSet<String> = BTreeSet::new();
        for segment in segments {
            for (term, _) in segment.terms().iter_terms() {
                all_terms.insert(term);
            }
        }

        let mut postings_writer = PostingsWriter::new();
        let mut term_builder = TermDictionaryBuilder::with_capacity(all_terms.len());

        for term in &all_terms {
            postings_writer.start_posting_list();
            let mut doc_frequency = 0u32;
            let mut total_term_frequency = 0u64;

            for (seg_idx, segment) in segments.iter().enumerate() {
                if let Some(iter) = segment.get_postings(term)? {
                    for posting in iter {
                        if let Some(&new_docno) = remaps[seg_idx].get(&posting.docno.as_u32()) {
                            postings_writer.add_posting(Posting::with_positions(
                                DocNo::new(new_docno),
                                posting.term_frequency,
                                posting.positions,
                            ));
                            doc_frequency += 1;
                            total_term_frequency += posting.term_frequency as u64;
                        }
                    }
                }
            }

            if doc_frequency > 0 {
                let meta =
                    postings_writer.finish_posting_list(doc_frequency, total_term_frequency);
                term_builder.add(term.clone(), meta);
            }
        }

        let stats = SegmentStatistics::from_doc_lengths(doc_lengths);

        // Sort columns: union of fields, values pulled per merged doc
        let mut field_names: BTreeSet<String> = BTreeSet::new();
        for segment in segments {
            for name in segment.docvalues().fields() {
                field_names.insert(name.clone());
            }
        }

        let mut docvalues = DocValues::new();
        for name in field_names {
            let mut column = SortColumn::new();
            for segment in segments {
                for old in segment.live_docnos() {
                    column.push(segment.sort_value(&name, old).cloned());
                }
            }
            docvalues.insert_column(name, column);
        }

        let mut stored_writer = StoredWriter::new();
        for segment in segments {
            for old in segment.live_docnos() {
                if let Some(stored) = segment.stored(old) {
                    stored_writer.add(&stored?)?;
                }
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
