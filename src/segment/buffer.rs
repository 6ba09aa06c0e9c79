//! Mutable write buffer
//!
//! Holds tokenized documents between `add_document` and `commit`. Nothing in
//! the buffer is visible to readers; a commit drains it into an immutable
//! segment.

use std::collections::HashMap;

use crate::config::BufferConfig;
use crate::document::{dict_key, encode_f64, encode_i64, Document, FieldValue};
use crate::error::Result;
use crate::tokenizer::Tokenizer;

use super::docvalues::{DocValuesBuilder, SortValue};
use super::statistics::SegmentStatistics;
use super::stored::StoredDocument;
use super::types::{DocNo, Posting};

/// In-memory buffer of uncommitted writes
#[derive(Default)]
pub struct WriteBuffer {
    /// Dictionary key -> postings, docno-ordered by construction
    postings: HashMap<String, Vec<Posting>>,
    /// Stored fields per docno
    stored: Vec<StoredDocument>,
    /// Sort columns under construction
    docvalues: DocValuesBuilder,
    /// Doc lengths
    stats: SegmentStatistics,
    /// Local deletes (docnos marked before flush)
    deleted: Vec<bool>,
    /// Approximate buffered size in bytes
    size_bytes: usize,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize and buffer one document; returns its buffer-local docno.
    ///
    /// `Text` fields go through the tokenizer; `Str` fields index their full
    /// value as one keyword term; numeric fields index an order-preserving
    /// encoded term. Unindexed fields only land in the stored blob.
    pub fn add_document(&mut self, doc: &Document, tokenizer: &dyn Tokenizer) -> Result<DocNo> {
        // term key -> positions within this document
        let mut term_positions: HashMap<String, Vec<u32>> = HashMap::new();
        // Positions continue across repeated fields with the same name
        let mut field_positions: HashMap<&str, u32> = HashMap::new();
        let mut doc_len = 0u32;

        for field in doc.fields() {
            if !field.options.indexed {
                continue;
            }

            match (&field.value, field.options.tokenized) {
                (FieldValue::Text(text), true) | (FieldValue::Str(text), true) => {
                    let base = field_positions.entry(field.name.as_str()).or_insert(0);
                    let tokens = tokenizer.tokenize(&field.name, text)?;
                    let mut max_pos = 0;
                    for token in &tokens {
                        let position = *base + token.position;
                        max_pos = max_pos.max(token.position + 1);
                        term_positions
                            .entry(dict_key(&field.name, &token.text))
                            .or_default()
                            .push(position);
                        doc_len += 1;
                    }
                    *base += max_pos;
                }
                (FieldValue::Text(text), false) | (FieldValue::Str(text), false) => {
                    let base = field_positions.entry(field.name.as_str()).or_insert(0);
                    term_positions
                        .entry(dict_key(&field.name, text))
                        .or_default()
                        .push(*base);
                    *base += 1;
                    doc_len += 1;
                }
                (FieldValue::I64(v), _) => {
                    term_positions
                        .entry(dict_key(&field.name, &encode_i64(*v)))
                        .or_default()
                        .push(0);
                    doc_len += 1;
                }
                (FieldValue::F64(v), _) => {
                    term_positions
                        .entry(dict_key(&field.name, &encode_f64(*v)))
                        .or_default()
                        .push(0);
                    doc_len += 1;
                }
            }
        }

        let docno = self.stats.add_document(doc_len);
        self.deleted.push(false);

        for (key, mut positions) in term_positions {
            positions.sort_unstable();
            let tf = positions.len() as u32;
            self.size_bytes += key.len() + std::mem::size_of::<Posting>() + positions.len() * 4;
            self.postings
                .entry(key)
                .or_default()
                .push(Posting::with_positions(docno, tf, positions));
        }

        for field in doc.fields() {
            if field.options.sortable {
                self.docvalues
                    .set(docno, &field.name, SortValue::from_field_value(&field.value));
            }
        }

        let stored = StoredDocument::from_document(doc);
        self.size_bytes += stored.fields().iter().map(|(n, _)| n.len() + 16).sum::<usize>();
        self.stored.push(stored);

        Ok(docno)
    }

    /// Mark every buffered document matching the dictionary key as deleted.
    /// Returns the number of documents newly marked.
    pub fn delete_by_key(&mut self, key: &str) -> usize {
        let mut count = 0;
        if let Some(postings) = self.postings.get(key) {
            for posting in postings {
                let slot = &mut self.deleted[posting.docno.as_usize()];
                if !*slot {
                    *slot = true;
                    count += 1;
                }
            }
        }
        count
    }

    pub fn is_deleted(&self, docno: DocNo) -> bool {
        self.deleted.get(docno.as_usize()).copied().unwrap_or(false)
    }

    pub fn doc_count(&self) -> u32 {
        self.stats.doc_count
    }

    pub fn live_doc_count(&self) -> u32 {
        self.deleted.iter().filter(|&&d| !d).count() as u32
    }

    /// Live docnos in ascending order
    pub fn live_docnos(&self) -> Vec<DocNo> {
        self.deleted
            .iter()
            .enumerate()
            .filter(|(_, &d)| !d)
            .map(|(i, _)| DocNo::new(i as u32))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.doc_count == 0
    }

    pub fn should_flush(&self, config: &BufferConfig) -> bool {
        self.stats.doc_count as usize >= config.max_docs || self.size_bytes >= config.max_bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn all_postings(&self) -> &HashMap<String, Vec<Posting>> {
        &self.postings
    }

    pub fn stats(&self) -> &SegmentStatistics {
        &self.stats
    }

    pub fn stored(&self, docno: DocNo) -> Option<&StoredDocument> {
        self.stored.get(docno.as_usize())
    }

    pub fn docvalues_builder(&self) -> &DocValuesBuilder {
        &self.docvalues
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
