//! Term dictionary backed by an FST
//!
//! Maps dictionary keys (`field NUL token`) to postings metadata. Key order
//! is lexicographic on (field, token), so all terms of one field form one
//! contiguous range, and prefix scans start at the first key >= the prefix
//! and stop at the first key that no longer shares it.

use std::io;

use fst::{IntoStreamer, Map, MapBuilder, Streamer};

use super::types::PostingListMeta;

/// Immutable term dictionary for one segment
pub struct TermDictionary {
    /// FST mapping key -> index into the metadata array
    fst: Map<Vec<u8>>,
    metadata: Vec<PostingListMeta>,
}

impl TermDictionary {
    pub fn new(fst_data: Vec<u8>, metadata: Vec<PostingListMeta>) -> io::Result<Self> {
        let fst = Map::new(fst_data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self { fst, metadata })
    }

    /// Look up an exact dictionary key
    pub fn get(&self, key: &str) -> Option<&PostingListMeta> {
        self.fst
            .get(key.as_bytes())
            .map(|idx| &self.metadata[idx as usize])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fst.contains_key(key.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Visit every key starting with `key_prefix`, in order.
    ///
    /// The visitor returns `false` to abort the scan early; the return value
    /// reports whether the scan ran to completion.
    pub fn scan_prefix<'a, F>(&'a self, key_prefix: &str, mut visit: F) -> bool
    where
        F: FnMut(&str, &'a PostingListMeta) -> bool,
    {
        let prefix_bytes = key_prefix.as_bytes();
        let mut stream = self.fst.range().ge(prefix_bytes).into_stream();

        while let Some((key, idx)) = stream.next() {
            if !key.starts_with(prefix_bytes) {
                break;
            }
            if let Ok(term) = std::str::from_utf8(key) {
                if !visit(term, &self.metadata[idx as usize]) {
                    return false;
                }
            }
        }
        true
    }

    /// All keys with the given prefix
    pub fn prefix_search(&self, key_prefix: &str) -> Vec<(String, &PostingListMeta)> {
        let mut results = Vec::new();
        self.scan_prefix(key_prefix, |term, meta| {
            results.push((term.to_string(), meta));
            true
        });
        results
    }

    /// Iterate all keys in the dictionary, in order
    pub fn iter_terms(&self) -> Vec<(String, &PostingListMeta)> {
        let mut results = Vec::new();
        let mut stream = self.fst.stream();
        while let Some((key, idx)) = stream.next() {
            if let Ok(term) = std::str::from_utf8(key) {
                results.push((term.to_string(), &self.metadata[idx as usize]));
            }
        }
        results
    }

    /// Raw FST bytes (for persistence)
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst.as_fst().as_bytes()
    }

    /// Metadata array (for persistence)
    pub fn metadata(&self) -> &[PostingListMeta] {
        &self.metadata
    }
}

/// Builder for term dictionaries
pub struct TermDictionaryBuilder {
    terms: Vec<(String, PostingListMeta)>,
}

impl TermDictionaryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, key: String, meta: PostingListMeta) {
        self.terms.push((key, meta));
    }

    pub fn build(mut self) -> io::Result<TermDictionary> {
        // FST construction requires sorted input
        self.terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut fst_builder = MapBuilder::memory();
        let mut metadata = Vec::with_capacity(self.terms.len());

        for (idx, (key, meta)) in self.terms.into_iter().enumerate() {
            fst_builder
                .insert(key.as_bytes(), idx as u64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            metadata.push(meta);
        }

        let fst_data = fst_builder
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        TermDictionary::new(fst_data, metadata)
    }
}

impl Default for TermDictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
