//! Segment manifest
//!
//! The manifest is the commit point of the index: it lists every live
//! segment together with its checksum and tombstone set. Commits write the
//! new manifest through an atomic rename, so readers observe either the old
//! or the new segment set, never a mix.

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

use super::reader::SegmentMeta;
use super::types::SegmentId;
use super::writer::current_timestamp;

/// Name of the manifest file inside a directory.
pub const MANIFEST_NAME: &str = "segments.manifest";

/// Manifest record for one live segment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub meta: SegmentMeta,
    /// Checksum over all segment artifacts
    pub checksum: u64,
    /// Docnos deleted since the segment was committed
    pub tombstones: Vec<u32>,
}

impl ManifestEntry {
    pub fn tombstone_bitmap(&self) -> RoaringBitmap {
        self.tombstones.iter().copied().collect()
    }

    pub fn live_doc_count(&self) -> u32 {
        self.meta.doc_count - self.tombstones.len() as u32
    }
}

/// The set of committed segments plus bookkeeping
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,
    /// Incremented on every commit
    pub generation: u64,
    pub next_segment_id: SegmentId,
    pub segments: Vec<ManifestEntry>,
    pub updated_at: u64,
}

impl Manifest {
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            generation: 0,
            next_segment_id: SegmentId::new(0),
            segments: Vec::new(),
            updated_at: 0,
        }
    }

    pub fn allocate_segment_id(&mut self) -> SegmentId {
        let id = self.next_segment_id;
        self.next_segment_id = id.next();
        id
    }

    pub fn add_segment(&mut self, meta: SegmentMeta, checksum: u64) {
        self.segments.push(ManifestEntry {
            meta,
            checksum,
            tombstones: Vec::new(),
        });
        self.touch();
    }

    pub fn remove_segment(&mut self, segment_id: SegmentId) -> Option<ManifestEntry> {
        let pos = self.segments.iter().position(|e| e.meta.id == segment_id)?;
        self.touch();
        Some(self.segments.remove(pos))
    }

    /// Record additional tombstones for an existing segment.
    pub fn add_tombstones(&mut self, segment_id: SegmentId, docnos: &[u32]) -> Result<()> {
        let entry = self
            .segments
            .iter_mut()
            .find(|e| e.meta.id == segment_id)
            .ok_or_else(|| {
                SearchError::Storage(format!("unknown segment in manifest: {}", segment_id))
            })?;
        let mut set: RoaringBitmap = entry.tombstones.iter().copied().collect();
        for &d in docnos {
            set.insert(d);
        }
        entry.tombstones = set.iter().collect();
        self.touch();
        Ok(())
    }

    pub fn get_segment(&self, segment_id: SegmentId) -> Option<&ManifestEntry> {
        self.segments.iter().find(|e| e.meta.id == segment_id)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_doc_count(&self) -> u64 {
        self.segments.iter().map(|e| e.meta.doc_count as u64).sum()
    }

    pub fn total_live_doc_count(&self) -> u64 {
        self.segments.iter().map(|e| e.live_doc_count() as u64).sum()
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.updated_at = current_timestamp();
    }

    pub fn to_bincode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bincode(data: &[u8]) -> Result<Self> {
        let manifest: Manifest = bincode::deserialize(data)?;
        if manifest.version != Self::VERSION {
            return Err(SearchError::Storage(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(manifest)
    }

    /// Human-readable form, handy when poking at an index directory.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| SearchError::Storage(format!("manifest encoding failed: {}", e)))
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}
