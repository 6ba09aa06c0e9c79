//! Segment persistence over a [`Directory`]
//!
//! Each segment is a fixed set of flat files named by segment id. The
//! manifest is written last, through an atomic rename, which is what makes
//! a commit a commit.

use roaring::RoaringBitmap;
use tracing::debug;

use crate::directory::Directory;
use crate::error::{Result, SearchError};

use super::manifest::{Manifest, ManifestEntry, MANIFEST_NAME};
use super::postings::PostingsReader;
use super::reader::SegmentReader;
use super::stored::StoredReader;
use super::term_dict::TermDictionary;
use super::types::{PostingListMeta, SegmentId};
use super::writer::SegmentWriteResult;

const SEGMENT_SUFFIXES: [&str; 6] = [
    "postings", "terms", "termmeta", "stats", "docvalues", "stored",
];

fn file_name(id: SegmentId, suffix: &str) -> String {
    format!("{}.{}", id, suffix)
}

/// Write all artifacts of a segment.
pub fn write_segment(dir: &dyn Directory, result: &SegmentWriteResult) -> Result<()> {
    let id = result.reader.id();
    dir.write(&file_name(id, "postings"), &result.postings_data)?;
    dir.write(&file_name(id, "terms"), &result.fst_data)?;
    dir.write(
        &file_name(id, "termmeta"),
        &bincode::serialize(&result.term_metadata)?,
    )?;
    dir.write(&file_name(id, "stats"), &result.stats_data)?;
    dir.write(&file_name(id, "docvalues"), &result.docvalues_data)?;
    dir.write(&file_name(id, "stored"), &result.stored_data)?;
    debug!(segment = %id, "wrote segment files");
    Ok(())
}

/// Load a segment named by a manifest entry, verifying its checksum.
pub fn read_segment(dir: &dyn Directory, entry: &ManifestEntry) -> Result<SegmentReader> {
    let id = entry.meta.id;
    let postings_data = dir.read(&file_name(id, "postings"))?;
    let fst_data = dir.read(&file_name(id, "terms"))?;
    let term_meta_bytes = dir.read(&file_name(id, "termmeta"))?;
    let stats_data = dir.read(&file_name(id, "stats"))?;
    let docvalues_data = dir.read(&file_name(id, "docvalues"))?;
    let stored_data = dir.read(&file_name(id, "stored"))?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&postings_data);
    hasher.update(&fst_data);
    hasher.update(&term_meta_bytes);
    hasher.update(&stats_data);
    hasher.update(&docvalues_data);
    hasher.update(&stored_data);
    let checksum = hasher.finalize() as u64;
    if checksum != entry.checksum {
        return Err(SearchError::Storage(format!(
            "corrupt segment {}: checksum mismatch",
            id
        )));
    }

    let term_metadata: Vec<PostingListMeta> = bincode::deserialize(&term_meta_bytes)?;
    let terms = TermDictionary::new(fst_data, term_metadata)?;
    let stats = bincode::deserialize(&stats_data)?;
    let docvalues = bincode::deserialize(&docvalues_data)?;
    let stored = StoredReader::from_bytes(&stored_data)?;
    let tombstones: RoaringBitmap = entry.tombstone_bitmap();

    Ok(SegmentReader::from_parts(
        entry.meta.clone(),
        terms,
        PostingsReader::new(postings_data),
        docvalues,
        stats,
        stored,
        tombstones,
    ))
}

/// Delete the files of a segment that left the manifest.
pub fn delete_segment(dir: &dyn Directory, id: SegmentId) -> Result<()> {
    for suffix in SEGMENT_SUFFIXES {
        dir.delete(&file_name(id, suffix))?;
    }
    debug!(segment = %id, "deleted segment files");
    Ok(())
}

/// Atomically publish a manifest.
pub fn save_manifest(dir: &dyn Directory, manifest: &Manifest) -> Result<()> {
    dir.atomic_write(MANIFEST_NAME, &manifest.to_bincode()?)
}

/// Load the manifest; `None` when the index has never been committed.
pub fn load_manifest(dir: &dyn Directory) -> Result<Option<Manifest>> {
    if !dir.exists(MANIFEST_NAME) {
        return Ok(None);
    }
    let bytes = dir.read(MANIFEST_NAME)?;
    Ok(Some(Manifest::from_bincode(&bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::directory::RamDirectory;
    use crate::document::{dict_key, Document};
    use crate::segment::buffer::WriteBuffer;
    use crate::segment::writer::SegmentWriter;
    use crate::tokenizer::StandardTokenizer;

    fn sample_result() -> SegmentWriteResult {
        let t = StandardTokenizer::new(&TokenizerConfig::default());
        let mut buffer = WriteBuffer::new();
        let mut doc = Document::new();
        doc.add_i64("id", 1).add_text("content", "hello world");
        buffer.add_document(&doc, &t).unwrap();
        SegmentWriter::new(SegmentId::new(0))
            .write_from_buffer(&buffer)
            .unwrap()
    }

    #[test]
    fn test_segment_persistence_roundtrip() {
        let dir = RamDirectory::new();
        let result = sample_result();
        let checksum = result.checksum();

        write_segment(&dir, &result).unwrap();

        let entry = ManifestEntry {
            meta: result.reader.meta().clone(),
            checksum,
            tombstones: vec![],
        };
        let reader = read_segment(&dir, &entry).unwrap();

        assert_eq!(reader.doc_count(), 1);
        assert_eq!(reader.doc_frequency(&dict_key("content", "hello")), 1);
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let dir = RamDirectory::new();
        let result = sample_result();

        write_segment(&dir, &result).unwrap();

        let entry = ManifestEntry {
            meta: result.reader.meta().clone(),
            checksum: result.checksum() ^ 1,
            tombstones: vec![],
        };
        let err = read_segment(&dir, &entry).unwrap_err();
        assert!(err.to_string().contains("corrupt segment"));
    }

    #[test]
    fn test_manifest_save_load() {
        let dir = RamDirectory::new();
        assert!(load_manifest(&dir).unwrap().is_none());

        let mut manifest = Manifest::new();
        manifest.allocate_segment_id();
        save_manifest(&dir, &manifest).unwrap();

        let loaded = load_manifest(&dir).unwrap().unwrap();
        assert_eq!(loaded.next_segment_id, SegmentId::new(1));
    }

    #[test]
    fn test_delete_segment_files() {
        let dir = RamDirectory::new();
        let result = sample_result();
        write_segment(&dir, &result).unwrap();
        assert!(!dir.list().unwrap().is_empty());

        delete_segment(&dir, SegmentId::new(0)).unwrap();
        assert!(dir.list().unwrap().is_empty());
    }
}
