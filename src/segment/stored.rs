//! Per-segment document store
//!
//! Stored field values live in an append-only blob with an offset table per
//! docno. A document is decoded only when a query match is resolved for
//! display.

use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};
use crate::error::Result;

use super::types::DocNo;

/// Stored field values of one document, in field order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    fields: Vec<(String, FieldValue)>,
}

impl StoredDocument {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    /// Collect the stored fields of a document
    pub fn from_document(doc: &Document) -> Self {
        let fields = doc
            .fields()
            .iter()
            .filter(|f| f.options.stored)
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_text())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_i64())
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredFile {
    offsets: Vec<(u64, u32)>,
    blob: Vec<u8>,
}

/// Builds the stored-fields blob for one segment
#[derive(Default)]
pub struct StoredWriter {
    offsets: Vec<(u64, u32)>,
    blob: Vec<u8>,
}

impl StoredWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one document; call order defines docno order.
    pub fn add(&mut self, doc: &StoredDocument) -> Result<()> {
        let payload = bincode::serialize(doc)?;
        self.offsets.push((self.blob.len() as u64, payload.len() as u32));
        self.blob.extend_from_slice(&payload);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn serialize(self) -> Result<Vec<u8>> {
        let file = StoredFile {
            offsets: self.offsets,
            blob: self.blob,
        };
        Ok(bincode::serialize(&file)?)
    }
}

/// Random-access reader over a stored-fields blob
pub struct StoredReader {
    offsets: Vec<(u64, u32)>,
    blob: Vec<u8>,
}

impl StoredReader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let file: StoredFile = bincode::deserialize(data)?;
        Ok(Self {
            offsets: file.offsets,
            blob: file.blob,
        })
    }

    pub fn empty() -> Self {
        Self {
            offsets: Vec::new(),
            blob: Vec::new(),
        }
    }

    pub fn get(&self, docno: DocNo) -> Option<Result<StoredDocument>> {
        let (offset, len) = *self.offsets.get(docno.as_usize())?;
        let start = offset as usize;
        let end = start + len as usize;
        let slice = &self.blob[start..end];
        Some(bincode::deserialize(slice).map_err(Into::into))
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldOptions;

    #[test]
    fn test_stored_roundtrip() {
        let mut writer = StoredWriter::new();
        writer
            .add(&StoredDocument::new(vec![
                ("id".to_string(), FieldValue::I64(1)),
                ("title".to_string(), FieldValue::Text("first".to_string())),
            ]))
            .unwrap();
        writer
            .add(&StoredDocument::new(vec![(
                "title".to_string(),
                FieldValue::Text("second".to_string()),
            )]))
            .unwrap();

        let data = writer.serialize().unwrap();
        let reader = StoredReader::from_bytes(&data).unwrap();

        assert_eq!(reader.len(), 2);
        let doc0 = reader.get(DocNo(0)).unwrap().unwrap();
        assert_eq!(doc0.get_i64("id"), Some(1));
        assert_eq!(doc0.get_text("title"), Some("first"));

        let doc1 = reader.get(DocNo(1)).unwrap().unwrap();
        assert_eq!(doc1.get_text("title"), Some("second"));

        assert!(reader.get(DocNo(2)).is_none());
    }

    #[test]
    fn test_from_document_keeps_only_stored_fields() {
        let mut doc = Document::new();
        doc.add_text("title", "kept");
        doc.add_field(
            "body",
            FieldValue::Text("dropped".to_string()),
            FieldOptions::TEXT.not_stored(),
        );

        let stored = StoredDocument::from_document(&doc);
        assert_eq!(stored.fields().len(), 1);
        assert_eq!(stored.get_text("title"), Some("kept"));
        assert!(stored.get("body").is_none());
    }
}
