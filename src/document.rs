//! Documents, fields, and terms
//!
//! A document is an ordered set of named fields. Each field carries a tagged
//! value and a set of flags deciding how the index writer treats it:
//! tokenized text, untokenized keyword, stored-only, sortable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field value with an explicit kind tag
///
/// The writer dispatches on the kind when deciding tokenization and storage
/// encoding: `Text` goes through the tokenizer, `Str` is indexed as a single
/// keyword term, numerics are indexed as order-preserving encoded terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Str(String),
    I64(i64),
    F64(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::I64(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Per-field indexing flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptions {
    pub indexed: bool,
    pub stored: bool,
    pub tokenized: bool,
    pub sortable: bool,
}

impl FieldOptions {
    /// Indexed, tokenized, stored. Full-text body fields.
    pub const TEXT: FieldOptions = FieldOptions {
        indexed: true,
        stored: true,
        tokenized: true,
        sortable: false,
    };

    /// Indexed as a single term, stored. Identifiers and exact-match keys.
    pub const STRING: FieldOptions = FieldOptions {
        indexed: true,
        stored: true,
        tokenized: false,
        sortable: false,
    };

    /// Stored only, never indexed.
    pub const STORED: FieldOptions = FieldOptions {
        indexed: false,
        stored: true,
        tokenized: false,
        sortable: false,
    };

    /// Mark the field as sortable; its value lands in the sort columns.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Drop the stored flag.
    pub fn not_stored(mut self) -> Self {
        self.stored = false;
        self
    }
}

/// A named, flagged field of a document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub options: FieldOptions,
}

/// Document: ordered set of named fields
///
/// Constructed by the caller, consumed by the index writer at add-time.
/// Identity is assigned at write time as a (segment, doc) address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        value: FieldValue,
        options: FieldOptions,
    ) -> &mut Self {
        self.fields.push(Field {
            name: name.into(),
            value,
            options,
        });
        self
    }

    /// Add a tokenized full-text field (indexed, stored).
    pub fn add_text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.add_field(name, FieldValue::Text(value.into()), FieldOptions::TEXT)
    }

    /// Add an untokenized keyword field (indexed as one term, stored).
    pub fn add_str(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.add_field(name, FieldValue::Str(value.into()), FieldOptions::STRING)
    }

    pub fn add_i64(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.add_field(name, FieldValue::I64(value), FieldOptions::STRING)
    }

    pub fn add_f64(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.add_field(name, FieldValue::F64(value), FieldOptions::STRING)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First field with the given name, if any.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// A (field, token) pair: the atomic unit of the inverted index
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub token: String,
}

impl Term {
    /// Term over a raw token. The token is matched exactly against the
    /// dictionary; no analysis is applied.
    pub fn new(field: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            token: token.into(),
        }
    }

    /// Term matching an integer field value.
    pub fn from_i64(field: impl Into<String>, value: i64) -> Self {
        Self::new(field, encode_i64(value))
    }

    /// Term matching a float field value.
    pub fn from_f64(field: impl Into<String>, value: f64) -> Self {
        Self::new(field, encode_f64(value))
    }

    /// Dictionary key: field and token joined by a NUL separator so that
    /// all terms of one field form a contiguous, lexicographically ordered
    /// key range.
    pub fn dict_key(&self) -> String {
        dict_key(&self.field, &self.token)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.token)
    }
}

/// Build a dictionary key from a field name and token.
pub fn dict_key(field: &str, token: &str) -> String {
    let mut key = String::with_capacity(field.len() + 1 + token.len());
    key.push_str(field);
    key.push('\u{0}');
    key.push_str(token);
    key
}

/// Encode an i64 as a fixed-width hex token whose lexicographic order equals
/// numeric order. The sign bit is flipped so negatives sort before positives.
pub fn encode_i64(value: i64) -> String {
    format!("{:016x}", (value as u64) ^ (1u64 << 63))
}

/// Encode an f64 as a fixed-width hex token with the same ordering property.
/// Positive floats get the sign bit set; negative floats are bit-inverted.
pub fn encode_f64(value: f64) -> String {
    let bits = value.to_bits();
    let ordered = if bits & (1u64 << 63) != 0 {
        !bits
    } else {
        bits | (1u64 << 63)
    };
    format!("{:016x}", ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let mut doc = Document::new();
        doc.add_i64("id", 7)
            .add_text("title", "Standard Analyzer")
            .add_text("content", "a body of text");

        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("id"), Some(&FieldValue::I64(7)));
        assert_eq!(
            doc.get("title").and_then(|v| v.as_text()),
            Some("Standard Analyzer")
        );
        assert!(doc.get("missing").is_none());
    }

    #[test]
    fn test_field_option_presets() {
        assert!(FieldOptions::TEXT.tokenized);
        assert!(!FieldOptions::STRING.tokenized);
        assert!(FieldOptions::STRING.indexed);
        assert!(!FieldOptions::STORED.indexed);
        assert!(FieldOptions::STRING.sortable().sortable);
        assert!(!FieldOptions::TEXT.not_stored().stored);
    }

    #[test]
    fn test_i64_encoding_preserves_order() {
        let values = [i64::MIN, -100, -1, 0, 1, 42, i64::MAX];
        let encoded: Vec<String> = values.iter().map(|&v| encode_i64(v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn test_f64_encoding_preserves_order() {
        let values = [-1e10, -2.5, -0.0, 0.0, 0.25, 3.14, 1e10];
        let encoded: Vec<String> = values.iter().map(|&v| encode_f64(v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn test_term_dict_key() {
        let term = Term::new("title", "rust");
        assert_eq!(term.dict_key(), "title\u{0}rust");
        assert_eq!(term.to_string(), "title:rust");

        // Field ranges do not bleed into each other: "title" keys sort
        // strictly before "titles" keys because NUL sorts below any letter.
        assert!(dict_key("title", "zzz") < dict_key("titles", "aaa"));
    }
}
