//! Columnar sort values
//!
//! Fields flagged `sortable` get one column per segment, indexed by docno.
//! The searcher consults these columns when an explicit sort overrides the
//! default ranking.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::FieldValue;

use super::types::DocNo;

/// A single comparable sort key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SortValue {
    Str(String),
    I64(i64),
    F64(f64),
}

impl SortValue {
    pub fn from_field_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) | FieldValue::Str(s) => SortValue::Str(s.clone()),
            FieldValue::I64(v) => SortValue::I64(*v),
            FieldValue::F64(v) => SortValue::F64(*v),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::I64(_) => 0,
            SortValue::F64(_) => 1,
            SortValue::Str(_) => 2,
        }
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Str(a), SortValue::Str(b)) => a.cmp(b),
            (SortValue::I64(a), SortValue::I64(b)) => a.cmp(b),
            (SortValue::F64(a), SortValue::F64(b)) => a.total_cmp(b),
            // Mixed-type columns should not occur; order by kind for stability
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// One column of sort values, indexed by docno
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SortColumn {
    values: Vec<Option<SortValue>>,
}

impl SortColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Option<SortValue>) {
        self.values.push(value);
    }

    pub fn get(&self, docno: DocNo) -> Option<&SortValue> {
        self.values.get(docno.as_usize()).and_then(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All sort columns of one segment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocValues {
    columns: BTreeMap<String, SortColumn>,
}

impl DocValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str, docno: DocNo) -> Option<&SortValue> {
        self.columns.get(field).and_then(|c| c.get(docno))
    }

    pub fn column(&self, field: &str) -> Option<&SortColumn> {
        self.columns.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    pub fn insert_column(&mut self, field: String, column: SortColumn) {
        self.columns.insert(field, column);
    }
}

/// Accumulates (docno, field, value) triples and pads columns to doc_count
#[derive(Clone, Debug, Default)]
pub struct DocValuesBuilder {
    cells: BTreeMap<String, BTreeMap<u32, SortValue>>,
}

impl DocValuesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, docno: DocNo, field: &str, value: SortValue) {
        self.cells
            .entry(field.to_string())
            .or_default()
            .insert(docno.as_u32(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn build(self, doc_count: u32) -> DocValues {
        let mut docvalues = DocValues::new();
        for (field, mut cells) in self.cells {
            let mut column = SortColumn::new();
            for docno in 0..doc_count {
                column.push(cells.remove(&docno));
            }
            docvalues.insert_column(field, column);
        }
        docvalues
    }

    /// Build, keeping only docnos accepted by the filter and renumbering them
    /// densely in the order given. Used when deleted documents are dropped at
    /// segment write time.
    pub fn build_remapped(self, keep: &[DocNo]) -> DocValues {
        let mut docvalues = DocValues::new();
        for (field, cells) in self.cells {
            let mut column = SortColumn::new();
            for old in keep {
                column.push(cells.get(&old.as_u32()).cloned());
            }
            docvalues.insert_column(field, column);
        }
        docvalues
    }
}
