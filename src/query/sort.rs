//! Explicit result ordering

/// Direction of one sort key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One field comparator
#[derive(Clone, Debug)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Explicit ordering that overrides the default ranking
///
/// Fields are compared in order; documents still tie after the last field
/// fall back to ascending document address. Fields used here must be
/// flagged `sortable` at index time.
#[derive(Clone, Debug)]
pub struct Sort {
    pub fields: Vec<SortField>,
}

impl Sort {
    pub fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    pub fn by(field: SortField) -> Self {
        Self {
            fields: vec![field],
        }
    }
}
