//! Prefix query: all terms starting with a literal prefix

use roaring::RoaringBitmap;

use crate::document::dict_key;
use crate::error::Result;

use super::ast::{Query, TermMatcher};
use super::context::SegmentContext;

/// Matches every document containing a term with the given prefix
///
/// Evaluated as a bounded scan of the ordered term dictionary: start at the
/// first key >= the prefix, stop at the first key outside it, union the
/// postings of everything in between. Constant-scored.
#[derive(Clone, Debug)]
pub struct PrefixQuery {
    pub field: String,
    pub prefix: String,
}

impl PrefixQuery {
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prefix: prefix.into(),
        }
    }
}

impl Query for PrefixQuery {
    fn execute(&self, ctx: &SegmentContext<'_>) -> Result<RoaringBitmap> {
        let mut bitmap = RoaringBitmap::new();
        let reader = ctx.reader();
        let mut scan_error = None;

        reader
            .terms()
            .scan_prefix(&dict_key(&self.field, &self.prefix), |_, meta| {
                match reader.postings_for(meta) {
                    Ok(iter) => {
                        for posting in iter {
                            bitmap.insert(posting.docno.as_u32());
                        }
                        true
                    }
                    Err(e) => {
                        scan_error = Some(e);
                        false
                    }
                }
            });

        match scan_error {
            Some(e) => Err(e),
            None => Ok(bitmap),
        }
    }

    fn score(&self, _ctx: &SegmentContext<'_>, _docno: crate::segment::DocNo) -> Option<f32> {
        Some(1.0)
    }

    fn collect_matchers(&self, field: &str, out: &mut Vec<TermMatcher>) {
        if self.field == field {
            out.push(TermMatcher::Prefix(self.prefix.clone()));
        }
    }

    fn query_type(&self) -> &'static str {
        "prefix"
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_query_basics() {
        let query = PrefixQuery::new("content", "prog");
        assert_eq!(query.query_type(), "prefix");

        let mut out = Vec::new();
        query.collect_matchers("content", &mut out);
        assert_eq!(out, vec![TermMatcher::Prefix("prog".to_string())]);
    }
}
