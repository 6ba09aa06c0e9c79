//! Term query: exact match on one (field, token) pair

use roaring::RoaringBitmap;

use crate::document::Term;
use crate::error::Result;
use crate::segment::DocNo;

use super::ast::{Query, TermMatcher};
use super::context::SegmentContext;

/// Matches documents containing an exact term
///
/// The most basic query: one dictionary lookup, one posting list.
#[derive(Clone, Debug)]
pub struct TermQuery {
    term: Term,
    key: String,
}

impl TermQuery {
    pub fn new(term: Term) -> Self {
        let key = term.dict_key();
        Self { term, key }
    }

    pub fn text(field: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(Term::new(field, token))
    }

    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl Query for TermQuery {
    fn execute(&self, ctx: &SegmentContext<'_>) -> Result<RoaringBitmap> {
        let mut bitmap = RoaringBitmap::new();
        if let Some(iter) = ctx.reader().get_postings(&self.key)? {
            for posting in iter {
                bitmap.insert(posting.docno.as_u32());
            }
        }
        Ok(bitmap)
    }

    fn score(&self, ctx: &SegmentContext<'_>, docno: DocNo) -> Option<f32> {
        let doc_frequency = ctx.reader().doc_frequency(&self.key);
        if doc_frequency == 0 {
            return None;
        }

        let mut iter = ctx.reader().get_postings(&self.key).ok()??;
        let posting = iter.skip_to(docno)?;
        if posting.docno != docno {
            return None;
        }

        let doc_len = ctx.reader().doc_length(docno)?;
        let idf = ctx.stats().idf(doc_frequency);
        let tf = ctx
            .stats()
            .tf_score(posting.term_frequency, doc_len, ctx.params());
        Some(idf * tf)
    }

    fn collect_matchers(&self, field: &str, out: &mut Vec<TermMatcher>) {
        if self.term.field == field {
            out.push(TermMatcher::Exact(self.term.token.clone()));
        }
    }

    fn query_type(&self) -> &'static str {
        "term"
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query_matchers() {
        let query = TermQuery::text("title", "rust");
        let mut out = Vec::new();
        query.collect_matchers("title", &mut out);
        assert_eq!(out, vec![TermMatcher::Exact("rust".to_string())]);

        out.clear();
        query.collect_matchers("content", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_term_query_type() {
        let query = TermQuery::new(Term::from_i64("id", 3));
        assert_eq!(query.query_type(), "term");
        assert!(query.validate().is_ok());
    }
}
