//! Boolean query: MUST / SHOULD / MUST_NOT / FILTER clause combination

use roaring::RoaringBitmap;

use crate::error::{Result, SearchError};
use crate::segment::DocNo;

use super::ast::{Query, TermMatcher};
use super::context::SegmentContext;

/// Clause inclusion semantics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occur {
    /// Document must appear in the clause's match set; contributes to score.
    Must,
    /// Forms the match set when no Must/Filter clause exists; otherwise
    /// contributes to score only.
    Should,
    /// Document must be absent from the clause's match set.
    MustNot,
    /// Like Must, but contributes no score.
    Filter,
}

/// One clause of a boolean query
#[derive(Clone, Debug)]
pub struct BooleanClause {
    pub query: Box<dyn Query>,
    pub occur: Occur,
}

/// Combines subqueries under MUST / SHOULD / MUST_NOT / FILTER semantics
///
/// A boolean query with zero clauses is invalid and rejected before
/// evaluation. A query with only MUST_NOT clauses matches nothing.
#[derive(Clone, Debug, Default)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, query: impl Query + 'static, occur: Occur) -> Self {
        self.clauses.push(BooleanClause {
            query: Box::new(query),
            occur,
        });
        self
    }

    pub fn add_boxed(mut self, query: Box<dyn Query>, occur: Occur) -> Self {
        self.clauses.push(BooleanClause { query, occur });
        self
    }

    pub fn must(self, query: impl Query + 'static) -> Self {
        self.add(query, Occur::Must)
    }

    pub fn should(self, query: impl Query + 'static) -> Self {
        self.add(query, Occur::Should)
    }

    pub fn must_not(self, query: impl Query + 'static) -> Self {
        self.add(query, Occur::MustNot)
    }

    pub fn filter(self, query: impl Query + 'static) -> Self {
        self.add(query, Occur::Filter)
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    fn clauses_with(&self, occur: Occur) -> impl Iterator<Item = &BooleanClause> {
        self.clauses.iter().filter(move |c| c.occur == occur)
    }

    fn has_positive(&self) -> bool {
        self.clauses
            .iter()
            .any(|c| matches!(c.occur, Occur::Must | Occur::Filter))
    }
}

impl Query for BooleanQuery {
    fn execute(&self, ctx: &SegmentContext<'_>) -> Result<RoaringBitmap> {
        let mut result: Option<RoaringBitmap> = None;

        // Filters first, then musts: both intersect
        for clause in self
            .clauses_with(Occur::Filter)
            .chain(self.clauses_with(Occur::Must))
        {
            let matches = clause.query.execute(ctx)?;
            result = Some(match result {
                Some(r) => r & matches,
                None => matches,
            });
            if let Some(ref r) = result {
                if r.is_empty() {
                    return Ok(RoaringBitmap::new());
                }
            }
        }

        // Should clauses define the match set only without Must/Filter;
        // otherwise they are score-only
        if !self.has_positive() {
            let mut should_matches = RoaringBitmap::new();
            let mut any_should = false;
            for clause in self.clauses_with(Occur::Should) {
                any_should = true;
                should_matches |= clause.query.execute(ctx)?;
            }
            if any_should {
                result = Some(should_matches);
            }
        }

        // A purely negative query matches nothing
        let mut final_result = result.unwrap_or_default();

        for clause in self.clauses_with(Occur::MustNot) {
            if final_result.is_empty() {
                break;
            }
            final_result -= clause.query.execute(ctx)?;
        }

        Ok(final_result)
    }

    fn score(&self, ctx: &SegmentContext<'_>, docno: DocNo) -> Option<f32> {
        let mut total = 0.0f32;
        let mut scored = false;

        for clause in self.clauses.iter() {
            if matches!(clause.occur, Occur::Must | Occur::Should) {
                if let Some(score) = clause.query.score(ctx, docno) {
                    total += score;
                    scored = true;
                }
            }
        }

        if scored {
            Some(total)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<()> {
        if self.clauses.is_empty() {
            return Err(SearchError::Query(
                "boolean query has no clauses".to_string(),
            ));
        }
        for clause in &self.clauses {
            clause.query.validate()?;
        }
        Ok(())
    }

    fn collect_matchers(&self, field: &str, out: &mut Vec<TermMatcher>) {
        for clause in &self.clauses {
            if clause.occur != Occur::MustNot {
                clause.query.collect_matchers(field, out);
            }
        }
    }

    fn query_type(&self) -> &'static str {
        "boolean"
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }
}
