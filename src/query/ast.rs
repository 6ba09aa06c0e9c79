//! Core query node trait

use std::fmt::Debug;
use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::error::Result;
use crate::segment::DocNo;

use super::context::SegmentContext;

/// Reference-counted query for sharing across threads
pub type QueryRef = Arc<dyn Query>;

/// A node in the query tree
///
/// `execute` produces the set of matching docnos within one segment;
/// `score` is consulted per matching document when the default ranking is
/// in effect. Structural problems (an empty boolean, for instance) are
/// reported by `validate` before any index access happens.
pub trait Query: Send + Sync + Debug {
    /// Matching docnos within the context's segment.
    fn execute(&self, ctx: &SegmentContext<'_>) -> Result<RoaringBitmap>;

    /// Score contribution for one matching document. `None` means the node
    /// does not score (filters) or the document does not match.
    fn score(&self, _ctx: &SegmentContext<'_>, _docno: DocNo) -> Option<f32> {
        None
    }

    /// Reject structurally invalid trees before evaluation.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Matchers for tokens of `field` this query could match; feeds the
    /// highlighter.
    fn collect_matchers(&self, _field: &str, _out: &mut Vec<TermMatcher>) {}

    /// Node kind name for debugging and logging
    fn query_type(&self) -> &'static str;

    fn clone_box(&self) -> Box<dyn Query>;
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Token predicate extracted from a query, used to mark highlight spans
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermMatcher {
    Exact(String),
    Prefix(String),
    /// Wildcard pattern with `*` and `?`
    Pattern(String),
}

impl TermMatcher {
    pub fn matches(&self, token: &str) -> bool {
        match self {
            TermMatcher::Exact(t) => token == t,
            TermMatcher::Prefix(p) => token.starts_with(p.as_str()),
            TermMatcher::Pattern(p) => wildcard_match(p, token),
        }
    }
}

/// Glob-style match: `*` is zero-or-more chars, `?` exactly one.
pub(crate) fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    // Iterative backtracking over the last `*`
    let (mut pi, mut ti) = (0usize, 0usize);
    let (mut star, mut star_ti) = (None::<usize>, 0usize);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("prog*", "programming"));
        assert!(wildcard_match("prog*", "prog"));
        assert!(!wildcard_match("prog*", "aprog"));
        assert!(wildcard_match("*K*", "\u{6caa}K123"));
        assert!(wildcard_match("te?t", "test"));
        assert!(!wildcard_match("te?t", "teest"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("?", ""));
    }

    #[test]
    fn test_term_matcher() {
        assert!(TermMatcher::Exact("rust".into()).matches("rust"));
        assert!(!TermMatcher::Exact("rust".into()).matches("rusty"));
        assert!(TermMatcher::Prefix("ru".into()).matches("rusty"));
        assert!(TermMatcher::Pattern("r?st".into()).matches("rust"));
    }
}
