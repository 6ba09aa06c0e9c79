//! Wildcard query: `*` matches any run of characters, `?` exactly one

use regex::Regex;
use roaring::RoaringBitmap;

use crate::document::dict_key;
use crate::error::{Result, SearchError};

use super::ast::{Query, TermMatcher};
use super::context::SegmentContext;

/// How many dictionary entries to test between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Matches documents containing any term that fits a wildcard pattern
///
/// The pattern is compiled to an anchored regex and tested against every
/// term of the target field. When the pattern starts with literal
/// characters, the scan is narrowed to that prefix range of the dictionary.
/// A scan that outlives the search deadline stops early and flags the
/// result as truncated instead of failing.
#[derive(Clone, Debug)]
pub struct WildcardQuery {
    pub field: String,
    pub pattern: String,
}

impl WildcardQuery {
    pub fn new(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn has_wildcards(&self) -> bool {
        self.pattern.contains('*') || self.pattern.contains('?')
    }

    /// Longest literal prefix before the first wildcard character.
    pub fn literal_prefix(&self) -> &str {
        let end = self
            .pattern
            .find(['*', '?'])
            .unwrap_or(self.pattern.len());
        &self.pattern[..end]
    }

    fn compile(&self) -> Result<Regex> {
        let mut regex_pattern = String::with_capacity(self.pattern.len() + 8);
        regex_pattern.push('^');
        for ch in self.pattern.chars() {
            match ch {
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\' => {
                    regex_pattern.push('\\');
                    regex_pattern.push(ch);
                }
                _ => regex_pattern.push(ch),
            }
        }
        regex_pattern.push('$');

        Regex::new(&regex_pattern)
            .map_err(|e| SearchError::Query(format!("invalid wildcard pattern: {}", e)))
    }
}

impl Query for WildcardQuery {
    fn execute(&self, ctx: &SegmentContext<'_>) -> Result<RoaringBitmap> {
        let reader = ctx.reader();
        let mut bitmap = RoaringBitmap::new();

        // A pattern without wildcards degenerates to an exact term lookup
        if !self.has_wildcards() {
            if let Some(iter) = reader.get_postings(&dict_key(&self.field, &self.pattern))? {
                for posting in iter {
                    bitmap.insert(posting.docno.as_u32());
                }
            }
            return Ok(bitmap);
        }

        let regex = self.compile()?;
        let scan_key = dict_key(&self.field, self.literal_prefix());
        let token_start = self.field.len() + 1;

        let mut tested = 0usize;
        let mut scan_error = None;
        let completed = reader.terms().scan_prefix(&scan_key, |key, meta| {
            tested += 1;
            if tested % DEADLINE_CHECK_INTERVAL == 0 && ctx.deadline_exceeded() {
                return false;
            }

            let token = &key[token_start..];
            if regex.is_match(token) {
                match reader.postings_for(meta) {
                    Ok(iter) => {
                        for posting in iter {
                            bitmap.insert(posting.docno.as_u32());
                        }
                    }
                    Err(e) => {
                        scan_error = Some(e);
                        return false;
                    }
                }
            }
            true
        });

        if let Some(e) = scan_error {
            return Err(e);
        }
        if !completed {
            ctx.mark_truncated();
        }
        Ok(bitmap)
    }

    fn score(&self, _ctx: &SegmentContext<'_>, _docno: crate::segment::DocNo) -> Option<f32> {
        Some(1.0)
    }

    fn collect_matchers(&self, field: &str, out: &mut Vec<TermMatcher>) {
        if self.field == field {
            out.push(TermMatcher::Pattern(self.pattern.clone()));
        }
    }

    fn query_type(&self) -> &'static str {
        "wildcard"
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_prefix() {
        assert_eq!(WildcardQuery::new("t", "prog*").literal_prefix(), "prog");
        assert_eq!(WildcardQuery::new("t", "*suffix").literal_prefix(), "");
        assert_eq!(WildcardQuery::new("t", "pre?fix*").literal_prefix(), "pre");
        assert_eq!(WildcardQuery::new("t", "plain").literal_prefix(), "plain");
    }

    #[test]
    fn test_compile_pattern() {
        let query = WildcardQuery::new("t", "prog*");
        let regex = query.compile().unwrap();
        assert!(regex.is_match("programming"));
        assert!(regex.is_match("prog"));
        assert!(!regex.is_match("aprog"));

        let query = WildcardQuery::new("t", "te?t");
        let regex = query.compile().unwrap();
        assert!(regex.is_match("test"));
        assert!(!regex.is_match("teest"));

        // Regex metacharacters in the pattern are literals
        let query = WildcardQuery::new("t", "a.b*");
        let regex = query.compile().unwrap();
        assert!(regex.is_match("a.bc"));
        assert!(!regex.is_match("axbc"));
    }

    #[test]
    fn test_has_wildcards() {
        assert!(WildcardQuery::new("t", "*K*").has_wildcards());
        assert!(!WildcardQuery::new("t", "plain").has_wildcards());
    }
}
