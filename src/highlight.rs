//! Match highlighting
//!
//! A presentation transform over already-ranked results: re-tokenizes a
//! stored field value, wraps every span whose token matches the query in
//! configurable markers, and can cut a bounded fragment around the first
//! match. Retrieval does not depend on this module.

use crate::error::Result;
use crate::query::{Query, TermMatcher};
use crate::tokenizer::TokenizerRef;

/// Default open marker.
pub const DEFAULT_OPEN: &str = "\u{3010}";
/// Default close marker.
pub const DEFAULT_CLOSE: &str = "\u{3011}";

/// Wraps matched spans of a stored field in markers
pub struct Highlighter {
    matchers: Vec<TermMatcher>,
    field: String,
    tokenizer: TokenizerRef,
    open: String,
    close: String,
}

impl Highlighter {
    /// Build a highlighter for one field of a query. The same tokenizer
    /// used at index time must be supplied, or spans will not line up.
    pub fn new(query: &dyn Query, field: impl Into<String>, tokenizer: TokenizerRef) -> Self {
        let field = field.into();
        let mut matchers = Vec::new();
        query.collect_matchers(&field, &mut matchers);
        Self {
            matchers,
            field,
            tokenizer,
            open: DEFAULT_OPEN.to_string(),
            close: DEFAULT_CLOSE.to_string(),
        }
    }

    /// Like [`Highlighter::new`], taking the markers from the index
    /// configuration.
    pub fn from_config(
        query: &dyn Query,
        field: impl Into<String>,
        tokenizer: TokenizerRef,
        config: &crate::config::IndexConfig,
    ) -> Self {
        let (open, close) = config.highlight_markers.clone();
        Self::new(query, field, tokenizer).with_markers(open, close)
    }

    pub fn with_markers(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open = open.into();
        self.close = close.into();
        self
    }

    /// Mark every matched span in the full text. Text without any match
    /// comes back unchanged.
    pub fn highlight(&self, text: &str) -> Result<String> {
        let spans = self.matched_spans(text)?;
        if spans.is_empty() {
            return Ok(text.to_string());
        }
        Ok(self.mark(text, &spans, 0, text.len()))
    }

    /// The first fragment of roughly `max_len` bytes containing a match,
    /// with its spans marked. Without a match, the plain text is returned
    /// whole.
    pub fn best_fragment(&self, text: &str, max_len: usize) -> Result<String> {
        let spans = self.matched_spans(text)?;
        let Some(&(first_start, _)) = spans.first() else {
            return Ok(text.to_string());
        };

        if text.len() <= max_len {
            return Ok(self.mark(text, &spans, 0, text.len()));
        }

        // Window around the first match, snapped to char boundaries
        let mut start = first_start.saturating_sub(max_len / 4);
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        Ok(self.mark(text, &spans, start, end))
    }

    /// Byte spans of tokens matched by the query, ascending.
    fn matched_spans(&self, text: &str) -> Result<Vec<(usize, usize)>> {
        if self.matchers.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.tokenizer.tokenize(&self.field, text)?;
        let mut spans = Vec::new();
        for token in tokens {
            if self.matchers.iter().any(|m| m.matches(&token.text)) {
                spans.push((token.start, token.end));
            }
        }
        Ok(spans)
    }

    fn mark(&self, text: &str, spans: &[(usize, usize)], from: usize, to: usize) -> String {
        let mut out = String::with_capacity(to - from + 16);
        let mut cursor = from;
        for &(start, end) in spans {
            if end <= from || start >= to {
                continue;
            }
            // Spans straddling the window edge are clipped to it
            let start = start.max(from);
            let end = end.min(to);
            out.push_str(&text[cursor..start]);
            out.push_str(&self.open);
            out.push_str(&text[start..end]);
            out.push_str(&self.close);
            cursor = end;
        }
        out.push_str(&text[cursor..to]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::query::{BooleanQuery, PrefixQuery, TermQuery, WildcardQuery};
    use crate::tokenizer::StandardTokenizer;
    use std::sync::Arc;

    fn tokenizer() -> TokenizerRef {
        Arc::new(StandardTokenizer::new(&TokenizerConfig::default()))
    }

    #[test]
    fn test_highlight_marks_matches() {
        let query = TermQuery::text("content", "rust");
        let h = Highlighter::new(&query, "content", tokenizer());

        let out = h.highlight("Rust is fast and Rust is safe").unwrap();
        assert_eq!(
            out,
            "\u{3010}Rust\u{3011} is fast and \u{3010}Rust\u{3011} is safe"
        );
    }

    #[test]
    fn test_highlight_custom_markers() {
        let query = TermQuery::text("content", "rust");
        let h = Highlighter::new(&query, "content", tokenizer()).with_markers("<em>", "</em>");

        let out = h.highlight("rust rocks").unwrap();
        assert_eq!(out, "<em>rust</em> rocks");
    }

    #[test]
    fn test_markers_from_config() {
        let config = crate::config::IndexConfig {
            highlight_markers: ("[".to_string(), "]".to_string()),
            ..Default::default()
        };
        let query = TermQuery::text("content", "rust");
        let h = Highlighter::from_config(&query, "content", tokenizer(), &config);
        assert_eq!(h.highlight("rust rocks").unwrap(), "[rust] rocks");
    }

    #[test]
    fn test_no_match_returns_text_unchanged() {
        let query = TermQuery::text("content", "absent");
        let h = Highlighter::new(&query, "content", tokenizer());

        let text = "nothing to see here";
        assert_eq!(h.highlight(text).unwrap(), text);
    }

    #[test]
    fn test_other_field_terms_do_not_highlight() {
        let query = TermQuery::text("title", "rust");
        let h = Highlighter::new(&query, "content", tokenizer());

        let text = "rust everywhere";
        assert_eq!(h.highlight(text).unwrap(), text);
    }

    #[test]
    fn test_wildcard_and_prefix_matchers() {
        let query = BooleanQuery::new()
            .should(PrefixQuery::new("content", "prog"))
            .should(WildcardQuery::new("content", "f?st"));
        let h = Highlighter::new(&query, "content", tokenizer());

        let out = h.highlight("fast programming").unwrap();
        assert_eq!(out, "\u{3010}fast\u{3011} \u{3010}programming\u{3011}");
    }

    #[test]
    fn test_best_fragment_windows_long_text() {
        let query = TermQuery::text("content", "needle");
        let h = Highlighter::new(&query, "content", tokenizer());

        let mut text = "filler ".repeat(50);
        text.push_str("the needle is here ");
        text.push_str(&"filler ".repeat(50));

        let fragment = h.best_fragment(&text, 80).unwrap();
        assert!(fragment.len() <= 80 + "\u{3010}\u{3011}".len());
        assert!(fragment.contains("\u{3010}needle\u{3011}"));
    }

    #[test]
    fn test_best_fragment_without_match_is_plain() {
        let query = TermQuery::text("content", "absent");
        let h = Highlighter::new(&query, "content", tokenizer());

        let text = "short text";
        assert_eq!(h.best_fragment(text, 5).unwrap(), text);
    }
}
