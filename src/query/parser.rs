//! Recursive descent parser for query expressions
//!
//! # Grammar
//!
//! ```text
//! query    := or_expr
//! or_expr  := and_expr (OR and_expr)*
//! and_expr := clause (AND? clause)*
//! clause   := (NOT | '-' | '+')? primary
//! primary  := grouped | field_query | phrase | term
//! grouped  := '(' or_expr ')'
//! field_query := TERM ':' (term | phrase)
//! ```
//!
//! Adjacent clauses without an explicit operator combine as SHOULD; an
//! explicit `AND` promotes both operands to MUST. A bare term with no field
//! prefix expands to one SHOULD clause per configured default field, with
//! the same keyword against each. Keywords are analyzed with the same
//! tokenizer used at index time; terms carrying `*` or `?` become wildcard
//! queries (a single trailing `*` becomes a prefix query). Malformed input
//! is rejected before any index access.

use crate::error::{Result, SearchError};
use crate::tokenizer::TokenizerRef;

use super::ast::Query;
use super::boolean::{BooleanQuery, Occur};
use super::lexer::{Lexer, Token};
use super::prefix::PrefixQuery;
use super::term::TermQuery;
use super::wildcard::WildcardQuery;

/// Builds query trees from `field:term` expressions
pub struct QueryParser {
    default_fields: Vec<String>,
    tokenizer: TokenizerRef,
}

impl QueryParser {
    pub fn new(default_fields: Vec<String>, tokenizer: TokenizerRef) -> Self {
        Self {
            default_fields,
            tokenizer,
        }
    }

    /// Parse an expression into a query tree.
    pub fn parse(&self, input: &str) -> Result<Box<dyn Query>> {
        if input.trim().is_empty() {
            return Err(SearchError::Query("empty query".to_string()));
        }

        let mut state = ParserState::new(input)?;
        let query = self.parse_or_expr(&mut state)?;

        if state.current != Token::Eof {
            return Err(SearchError::Query(format!(
                "unexpected token after query: {:?}",
                state.current
            )));
        }

        query.validate()?;
        Ok(query)
    }

    fn parse_or_expr(&self, state: &mut ParserState) -> Result<Box<dyn Query>> {
        let mut groups = vec![self.parse_and_expr(state)?];

        while state.current == Token::Or {
            state.advance()?;
            groups.push(self.parse_and_expr(state)?);
        }

        if groups.len() == 1 {
            return Ok(groups.pop().expect("non-empty"));
        }

        let mut query = BooleanQuery::new();
        for group in groups {
            query = query.add_boxed(group, Occur::Should);
        }
        Ok(Box::new(query))
    }

    fn parse_and_expr(&self, state: &mut ParserState) -> Result<Box<dyn Query>> {
        let mut clauses = vec![self.parse_clause(state)?];

        loop {
            match &state.current {
                Token::And => {
                    state.advance()?;
                    // AND binds its operands as required clauses
                    if let Some(last) = clauses.last_mut() {
                        if last.1 == Occur::Should {
                            last.1 = Occur::Must;
                        }
                    }
                    let (query, occur) = self.parse_clause(state)?;
                    let occur = if occur == Occur::Should {
                        Occur::Must
                    } else {
                        occur
                    };
                    clauses.push((query, occur));
                }
                token if Self::starts_clause(token) => {
                    clauses.push(self.parse_clause(state)?);
                }
                _ => break,
            }
        }

        if clauses.len() == 1 && matches!(clauses[0].1, Occur::Should | Occur::Must) {
            return Ok(clauses.pop().expect("non-empty").0);
        }

        let mut query = BooleanQuery::new();
        for (subquery, occur) in clauses {
            query = query.add_boxed(subquery, occur);
        }
        Ok(Box::new(query))
    }

    fn parse_clause(&self, state: &mut ParserState) -> Result<(Box<dyn Query>, Occur)> {
        let occur = match state.current {
            Token::Not | Token::Minus => {
                state.advance()?;
                Occur::MustNot
            }
            Token::Plus => {
                state.advance()?;
                Occur::Must
            }
            _ => Occur::Should,
        };

        Ok((self.parse_primary(state)?, occur))
    }

    fn parse_primary(&self, state: &mut ParserState) -> Result<Box<dyn Query>> {
        match state.current.clone() {
            Token::LeftParen => {
                state.advance()?;
                let query = self.parse_or_expr(state)?;
                if state.current != Token::RightParen {
                    return Err(SearchError::Query("unbalanced parentheses".to_string()));
                }
                state.advance()?;
                Ok(query)
            }
            Token::Phrase(phrase) => {
                state.advance()?;
                self.multi_field(|field| self.phrase_query(field, &phrase))
            }
            Token::Term(term) => {
                state.advance()?;
                if state.current == Token::Colon {
                    state.advance()?;
                    self.parse_field_value(state, &term)
                } else {
                    self.multi_field(|field| self.keyword_query(field, &term))
                }
            }
            Token::Eof => Err(SearchError::Query("unexpected end of query".to_string())),
            other => Err(SearchError::Query(format!(
                "unexpected token: {:?}",
                other
            ))),
        }
    }

    fn parse_field_value(&self, state: &mut ParserState, field: &str) -> Result<Box<dyn Query>> {
        match state.current.clone() {
            Token::Term(value) => {
                state.advance()?;
                self.keyword_query(field, &value)
            }
            Token::Phrase(phrase) => {
                state.advance()?;
                self.phrase_query(field, &phrase)
            }
            _ => Err(SearchError::Query(format!(
                "expected keyword after '{}:'",
                field
            ))),
        }
    }

    /// Expand one keyword across all default fields as SHOULD clauses.
    fn multi_field<F>(&self, build: F) -> Result<Box<dyn Query>>
    where
        F: Fn(&str) -> Result<Box<dyn Query>>,
    {
        if self.default_fields.is_empty() {
            return Err(SearchError::Query(
                "no default search fields configured".to_string(),
            ));
        }
        if self.default_fields.len() == 1 {
            return build(&self.default_fields[0]);
        }

        let mut query = BooleanQuery::new();
        for field in &self.default_fields {
            query = query.add_boxed(build(field)?, Occur::Should);
        }
        Ok(Box::new(query))
    }

    /// One keyword against one field: wildcard, prefix, or analyzed terms.
    fn keyword_query(&self, field: &str, raw: &str) -> Result<Box<dyn Query>> {
        if raw.contains('*') || raw.contains('?') {
            // A single trailing star is the cheaper dictionary range scan
            if let Some(inner) = raw.strip_suffix('*') {
                if !inner.is_empty() && !inner.contains('*') && !inner.contains('?') {
                    return Ok(Box::new(PrefixQuery::new(field, inner)));
                }
            }
            return Ok(Box::new(WildcardQuery::new(field, raw)));
        }

        let tokens = self.tokenizer.tokenize(field, raw)?;
        match tokens.len() {
            0 => Err(SearchError::Query(format!(
                "keyword '{}' produced no searchable terms",
                raw
            ))),
            1 => Ok(Box::new(TermQuery::text(field, tokens[0].text.clone()))),
            _ => {
                let mut query = BooleanQuery::new();
                for token in tokens {
                    query = query.must(TermQuery::text(field, token.text));
                }
                Ok(Box::new(query))
            }
        }
    }

    /// Quoted phrases require every analyzed term.
    fn phrase_query(&self, field: &str, phrase: &str) -> Result<Box<dyn Query>> {
        let tokens = self.tokenizer.tokenize(field, phrase)?;
        match tokens.len() {
            0 => Err(SearchError::Query("empty phrase".to_string())),
            1 => Ok(Box::new(TermQuery::text(field, tokens[0].text.clone()))),
            _ => {
                let mut query = BooleanQuery::new();
                for token in tokens {
                    query = query.must(TermQuery::text(field, token.text));
                }
                Ok(Box::new(query))
            }
        }
    }

    fn starts_clause(token: &Token) -> bool {
        matches!(
            token,
            Token::Term(_)
                | Token::Phrase(_)
                | Token::LeftParen
                | Token::Not
                | Token::Plus
                | Token::Minus
        )
    }
}

struct ParserState {
    lexer: Lexer,
    current: Token,
}

impl ParserState {
    fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }
}
