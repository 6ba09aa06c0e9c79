//! Tokenization seam
//!
//! The engine never splits text itself; it hands raw field text to a
//! [`Tokenizer`] collaborator and folds the returned token stream into
//! postings. Language-specific implementations are swapped in without
//! changing the core.

mod standard;

pub use standard::StandardTokenizer;

use std::sync::Arc;

use crate::error::Result;

/// A single token produced by analysis
///
/// Offsets are byte positions into the original text, so a matched token can
/// be mapped back onto the raw field value (highlighting relies on this).
/// `position` counts token slots in the stream, including slots occupied by
/// filtered-out tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub position: u32,
}

/// Splits raw field text into a finite token sequence
///
/// Each call is independent and restartable. Failures surface as
/// `SearchError::Tokenization`; they are never swallowed.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, field: &str, text: &str) -> Result<Vec<Token>>;
}

/// Shared tokenizer handle
pub type TokenizerRef = Arc<dyn Tokenizer>;
