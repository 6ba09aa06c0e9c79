use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use super::{Token, Tokenizer};
use crate::config::TokenizerConfig;
use crate::error::Result;

/// Unicode word tokenizer with optional stemming and stopword removal
pub struct StandardTokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl StandardTokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, _field: &str, text: &str) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut position = 0u32;

        for (start, word) in text.unicode_word_indices() {
            let end = start + word.len();

            let mut token = word.to_string();
            if self.config.lowercase {
                token = token.to_lowercase();
            }

            // Filtered tokens still occupy a position slot.
            if token.len() < self.config.min_token_length
                || token.len() > self.config.max_token_length
            {
                position += 1;
                continue;
            }

            if self.stopwords.contains(&token) {
                position += 1;
                continue;
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token).to_string();
            }

            tokens.push(Token {
                text: token,
                start,
                end,
                position,
            });
            position += 1;
        }

        Ok(tokens)
    }
}
