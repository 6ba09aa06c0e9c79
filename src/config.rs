use serde::{Deserialize, Serialize};

/// How the writer treats existing index data at open time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    /// Discard any existing segments and start fresh.
    Create,
    /// Append to an existing index, or create one if none exists.
    CreateOrAppend,
    /// Append to an existing index; fail if none exists.
    Append,
}

/// Index configuration
///
/// Every component receives its configuration explicitly at construction;
/// there is no process-wide shared state.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    pub mode: OpenMode,
    /// Fields searched when a query term carries no field prefix.
    pub default_search_fields: Vec<String>,
    /// Default number of hits returned by `search`.
    pub result_limit: usize,
    /// Markers wrapped around matched spans by the highlighter.
    pub highlight_markers: (String, String),
    pub tokenizer: TokenizerConfig,
    pub buffer: BufferConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            mode: OpenMode::CreateOrAppend,
            default_search_fields: vec!["title".to_string(), "content".to_string()],
            result_limit: 10,
            highlight_markers: ("\u{3010}".to_string(), "\u{3011}".to_string()),
            tokenizer: TokenizerConfig::default(),
            buffer: BufferConfig::default(),
        }
    }
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub language: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            max_token_length: 64,
            language: "english".to_string(),
        }
    }
}

/// Write buffer thresholds
#[derive(Clone, Debug)]
pub struct BufferConfig {
    /// Flush when buffered postings exceed this size (bytes).
    pub max_bytes: usize,
    /// Flush when buffered document count exceeds this.
    pub max_docs: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024 * 1024,
            max_docs: 50_000,
        }
    }
}
