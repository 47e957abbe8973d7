//! Word → id vocabulary shipped alongside the trained model.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::HalalError;

/// Key reserved for out-of-vocabulary tokens when the artifact names none.
pub const DEFAULT_OOV_TOKEN: &str = "<OOV>";

/// Id used when neither the word nor the OOV token is present.
pub const FALLBACK_ID: u32 = 0;

const ASSET: &str = "vocabulary";

/// Immutable mapping from lowercase word to token id.
///
/// Lookups never fail. They resolve in three tiers: the word itself, then the
/// OOV token, then [`FALLBACK_ID`].
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    word_index: HashMap<String, u32>,
    oov_token: String,
}

/// Raw tokenizer document. Accepts both a flat `{"word_index": {...}}` dump and
/// the Keras `Tokenizer.to_json()` layout, where `word_index` sits under
/// `config` as a JSON-encoded string.
#[derive(Debug, Deserialize)]
struct TokenizerDocument {
    #[serde(default)]
    word_index: Option<Value>,
    #[serde(default)]
    oov_token: Option<String>,
    #[serde(default)]
    config: Option<TokenizerConfig>,
}

#[derive(Debug, Deserialize)]
struct TokenizerConfig {
    #[serde(default)]
    word_index: Option<Value>,
    #[serde(default)]
    oov_token: Option<String>,
}

impl VocabularyIndex {
    /// Create a vocabulary using the default `<OOV>` key.
    pub fn new(word_index: HashMap<String, u32>) -> Self {
        Self {
            word_index,
            oov_token: DEFAULT_OOV_TOKEN.to_string(),
        }
    }

    /// Use a different key for out-of-vocabulary lookups.
    pub fn with_oov_token(mut self, oov_token: impl Into<String>) -> Self {
        self.oov_token = oov_token.into();
        self
    }

    /// Parse a tokenizer JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, HalalError> {
        let document: TokenizerDocument =
            serde_json::from_str(json).map_err(|e| HalalError::asset(ASSET, e))?;

        let (raw_index, config_oov) = match document.config {
            Some(config) => (document.word_index.or(config.word_index), config.oov_token),
            None => (document.word_index, None),
        };

        let raw_index = raw_index
            .ok_or_else(|| HalalError::asset(ASSET, "tokenizer document has no word_index"))?;
        let word_index = parse_word_index(raw_index)?;

        let oov_token = document
            .oov_token
            .or(config_oov)
            .unwrap_or_else(|| DEFAULT_OOV_TOKEN.to_string());

        Ok(Self::new(word_index).with_oov_token(oov_token))
    }

    /// Read and parse a tokenizer JSON file.
    pub fn from_file(path: &Path) -> Result<Self, HalalError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HalalError::asset(ASSET, format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Resolve a token to its id.
    pub fn lookup(&self, word: &str) -> u32 {
        if let Some(&id) = self.word_index.get(word) {
            return id;
        }
        self.oov_id().unwrap_or(FALLBACK_ID)
    }

    /// Id of the OOV token, if the vocabulary has one.
    pub fn oov_id(&self) -> Option<u32> {
        self.word_index.get(&self.oov_token).copied()
    }

    pub fn oov_token(&self) -> &str {
        &self.oov_token
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_index.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.word_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_index.is_empty()
    }
}

fn parse_word_index(raw: Value) -> Result<HashMap<String, u32>, HalalError> {
    let parsed = match raw {
        Value::String(encoded) => serde_json::from_str::<HashMap<String, u32>>(&encoded),
        other => serde_json::from_value::<HashMap<String, u32>>(other),
    };
    parsed.map_err(|e| HalalError::asset(ASSET, format!("invalid word_index: {}", e)))
}
