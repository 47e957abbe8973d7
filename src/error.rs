use std::fmt::Display;

use thiserror::Error;

/// Error type for ingredient classification.
#[derive(Debug, Error)]
pub enum HalalError {
    /// The request carried no ingredients (or an unusable payload).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The vocabulary or the model could not be loaded or downloaded.
    #[error("Asset unavailable ({asset}): {message}")]
    AssetUnavailable { asset: String, message: String },

    /// The scoring model raised or returned malformed output.
    #[error("Scoring failed: {0}")]
    Scoring(String),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HalalError {
    /// Build an [`HalalError::AssetUnavailable`] for the named asset.
    pub fn asset(asset: impl Into<String>, err: impl Display) -> Self {
        HalalError::AssetUnavailable {
            asset: asset.into(),
            message: err.to_string(),
        }
    }
}
