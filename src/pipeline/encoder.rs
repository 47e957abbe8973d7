//! Ingredient text → fixed-length id sequence.

use crate::pipeline::vocab::VocabularyIndex;

/// Number of ids fed to the model per ingredient.
pub const MAX_LENGTH: usize = 50;

/// Id used to right-pad short sequences.
pub const PAD_ID: u32 = 0;

/// Exactly [`MAX_LENGTH`] token ids for one ingredient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSequence([u32; MAX_LENGTH]);

impl EncodedSequence {
    pub fn ids(&self) -> &[u32] {
        &self.0
    }

    /// Id at `position`, or `None` past the end.
    pub fn get(&self, position: usize) -> Option<u32> {
        self.0.get(position).copied()
    }
}

impl From<[u32; MAX_LENGTH]> for EncodedSequence {
    fn from(ids: [u32; MAX_LENGTH]) -> Self {
        Self(ids)
    }
}

/// Lowercase the whole string. Nothing else is stripped or trimmed.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Split on single spaces. Consecutive spaces yield empty tokens, which are
/// looked up like any other word.
pub fn tokenize(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ')
}

/// Encode one ingredient, truncating past [`MAX_LENGTH`] tokens and padding
/// with [`PAD_ID`] below it.
pub fn encode(text: &str, vocab: &VocabularyIndex) -> EncodedSequence {
    let normalized = normalize(text);
    let mut ids = [PAD_ID; MAX_LENGTH];
    for (slot, token) in ids.iter_mut().zip(tokenize(&normalized)) {
        *slot = vocab.lookup(token);
    }
    EncodedSequence(ids)
}
