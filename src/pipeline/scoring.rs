//! Batch scoring against an injected model.

use std::sync::Arc;

use crate::pipeline::encoder::EncodedSequence;
use crate::HalalError;

/// A loaded model: one forward pass over a `[batch, MAX_LENGTH]` id matrix.
///
/// Output is treated as untyped: the adapter checks that it holds exactly one
/// value per row.
pub trait ScoringModel: Send + Sync {
    fn predict(&self, batch: &[EncodedSequence]) -> anyhow::Result<Vec<f32>>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "scoring model".to_string()
    }
}

/// Runs the whole request as a single batch and validates the output.
#[derive(Clone)]
pub struct ScoringAdapter {
    model: Arc<dyn ScoringModel>,
}

impl ScoringAdapter {
    pub fn new(model: Arc<dyn ScoringModel>) -> Self {
        Self { model }
    }

    /// Score every sequence with one model call. Returns one score per input,
    /// in input order.
    pub fn score(&self, sequences: &[EncodedSequence]) -> Result<Vec<f64>, HalalError> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self
            .model
            .predict(sequences)
            .map_err(|e| HalalError::Scoring(format!("{:#}", e)))?;

        if raw.len() != sequences.len() {
            return Err(HalalError::Scoring(format!(
                "{} returned {} scores for a batch of {}",
                self.model.describe(),
                raw.len(),
                sequences.len()
            )));
        }

        Ok(raw.into_iter().map(f64::from).collect())
    }
}
