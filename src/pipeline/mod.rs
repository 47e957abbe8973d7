//! Inference request pipeline: encode → score → classify → aggregate.
//!
//! [`Pipeline::predict`] is synchronous and holds no mutable state, so one
//! instance can serve concurrent requests once its vocabulary and model are
//! loaded. The model sees every ingredient of a request in a single batch.

pub mod encoder;
pub mod label;
pub mod scoring;
pub mod vocab;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::HalalError;

pub use encoder::{encode, EncodedSequence, MAX_LENGTH};
pub use label::{aggregate, classify, Label};
pub use scoring::{ScoringAdapter, ScoringModel};
pub use vocab::VocabularyIndex;

/// Classification of one ingredient, paired with the string as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientResult {
    pub ingredient: String,
    pub classification: Label,
}

/// Per-ingredient results in request order plus the aggregate label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub ingredients: Vec<IngredientResult>,
    pub overall_classification: Label,
}

/// Reject an empty ingredient list.
pub fn ensure_not_empty<S: AsRef<str>>(ingredients: &[S]) -> Result<(), HalalError> {
    if ingredients.is_empty() {
        return Err(HalalError::InvalidInput(
            "No ingredients provided".to_string(),
        ));
    }
    Ok(())
}

/// Vocabulary plus scoring model, ready to classify.
#[derive(Clone)]
pub struct Pipeline {
    vocabulary: Arc<VocabularyIndex>,
    scorer: ScoringAdapter,
}

impl Pipeline {
    pub fn new(vocabulary: Arc<VocabularyIndex>, scorer: ScoringAdapter) -> Self {
        Self { vocabulary, scorer }
    }

    /// Classify every ingredient and the request as a whole.
    ///
    /// Fails with [`HalalError::InvalidInput`] on an empty list and with
    /// [`HalalError::Scoring`] if the model fails; there are no partial results.
    pub fn predict<S: AsRef<str>>(
        &self,
        ingredients: &[S],
    ) -> Result<PredictionResponse, HalalError> {
        ensure_not_empty(ingredients)?;

        let sequences: Vec<EncodedSequence> = ingredients
            .iter()
            .map(|ingredient| encode(ingredient.as_ref(), &self.vocabulary))
            .collect();

        let scores = self.scorer.score(&sequences)?;

        let results: Vec<IngredientResult> = ingredients
            .iter()
            .zip(scores)
            .map(|(ingredient, score)| IngredientResult {
                ingredient: ingredient.as_ref().to_string(),
                classification: classify(score),
            })
            .collect();

        let overall_classification = aggregate(results.iter().map(|r| r.classification));

        debug!(
            ingredients = results.len(),
            overall = %overall_classification,
            "Classified request"
        );

        Ok(PredictionResponse {
            ingredients: results,
            overall_classification,
        })
    }

    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 0.9 when the first id is 5 ("gelatin"), 0.5 otherwise.
    struct GelatinStub {
        calls: AtomicUsize,
    }

    impl ScoringModel for GelatinStub {
        fn predict(&self, batch: &[EncodedSequence]) -> anyhow::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(batch
                .iter()
                .map(|seq| if seq.get(0) == Some(5) { 0.9 } else { 0.5 })
                .collect())
        }
    }

    /// Maps the first id straight to a score bucket.
    struct TableStub;

    impl ScoringModel for TableStub {
        fn predict(&self, batch: &[EncodedSequence]) -> anyhow::Result<Vec<f32>> {
            Ok(batch
                .iter()
                .map(|seq| match seq.get(0) {
                    Some(5) => 0.95,
                    Some(9) => 0.05,
                    _ => 0.5,
                })
                .collect())
        }
    }

    fn vocab() -> Arc<VocabularyIndex> {
        Arc::new(VocabularyIndex::new(
            [("gelatin", 5), ("sugar", 7), ("pork", 9), ("<OOV>", 1)]
                .into_iter()
                .map(|(w, id)| (w.to_string(), id))
                .collect(),
        ))
    }

    fn pipeline(model: Arc<dyn ScoringModel>) -> Pipeline {
        Pipeline::new(vocab(), ScoringAdapter::new(model))
    }

    #[test]
    fn test_predict_end_to_end_with_stub() {
        let p = pipeline(Arc::new(GelatinStub {
            calls: AtomicUsize::new(0),
        }));

        let response = p.predict(&["sugar", "gelatin"]).expect("predict");

        assert_eq!(
            response,
            PredictionResponse {
                ingredients: vec![
                    IngredientResult {
                        ingredient: "sugar".to_string(),
                        classification: Label::Doubtful,
                    },
                    IngredientResult {
                        ingredient: "gelatin".to_string(),
                        classification: Label::Halal,
                    },
                ],
                overall_classification: Label::Doubtful,
            }
        );
    }

    #[test]
    fn test_predict_empty_is_invalid_input() {
        let p = pipeline(Arc::new(TableStub));
        let empty: [&str; 0] = [];
        let err = p.predict(&empty).unwrap_err();
        assert!(matches!(err, HalalError::InvalidInput(_)));
    }

    #[test]
    fn test_predict_preserves_order_and_original_strings() {
        let p = pipeline(Arc::new(TableStub));
        let input = ["Pork Fat", "GELATIN", "sugar", "Pork"];

        let response = p.predict(&input).expect("predict");

        let names: Vec<&str> = response
            .ingredients
            .iter()
            .map(|r| r.ingredient.as_str())
            .collect();
        assert_eq!(names, input.to_vec());
        let labels: Vec<Label> = response
            .ingredients
            .iter()
            .map(|r| r.classification)
            .collect();
        assert_eq!(
            labels,
            vec![Label::Haram, Label::Halal, Label::Doubtful, Label::Haram]
        );
        assert_eq!(response.overall_classification, Label::Haram);
    }

    #[test]
    fn test_predict_scores_whole_request_in_one_call() {
        let stub = Arc::new(GelatinStub {
            calls: AtomicUsize::new(0),
        });
        let p = pipeline(stub.clone());

        p.predict(&["a", "b", "c", "d", "e"]).expect("predict");

        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_predict_keeps_empty_string_ingredients() {
        let p = pipeline(Arc::new(TableStub));
        let response = p.predict(&["", "gelatin"]).expect("predict");
        assert_eq!(response.ingredients.len(), 2);
        assert_eq!(response.ingredients[0].ingredient, "");
        assert_eq!(response.ingredients[0].classification, Label::Doubtful);
    }

    #[test]
    fn test_response_serializes_to_wire_shape() {
        let p = pipeline(Arc::new(TableStub));
        let response = p.predict(&["gelatin"]).expect("predict");
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "ingredients": [{"ingredient": "gelatin", "classification": "halal"}],
                "overall_classification": "halal"
            })
        );
    }
}
