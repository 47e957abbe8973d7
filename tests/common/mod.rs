//! Shared fixtures: a tiny trained-model artifact and its vocabulary.
//!
//! The model is Embedding(4x1) -> GlobalAveragePooling1D -> Dense(1->1, sigmoid)
//! with kernel 1 and bias 0. Embedding rows:
//!
//! | id | word    | value |
//! |----|---------|-------|
//! | 0  | padding | 0     |
//! | 1  | `<OOV>` | 0     |
//! | 2  | pork    | -100  |
//! | 3  | water   | +100  |
//!
//! Averaging over 50 positions gives a one-word score of sigmoid(±2): "water"
//! is halal (0.88), "pork" is haram (0.12), unknown words are doubtful (0.5).

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use halalapi::assets::{CachedAssetProvider, LocalSource};
use halalapi::pipeline::{EncodedSequence, ScoringModel, VocabularyIndex};

pub const SHARD_FILE: &str = "group1-shard1of1.bin";

pub fn model_json() -> String {
    json!({
        "format": "layers-model",
        "generatedBy": "keras v2.15.0",
        "convertedBy": "TensorFlow.js Converter v4.17.0",
        "modelTopology": {
            "class_name": "Sequential",
            "config": {"name": "sequential", "layers": [
                {"class_name": "InputLayer", "config": {"name": "input", "batch_input_shape": [null, 50]}},
                {"class_name": "Embedding", "config": {"name": "embedding", "input_dim": 4, "output_dim": 1}},
                {"class_name": "GlobalAveragePooling1D", "config": {"name": "pool"}},
                {"class_name": "Dense", "config": {"name": "dense", "units": 1, "activation": "sigmoid"}}
            ]}
        },
        "weightsManifest": [{
            "paths": [SHARD_FILE],
            "weights": [
                {"name": "embedding/embeddings", "shape": [4, 1], "dtype": "float32"},
                {"name": "dense/kernel", "shape": [1, 1], "dtype": "float32"},
                {"name": "dense/bias", "shape": [1], "dtype": "float32"}
            ]
        }]
    })
    .to_string()
}

pub fn shard_bytes() -> Vec<u8> {
    [0f32, 0.0, -100.0, 100.0, 1.0, 0.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

pub fn vocabulary_json() -> String {
    json!({"word_index": {"<OOV>": 1, "pork": 2, "water": 3}}).to_string()
}

/// Write `model.json`, its shard and `tokenizer.json` into `dir`.
/// Returns `(model_path, vocabulary_path)`.
pub fn write_assets(dir: &Path) -> (PathBuf, PathBuf) {
    let model_path = dir.join("model.json");
    let vocabulary_path = dir.join("tokenizer.json");
    std::fs::write(&model_path, model_json()).expect("write model.json");
    std::fs::write(dir.join(SHARD_FILE), shard_bytes()).expect("write shard");
    std::fs::write(&vocabulary_path, vocabulary_json()).expect("write tokenizer.json");
    (model_path, vocabulary_path)
}

/// Provider over the fixture assets written to `dir`.
pub fn local_provider(dir: &Path) -> Arc<CachedAssetProvider> {
    let (model_path, vocabulary_path) = write_assets(dir);
    Arc::new(CachedAssetProvider::new(Arc::new(LocalSource::new(
        model_path,
        vocabulary_path,
    ))))
}

/// Vocabulary used by the stub-model scenarios.
pub fn stub_vocabulary() -> Arc<VocabularyIndex> {
    let word_index = [("<OOV>", 1), ("gelatin", 2), ("cane", 3), ("sugar", 4)]
        .into_iter()
        .map(|(w, id)| (w.to_string(), id))
        .collect();
    Arc::new(VocabularyIndex::new(word_index))
}

/// Scores the i-th sequence of a batch with `self.0[i]`.
pub struct FixedScores(pub Vec<f32>);

impl ScoringModel for FixedScores {
    fn predict(&self, batch: &[EncodedSequence]) -> anyhow::Result<Vec<f32>> {
        Ok(self.0.iter().copied().take(batch.len()).collect())
    }
}
