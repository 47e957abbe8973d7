//! Prediction service: validates a request, awaits the shared assets and runs
//! the pipeline off the async runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::assets::AssetProvider;
use crate::pipeline::{ensure_not_empty, Pipeline, PredictionResponse, ScoringAdapter};
use crate::HalalError;

/// Service trait for ingredient classification.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Classify every ingredient and the request as a whole.
    ///
    /// An empty list fails with [`HalalError::InvalidInput`] before any asset
    /// is touched.
    async fn predict(&self, ingredients: Vec<String>) -> Result<PredictionResponse, HalalError>;

    /// Whether the vocabulary and model are loaded.
    fn is_ready(&self) -> bool;
}

/// [`PredictionService`] backed by an injected [`AssetProvider`].
pub struct AssetBackedPredictionService {
    assets: Arc<dyn AssetProvider>,
}

impl AssetBackedPredictionService {
    pub fn new(assets: Arc<dyn AssetProvider>) -> Self {
        Self { assets }
    }

    /// Build a pipeline from the shared assets, loading them on first use.
    pub async fn pipeline(&self) -> Result<Pipeline, HalalError> {
        let (vocabulary, model) = futures::try_join!(self.assets.vocabulary(), self.assets.model())?;
        Ok(Pipeline::new(vocabulary, ScoringAdapter::new(model)))
    }
}

#[async_trait]
impl PredictionService for AssetBackedPredictionService {
    async fn predict(&self, ingredients: Vec<String>) -> Result<PredictionResponse, HalalError> {
        ensure_not_empty(&ingredients)?;

        let pipeline = self.pipeline().await?;

        // The forward pass is CPU-bound.
        tokio::task::spawn_blocking(move || pipeline.predict(&ingredients))
            .await
            .map_err(|e| HalalError::Scoring(format!("Task join error: {}", e)))?
    }

    fn is_ready(&self) -> bool {
        self.assets.is_ready()
    }
}
