//! Shared initialization logic for the server and CLI commands.

use std::sync::Arc;

use anyhow::Result;

use crate::assets::{create_asset_provider, CachedAssetProvider};
use crate::config::AppConfig;
use crate::services::{AssetBackedPredictionService, PredictionService};

/// Application context holding configuration, assets and services.
pub struct AppContext {
    pub config: AppConfig,
    pub assets: Arc<CachedAssetProvider>,
    pub predictor: Arc<dyn PredictionService>,
}

impl AppContext {
    /// Wire up the asset provider and prediction service.
    ///
    /// Nothing is loaded here; call [`AppContext::preload`] or let the first
    /// request trigger it.
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Using {} assets", config.assets.source_name());

        let assets = Arc::new(create_asset_provider(&config.assets)?);
        let predictor: Arc<dyn PredictionService> =
            Arc::new(AssetBackedPredictionService::new(assets.clone()));

        Ok(Self {
            config,
            assets,
            predictor,
        })
    }

    /// Load the vocabulary and model now.
    pub async fn preload(&self) -> Result<()> {
        tracing::info!("Preloading assets...");
        self.assets.preload().await?;
        tracing::info!("Assets ready");
        Ok(())
    }
}
