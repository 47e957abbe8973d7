//! Asset provisioning: resolve the vocabulary and the model once, share them
//! afterwards.
//!
//! An [`AssetSource`] knows how to produce each asset (from disk, or by
//! downloading into a cache first). [`CachedAssetProvider`] wraps a source with
//! one `OnceCell` per asset so concurrent first callers share a single
//! in-flight load. A failed load leaves the cell empty and is reported to the
//! caller that triggered it; the next caller starts a fresh attempt.

pub mod local;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{default_cache_dir, AssetsConfig};
use crate::pipeline::{ScoringModel, VocabularyIndex};
use crate::HalalError;

pub use local::LocalSource;
pub use remote::RemoteSource;

/// Produces fresh copies of the assets. Called at most once per successful load.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn load_vocabulary(&self) -> Result<VocabularyIndex, HalalError>;

    async fn load_model(&self) -> Result<Arc<dyn ScoringModel>, HalalError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Shared, lazily loaded assets.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    async fn vocabulary(&self) -> Result<Arc<VocabularyIndex>, HalalError>;

    async fn model(&self) -> Result<Arc<dyn ScoringModel>, HalalError>;

    /// Whether both assets are loaded.
    fn is_ready(&self) -> bool;
}

/// [`AssetProvider`] with single-flight initialization over an [`AssetSource`].
pub struct CachedAssetProvider {
    source: Arc<dyn AssetSource>,
    vocabulary: OnceCell<Arc<VocabularyIndex>>,
    model: OnceCell<Arc<dyn ScoringModel>>,
}

impl CachedAssetProvider {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            vocabulary: OnceCell::new(),
            model: OnceCell::new(),
        }
    }

    /// Load both assets concurrently.
    pub async fn preload(&self) -> Result<(), HalalError> {
        futures::try_join!(self.vocabulary(), self.model())?;
        Ok(())
    }

    pub fn source(&self) -> &dyn AssetSource {
        self.source.as_ref()
    }
}

#[async_trait]
impl AssetProvider for CachedAssetProvider {
    async fn vocabulary(&self) -> Result<Arc<VocabularyIndex>, HalalError> {
        self.vocabulary
            .get_or_try_init(|| async {
                info!("Loading vocabulary from {}", self.source.describe());
                let vocabulary = self.source.load_vocabulary().await?;
                info!(
                    "Vocabulary loaded ({} words, oov token {:?})",
                    vocabulary.len(),
                    vocabulary.oov_token()
                );
                Ok::<_, HalalError>(Arc::new(vocabulary))
            })
            .await
            .cloned()
    }

    async fn model(&self) -> Result<Arc<dyn ScoringModel>, HalalError> {
        self.model
            .get_or_try_init(|| async {
                info!("Loading model from {}", self.source.describe());
                let model = self.source.load_model().await?;
                info!("Model loaded ({})", model.describe());
                Ok::<_, HalalError>(model)
            })
            .await
            .cloned()
    }

    fn is_ready(&self) -> bool {
        self.vocabulary.initialized() && self.model.initialized()
    }
}

/// Build the provider described by the configuration.
pub fn create_asset_provider(config: &AssetsConfig) -> Result<CachedAssetProvider, HalalError> {
    let source: Arc<dyn AssetSource> = match config {
        AssetsConfig::Local {
            model_path,
            vocabulary_path,
            ..
        } => Arc::new(LocalSource::new(model_path.clone(), vocabulary_path.clone())),
        AssetsConfig::Remote {
            model_url,
            vocabulary_url,
            cache_dir,
            ..
        } => {
            let cache_dir = cache_dir.clone().unwrap_or_else(default_cache_dir);
            Arc::new(RemoteSource::new(model_url, vocabulary_url, cache_dir)?)
        }
    };
    Ok(CachedAssetProvider::new(source))
}
