use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::assets::AssetSource;
use crate::model::{select_device, SequentialModel};
use crate::pipeline::{ScoringModel, VocabularyIndex};
use crate::HalalError;

/// Assets read straight from disk.
pub struct LocalSource {
    model_path: PathBuf,
    vocabulary_path: PathBuf,
}

impl LocalSource {
    pub fn new(model_path: PathBuf, vocabulary_path: PathBuf) -> Self {
        Self {
            model_path,
            vocabulary_path,
        }
    }
}

#[async_trait]
impl AssetSource for LocalSource {
    async fn load_vocabulary(&self) -> Result<VocabularyIndex, HalalError> {
        read_vocabulary(&self.vocabulary_path).await
    }

    async fn load_model(&self) -> Result<Arc<dyn ScoringModel>, HalalError> {
        read_model(&self.model_path).await
    }

    fn describe(&self) -> String {
        format!(
            "local files (model {}, vocabulary {})",
            self.model_path.display(),
            self.vocabulary_path.display()
        )
    }
}

/// Parse a vocabulary file off the async runtime.
pub(crate) async fn read_vocabulary(path: &Path) -> Result<VocabularyIndex, HalalError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || VocabularyIndex::from_file(&path))
        .await
        .map_err(|e| HalalError::asset("vocabulary", format!("Task join error: {}", e)))?
}

/// Load a layers model off the async runtime.
pub(crate) async fn read_model(path: &Path) -> Result<Arc<dyn ScoringModel>, HalalError> {
    let path = path.to_path_buf();
    let model = tokio::task::spawn_blocking(move || {
        let device = select_device();
        SequentialModel::load(&path, device)
    })
    .await
    .map_err(|e| HalalError::asset("model", format!("Task join error: {}", e)))?
    .map_err(|e| HalalError::asset("model", format!("{:#}", e)))?;

    Ok(Arc::new(model))
}
