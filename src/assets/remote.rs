//! Assets downloaded once into a cache directory.
//!
//! Layout under the cache dir:
//! - `tokenizer.json`
//! - `model/model.json` plus every shard its weights manifest names
//!
//! A file that already exists is never downloaded again. Downloads are
//! written to `<name>.part` and renamed on success.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::info;
use url::Url;

use crate::assets::local::{read_model, read_vocabulary};
use crate::assets::AssetSource;
use crate::model::manifest::{checked_shard_path, LayersModelArtifact};
use crate::pipeline::{ScoringModel, VocabularyIndex};
use crate::HalalError;

const VOCABULARY_FILE: &str = "tokenizer.json";
const MODEL_DIR: &str = "model";
const MODEL_FILE: &str = "model.json";

pub struct RemoteSource {
    model_url: Url,
    vocabulary_url: Url,
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl RemoteSource {
    pub fn new(model_url: &str, vocabulary_url: &str, cache_dir: PathBuf) -> Result<Self, HalalError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| HalalError::Config(format!("invalid asset URL '{}': {}", raw, e)))
        };
        Ok(Self {
            model_url: parse(model_url)?,
            vocabulary_url: parse(vocabulary_url)?,
            cache_dir,
            client: reqwest::Client::new(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn vocabulary_path(&self) -> PathBuf {
        self.cache_dir.join(VOCABULARY_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.cache_dir.join(MODEL_DIR).join(MODEL_FILE)
    }

    async fn ensure_vocabulary(&self) -> Result<PathBuf, HalalError> {
        let path = self.vocabulary_path();
        if !path.exists() {
            self.download(&self.vocabulary_url, &path)
                .await
                .map_err(|e| HalalError::asset("vocabulary", e))?;
        }
        Ok(path)
    }

    async fn ensure_model(&self) -> Result<PathBuf, HalalError> {
        let model_path = self.model_path();
        if !model_path.exists() {
            self.download(&self.model_url, &model_path)
                .await
                .map_err(|e| HalalError::asset("model", e))?;
        }

        let artifact = LayersModelArtifact::from_file(&model_path)
            .map_err(|e| HalalError::asset("model", format!("{:#}", e)))?;
        let model_dir = model_path.parent().unwrap_or(&self.cache_dir).to_path_buf();

        for shard in artifact.shard_paths() {
            let relative = checked_shard_path(shard).map_err(|e| HalalError::asset("model", e))?;
            let shard_path = model_dir.join(relative);
            if shard_path.exists() {
                continue;
            }
            let shard_url = self
                .model_url
                .join(shard)
                .map_err(|e| HalalError::asset("model", format!("invalid shard URL '{}': {}", shard, e)))?;
            self.download(&shard_url, &shard_path)
                .await
                .map_err(|e| HalalError::asset("model", e))?;
        }

        Ok(model_path)
    }

    /// Stream `url` to `dest` through a `.part` file.
    async fn download(&self, url: &Url, dest: &Path) -> Result<(), String> {
        info!("Downloading {} to {}", url, dest.display());

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("failed to download {}: {}", url, e))?;

        let mut part_name = dest.as_os_str().to_owned();
        part_name.push(".part");
        let part_path = PathBuf::from(part_name);

        let mut file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|e| format!("failed to create {}: {}", part_path.display(), e))?;

        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| format!("failed to download {}: {}", url, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("failed to write {}: {}", part_path.display(), e))?;
            written += chunk.len();
        }
        file.flush()
            .await
            .map_err(|e| format!("failed to write {}: {}", part_path.display(), e))?;
        drop(file);

        tokio::fs::rename(&part_path, dest)
            .await
            .map_err(|e| format!("failed to move {} into place: {}", dest.display(), e))?;

        info!("Downloaded {} ({} bytes)", dest.display(), written);
        Ok(())
    }
}

#[async_trait]
impl AssetSource for RemoteSource {
    async fn load_vocabulary(&self) -> Result<VocabularyIndex, HalalError> {
        let path = self.ensure_vocabulary().await?;
        read_vocabulary(&path).await
    }

    async fn load_model(&self) -> Result<Arc<dyn ScoringModel>, HalalError> {
        let path = self.ensure_model().await?;
        read_model(&path).await
    }

    fn describe(&self) -> String {
        format!(
            "{} and {} (cache {})",
            self.model_url,
            self.vocabulary_url,
            self.cache_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_layout() {
        let source = RemoteSource::new(
            "https://example.com/v1/model.json",
            "https://example.com/v1/tokenizer.json",
            PathBuf::from("/cache"),
        )
        .expect("source");
        assert_eq!(source.vocabulary_path(), PathBuf::from("/cache/tokenizer.json"));
        assert_eq!(source.model_path(), PathBuf::from("/cache/model/model.json"));
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = RemoteSource::new("model.json", "tokenizer.json", PathBuf::from("/cache"))
            .err()
            .expect("should fail");
        assert!(matches!(err, HalalError::Config(_)));
    }

    #[tokio::test]
    async fn test_cached_vocabulary_skips_download() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Port 9 is discard; any request would fail.
        let source = RemoteSource::new(
            "http://127.0.0.1:9/model.json",
            "http://127.0.0.1:9/tokenizer.json",
            dir.path().to_path_buf(),
        )
        .expect("source");
        std::fs::write(
            source.vocabulary_path(),
            r#"{"word_index": {"<OOV>": 1, "honey": 2}}"#,
        )
        .expect("write");

        let vocabulary = source.load_vocabulary().await.expect("load");
        assert_eq!(vocabulary.lookup("honey"), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_asset_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = RemoteSource::new(
            "http://127.0.0.1:9/model.json",
            "http://127.0.0.1:9/tokenizer.json",
            dir.path().to_path_buf(),
        )
        .expect("source");

        let err = source.load_vocabulary().await.unwrap_err();
        assert!(matches!(err, HalalError::AssetUnavailable { .. }));
        assert!(!source.vocabulary_path().exists());
    }
}
