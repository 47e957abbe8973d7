//! Remote assets: download into the cache once, reuse afterwards.

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use halalapi::assets::{
    create_asset_provider, AssetProvider, AssetSource, CachedAssetProvider, RemoteSource,
};
use halalapi::config::AssetsConfig;
use halalapi::pipeline::Label;
use halalapi::services::{AssetBackedPredictionService, PredictionService};
use halalapi::HalalError;

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

impl Hits {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serve the fixture assets under `/v1/`, counting requests.
async fn spawn_asset_server(serve_shard: bool) -> (SocketAddr, Hits) {
    let hits = Hits::default();

    let app = Router::new()
        .route(
            "/v1/model.json",
            get(|State(hits): State<Hits>| async move {
                hits.0.fetch_add(1, Ordering::SeqCst);
                common::model_json()
            }),
        )
        .route(
            "/v1/tokenizer.json",
            get(|State(hits): State<Hits>| async move {
                hits.0.fetch_add(1, Ordering::SeqCst);
                common::vocabulary_json()
            }),
        )
        .route(
            "/v1/group1-shard1of1.bin",
            get(move |State(hits): State<Hits>| async move {
                hits.0.fetch_add(1, Ordering::SeqCst);
                if serve_shard {
                    Ok(common::shard_bytes())
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (addr, hits)
}

fn remote_provider(addr: SocketAddr, cache_dir: &std::path::Path) -> Arc<CachedAssetProvider> {
    let source = RemoteSource::new(
        &format!("http://{}/v1/model.json", addr),
        &format!("http://{}/v1/tokenizer.json", addr),
        cache_dir.to_path_buf(),
    )
    .expect("source");
    Arc::new(CachedAssetProvider::new(Arc::new(source)))
}

#[tokio::test]
async fn test_remote_assets_are_downloaded_and_cached() {
    let (addr, hits) = spawn_asset_server(true).await;
    let cache = tempfile::tempdir().expect("tempdir");

    let service = AssetBackedPredictionService::new(remote_provider(addr, cache.path()));
    let response = service
        .predict(vec!["water".to_string(), "pork".to_string()])
        .await
        .expect("predict");

    assert_eq!(response.overall_classification, Label::Haram);
    assert_eq!(hits.count(), 3);
    assert!(cache.path().join("tokenizer.json").exists());
    assert!(cache.path().join("model").join("model.json").exists());
    assert!(cache.path().join("model").join(common::SHARD_FILE).exists());
    assert!(!cache.path().join("tokenizer.json.part").exists());

    // Second request on the same provider reuses the loaded assets.
    service
        .predict(vec!["water".to_string()])
        .await
        .expect("predict again");
    assert_eq!(hits.count(), 3);
}

#[tokio::test]
async fn test_fresh_provider_reuses_cache_directory() {
    let (addr, hits) = spawn_asset_server(true).await;
    let cache = tempfile::tempdir().expect("tempdir");

    remote_provider(addr, cache.path())
        .preload()
        .await
        .expect("first preload");
    assert_eq!(hits.count(), 3);

    let provider = remote_provider(addr, cache.path());
    provider.preload().await.expect("second preload");
    assert!(provider.is_ready());
    assert_eq!(hits.count(), 3);
}

#[tokio::test]
async fn test_missing_shard_fails_then_recovers() {
    let (addr, _hits) = spawn_asset_server(false).await;
    let cache = tempfile::tempdir().expect("tempdir");
    let provider = remote_provider(addr, cache.path());

    let err = provider.model().await.err().expect("shard is 404");
    assert!(matches!(err, HalalError::AssetUnavailable { ref asset, .. } if asset == "model"));
    assert!(!cache.path().join("model").join(common::SHARD_FILE).exists());

    // Vocabulary is independent of the model.
    provider.vocabulary().await.expect("vocabulary");
    assert!(!provider.is_ready());

    // Drop the shard in by hand; the next attempt finds it in the cache.
    std::fs::write(
        cache.path().join("model").join(common::SHARD_FILE),
        common::shard_bytes(),
    )
    .expect("write shard");
    provider.model().await.expect("retry");
    assert!(provider.is_ready());
}

#[test]
fn test_remote_config_builds_provider() {
    let cache = tempfile::tempdir().expect("tempdir");
    let config: AssetsConfig = serde_json::from_str(&format!(
        r#"{{"source": "remote", "model_url": "https://example.com/v1/model.json",
            "vocabulary_url": "https://example.com/v1/tokenizer.json", "cache_dir": {:?}}}"#,
        cache.path().display().to_string()
    ))
    .expect("config");

    assert!(!config.preload());
    let provider = create_asset_provider(&config).expect("provider");
    assert!(!provider.is_ready());
    assert!(provider.source().describe().contains("example.com"));
}
