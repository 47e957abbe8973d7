//! HTTP surface: `POST /api/predict` and `GET /api/health`.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::init::AppContext;
use crate::services::PredictionService;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn PredictionService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(predictor: Arc<dyn PredictionService>) -> Self {
        Self {
            predictor,
            started_at: Instant::now(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let predict_route = post(handlers::predict).fallback(handlers::method_not_allowed);

    let app = Router::new()
        .route("/api/predict", predict_route)
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run_server(ctx: &AppContext) -> Result<()> {
    let config = &ctx.config.server;
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;

    let app = router(AppState::new(ctx.predictor.clone()), config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
