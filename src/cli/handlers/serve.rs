use anyhow::Result;
use tracing::warn;

use crate::init::AppContext;
use crate::server::run_server;

/// Optionally warm the assets, then serve until shutdown.
///
/// A failed preload is not fatal: requests retry the load.
pub async fn handle_serve(ctx: &AppContext, allow_preload: bool) -> Result<()> {
    if allow_preload && ctx.config.assets.preload() {
        if let Err(e) = ctx.preload().await {
            warn!("Asset preload failed, will retry on first request: {}", e);
        }
    }

    run_server(ctx).await
}
