//! Static asset server for the application root
//!
//! Serves `components/<tag>/<tag>.{html,css}` (and anything else below the
//! root) so an [`HttpFetcher`](crate::resource::HttpFetcher) or a browser
//! can load templates. Paths that would leave the root are answered 404.

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::VERSION;
use crate::registry::ComponentRegistry;

/// Registered tags, for `/components`
#[derive(Clone)]
struct Tags(Arc<Vec<String>>);

/// `/health` and `/components`, everything else from `app_root`
pub fn router(app_root: impl Into<PathBuf>, registry: &ComponentRegistry) -> Router {
    let tags = Tags(Arc::new(registry.tags().into_iter().map(str::to_string).collect()));
    Router::new()
        .route("/health", get(health))
        .route("/components", get(components))
        .fallback_service(ServeDir::new(app_root.into()))
        .layer(TraceLayer::new_for_http())
        .with_state(tags)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "version": VERSION }))
}

async fn components(State(Tags(tags)): State<Tags>) -> Json<serde_json::Value> {
    Json(json!({ "components": tags.as_slice() }))
}

/// Bind and serve until `shutdown` resolves
pub async fn run(
    bind_addr: SocketAddr,
    app_root: PathBuf,
    registry: &ComponentRegistry,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(app_root.clone(), registry);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    tracing::info!(root = %app_root.display(), "Serving components on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    tracing::info!("Asset server shut down gracefully");
    Ok(())
}
