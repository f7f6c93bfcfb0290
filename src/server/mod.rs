//! # HTTP Server for Mockup Generation
//!
//! Serves the template API, single-mockup previews, and batch jobs with
//! progress polling.
//!
//! ## Usage
//!
//! ```bash
//! maqueta serve --listen 0.0.0.0:8080 --asset-dir assets --font-dir fonts
//! ```

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::assets::AssetResolver;
use crate::error::MaquetaError;
use crate::job::runner::BatchRunner;
use crate::render::text::FontStore;
use crate::render::Renderer;
use crate::storage::MemoryStore;
use crate::upload::{HttpUploader, LocalUploader, Uploader};

/// Build the application router for the given state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Mockup API
        .route("/api/mockup/preview", post(handlers::mockup::preview))
        // Template API
        .route(
            "/api/templates",
            post(handlers::templates::create).get(handlers::templates::list),
        )
        .route("/api/templates/:id", get(handlers::templates::get))
        // Job API (8MB limit for CSV bodies)
        .route(
            "/api/jobs",
            post(handlers::jobs::create).layer(DefaultBodyLimit::max(8 * 1024 * 1024)),
        )
        .route("/api/jobs/:id", get(handlers::jobs::detail))
        .route("/api/jobs/:id/results.csv", get(handlers::jobs::results_csv))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Wire up stores, renderer, and uploader from the configuration.
pub fn build_state(config: ServerConfig) -> Result<Arc<AppState>, MaquetaError> {
    let store = Arc::new(MemoryStore::new());
    let timeout = Duration::from_secs(config.fetch_timeout_secs);

    let uploader: Arc<dyn Uploader> = if config.upload_endpoint.is_empty() {
        Arc::new(LocalUploader::new(&config.output_dir))
    } else {
        Arc::new(HttpUploader::new(
            config.upload_endpoint.clone(),
            config.upload_api_key.clone(),
            timeout,
        )?)
    };

    let runner = BatchRunner {
        templates: store.clone(),
        jobs: store.clone(),
        processed: store.clone(),
        uploader,
        renderer: Arc::new(Renderer::new(FontStore::new(&config.font_dir))),
        resolver: Arc::new(AssetResolver::with_timeout(&config.asset_dir, timeout)?),
    };

    Ok(Arc::new(AppState {
        config,
        templates: store.clone(),
        jobs: store.clone(),
        processed: store,
        runner,
    }))
}

/// Start the HTTP server.
pub async fn serve(config: ServerConfig) -> Result<(), MaquetaError> {
    let listen_addr = config.listen_addr.clone();
    let app_state = build_state(config)?;
    let app = router(app_state);

    info!(listen_addr, "maqueta server starting");

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
