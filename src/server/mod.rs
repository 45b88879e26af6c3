//! HTTP API over the retriever.
//!
//! Endpoints:
//! - `GET  /health`   liveness probe
//! - `POST /upload`   multipart file upload (`file` field)
//! - `POST /ingest`   JSON `{document_id, text}`
//! - `POST /retrieve` JSON `{question, k?}`, ranked chunks
//! - `POST /query`    JSON `{question, k?}`, answer plus sources
//! - `GET  /stats`    index statistics

pub mod error;
pub mod routes;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::{ServerConfig, Settings};
use crate::error::{RagError, RagResult};
use crate::generation::{QaPipeline, run_blocking};
use crate::retrieve::Retriever;

pub use error::{ApiError, ErrorBody};

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    pub pipeline: QaPipeline,
    /// Lowercased, with leading dot
    pub allowed_extensions: Vec<String>,
    pub top_k: usize,
}

impl AppState {
    pub fn new(pipeline: QaPipeline, server: &ServerConfig, top_k: usize) -> Self {
        Self {
            pipeline,
            allowed_extensions: server
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            top_k,
        }
    }

    /// Case-insensitive check of the file name's extension.
    pub fn extension_allowed(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }
}

fn cors_layer(origins: &[String]) -> RagResult<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| {
                RagError::Configuration(format!("invalid CORS origin '{origin}'"))
            })
        })
        .collect::<RagResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Build the application router.
pub fn router(state: AppState, server: &ServerConfig) -> RagResult<Router> {
    let cors = cors_layer(&server.cors_origins)?;

    Ok(Router::new()
        .route("/health", get(routes::health))
        .route("/stats", get(routes::stats))
        .route("/upload", post(routes::upload))
        .route("/ingest", post(routes::ingest))
        .route("/retrieve", post(routes::retrieve))
        .route("/query", post(routes::query))
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(DefaultBodyLimit::max(server.max_upload_bytes)),
        ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "server", "failed to listen for ctrl+c: {e}");
        std::future::pending::<()>().await;
    }
    crate::log_event!("server", "shutdown", "signal received");
}

/// Load the model and index, then serve until Ctrl+C.
pub async fn serve(settings: Settings, bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| settings.server.bind.clone());

    crate::log_event!("server", "starting", "loading embedder and index");

    let startup_settings = settings.clone();
    let retriever = run_blocking(move || {
        let retriever = Retriever::from_settings(&startup_settings)?;
        retriever.ensure_loaded()?;
        Ok(retriever)
    })
    .await
    .context("failed to initialise retriever")?;

    let stats = retriever.stats();
    crate::log_event!(
        "server",
        "index ready",
        "{} entries, model {}",
        stats.entries,
        stats.model
    );

    let pipeline = QaPipeline::from_settings(Arc::new(retriever), &settings.generation)?;
    let state = AppState::new(pipeline, &settings.server, settings.retrieval.top_k);
    let app = router(state, &settings.server)?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    eprintln!("docrag listening on http://{bind}");
    eprintln!("Press Ctrl+C to stop the server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("Server shut down gracefully");
    Ok(())
}
