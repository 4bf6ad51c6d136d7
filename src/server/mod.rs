//! HTTP API server for the resume search engine.

pub mod routes;

use crate::engine::{EngineConfig, SearchEngine};
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::metrics::MetricsCollector;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Shared application state for the HTTP server.
///
/// Upload handlers take the engine's write guard, serializing the model's
/// load-fit-save sequence; search handlers take the read guard and see a
/// consistent snapshot.
pub struct AppState {
    pub engine: RwLock<SearchEngine>,
    pub extractor: Box<dyn TextExtractor>,
    pub metrics: RwLock<MetricsCollector>,
}

/// Start the HTTP server over a data directory.
pub async fn start(
    addr: &str,
    data_dir: impl AsRef<Path>,
    config: EngineConfig,
) -> anyhow::Result<()> {
    let engine = SearchEngine::open(data_dir, config)?;
    let state = Arc::new(AppState {
        engine: RwLock::new(engine),
        extractor: Box::new(PlainTextExtractor),
        metrics: RwLock::new(MetricsCollector::new()),
    });

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
