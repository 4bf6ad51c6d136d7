//! HTTP route handlers for the resume search API.

use crate::engine::DEFAULT_K;
use crate::error::EngineError;
use crate::extract;
use crate::server::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

// --- Request/Response types ---

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub record_id: u64,
    pub name: String,
    pub model_version: u64,
    pub status: String,
}

#[derive(Serialize)]
pub struct HitResponse {
    pub id: u64,
    pub name: String,
    pub score: f32,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub hits: Vec<HitResponse>,
    pub skipped_incompatible: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub document_count: usize,
    pub model_version: u64,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub total_queries: u64,
    pub total_uploads: u64,
    pub total_skipped_incompatible: u64,
    pub avg_query_latency_us: f64,
    pub p50_query_latency_us: f64,
    pub p95_query_latency_us: f64,
    pub p99_query_latency_us: f64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Router ---

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload", post(upload_document))
        .route("/search", post(search_documents))
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn engine_error(e: EngineError) -> ApiError {
    let status = if e.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn lock_poisoned() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Lock poisoned".to_string(),
        }),
    )
}

// --- Handlers ---

async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let file_name = field
                .file_name()
                .ok_or_else(|| bad_request("no file name in upload"))?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(e.to_string()))?;
            file = Some((file_name, bytes.to_vec()));
            break;
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| bad_request("no file part in the request"))?;

    let text = state
        .extractor
        .extract(&file_name, &bytes)
        .map_err(engine_error)?;
    let name = extract::document_name(&file_name);

    let receipt = {
        let mut engine = state.engine.write().map_err(|_| lock_poisoned())?;
        engine.upload(&name, &text).map_err(engine_error)?
    };

    if let Ok(mut metrics) = state.metrics.write() {
        metrics.record_upload();
    }

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            record_id: receipt.id,
            name: receipt.name,
            model_version: receipt.model_version,
            status: "indexed".to_string(),
        }),
    ))
}

async fn search_documents(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let k = req.k.unwrap_or(DEFAULT_K);

    let start = Instant::now();

    let outcome = {
        let engine = state.engine.read().map_err(|_| lock_poisoned())?;
        engine.search(&req.query, k).map_err(engine_error)?
    };

    let elapsed = start.elapsed();

    if let Ok(mut metrics) = state.metrics.write() {
        metrics.record_query(elapsed, outcome.skipped_incompatible);
    }

    let hits = outcome
        .hits
        .into_iter()
        .map(|h| HitResponse {
            id: h.id,
            name: h.name,
            score: h.score,
        })
        .collect();

    Ok(Json(SearchResponse {
        hits,
        skipped_incompatible: outcome.skipped_incompatible,
    }))
}

async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let engine = state.engine.read().map_err(|_| lock_poisoned())?;
    let model_version = engine.model_version().map_err(engine_error)?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        document_count: engine.document_count(),
        model_version,
    }))
}

async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let metrics = state.metrics.read().map_err(|_| lock_poisoned())?;

    Ok(Json(MetricsResponse {
        total_queries: metrics.total_queries(),
        total_uploads: metrics.total_uploads(),
        total_skipped_incompatible: metrics.total_skipped_incompatible(),
        avg_query_latency_us: metrics.avg_query_latency_us(),
        p50_query_latency_us: metrics.percentile_query_latency_us(50.0),
        p95_query_latency_us: metrics.percentile_query_latency_us(95.0),
        p99_query_latency_us: metrics.percentile_query_latency_us(99.0),
    }))
}
