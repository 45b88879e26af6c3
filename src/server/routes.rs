//! Route handlers.

use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use super::error::ApiError;
use crate::documents::extract_text;
use crate::generation::{Answer, run_blocking};
use crate::retrieve::{IndexStats, IngestReport};
use crate::vector::SearchHit;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub document_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    /// Falls back to `retrieval.top_k`.
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub document_id: String,
    pub chunks_indexed: usize,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub results: Vec<SearchHit>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<IndexStats> {
    Json(state.pipeline.retriever().stats())
}

/// Accept a multipart `file` field and ingest it under its file name.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| ApiError::validation("uploaded file has no name"))?;

        if !state.extension_allowed(&file_name) {
            return Err(ApiError::validation(format!(
                "Unsupported file type: {file_name} (allowed: {})",
                state.allowed_extensions.join(", ")
            )));
        }

        let bytes = field.bytes().await?;
        crate::debug_event!("upload", "received", "{file_name}: {} bytes", bytes.len());

        let name = file_name.clone();
        let text = run_blocking(move || extract_text(&name, &bytes)).await?;

        let report = ingest_blocking(&state, file_name.clone(), text).await?;
        return Ok(Json(UploadResponse {
            message: format!("Successfully processed {file_name}"),
            document_id: report.document_id,
            chunks_indexed: report.chunks_indexed,
        }));
    }

    Err(ApiError::validation("No file provided"))
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<IngestReport> {
    let Json(request) = payload?;
    let report = ingest_blocking(&state, request.document_id, request.text).await?;
    Ok(Json(report))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> ApiResult<RetrieveResponse> {
    let Json(request) = payload?;
    let k = request.k.unwrap_or(state.top_k);
    let results = state.pipeline.retrieve(&request.question, k).await?;
    Ok(Json(RetrieveResponse { results }))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> ApiResult<Answer> {
    let Json(request) = payload?;
    let k = request.k.unwrap_or(state.top_k);
    let answer = state.pipeline.answer(&request.question, k).await?;
    Ok(Json(answer))
}

async fn ingest_blocking(
    state: &AppState,
    document_id: String,
    text: String,
) -> Result<IngestReport, ApiError> {
    let retriever = Arc::clone(state.pipeline.retriever());
    let report = run_blocking(move || retriever.ingest(&document_id, &text)).await?;
    crate::log_event!(
        "server",
        "ingested",
        "{} ({} chunks)",
        report.document_id,
        report.chunks_indexed
    );
    Ok(report)
}
