use axum::{extract::State, http::StatusCode, Json};
use nq_core::{ChatRequest, ChatResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{status_for, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub url: String,
    pub status: String,
    pub message: String,
}

pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<Json<ChatResponse>, ApiError> {
    let response = state.chat.chat(&request.query).await?;
    Ok(Json(response))
}

pub async fn ingest(State(state): State<AppState>, Json(request): Json<IngestRequest>) -> (StatusCode, Json<IngestResponse>) {
    match state.ingestor.ingest(&request.url).await {
        Ok(article) => {
            info!("📥 Ingested {} via API", article.url);
            (
                StatusCode::OK,
                Json(IngestResponse {
                    url: article.url,
                    status: "ok".to_string(),
                    message: format!("Ingested '{}'", article.title),
                }),
            )
        }
        Err(e) => {
            warn!("Ingestion of {} failed: {}", request.url, e);
            (
                status_for(&e),
                Json(IngestResponse {
                    url: request.url,
                    status: "error".to_string(),
                    message: e.to_string(),
                }),
            )
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let articles = state.articles.count_articles().await?;
    Ok(Json(json!({ "status": "ok", "articles": articles })))
}
