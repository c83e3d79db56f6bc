//! Chat endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /api/chat - Answer a message, optionally grounded in documents
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let outcome = state
        .engine()
        .chat(&request.message, request.mode.as_deref(), &request.history)
        .await?;

    Ok(Json(ChatResponse::from_outcome(outcome)))
}
