//! API routes for the chat server

pub mod chat;
pub mod documents;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::upload_document)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/documents/:id", delete(documents::delete_document))
        .route("/documents/ingest", post(documents::ingest_existing))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "ragchat",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "RAG chat service with document ingestion and grounded answers",
        "endpoints": {
            "POST /api/chat": "Chat with optional retrieval grounding",
            "GET /api/documents": "List uploaded documents",
            "POST /api/documents": "Upload and ingest a document",
            "DELETE /api/documents/:id": "Delete a document and rebuild the index",
            "POST /api/documents/ingest": "Ingest every file in the documents directory"
        }
    }))
}
