//! Document management endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentListResponse, DocumentRecord, IngestSummary, UploadResponse};

/// GET /api/documents - List uploaded documents, newest first
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let documents = state.list_documents();
    let total = documents.len();
    Json(DocumentListResponse { documents, total })
}

/// POST /api/documents - Upload a file, record it, and ingest it
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(sanitize_filename) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(Error::InvalidRequest(
            "multipart request contained no file field".to_string(),
        ));
    };
    tracing::info!("Received upload: {} ({} bytes)", filename, data.len());

    let stored_path = store_upload(&state, &filename, &data).await?;
    let record = DocumentRecord::new(&filename, stored_path.clone());
    state.add_document(record.clone());

    let ingested_sources = state.engine().ingest_files(&[stored_path]).await?;
    if ingested_sources.is_empty() {
        tracing::warn!("Upload {} produced no indexable content", filename);
    }

    Ok(Json(UploadResponse {
        document: record,
        ingested_sources,
    }))
}

/// DELETE /api/documents/:id - Remove a document and rebuild the index from
/// what remains
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let record = state
        .remove_document(&id)
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

    if let Err(e) = tokio::fs::remove_file(&record.stored_path).await {
        tracing::warn!(
            "Could not remove stored file {}: {}",
            record.stored_path.display(),
            e
        );
    }

    let remaining = state.remaining_paths();
    state.engine().rebuild_index(&remaining).await?;
    tracing::info!(
        "Deleted document {} ({}), index rebuilt from {} remaining files",
        id,
        record.original_name,
        remaining.len()
    );

    Ok(Json(serde_json::json!({
        "deleted": id,
        "remaining_documents": remaining.len(),
    })))
}

/// POST /api/documents/ingest - Ingest every file already in the documents
/// directory
pub async fn ingest_existing(State(state): State<AppState>) -> Result<Json<IngestSummary>> {
    let paths = state.engine().scan_docs_dir();
    let ingested = state.engine().ingest_files(&paths).await?;
    Ok(Json(IngestSummary::new(ingested)))
}

/// Keep only the final path component of a client-supplied filename
fn sanitize_filename(raw: &str) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim()
        .to_string();
    if name.is_empty() {
        format!("upload-{}", Uuid::new_v4())
    } else {
        name
    }
}

/// Write the upload under `docs_dir/uploads/YYYY/MM/DD/`, avoiding collisions
async fn store_upload(state: &AppState, filename: &str, data: &[u8]) -> Result<std::path::PathBuf> {
    let day_dir = state
        .config()
        .storage
        .docs_dir
        .join("uploads")
        .join(Utc::now().format("%Y/%m/%d").to_string());
    tokio::fs::create_dir_all(&day_dir).await?;

    let mut target = day_dir.join(filename);
    if target.exists() {
        target = day_dir.join(format!("{}-{}", Uuid::new_v4(), filename));
    }
    tokio::fs::write(&target, data).await?;
    Ok(target)
}
