use axum::extract::{Multipart, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::Page;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{StoredDocument, UserRole};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::document_service::{DocumentPage, DocumentService};
use crate::services::file_store::LocalFileStore;

#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn document_service() -> Result<DocumentService, ApiError> {
    let pool = DatabaseManager::pool()?;
    Ok(DocumentService::new(pool, Arc::new(LocalFileStore::from_config())))
}

/// POST /api/documents - Multipart KYC upload. Fields: `file` (required),
/// `verificationId` (optional, must be the caller's own submission).
pub async fn upload(
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<StoredDocument> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut verification_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read upload: {}", e)))?;
                file = Some((name, content_type, bytes.to_vec()));
            }
            Some("verificationId") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read field: {}", e)))?;
                let parsed = raw.parse::<Uuid>().map_err(|_| {
                    ApiError::bad_request(format!("verificationId is not a UUID: {}", raw))
                })?;
                verification_id = Some(parsed);
            }
            _ => {}
        }
    }

    let (name, content_type, bytes) = file
        .ok_or_else(|| ApiError::bad_request("Multipart field 'file' is required"))?;

    let service = document_service()?;
    let document = service
        .upload(user.user_id, verification_id, &name, &content_type, &bytes)
        .await?;

    Ok(ApiResponse::created(document))
}

/// GET /api/documents - The caller's own uploads.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DocumentListQuery>,
) -> ApiResult<DocumentPage> {
    let page = Page::from_query(query.limit, query.offset, &config().api);
    let service = document_service()?;
    Ok(ApiResponse::success(
        service.list_for_owner(user.user_id, page).await?,
    ))
}

/// GET /api/documents/:id - Metadata, owner or admin.
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StoredDocument> {
    let service = document_service()?;
    let document = service
        .get_for(user.user_id, user.role == UserRole::Admin, id)
        .await?;
    Ok(ApiResponse::success(document))
}

/// GET /api/documents/:id/content - Raw bytes with the stored content type.
pub async fn content(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let service = document_service()?;
    let (document, bytes) = service
        .content_for(user.user_id, user.role == UserRole::Admin, id)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", document.original_name.replace('"', "")),
            ),
        ],
        bytes,
    )
        .into_response())
}
