use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::Page;
use crate::database::models::StoredDocument;
use crate::error::ApiError;
use crate::services::file_store::{FileStore, FileStoreError, KYC_FOLDER};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("Verification not found: {0}")]
    VerificationMissing(Uuid),

    #[error(transparent)]
    Store(#[from] FileStoreError),
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Database(e) => ApiError::from(e),
            DocumentError::NotFound(id) => {
                ApiError::not_found(format!("Document not found: {}", id))
            }
            DocumentError::VerificationMissing(id) => {
                ApiError::not_found(format!("Verification not found: {}", id))
            }
            DocumentError::Store(e) => ApiError::from(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentPage {
    pub records: Vec<StoredDocument>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub struct DocumentService {
    pool: PgPool,
    store: Arc<dyn FileStore>,
}

impl DocumentService {
    pub fn new(pool: PgPool, store: Arc<dyn FileStore>) -> Self {
        Self { pool, store }
    }

    /// Persist the uploaded bytes, then the metadata row. A failed insert
    /// removes the orphaned file again.
    pub async fn upload(
        &self,
        owner_id: Uuid,
        verification_id: Option<Uuid>,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument, DocumentError> {
        if let Some(vid) = verification_id {
            let owned: Option<(Uuid,)> =
                sqlx::query_as("SELECT user_id FROM verifications WHERE id = $1")
                    .bind(vid)
                    .fetch_optional(&self.pool)
                    .await?;
            match owned {
                Some((user_id,)) if user_id == owner_id => {}
                _ => return Err(DocumentError::VerificationMissing(vid)),
            }
        }

        let saved = self.store.save(KYC_FOLDER, original_name, bytes).await?;

        let inserted = sqlx::query_as::<_, StoredDocument>(
            r#"
            INSERT INTO documents
                (id, owner_id, verification_id, original_name, content_type, size_bytes, stored_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(verification_id)
        .bind(original_name)
        .bind(content_type)
        .bind(saved.size_bytes)
        .bind(&saved.stored_path)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(doc) => Ok(doc),
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&saved.stored_path).await {
                    tracing::warn!(
                        "Could not remove orphaned upload {}: {}",
                        saved.stored_path,
                        cleanup
                    );
                }
                Err(e.into())
            }
        }
    }

    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        page: Page,
    ) -> Result<DocumentPage, DocumentError> {
        let records = sqlx::query_as::<_, StoredDocument>(
            r#"
            SELECT * FROM documents WHERE owner_id = $1
            ORDER BY uploaded_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool);

        let total =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM documents WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool);

        let (records, total) = tokio::try_join!(records, total)?;

        Ok(DocumentPage {
            records,
            total: total.0,
            limit: page.limit,
            offset: page.offset,
        })
    }

    /// Metadata, visible to the owner and to admins. Anyone else reads the
    /// document as absent.
    pub async fn get_for(
        &self,
        viewer_id: Uuid,
        is_admin: bool,
        id: Uuid,
    ) -> Result<StoredDocument, DocumentError> {
        let doc = sqlx::query_as::<_, StoredDocument>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DocumentError::NotFound(id))?;

        if doc.owner_id == viewer_id || is_admin {
            Ok(doc)
        } else {
            Err(DocumentError::NotFound(id))
        }
    }

    pub async fn content_for(
        &self,
        viewer_id: Uuid,
        is_admin: bool,
        id: Uuid,
    ) -> Result<(StoredDocument, Vec<u8>), DocumentError> {
        let doc = self.get_for(viewer_id, is_admin, id).await?;
        let bytes = self.store.read(&doc.stored_path).await?;
        Ok((doc, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn missing_document_maps_to_not_found() {
        let api: ApiError = DocumentError::NotFound(Uuid::new_v4()).into();
        assert_eq!(api.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_errors_keep_their_api_mapping() {
        let api: ApiError = DocumentError::Store(FileStoreError::TooLarge { limit: 8 }).into();
        assert_eq!(api.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let api: ApiError =
            DocumentError::Store(FileStoreError::InvalidPath("..".to_string())).into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
    }
}
