use axum::extract::{Multipart, Path, Query};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::Page;
use crate::auth;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Scholarship, ScholarshipStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::audit_service::AuditService;
use crate::services::file_store::{FileStore, LocalFileStore, BANNERS_FOLDER};
use crate::services::scholarship_service::{
    BrowseFilter, ScholarshipInput, ScholarshipPage, ScholarshipService, Viewer,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    pub status: Option<String>,
    pub sponsor_id: Option<Uuid>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarshipBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scholarship_type: Option<String>,
    #[serde(default)]
    pub coverage: Vec<String>,
    #[serde(default)]
    pub slots: Option<i32>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl ScholarshipBody {
    fn into_input(self) -> ScholarshipInput {
        ScholarshipInput {
            title: self.title,
            description: self.description.unwrap_or_default(),
            scholarship_type: self.scholarship_type,
            coverage: self.coverage,
            slots: self.slots,
            amount: self.amount,
            application_deadline: self.application_deadline,
        }
    }
}

/// Browse endpoints are public; a valid Bearer token widens visibility to
/// the caller's own records, anything else browses anonymously.
fn optional_viewer(headers: &HeaderMap) -> Option<Viewer> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let claims = auth::validate_jwt(token, &config().security.jwt_secret).ok()?;
    Some(Viewer {
        user_id: claims.sub,
        role: claims.role,
    })
}

fn viewer_of(user: &AuthUser) -> Viewer {
    Viewer {
        user_id: user.user_id,
        role: user.role,
    }
}

/// GET /api/scholarships
pub async fn browse(
    headers: HeaderMap,
    Query(query): Query<BrowseQuery>,
) -> ApiResult<ScholarshipPage> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(value) => Some(ScholarshipStatus::parse(value).ok_or_else(|| {
            ApiError::bad_request(format!("Unknown status: {}", value))
        })?),
    };
    let page = Page::from_query(query.limit, query.offset, &config().api);

    let service = ScholarshipService::new(DatabaseManager::pool()?);
    let result = service
        .list(
            optional_viewer(&headers),
            BrowseFilter {
                status,
                sponsor_id: query.sponsor_id,
                q: query.q.as_deref(),
            },
            page,
        )
        .await?;

    Ok(ApiResponse::success(result))
}

/// GET /api/scholarships/:id
pub async fn get(headers: HeaderMap, Path(id): Path<Uuid>) -> ApiResult<Scholarship> {
    let service = ScholarshipService::new(DatabaseManager::pool()?);
    let record = service.get_visible(optional_viewer(&headers), id).await?;
    Ok(ApiResponse::success(record))
}

/// POST /api/scholarships - New scholarship, always starts in draft.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ScholarshipBody>,
) -> ApiResult<Scholarship> {
    let service = ScholarshipService::new(DatabaseManager::pool()?);
    let record = service.create(user.user_id, body.into_input()).await?;
    Ok(ApiResponse::created(record))
}

/// PUT /api/scholarships/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ScholarshipBody>,
) -> ApiResult<Scholarship> {
    let service = ScholarshipService::new(DatabaseManager::pool()?);
    let record = service
        .update(viewer_of(&user), id, body.into_input())
        .await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/scholarships/:id/status - Walk the lifecycle machine.
pub async fn set_status(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Scholarship> {
    let next = ScholarshipStatus::parse(&body.status)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {}", body.status)))?;

    let pool = DatabaseManager::pool()?;
    let service = ScholarshipService::new(pool.clone());
    let record = service.set_status(viewer_of(&user), id, next).await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "scholarship.status",
            "scholarship",
            Some(id.to_string()),
            json!({ "status": next.as_str() }),
        )
        .await;

    Ok(ApiResponse::success(record))
}

/// POST /api/scholarships/:id/banner - Multipart banner upload.
pub async fn upload_banner(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Scholarship> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("banner").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Could not read upload: {}", e)))?;
            file = Some((name, bytes.to_vec()));
        }
    }
    let (name, bytes) = file
        .ok_or_else(|| ApiError::bad_request("Multipart field 'file' is required"))?;

    let store = LocalFileStore::from_config();
    let saved = store
        .save(BANNERS_FOLDER, &name, &bytes)
        .await
        .map_err(ApiError::from)?;

    let service = ScholarshipService::new(DatabaseManager::pool()?);
    match service
        .set_banner(viewer_of(&user), id, &saved.stored_path)
        .await
    {
        Ok(record) => Ok(ApiResponse::success(record)),
        Err(e) => {
            if let Err(cleanup) = store.delete(&saved.stored_path).await {
                tracing::warn!(
                    "Could not remove orphaned banner {}: {}",
                    saved.stored_path,
                    cleanup
                );
            }
            Err(e.into())
        }
    }
}
