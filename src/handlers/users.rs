use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::Page;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{UserRole, UserStatus, UserView};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::audit_service::AuditService;
use crate::services::user_service::{UserPage, UserService};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateBody {
    pub role: Option<String>,
    pub status: Option<String>,
}

/// GET /api/admin/users
pub async fn list(Query(query): Query<UserListQuery>) -> ApiResult<UserPage> {
    let role = parse_role(query.role.as_deref())?;
    let status = parse_status(query.status.as_deref())?;
    let page = Page::from_query(query.limit, query.offset, &config().api);

    let service = UserService::new(DatabaseManager::pool()?);
    Ok(ApiResponse::success(service.list(role, status, page).await?))
}

/// GET /api/admin/users/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<UserView> {
    let service = UserService::new(DatabaseManager::pool()?);
    let user = service.get(id).await?;
    Ok(ApiResponse::success(UserView::from(&user)))
}

/// PATCH /api/admin/users/:id - Change role and/or status.
pub async fn update(
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UserUpdateBody>,
) -> ApiResult<UserView> {
    let role = parse_role(body.role.as_deref())?;
    let status = parse_status(body.status.as_deref())?;

    let pool = DatabaseManager::pool()?;
    let service = UserService::new(pool.clone());
    let updated = service.admin_update(actor.user_id, id, role, status).await?;

    AuditService::new(pool)
        .record(
            actor.user_id,
            "user.admin_update",
            "user",
            Some(id.to_string()),
            json!({
                "role": role.map(|r| r.as_str()),
                "status": status.map(|s| s.as_str()),
            }),
        )
        .await;

    Ok(ApiResponse::success(UserView::from(&updated)))
}

fn parse_role(raw: Option<&str>) -> Result<Option<UserRole>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => UserRole::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown role: {}", value))),
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<UserStatus>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => UserStatus::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {}", value))),
    }
}
