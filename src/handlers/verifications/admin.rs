use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::school::parse_status_filter;
use super::DecisionBody;
use crate::api::Page;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Persona, Verification, VerificationStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::audit_service::AuditService;
use crate::services::verification_service::{
    BulkOutcome, GlobalStats, VerificationFilter, VerificationPage, VerificationService,
    ADMIN_TARGETS,
};

#[derive(Debug, Deserialize)]
pub struct AdminQueueQuery {
    pub status: Option<String>,
    pub persona: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBody {
    pub ids: Vec<Uuid>,
    pub status: String,
    #[serde(default)]
    pub denial_reason: Option<String>,
}

/// GET /api/admin/verifications - Full review queue with filters.
pub async fn list(Query(query): Query<AdminQueueQuery>) -> ApiResult<VerificationPage> {
    let status = parse_status_filter(query.status.as_deref())?;
    let persona = parse_persona_filter(query.persona.as_deref())?;
    let page = Page::from_query(query.limit, query.offset, &config().api);

    let service = VerificationService::new(DatabaseManager::pool()?);
    let result = service
        .list(VerificationFilter { status, persona }, page)
        .await?;

    Ok(ApiResponse::success(result))
}

/// GET /api/admin/verifications/stats
pub async fn stats() -> ApiResult<GlobalStats> {
    let service = VerificationService::new(DatabaseManager::pool()?);
    Ok(ApiResponse::success(service.global_stats().await?))
}

/// GET /api/admin/verifications/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<Verification> {
    let service = VerificationService::new(DatabaseManager::pool()?);
    Ok(ApiResponse::success(service.get(id).await?))
}

/// PUT /api/admin/verifications/:id - Verify or deny a pending record.
pub async fn decide(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<Verification> {
    let status = body.status()?;
    let pool = DatabaseManager::pool()?;
    let service = VerificationService::new(pool.clone());

    let updated = service
        .decide(
            id,
            user.user_id,
            status,
            body.denial_reason.as_deref(),
            ADMIN_TARGETS,
        )
        .await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "verification.decision",
            "verification",
            Some(id.to_string()),
            json!({ "status": status.as_str() }),
        )
        .await;

    Ok(ApiResponse::success(updated))
}

/// PUT /api/admin/verifications/bulk - One decision across many pending
/// records; misses are reported per id instead of failing the batch.
pub async fn bulk_decide(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<BulkBody>,
) -> ApiResult<BulkOutcome> {
    let status = VerificationStatus::parse(&body.status)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {}", body.status)))?;
    let pool = DatabaseManager::pool()?;
    let service = VerificationService::new(pool.clone());

    let outcome = service
        .bulk_decide(
            &body.ids,
            user.user_id,
            status,
            body.denial_reason.as_deref(),
            ADMIN_TARGETS,
        )
        .await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "verification.bulk_decision",
            "verification",
            None,
            json!({
                "status": status.as_str(),
                "targeted": body.ids.len(),
                "updated": outcome.updated.len(),
                "skipped": outcome.skipped.len(),
            }),
        )
        .await;

    Ok(ApiResponse::success(outcome))
}

fn parse_persona_filter(raw: Option<&str>) -> Result<Option<Persona>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => Persona::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown persona: {}", value))),
    }
}
