use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::DecisionBody;
use crate::api::Page;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Persona, Verification, VerificationStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::audit_service::AuditService;
use crate::services::verification_service::{
    VerificationFilter, VerificationPage, VerificationService, SCHOOL_TARGETS,
};

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/school/verifications - Student queue for school reviewers.
pub async fn list(Query(query): Query<QueueQuery>) -> ApiResult<VerificationPage> {
    let status = parse_status_filter(query.status.as_deref())?;
    let page = Page::from_query(query.limit, query.offset, &config().api);

    let service = VerificationService::new(DatabaseManager::pool()?);
    let result = service
        .list(
            VerificationFilter {
                status,
                persona: Some(Persona::Student),
            },
            page,
        )
        .await?;

    Ok(ApiResponse::success(result))
}

/// PUT /api/school/verifications/:id - Pre-approve or deny a pending
/// student submission.
pub async fn decide(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> ApiResult<Verification> {
    let status = body.status()?;
    let pool = DatabaseManager::pool()?;
    let service = VerificationService::new(pool.clone());

    // School reviewers only ever see student submissions; other personas
    // read as absent from this queue.
    let record = service.get(id).await?;
    if record.persona != Persona::Student {
        return Err(ApiError::not_found(format!("Verification not found: {}", id)));
    }

    let updated = service
        .decide(
            id,
            user.user_id,
            status,
            body.denial_reason.as_deref(),
            SCHOOL_TARGETS,
        )
        .await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "verification.school_decision",
            "verification",
            Some(id.to_string()),
            json!({ "status": status.as_str() }),
        )
        .await;

    Ok(ApiResponse::success(updated))
}

pub(super) fn parse_status_filter(
    raw: Option<&str>,
) -> Result<Option<VerificationStatus>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => VerificationStatus::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {}", value))),
    }
}
