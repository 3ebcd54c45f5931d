use axum::{Extension, Json};
use serde_json::Value;

use crate::database::manager::DatabaseManager;
use crate::database::models::{PersonaProfile, Verification};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::verification_service::VerificationService;

/// POST /api/verifications - Submit a persona payload for review.
pub async fn submit(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> ApiResult<Verification> {
    // Deserialize by hand so malformed payloads come back as a 400 in the
    // standard envelope, with serde's variant/field message intact.
    let profile: PersonaProfile = serde_json::from_value(payload)
        .map_err(|e| ApiError::invalid_json(format!("Invalid persona payload: {}", e)))?;

    let service = VerificationService::new(DatabaseManager::pool()?);
    let record = service.submit(user.user_id, user.role, &profile).await?;

    Ok(ApiResponse::created(record))
}

/// GET /api/verifications/me - The caller's latest submission.
pub async fn me(Extension(user): Extension<AuthUser>) -> ApiResult<Verification> {
    let service = VerificationService::new(DatabaseManager::pool()?);
    let record = service
        .latest_for_user(user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No verification submitted yet"))?;

    Ok(ApiResponse::success(record))
}
