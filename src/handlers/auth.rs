use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{UserRole, UserView};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{Registration, UserService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: String,
    #[serde(default)]
    pub school_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

/// Token payload shared by register, login and refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user: UserView,
    pub token: String,
    pub expires_in: i64,
}

fn session_data(user: &crate::database::models::User) -> Result<SessionData, ApiError> {
    let security = &config().security;
    let claims = Claims::new(user, security.token_expiry_hours);
    let token = auth::generate_jwt(&claims, &security.jwt_secret).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Could not issue a session token")
    })?;

    Ok(SessionData {
        user: UserView::from(user),
        token,
        expires_in: (security.token_expiry_hours * 3600) as i64,
    })
}

/// POST /auth/register - Self-service signup for student, sponsor and
/// school accounts.
pub async fn register(Json(body): Json<RegisterRequest>) -> ApiResult<SessionData> {
    let role = UserRole::parse(&body.role)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown role: {}", body.role)))?;

    let registration = Registration::validate(
        &body.email,
        &body.password,
        &body.display_name,
        role,
        body.school_name.as_deref(),
    )?;

    let service = UserService::new(DatabaseManager::pool()?);
    let user = service.register(registration).await?;

    Ok(ApiResponse::created(session_data(&user)?))
}

/// POST /auth/login
pub async fn login(Json(body): Json<LoginRequest>) -> ApiResult<SessionData> {
    let service = UserService::new(DatabaseManager::pool()?);
    let user = service.authenticate(&body.email, &body.password).await?;

    Ok(ApiResponse::success(session_data(&user)?))
}

/// POST /auth/refresh - Exchange a token whose signature still verifies for
/// a fresh one. Expiry is ignored, but `iat` must fall inside the refresh
/// window and the account must still be active.
pub async fn refresh(Json(body): Json<RefreshRequest>) -> ApiResult<SessionData> {
    let security = &config().security;

    let claims = auth::decode_expired_jwt(&body.token, &security.jwt_secret)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let age_secs = Utc::now().timestamp() - claims.iat;
    let window_secs = (security.refresh_window_hours * 3600) as i64;
    if age_secs > window_secs {
        return Err(ApiError::unauthorized(
            "Token is too old to refresh, log in again",
        ));
    }

    let service = UserService::new(DatabaseManager::pool()?);
    let user = service.get_active(claims.sub).await.map_err(|_| {
        // Deleted and suspended accounts read the same from outside
        ApiError::unauthorized("Account is no longer eligible for refresh")
    })?;

    Ok(ApiResponse::success(session_data(&user)?))
}

/// GET /api/auth/whoami - Echo the verified claims.
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "userId": user.user_id,
        "email": user.email,
        "role": user.role,
        "schoolName": user.school_name,
    })))
}
